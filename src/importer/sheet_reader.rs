// ==========================================
// 参考成本引擎 - 表格读取器
// ==========================================
// 职责: 把上传文件解码为行列网格（不做表头识别）
// 支持: Excel (.xlsx/.xlsm/.xls) / ODS / CSV
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::text_normalizer::normalize_text;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::path::Path;
use tracing::debug;

/// 解码后的工作表网格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub sheet_name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(sheet_name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows,
        }
    }

    /// 最宽一行的列数
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

// ==========================================
// SheetReader Trait
// ==========================================
pub trait SheetReader: Send + Sync {
    /// 读取文件为网格
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet_hint: 期望的工作表名（找不到时退回第一个工作表）
    fn read_grid(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid>;
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|v| v.is_empty())
}

/// 按提示名挑选工作表：先精确匹配，再包含匹配，否则第一个
pub fn pick_sheet_name(sheet_names: &[String], sheet_hint: Option<&str>) -> Option<String> {
    let first = sheet_names.first().cloned();
    let hint = match sheet_hint.map(normalize_text) {
        Some(h) if !h.is_empty() => h,
        _ => return first,
    };

    let normalized: Vec<String> = sheet_names.iter().map(|n| normalize_text(n)).collect();
    if let Some(idx) = normalized.iter().position(|n| *n == hint) {
        return Some(sheet_names[idx].clone());
    }
    if let Some(idx) = normalized.iter().position(|n| n.contains(&hint)) {
        return Some(sheet_names[idx].clone());
    }

    debug!(hint = %hint, "未找到指定工作表，使用第一个工作表");
    first
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvSheetReader;

impl CsvSheetReader {
    /// 按首个非空行中分隔符出现次数选择分隔符
    fn sniff_delimiter(content: &str) -> u8 {
        let first_line = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("");
        let candidates = [b';', b',', b'\t'];
        candidates
            .iter()
            .copied()
            .max_by_key(|d| first_line.matches(*d as char).count())
            .unwrap_or(b';')
    }

    /// UTF-8 优先，失败则按 Windows-1252 解码（旧版报表常见）
    fn decode(bytes: Vec<u8>) -> String {
        match String::from_utf8(bytes) {
            Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
            Err(e) => {
                let bytes = e.into_bytes();
                let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(&bytes);
                if had_errors {
                    debug!("Windows-1252 解码存在无法映射的字节");
                }
                text.into_owned()
            }
        }
    }

    pub fn parse_content(&self, content: &str, sheet_name: &str) -> ImportResult<SheetGrid> {
        let delimiter = Self::sniff_delimiter(content);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if is_blank_row(&row) {
                continue;
            }
            rows.push(row);
        }

        Ok(SheetGrid::new(sheet_name, rows))
    }
}

impl SheetReader for CsvSheetReader {
    fn read_grid(&self, file_path: &Path, _sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let content = Self::decode(std::fs::read(file_path)?);
        let sheet_name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();

        self.parse_content(&content, &sheet_name)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelSheetReader;

impl SheetReader for ExcelSheetReader {
    fn read_grid(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if !matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = pick_sheet_name(&sheet_names, sheet_hint)
            .ok_or_else(|| ImportError::EmptyWorkbook(file_path.display().to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = Vec::new();
        for data_row in range.rows() {
            let row: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            if is_blank_row(&row) {
                continue;
            }
            rows.push(row);
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "工作表读取完成");
        Ok(SheetGrid::new(sheet_name, rows))
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetReader;

impl SheetReader for UniversalSheetReader {
    fn read_grid(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        match extension_of(file_path).as_str() {
            "csv" => CsvSheetReader.read_grid(file_path, sheet_hint),
            "xlsx" | "xlsm" | "xls" | "ods" => ExcelSheetReader.read_grid(file_path, sheet_hint),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
