// ==========================================
// 参考成本引擎 - 参考单价导入器
// ==========================================
// 流程:
// 1. 读取文件为网格（按工作表提示选表）
// 2. 表头识别 + 行解析（纯函数，失败则整体失败，不落库）
// 3. 分区整体替换（单事务）
// 4. 记录导入批次
// ==========================================

use crate::config::composition_config_trait::CompositionConfigReader;
use crate::domain::import_batch::ImportBatch;
use crate::domain::partition::PartitionKey;
use crate::domain::reference::ReferenceBatch;
use crate::domain::types::EntityKind;
use crate::importer::bom_parser::parse_bom_lines;
use crate::importer::column_detector::ColumnMap;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::reference_parser::{parse_assemblies, parse_resources};
use crate::importer::sheet_reader::{SheetGrid, SheetReader, UniversalSheetReader};
use crate::repository::reference_repo::ReferenceRepository;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 单张表解析后的记录集
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub batch: ReferenceBatch,
    pub columns: ColumnMap,
    pub scanned_rows: usize,
    pub skipped_rows: usize,
}

/// 按实体类别解析网格（不落库）
pub fn parse_grid(
    grid: &SheetGrid,
    kind: EntityKind,
    partition: &PartitionKey,
    scan_rows: usize,
) -> ImportResult<ParsedSheet> {
    let parsed = match kind {
        EntityKind::Resource => {
            let o = parse_resources(grid, partition, scan_rows)?;
            ParsedSheet {
                batch: ReferenceBatch::Resources(o.records),
                columns: o.columns,
                scanned_rows: o.scanned_rows,
                skipped_rows: o.skipped_rows,
            }
        }
        EntityKind::Assembly => {
            let o = parse_assemblies(grid, partition, scan_rows)?;
            ParsedSheet {
                batch: ReferenceBatch::Assemblies(o.records),
                columns: o.columns,
                scanned_rows: o.scanned_rows,
                skipped_rows: o.skipped_rows,
            }
        }
        EntityKind::BomLine => {
            let o = parse_bom_lines(grid, partition, scan_rows)?;
            ParsedSheet {
                batch: ReferenceBatch::BomLines(o.records),
                columns: o.columns,
                scanned_rows: o.scanned_rows,
                skipped_rows: o.skipped_rows,
            }
        }
    };
    Ok(parsed)
}

// ==========================================
// ReferenceImporter - 参考单价导入器
// ==========================================
pub struct ReferenceImporter<R, C>
where
    R: ReferenceRepository,
    C: CompositionConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,

    // 文件读取
    reader: Box<dyn SheetReader>,
}

impl<R, C> ReferenceImporter<R, C>
where
    R: ReferenceRepository,
    C: CompositionConfigReader,
{
    /// 创建导入器（按扩展名自动选择读取器）
    pub fn new(repo: R, config: C) -> Self {
        Self::with_reader(repo, config, Box::new(UniversalSheetReader))
    }

    /// 使用指定读取器创建导入器
    pub fn with_reader(repo: R, config: C, reader: Box<dyn SheetReader>) -> Self {
        Self {
            repo,
            config,
            reader,
        }
    }

    async fn scan_rows(&self) -> ImportResult<usize> {
        self.config
            .get_header_scan_rows()
            .await
            .map_err(|e| ImportError::InternalError(format!("读取配置失败: {}", e)))
    }

    /// 导入一个文件到指定分区
    ///
    /// # 参数
    /// - file_path: 报表文件
    /// - kind: 报表对应的实体类别
    /// - partition: 目标分区（期次/地区/模式由调用方提供）
    /// - sheet_hint: 期望的工作表名
    ///
    /// # 返回
    /// - Ok(ImportBatch): 本次导入的批次记录
    /// - Err: 文件无法读取 / 缺少必需列 / 落库失败（分区保持导入前状态）
    #[instrument(skip_all, fields(kind = %kind, partition = %partition, batch_id))]
    pub async fn import_file(
        &self,
        file_path: &Path,
        kind: EntityKind,
        partition: &PartitionKey,
        sheet_hint: Option<&str>,
    ) -> ImportResult<ImportBatch> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        info!(file = %file_name, sheet_hint = ?sheet_hint, "开始导入参考单价");

        // === 步骤 1: 读取文件 ===
        let grid = self.reader.read_grid(file_path, sheet_hint)?;
        debug!(sheet = %grid.sheet_name, rows = grid.rows.len(), "文件读取完成");

        // === 步骤 2: 解析 ===
        let scan_rows = self.scan_rows().await?;
        let parsed = parse_grid(&grid, kind, partition, scan_rows)?;
        if parsed.batch.is_empty() {
            warn!(scanned = parsed.scanned_rows, "未解析出任何记录，分区将被清空");
        }

        let column_map_json = serde_json::to_string(&parsed.columns)
            .map_err(|e| ImportError::InternalError(format!("列映射序列化失败: {}", e)))?;

        // === 步骤 3: 分区替换 ===
        let accepted_rows = self.repo.replace_partition(partition, parsed.batch).await?;

        // === 步骤 4: 导入批次 ===
        let batch = ImportBatch {
            batch_id,
            kind,
            partition: partition.clone(),
            file_name,
            sheet_name: grid.sheet_name,
            scanned_rows: parsed.scanned_rows,
            accepted_rows,
            skipped_rows: parsed.skipped_rows,
            column_map_json,
            elapsed_ms: start_time.elapsed().as_millis() as i64,
            imported_at: Utc::now(),
        };
        self.repo.insert_import_batch(&batch).await?;

        info!(
            accepted = batch.accepted_rows,
            skipped = batch.skipped_rows,
            elapsed_ms = batch.elapsed_ms,
            "导入完成"
        );
        Ok(batch)
    }

    /// 导入已解码的网格（调用方自行读取文件时使用）
    pub async fn import_grid(
        &self,
        grid: &SheetGrid,
        kind: EntityKind,
        partition: &PartitionKey,
    ) -> ImportResult<usize> {
        let scan_rows = self.scan_rows().await?;
        let parsed = parse_grid(grid, kind, partition, scan_rows)?;
        Ok(self.repo.replace_partition(partition, parsed.batch).await?)
    }
}
