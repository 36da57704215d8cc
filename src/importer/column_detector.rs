// ==========================================
// 参考成本引擎 - 表头识别
// ==========================================
// 职责: 在有限窗口内按关键词定位表头行与各字段所在列
// 规则:
// 1) 关键词匹配不区分大小写/重音
// 2) 价格列从右往左扫描，优先表头（或上方横幅）含地区代码的列，
//    百分比/负担率列降级
// 3) 关键词失败时按总列数套用固定版式
// 纯函数，不读文件，方便用版式样例单测
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::text_normalizer::{normalize_text, tokens};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// 默认表头扫描窗口（行）
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 25;

// ==========================================
// ColumnField - 可识别字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnField {
    // 资源 / 组成
    Classification,
    Group,
    Code,
    Description,
    Unit,
    PriceSource,
    UnitPrice,
    UnitCost,
    OverheadPercent,
    // BOM 明细
    AssemblyCode,
    LineType,
    LineCode,
    LineDescription,
    LineUnit,
    Coefficient,
    SnapshotUnitCost,
    SnapshotTotalCost,
    Status,
}

impl ColumnField {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnField::Classification => "classification",
            ColumnField::Group => "group",
            ColumnField::Code => "code",
            ColumnField::Description => "description",
            ColumnField::Unit => "unit",
            ColumnField::PriceSource => "price_source",
            ColumnField::UnitPrice => "unit_price",
            ColumnField::UnitCost => "unit_cost",
            ColumnField::OverheadPercent => "overhead_percent",
            ColumnField::AssemblyCode => "assembly_code",
            ColumnField::LineType => "line_type",
            ColumnField::LineCode => "line_code",
            ColumnField::LineDescription => "line_description",
            ColumnField::LineUnit => "line_unit",
            ColumnField::Coefficient => "coefficient",
            ColumnField::SnapshotUnitCost => "snapshot_unit_cost",
            ColumnField::SnapshotTotalCost => "snapshot_total_cost",
            ColumnField::Status => "status",
        }
    }
}

// ==========================================
// ColumnMap - 识别结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMap {
    pub kind: EntityKind,
    /// 表头行下标（None 表示未识别到表头，全表按版式处理）
    pub header_row: Option<usize>,
    pub width: usize,
    pub columns: BTreeMap<ColumnField, usize>,
    /// 通过固定版式补齐的字段
    pub positional: Vec<ColumnField>,
}

impl ColumnMap {
    pub fn get(&self, field: ColumnField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// 数据区起始行
    pub fn data_start(&self) -> usize {
        self.header_row.map(|r| r + 1).unwrap_or(0)
    }

    /// 取行中某字段的单元格文本，缺列或越界返回空串
    pub fn cell<'a>(&self, row: &'a [String], field: ColumnField) -> &'a str {
        self.get(field)
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

// ==========================================
// 关键词判定（入参均为规范化文本）
// ==========================================
fn has_token(h: &str, wanted: &[&str]) -> bool {
    tokens(h).any(|t| wanted.contains(&t))
}

fn is_code(h: &str) -> bool {
    h.contains("codigo") || has_token(h, &["cod", "code"])
}

fn is_description(h: &str) -> bool {
    h.contains("descricao") || h.contains("denominacao") || has_token(h, &["description"])
}

fn is_unit(h: &str) -> bool {
    h.contains("unidade") || has_token(h, &["unid", "un", "und", "unit"])
}

fn is_price_source(h: &str) -> bool {
    h.contains("origem")
}

fn is_price(h: &str) -> bool {
    (h.contains("preco") || h.contains("custo") || h.contains("valor") || has_token(h, &["price", "cost"]))
        && !is_price_source(h)
}

/// 百分比/费率列
///
/// "encargo" 单独出现时是含社保负担的成本列（如 "Custo com Encargos DF"），
/// 只有同时带费率字样才算费率列
fn is_percentage(h: &str) -> bool {
    h.contains('%')
        || h.contains("percent")
        || h.contains("porcent")
        || (h.contains("encargo") && (h.contains("taxa") || h.contains("aliquota")))
}

fn is_coefficient(h: &str) -> bool {
    h.contains("coeficiente") || has_token(h, &["coef"])
}

fn is_line_type(h: &str) -> bool {
    has_token(h, &["tipo", "type"])
}

fn region_match(h: &str, region: &str) -> bool {
    !region.is_empty() && (h == region || has_token(h, &[region]))
}

fn first_match(headers: &[String], taken: &[usize], pred: impl Fn(&str) -> bool) -> Option<usize> {
    headers
        .iter()
        .enumerate()
        .find(|(i, h)| !taken.contains(i) && pred(h.as_str()))
        .map(|(i, _)| i)
}

fn last_match(headers: &[String], taken: &[usize], pred: impl Fn(&str) -> bool) -> Option<usize> {
    headers
        .iter()
        .enumerate()
        .rev()
        .find(|(i, h)| !taken.contains(i) && pred(h.as_str()))
        .map(|(i, _)| i)
}

// ==========================================
// HeaderView - 表头行 + 上方横幅
// ==========================================
struct HeaderView {
    headers: Vec<String>,
    banners: Vec<String>,
}

impl HeaderView {
    fn build(rows: &[Vec<String>], header_row: usize, width: usize) -> Self {
        let normalize_row = |row: Option<&Vec<String>>| -> Vec<String> {
            (0..width)
                .map(|i| {
                    row.and_then(|r| r.get(i))
                        .map(|c| normalize_text(c))
                        .unwrap_or_default()
                })
                .collect()
        };

        let headers = normalize_row(rows.get(header_row));

        // 合并单元格只在首列有值，向右延续
        let mut banners = normalize_row(header_row.checked_sub(1).and_then(|r| rows.get(r)));
        let mut current = String::new();
        for banner in banners.iter_mut() {
            if banner.is_empty() {
                banner.clone_from(&current);
            } else {
                current.clone_from(banner);
            }
        }

        Self { headers, banners }
    }

    /// 从右往左定位价格列
    ///
    /// 1) 表头含地区代码，或横幅含地区代码且表头为价格列；非百分比列
    /// 2) 价格关键词；非百分比列
    /// 3) 表头含地区代码（百分比列兜底）
    fn price_column(&self, region: &str, taken: &[usize]) -> Option<usize> {
        let in_region = |i: usize, h: &str| -> bool {
            region_match(h, region) || (is_price(h) && region_match(&self.banners[i], region))
        };

        let rtl = || {
            self.headers
                .iter()
                .enumerate()
                .rev()
                .filter(|(i, _)| !taken.contains(i))
        };

        rtl()
            .find(|(i, h)| !is_percentage(h) && in_region(*i, h.as_str()))
            .or_else(|| rtl().find(|(_, h)| !is_percentage(h) && is_price(h)))
            .or_else(|| rtl().find(|(_, h)| region_match(h, region)))
            .map(|(i, _)| i)
    }
}

// ==========================================
// 固定版式（按总列数）
// ==========================================
fn positional_layout(kind: EntityKind, width: usize) -> &'static [(ColumnField, usize)] {
    use ColumnField as F;
    match (kind, width) {
        (EntityKind::Resource, 5) => &[
            (F::Code, 0),
            (F::Description, 1),
            (F::Unit, 2),
            (F::PriceSource, 3),
            (F::UnitPrice, 4),
        ],
        (EntityKind::Resource, 6) => &[
            (F::Classification, 0),
            (F::Code, 1),
            (F::Description, 2),
            (F::Unit, 3),
            (F::PriceSource, 4),
            (F::UnitPrice, 5),
        ],
        (EntityKind::Resource, 7) => &[
            (F::Classification, 0),
            (F::Code, 1),
            (F::Description, 2),
            (F::Unit, 3),
            (F::PriceSource, 4),
            (F::UnitPrice, 6),
        ],
        (EntityKind::Assembly, 4) => &[
            (F::Code, 0),
            (F::Description, 1),
            (F::Unit, 2),
            (F::UnitCost, 3),
        ],
        (EntityKind::Assembly, 5) => &[
            (F::Code, 0),
            (F::Description, 1),
            (F::Unit, 2),
            (F::UnitCost, 3),
            (F::OverheadPercent, 4),
        ],
        (EntityKind::Assembly, 6) => &[
            (F::Group, 0),
            (F::Code, 1),
            (F::Description, 2),
            (F::Unit, 3),
            (F::UnitCost, 4),
            (F::OverheadPercent, 5),
        ],
        (EntityKind::BomLine, 7) => &[
            (F::AssemblyCode, 0),
            (F::LineType, 1),
            (F::LineCode, 2),
            (F::LineDescription, 3),
            (F::LineUnit, 4),
            (F::Coefficient, 5),
            (F::SnapshotUnitCost, 6),
        ],
        (EntityKind::BomLine, 9) => &[
            (F::AssemblyCode, 0),
            (F::LineType, 1),
            (F::LineCode, 2),
            (F::LineDescription, 3),
            (F::LineUnit, 4),
            (F::Coefficient, 5),
            (F::SnapshotUnitCost, 6),
            (F::SnapshotTotalCost, 7),
            (F::Status, 8),
        ],
        (EntityKind::BomLine, 10) => &[
            (F::Group, 0),
            (F::AssemblyCode, 1),
            (F::LineType, 2),
            (F::LineCode, 3),
            (F::LineDescription, 4),
            (F::LineUnit, 5),
            (F::Coefficient, 6),
            (F::SnapshotUnitCost, 7),
            (F::SnapshotTotalCost, 8),
            (F::Status, 9),
        ],
        _ => &[],
    }
}

fn required_fields(kind: EntityKind) -> &'static [ColumnField] {
    match kind {
        EntityKind::Resource => &[ColumnField::Code, ColumnField::Description, ColumnField::UnitPrice],
        EntityKind::Assembly => &[ColumnField::Code, ColumnField::Description, ColumnField::UnitCost],
        EntityKind::BomLine => &[
            ColumnField::AssemblyCode,
            ColumnField::LineType,
            ColumnField::LineCode,
            ColumnField::Coefficient,
        ],
    }
}

// ==========================================
// 表头行定位
// ==========================================
fn looks_like_header(kind: EntityKind, row: &[String], region: &str) -> bool {
    let cells: Vec<String> = row.iter().map(|c| normalize_text(c)).collect();
    let any = |pred: &dyn Fn(&str) -> bool| cells.iter().any(|c| pred(c.as_str()));

    match kind {
        EntityKind::Resource | EntityKind::Assembly => {
            any(&is_code)
                && any(&is_description)
                && (any(&is_price) || any(&|c: &str| region_match(c, region)))
        }
        EntityKind::BomLine => any(&is_code) && (any(&is_coefficient) || any(&is_line_type)),
    }
}

/// 在前 scan_rows 行内找表头行
pub fn find_header_row(
    kind: EntityKind,
    rows: &[Vec<String>],
    region: &str,
    scan_rows: usize,
) -> Option<usize> {
    let region = normalize_text(region);
    rows.iter()
        .take(scan_rows)
        .position(|row| looks_like_header(kind, row, &region))
}

// ==========================================
// 字段识别
// ==========================================
#[derive(Default)]
struct Picker {
    found: BTreeMap<ColumnField, usize>,
}

impl Picker {
    fn taken(&self) -> Vec<usize> {
        self.found.values().copied().collect()
    }

    fn put(&mut self, field: ColumnField, idx: Option<usize>) {
        if let Some(i) = idx {
            self.found.insert(field, i);
        }
    }

    fn has(&self, field: ColumnField) -> bool {
        self.found.contains_key(&field)
    }
}

fn detect_by_keyword(
    kind: EntityKind,
    view: &HeaderView,
    region: &str,
) -> BTreeMap<ColumnField, usize> {
    let h = &view.headers;
    let mut p = Picker::default();

    match kind {
        EntityKind::Resource => {
            p.put(ColumnField::Code, first_match(h, &[], is_code));
            p.put(ColumnField::Description, first_match(h, &p.taken(), is_description));
            p.put(ColumnField::Unit, first_match(h, &p.taken(), is_unit));
            p.put(
                ColumnField::Classification,
                first_match(h, &p.taken(), |c| c.contains("classificacao")),
            );
            p.put(ColumnField::PriceSource, first_match(h, &p.taken(), is_price_source));
            p.put(ColumnField::UnitPrice, view.price_column(region, &p.taken()));
        }
        EntityKind::Assembly => {
            p.put(ColumnField::Group, first_match(h, &[], |c| c.contains("grupo")));
            p.put(ColumnField::Code, first_match(h, &p.taken(), is_code));
            p.put(ColumnField::Description, first_match(h, &p.taken(), is_description));
            p.put(ColumnField::Unit, first_match(h, &p.taken(), is_unit));
            let cost = view.price_column(region, &p.taken());
            p.put(ColumnField::UnitCost, cost);

            // 负担率列：紧跟成本列的百分比列，否则表头/横幅含地区代码的百分比列
            let overhead = cost
                .map(|c| c + 1)
                .filter(|&n| h.get(n).map(|x| is_percentage(x)).unwrap_or(false))
                .or_else(|| {
                    last_match(h, &p.taken(), |x| is_percentage(x) && region_match(x, region))
                })
                .or_else(|| {
                    h.iter().enumerate().rev().find_map(|(i, x)| {
                        (is_percentage(x) && region_match(&view.banners[i], region)).then_some(i)
                    })
                });
            p.put(ColumnField::OverheadPercent, overhead);
        }
        EntityKind::BomLine => {
            p.put(ColumnField::Group, first_match(h, &[], |c| c.contains("grupo")));

            let asm_code = first_match(h, &p.taken(), |c| is_code(c) && c.contains("composicao"))
                .or_else(|| first_match(h, &p.taken(), |c| is_code(c) && !c.contains("item")));
            p.put(ColumnField::AssemblyCode, asm_code);

            let line_code = first_match(h, &p.taken(), |c| is_code(c) && c.contains("item"))
                .or_else(|| first_match(h, &p.taken(), is_code));
            p.put(ColumnField::LineCode, line_code);

            p.put(ColumnField::LineType, first_match(h, &p.taken(), is_line_type));

            let line_desc = first_match(h, &p.taken(), |c| is_description(c) && c.contains("item"))
                .or_else(|| {
                    last_match(h, &p.taken(), |c| is_description(c) && !c.contains("composicao"))
                })
                .or_else(|| last_match(h, &p.taken(), is_description));
            p.put(ColumnField::LineDescription, line_desc);

            let line_unit = first_match(h, &p.taken(), |c| is_unit(c) && c.contains("item"))
                .or_else(|| last_match(h, &p.taken(), |c| is_unit(c) && !c.contains("composicao")))
                .or_else(|| last_match(h, &p.taken(), is_unit));
            p.put(ColumnField::LineUnit, line_unit);

            p.put(ColumnField::Coefficient, first_match(h, &p.taken(), is_coefficient));
            p.put(
                ColumnField::Status,
                first_match(h, &p.taken(), |c| c.contains("situacao")),
            );

            let unit_cost = last_match(h, &p.taken(), |c| {
                is_price(c) && c.contains("unit") && !is_percentage(c)
            });
            p.put(ColumnField::SnapshotUnitCost, unit_cost);

            let total_cost =
                last_match(h, &p.taken(), |c| c.contains("total") && !is_percentage(c));
            p.put(ColumnField::SnapshotTotalCost, total_cost);

            // 部分版式这两列没有表头文字：紧跟系数列之后
            if let Some(coef) = p.found.get(&ColumnField::Coefficient).copied() {
                let blank = |i: usize| {
                    h.get(i)
                        .map(|x| x.is_empty() || is_price(x))
                        .unwrap_or(false)
                };
                if !p.has(ColumnField::SnapshotUnitCost)
                    && blank(coef + 1)
                    && !p.taken().contains(&(coef + 1))
                {
                    p.put(ColumnField::SnapshotUnitCost, Some(coef + 1));
                }
                if !p.has(ColumnField::SnapshotTotalCost)
                    && blank(coef + 2)
                    && !p.taken().contains(&(coef + 2))
                {
                    p.put(ColumnField::SnapshotTotalCost, Some(coef + 2));
                }
            }
        }
    }

    p.found
}

/// 识别列位置
///
/// # 参数
/// - kind: 目标实体类别
/// - rows: 工作表网格
/// - region: 目标地区代码（价格列以地区命名）
/// - scan_rows: 表头扫描窗口
///
/// # 返回
/// - Ok(ColumnMap): 字段 → 列下标
/// - Err(MissingRequiredColumns): 版式兜底后仍缺必需列
pub fn detect_columns(
    kind: EntityKind,
    rows: &[Vec<String>],
    region: &str,
    scan_rows: usize,
) -> ImportResult<ColumnMap> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let region_norm = normalize_text(region);
    let header_row = find_header_row(kind, rows, region, scan_rows);

    let mut columns = match header_row {
        Some(r) => {
            let view = HeaderView::build(rows, r, width);
            detect_by_keyword(kind, &view, &region_norm)
        }
        None => BTreeMap::new(),
    };

    // 固定版式兜底：只补缺失字段，且不占用已识别的列
    let mut positional = Vec::new();
    for &(field, idx) in positional_layout(kind, width) {
        if columns.contains_key(&field) || idx >= width {
            continue;
        }
        if columns.values().any(|&used| used == idx) {
            continue;
        }
        columns.insert(field, idx);
        positional.push(field);
    }

    let missing: Vec<String> = required_fields(kind)
        .iter()
        .filter(|f| !columns.contains_key(f))
        .map(|f| f.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingRequiredColumns {
            kind,
            fields: missing,
        });
    }

    debug!(
        kind = %kind,
        header_row = ?header_row,
        width = width,
        positional = positional.len(),
        "列识别完成"
    );

    Ok(ColumnMap {
        kind,
        header_row,
        width,
        columns,
        positional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_resource_header_with_region_columns() {
        let rows = grid(&[
            &["SINAPI - PREÇOS DE INSUMOS"],
            &["Classificação", "Código do Insumo", "Descrição", "Unidade", "Origem de Preço", "AC", "DF", "GO"],
            &["MATERIAL", "34", "CIMENTO", "KG", "C", "0,90", "0,80", "0,85"],
        ]);

        let map = detect_columns(EntityKind::Resource, &rows, "DF", 25).unwrap();
        assert_eq!(map.header_row, Some(1));
        assert_eq!(map.get(ColumnField::Code), Some(1));
        assert_eq!(map.get(ColumnField::Description), Some(2));
        assert_eq!(map.get(ColumnField::Unit), Some(3));
        assert_eq!(map.get(ColumnField::PriceSource), Some(4));
        assert_eq!(map.get(ColumnField::UnitPrice), Some(6));
        assert!(map.positional.is_empty());
    }

    #[test]
    fn test_price_column_scans_right_to_left() {
        // 同一地区先有中间分项，再有最终价格
        let rows = grid(&[
            &["Código", "Descrição", "Unidade", "Custo Material DF", "Custo Mão de Obra DF", "Custo Total DF"],
            &["100", "ITEM", "M2", "1,00", "2,00", "3,00"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::UnitCost), Some(5));
    }

    #[test]
    fn test_percentage_column_is_deprioritized() {
        let rows = grid(&[
            &["", "", "", "DF", ""],
            &["Código", "Descrição", "Unidade", "Custo (R$)", "%AS"],
            &["100", "ALVENARIA", "M2", "90,00", "45,2"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.header_row, Some(1));
        assert_eq!(map.get(ColumnField::UnitCost), Some(3));
        assert_eq!(map.get(ColumnField::OverheadPercent), Some(4));
    }

    #[test]
    fn test_banner_selects_region_group() {
        let rows = grid(&[
            &["", "", "", "AC", "", "DF", ""],
            &["Código", "Descrição", "Unidade", "Custo", "%AS", "Custo", "%AS"],
            &["100", "ALVENARIA", "M2", "80,00", "40", "90,00", "45"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::UnitCost), Some(5));
        assert_eq!(map.get(ColumnField::OverheadPercent), Some(6));
    }

    #[test]
    fn test_loaded_cost_column_is_not_a_rate() {
        let rows = grid(&[
            &["Código", "Descrição", "Unidade", "Custo Material DF", "Custo com Encargos DF"],
            &["100", "ALVENARIA", "M2", "60,00", "90,00"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::UnitCost), Some(4));
        assert_eq!(map.get(ColumnField::OverheadPercent), None);

        let rows = grid(&[
            &["Código", "Descrição", "Unidade", "Custo sem encargos DF", "Custo com encargos DF"],
            &["100", "ALVENARIA", "M2", "60,00", "90,00"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::UnitCost), Some(4));
        assert_eq!(map.get(ColumnField::OverheadPercent), None);
    }

    #[test]
    fn test_charge_rate_column_stays_a_rate() {
        let rows = grid(&[
            &["Código", "Descrição", "Unidade", "Custo com Encargos DF", "Taxa de Encargos DF"],
            &["100", "ALVENARIA", "M2", "90,00", "45,2"],
        ]);
        let map = detect_columns(EntityKind::Assembly, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::UnitCost), Some(3));
        assert_eq!(map.get(ColumnField::OverheadPercent), Some(4));
    }

    #[test]
    fn test_positional_fallback_without_header() {
        let rows = grid(&[
            &["34", "CIMENTO", "KG", "C", "0,80"],
            &["37", "AREIA", "M3", "C", "120,00"],
        ]);
        let map = detect_columns(EntityKind::Resource, &rows, "DF", 25).unwrap();
        assert_eq!(map.header_row, None);
        assert_eq!(map.data_start(), 0);
        assert_eq!(map.get(ColumnField::UnitPrice), Some(4));
        assert_eq!(map.positional.len(), 5);
    }

    #[test]
    fn test_missing_required_columns_error() {
        let rows = grid(&[&["a", "b", "c"], &["1", "2", "3"]]);
        let err = detect_columns(EntityKind::Resource, &rows, "DF", 25).unwrap_err();
        match err {
            ImportError::MissingRequiredColumns { kind, fields } => {
                assert_eq!(kind, EntityKind::Resource);
                assert_eq!(fields, vec!["code", "description", "unit_price"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_outside_scan_window_is_ignored() {
        let mut rows = vec![vec!["nota".to_string()]; 5];
        rows.extend(grid(&[&["Código", "Descrição", "Unidade", "Preço DF"]]));
        assert_eq!(find_header_row(EntityKind::Resource, &rows, "DF", 3), None);
        assert_eq!(find_header_row(EntityKind::Resource, &rows, "DF", 10), Some(5));
    }

    #[test]
    fn test_bom_columns_by_keyword() {
        let rows = grid(&[
            &[
                "Grupo", "Código da Composição", "Tipo Item", "Código do Item", "Descrição",
                "Unidade", "Coeficiente", "Preço Unitário", "Custo Total", "Situação",
            ],
        ]);
        let map = detect_columns(EntityKind::BomLine, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::Group), Some(0));
        assert_eq!(map.get(ColumnField::AssemblyCode), Some(1));
        assert_eq!(map.get(ColumnField::LineType), Some(2));
        assert_eq!(map.get(ColumnField::LineCode), Some(3));
        assert_eq!(map.get(ColumnField::LineDescription), Some(4));
        assert_eq!(map.get(ColumnField::LineUnit), Some(5));
        assert_eq!(map.get(ColumnField::Coefficient), Some(6));
        assert_eq!(map.get(ColumnField::SnapshotUnitCost), Some(7));
        assert_eq!(map.get(ColumnField::SnapshotTotalCost), Some(8));
        assert_eq!(map.get(ColumnField::Status), Some(9));
    }

    #[test]
    fn test_bom_snapshot_columns_without_header_text() {
        let rows = grid(&[
            &["Código da Composição", "Tipo Item", "Código do Item", "Descrição", "Unidade", "Coeficiente", "", ""],
            &["87316", "", "", "ARGAMASSA", "M3", "", "", ""],
        ]);
        let map = detect_columns(EntityKind::BomLine, &rows, "DF", 25).unwrap();
        assert_eq!(map.get(ColumnField::Coefficient), Some(5));
        assert_eq!(map.get(ColumnField::SnapshotUnitCost), Some(6));
        assert_eq!(map.get(ColumnField::SnapshotTotalCost), Some(7));
    }
}
