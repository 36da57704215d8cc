// ==========================================
// 参考成本引擎 - 资源/组成清单解析
// ==========================================
// 流程: 表头识别 → 数据行（表头之后直到文件末尾）→ 代码列必须为纯数字
// 代码列不是纯数字的行（脚注/说明/空行）直接跳过，不算错误
// ==========================================

use crate::domain::partition::PartitionKey;
use crate::domain::reference::{Assembly, Resource};
use crate::domain::types::EntityKind;
use crate::importer::column_detector::{detect_columns, ColumnField, ColumnMap};
use crate::importer::error::ImportResult;
use crate::importer::number_parser::{parse_number, parse_optional_number};
use crate::importer::sheet_reader::SheetGrid;
use crate::importer::text_normalizer::is_numeric_code;
use tracing::debug;

/// 单张表的解析结果
#[derive(Debug, Clone)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub columns: ColumnMap,
    /// 数据区扫描行数
    pub scanned_rows: usize,
    /// 被跳过的行数
    pub skipped_rows: usize,
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 遍历数据区，代码列为纯数字的行交给 build
fn collect_rows<T>(
    grid: &SheetGrid,
    columns: ColumnMap,
    mut build: impl FnMut(&ColumnMap, &[String]) -> T,
) -> ParseOutcome<T> {
    let data_rows = grid.rows.iter().skip(columns.data_start());

    let mut records = Vec::new();
    let mut scanned_rows = 0;
    let mut skipped_rows = 0;
    for (offset, row) in data_rows.enumerate() {
        scanned_rows += 1;
        let code = columns.cell(row, ColumnField::Code);
        if !is_numeric_code(code) {
            skipped_rows += 1;
            debug!(row = columns.data_start() + offset, code = %code, "跳过非数据行");
            continue;
        }
        records.push(build(&columns, row));
    }

    ParseOutcome {
        records,
        columns,
        scanned_rows,
        skipped_rows,
    }
}

/// 解析资源清单
pub fn parse_resources(
    grid: &SheetGrid,
    partition: &PartitionKey,
    scan_rows: usize,
) -> ImportResult<ParseOutcome<Resource>> {
    let columns = detect_columns(EntityKind::Resource, &grid.rows, &partition.region, scan_rows)?;

    Ok(collect_rows(grid, columns, |map, row| {
        let mut resource = Resource::new(
            partition,
            map.cell(row, ColumnField::Code),
            map.cell(row, ColumnField::Description),
            map.cell(row, ColumnField::Unit),
            parse_number(map.cell(row, ColumnField::UnitPrice)),
        );
        resource.classification = optional_text(map.cell(row, ColumnField::Classification));
        resource.price_source = optional_text(map.cell(row, ColumnField::PriceSource));
        resource
    }))
}

/// 解析组成清单
pub fn parse_assemblies(
    grid: &SheetGrid,
    partition: &PartitionKey,
    scan_rows: usize,
) -> ImportResult<ParseOutcome<Assembly>> {
    let columns = detect_columns(EntityKind::Assembly, &grid.rows, &partition.region, scan_rows)?;

    Ok(collect_rows(grid, columns, |map, row| {
        let mut assembly = Assembly::new(
            partition,
            map.cell(row, ColumnField::Code),
            map.cell(row, ColumnField::Description),
            map.cell(row, ColumnField::Unit),
            parse_number(map.cell(row, ColumnField::UnitCost)),
        );
        assembly.group = optional_text(map.cell(row, ColumnField::Group));
        assembly.overhead_percent = parse_optional_number(map.cell(row, ColumnField::OverheadPercent));
        assembly
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CostingMode;

    fn grid(rows: &[&[&str]]) -> SheetGrid {
        SheetGrid::new(
            "test",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn partition() -> PartitionKey {
        PartitionKey::new("2025/08", "DF", CostingMode::WithoutSocialCharges)
    }

    #[test]
    fn test_parse_resources_skips_footer() {
        let sheet = grid(&[
            &["Código", "Descrição", "Unidade", "Origem de Preço", "DF"],
            &["34", "CIMENTO PORTLAND", "KG", "C", "0,80"],
            &["37", "AREIA MÉDIA", "M3", "C", "120,00"],
            &["Fonte: relatório mensal", "", "", "", ""],
        ]);

        let outcome = parse_resources(&sheet, &partition(), 25).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.scanned_rows, 3);
        assert_eq!(outcome.skipped_rows, 1);

        let cement = &outcome.records[0];
        assert_eq!(cement.code, "34");
        assert_eq!(cement.unit, "KG");
        assert_eq!(cement.unit_price, 0.80);
        assert_eq!(cement.price_source.as_deref(), Some("C"));
        assert_eq!(cement.id, partition().resource_id("34"));
    }

    #[test]
    fn test_parse_assemblies_with_overhead() {
        let sheet = grid(&[
            &["Grupo", "Código", "Descrição", "Unidade", "Custo DF", "%AS DF"],
            &["ALVENARIA", "87316", "ALVENARIA DE VEDAÇÃO", "M2", "1.234,56", "45,20"],
            &["", "", "", "", "", ""],
        ]);

        let outcome = parse_assemblies(&sheet, &partition(), 25).unwrap();
        assert_eq!(outcome.records.len(), 1);
        let asm = &outcome.records[0];
        assert_eq!(asm.unit_cost, 1234.56);
        assert_eq!(asm.overhead_percent, Some(45.2));
        assert_eq!(asm.group.as_deref(), Some("ALVENARIA"));
    }

    #[test]
    fn test_parse_resources_missing_columns() {
        let sheet = grid(&[&["x", "y"], &["1", "2"]]);
        assert!(parse_resources(&sheet, &partition(), 25).is_err());
    }
}
