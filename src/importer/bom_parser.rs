// ==========================================
// 参考成本引擎 - BOM 分析表解析（状态机）
// ==========================================
// 状态: last_seen_assembly_code
// 块头行: 组成代码列为纯数字且明细代码列为空 → 更新状态，不产出记录
// 明细行: 类型列为 INSUMO / COMPOSICAO → 产出明细，组成代码取状态值
//         （状态未设置时取本行组成代码列）
// 组成代码或明细代码不是纯数字的行视为排版残留，跳过
// ==========================================

use crate::domain::partition::PartitionKey;
use crate::domain::reference::BomLineItem;
use crate::domain::types::{EntityKind, LineType};
use crate::importer::column_detector::{detect_columns, ColumnField, ColumnMap};
use crate::importer::error::ImportResult;
use crate::importer::number_parser::{parse_number, parse_optional_number};
use crate::importer::reference_parser::ParseOutcome;
use crate::importer::sheet_reader::SheetGrid;
use crate::importer::text_normalizer::{is_numeric_code, normalize_text};
use tracing::debug;

/// 单行的分类结果
#[derive(Debug)]
enum BomRow {
    BlockHeader(String),
    Item(BomLineItem),
    Skip,
}

struct BomStateMachine<'a> {
    partition: &'a PartitionKey,
    columns: &'a ColumnMap,
    last_seen_assembly_code: Option<String>,
}

impl<'a> BomStateMachine<'a> {
    fn new(partition: &'a PartitionKey, columns: &'a ColumnMap) -> Self {
        Self {
            partition,
            columns,
            last_seen_assembly_code: None,
        }
    }

    fn classify(&self, row: &[String]) -> BomRow {
        let map = self.columns;
        let own_assembly_code = map.cell(row, ColumnField::AssemblyCode);
        let line_code = map.cell(row, ColumnField::LineCode);

        if is_numeric_code(own_assembly_code) && line_code.is_empty() {
            return BomRow::BlockHeader(own_assembly_code.to_string());
        }

        let line_type = match LineType::from_tag(&normalize_text(map.cell(row, ColumnField::LineType))) {
            Some(t) => t,
            None => return BomRow::Skip,
        };

        let assembly_code = self
            .last_seen_assembly_code
            .as_deref()
            .unwrap_or(own_assembly_code);
        if !is_numeric_code(assembly_code) || !is_numeric_code(line_code) {
            return BomRow::Skip;
        }

        let mut item = BomLineItem::new(
            self.partition,
            assembly_code,
            line_type,
            line_code,
            parse_number(map.cell(row, ColumnField::Coefficient)),
        )
        .with_text(
            map.cell(row, ColumnField::LineDescription),
            map.cell(row, ColumnField::LineUnit),
        )
        .with_snapshot(
            parse_optional_number(map.cell(row, ColumnField::SnapshotUnitCost)),
            parse_optional_number(map.cell(row, ColumnField::SnapshotTotalCost)),
        );
        item.group = map.cell(row, ColumnField::Group).to_string();
        let status = map.cell(row, ColumnField::Status);
        item.status = (!status.is_empty()).then(|| status.to_string());

        BomRow::Item(item)
    }

    fn feed(&mut self, row: &[String]) -> BomRow {
        let outcome = self.classify(row);
        if let BomRow::BlockHeader(code) = &outcome {
            self.last_seen_assembly_code = Some(code.clone());
        }
        outcome
    }
}

/// 解析 BOM 分析表
pub fn parse_bom_lines(
    grid: &SheetGrid,
    partition: &PartitionKey,
    scan_rows: usize,
) -> ImportResult<ParseOutcome<BomLineItem>> {
    let columns = detect_columns(EntityKind::BomLine, &grid.rows, &partition.region, scan_rows)?;

    let mut records = Vec::new();
    let mut scanned_rows = 0;
    let mut skipped_rows = 0;
    let mut block_headers = 0;
    let mut machine = BomStateMachine::new(partition, &columns);
    for row in grid.rows.iter().skip(columns.data_start()) {
        scanned_rows += 1;
        match machine.feed(row) {
            BomRow::BlockHeader(_) => block_headers += 1,
            BomRow::Item(item) => records.push(item),
            BomRow::Skip => skipped_rows += 1,
        }
    }

    debug!(
        lines = records.len(),
        block_headers = block_headers,
        skipped = skipped_rows,
        "BOM 解析完成"
    );

    Ok(ParseOutcome {
        records,
        columns,
        scanned_rows,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CostingMode;

    fn grid(rows: &[&[&str]]) -> SheetGrid {
        SheetGrid::new(
            "Analítico",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn partition() -> PartitionKey {
        PartitionKey::new("2025/08", "DF", CostingMode::WithSocialCharges)
    }

    const HEADER: &[&str] = &[
        "Código da Composição", "Tipo Item", "Código do Item", "Descrição", "Unidade",
        "Coeficiente", "Preço Unitário", "Custo Total",
    ];

    #[test]
    fn test_block_header_assigns_assembly_code() {
        let sheet = grid(&[
            HEADER,
            &["12345", "", "", "ALVENARIA", "M2", "", "", ""],
            &["", "INSUMO", "34", "CIMENTO", "KG", "2,5", "0,80", "2,00"],
            &["", "COMPOSIÇÃO", "88309", "PEDREIRO COM ENCARGOS", "H", "1,2", "", ""],
        ]);

        let outcome = parse_bom_lines(&sheet, &partition(), 25).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|l| l.assembly_code == "12345"));

        let cement = &outcome.records[0];
        assert_eq!(cement.line_type, LineType::Resource);
        assert_eq!(cement.coefficient, 2.5);
        assert_eq!(cement.snapshot_unit_cost, Some(0.80));
        assert_eq!(cement.snapshot_total_cost, Some(2.0));

        let labor = &outcome.records[1];
        assert_eq!(labor.line_type, LineType::Assembly);
        assert_eq!(labor.snapshot_unit_cost, None);
        assert_eq!(labor.snapshot_total_cost, None);
    }

    #[test]
    fn test_row_own_assembly_code_used_when_no_block_header() {
        let sheet = grid(&[
            HEADER,
            &["555", "INSUMO", "34", "CIMENTO", "KG", "1", "", ""],
        ]);
        let outcome = parse_bom_lines(&sheet, &partition(), 25).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].assembly_code, "555");
    }

    #[test]
    fn test_skip_unrecognized_and_malformed_rows() {
        let sheet = grid(&[
            HEADER,
            &["100", "", "", "BLOCO", "M2", "", "", ""],
            &["", "INSUMO", "ABC", "INVÁLIDO", "KG", "1", "", ""],
            &["", "OBSERVAÇÃO", "34", "NOTA", "", "", "", ""],
            &["", "INSUMO", "37", "AREIA", "M3", "0,02", "", ""],
        ]);
        let outcome = parse_bom_lines(&sheet, &partition(), 25).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].line_code, "37");
        assert_eq!(outcome.skipped_rows, 2);
    }

    #[test]
    fn test_new_block_header_switches_assembly() {
        let sheet = grid(&[
            HEADER,
            &["100", "", "", "A", "M2", "", "", ""],
            &["", "INSUMO", "1", "X", "KG", "1", "", ""],
            &["200", "", "", "B", "M2", "", "", ""],
            &["", "INSUMO", "1", "X", "KG", "3", "", ""],
        ]);
        let outcome = parse_bom_lines(&sheet, &partition(), 25).unwrap();
        let codes: Vec<&str> = outcome.records.iter().map(|l| l.assembly_code.as_str()).collect();
        assert_eq!(codes, vec!["100", "200"]);
        assert_ne!(outcome.records[0].id, outcome.records[1].id);
    }
}
