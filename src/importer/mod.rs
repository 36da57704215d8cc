// ==========================================
// 参考成本引擎 - 导入层
// ==========================================
// 职责: 把版式不固定的报表转换为带分区的参考单价记录
// 支持: Excel (.xlsx/.xlsm/.xls) / ODS / CSV
// ==========================================

// 模块声明
pub mod bom_parser;
pub mod column_detector;
pub mod error;
pub mod number_parser;
pub mod reference_importer;
pub mod reference_parser;
pub mod sheet_reader;
pub mod text_normalizer;

// 重导出核心类型
pub use bom_parser::parse_bom_lines;
pub use column_detector::{detect_columns, ColumnField, ColumnMap, DEFAULT_HEADER_SCAN_ROWS};
pub use error::{ImportError, ImportResult};
pub use number_parser::{parse_number, parse_optional_number};
pub use reference_importer::{parse_grid, ParsedSheet, ReferenceImporter};
pub use reference_parser::{parse_assemblies, parse_resources, ParseOutcome};
pub use sheet_reader::{CsvSheetReader, ExcelSheetReader, SheetGrid, SheetReader, UniversalSheetReader};
pub use text_normalizer::normalize_text;
