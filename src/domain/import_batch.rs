// ==========================================
// 参考成本引擎 - 导入批次记录
// ==========================================
// 对齐: ref_import_batch 表，每次成功导入写一行
// ==========================================

use crate::domain::partition::PartitionKey;
use crate::domain::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,               // 批次 ID（UUID）
    pub kind: EntityKind,               // 导入的实体类别
    pub partition: PartitionKey,        // 目标分区
    pub file_name: String,              // 源文件名
    pub sheet_name: String,             // 实际读取的工作表
    pub scanned_rows: usize,            // 数据区扫描行数
    pub accepted_rows: usize,           // 入库行数
    pub skipped_rows: usize,            // 跳过行数
    pub column_map_json: String,        // 识别出的列映射
    pub elapsed_ms: i64,                // 导入耗时（毫秒）
    pub imported_at: DateTime<Utc>,     // 导入时间
}
