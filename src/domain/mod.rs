// ==========================================
// 参考成本引擎 - 领域模型层
// ==========================================
// 职责: 定义实体、分区键、类型与计算结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod breakdown;
pub mod import_batch;
pub mod partition;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use breakdown::{round2, CatalogDraft, CostBreakdown, ReferenceLookup, ResolvedLine};
pub use import_batch::ImportBatch;
pub use partition::{PartitionKey, PartitionSummary};
pub use reference::{
    Assembly, BomLineItem, PriceOverride, ReferenceBatch, ReferenceRecord, Resource,
};
pub use types::{CostingMode, EntityKind, LineType, PriceSource};
