// ==========================================
// 参考成本引擎 - 参考单价实体
// ==========================================
// 三类实体: 资源 (Resource) / 组成 (Assembly) / BOM 明细 (BomLineItem)
// 生命周期: 仅由导入批量写入；除人工调价外不可变；按分区整体替换
// ==========================================

use crate::domain::partition::PartitionKey;
use crate::domain::types::{EntityKind, LineType};
use serde::{Deserialize, Serialize};

// ==========================================
// Resource - 基础资源（材料/人工/机械台时）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(flatten)]
    pub partition: PartitionKey,
    pub classification: Option<String>,
    pub code: String,
    pub description: String,
    pub unit: String,
    pub price_source: Option<String>,
    pub unit_price: f64,
}

impl Resource {
    pub fn new(
        partition: &PartitionKey,
        code: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        unit_price: f64,
    ) -> Self {
        let code = code.into().trim().to_string();
        Self {
            id: partition.resource_id(&code),
            partition: partition.clone(),
            classification: None,
            code,
            description: description.into(),
            unit: unit.into(),
            price_source: None,
            unit_price,
        }
    }
}

// ==========================================
// Assembly - 组成（带发布单价的 BOM 节点）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub id: String,
    #[serde(flatten)]
    pub partition: PartitionKey,
    pub group: Option<String>,
    pub code: String,
    pub description: String,
    pub unit: String,
    pub unit_cost: f64,
    pub overhead_percent: Option<f64>,
}

impl Assembly {
    pub fn new(
        partition: &PartitionKey,
        code: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        unit_cost: f64,
    ) -> Self {
        let code = code.into().trim().to_string();
        Self {
            id: partition.assembly_id(&code),
            partition: partition.clone(),
            group: None,
            code,
            description: description.into(),
            unit: unit.into(),
            unit_cost,
            overhead_percent: None,
        }
    }
}

// ==========================================
// BomLineItem - BOM 明细行
// ==========================================
// coefficient: 每单位父组成消耗的数量
// snapshot_*: 导入时报表上的原值（可能缺失）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLineItem {
    pub id: String,
    #[serde(flatten)]
    pub partition: PartitionKey,
    pub assembly_code: String,
    pub group: String,
    pub line_type: LineType,
    pub line_code: String,
    pub line_description: String,
    pub line_unit: String,
    pub coefficient: f64,
    pub snapshot_unit_cost: Option<f64>,
    pub snapshot_total_cost: Option<f64>,
    pub status: Option<String>,
}

impl BomLineItem {
    pub fn new(
        partition: &PartitionKey,
        assembly_code: impl Into<String>,
        line_type: LineType,
        line_code: impl Into<String>,
        coefficient: f64,
    ) -> Self {
        let assembly_code = assembly_code.into().trim().to_string();
        let line_code = line_code.into().trim().to_string();
        Self {
            id: partition.bom_line_id(&assembly_code, line_type, &line_code),
            partition: partition.clone(),
            assembly_code,
            group: String::new(),
            line_type,
            line_code,
            line_description: String::new(),
            line_unit: String::new(),
            coefficient,
            snapshot_unit_cost: None,
            snapshot_total_cost: None,
            status: None,
        }
    }

    pub fn with_snapshot(mut self, unit_cost: Option<f64>, total_cost: Option<f64>) -> Self {
        self.snapshot_unit_cost = unit_cost;
        self.snapshot_total_cost = total_cost;
        self
    }

    pub fn with_text(mut self, description: impl Into<String>, unit: impl Into<String>) -> Self {
        self.line_description = description.into();
        self.line_unit = unit.into();
        self
    }
}

// ==========================================
// ReferenceBatch - 一次导入的同类记录集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceBatch {
    Resources(Vec<Resource>),
    Assemblies(Vec<Assembly>),
    BomLines(Vec<BomLineItem>),
}

impl ReferenceBatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            ReferenceBatch::Resources(_) => EntityKind::Resource,
            ReferenceBatch::Assemblies(_) => EntityKind::Assembly,
            ReferenceBatch::BomLines(_) => EntityKind::BomLine,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceBatch::Resources(v) => v.len(),
            ReferenceBatch::Assemblies(v) => v.len(),
            ReferenceBatch::BomLines(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// ReferenceRecord - 搜索结果（任一类实体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceRecord {
    Resource(Resource),
    Assembly(Assembly),
    BomLine(BomLineItem),
}

impl ReferenceRecord {
    pub fn code(&self) -> &str {
        match self {
            ReferenceRecord::Resource(r) => &r.code,
            ReferenceRecord::Assembly(a) => &a.code,
            ReferenceRecord::BomLine(l) => &l.line_code,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ReferenceRecord::Resource(r) => &r.description,
            ReferenceRecord::Assembly(a) => &a.description,
            ReferenceRecord::BomLine(l) => &l.line_description,
        }
    }
}

// ==========================================
// PriceOverride - 人工调价目标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceOverride {
    ResourceUnitPrice { code: String, unit_price: f64 },
    AssemblyUnitCost { code: String, unit_cost: f64 },
    /// 覆盖快照单价，同时重算快照合价 = 系数 × 新单价
    BomLineSnapshotCost {
        assembly_code: String,
        line_type: LineType,
        line_code: String,
        unit_cost: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CostingMode;

    #[test]
    fn test_constructors_derive_ids() {
        let key = PartitionKey::new("2025/08", "DF", CostingMode::WithSocialCharges);
        let res = Resource::new(&key, " 00034 ", "CIMENTO", "KG", 0.8);
        assert_eq!(res.code, "00034");
        assert_eq!(res.id, key.resource_id("00034"));

        let line = BomLineItem::new(&key, "87316", LineType::Resource, "34", 1.5);
        assert_eq!(line.id, key.bom_line_id("87316", LineType::Resource, "34"));
        assert!(line.snapshot_unit_cost.is_none());
    }

    #[test]
    fn test_batch_kind_and_len() {
        let key = PartitionKey::new("2025/08", "DF", CostingMode::TaxExempt);
        let batch = ReferenceBatch::Assemblies(vec![Assembly::new(&key, "1", "A", "M2", 10.0)]);
        assert_eq!(batch.kind(), EntityKind::Assembly);
        assert_eq!(batch.len(), 1);
        assert!(ReferenceBatch::BomLines(Vec::new()).is_empty());
    }
}
