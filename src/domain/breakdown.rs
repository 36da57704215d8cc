// ==========================================
// 参考成本引擎 - 成本分解结果
// ==========================================
// 由组成成本解析器输出，交给界面层展示或复制进目录
// ==========================================

use crate::domain::partition::PartitionKey;
use crate::domain::reference::{Assembly, BomLineItem};
use crate::domain::types::PriceSource;
use serde::{Deserialize, Serialize};

/// 按代码软引用的现查结果
///
/// 明细只按代码引用资源/组成，被引用方可能不存在
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReferenceLookup {
    Assembly(f64),
    Resource(f64),
    Missing,
}

impl ReferenceLookup {
    pub fn price(&self) -> f64 {
        match self {
            ReferenceLookup::Assembly(cost) => *cost,
            ReferenceLookup::Resource(price) => *price,
            ReferenceLookup::Missing => 0.0,
        }
    }

    pub fn source(&self) -> PriceSource {
        match self {
            ReferenceLookup::Assembly(_) => PriceSource::LiveAssembly,
            ReferenceLookup::Resource(_) => PriceSource::LiveResource,
            ReferenceLookup::Missing => PriceSource::Missing,
        }
    }
}

/// 已定价的明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLine {
    pub line: BomLineItem,
    pub unit_price: f64,
    pub total: f64,
    pub price_source: PriceSource,
}

/// 组成成本分解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// 请求的分区
    pub partition: PartitionKey,
    /// 明细实际取自的分区（回退时与请求分区的模式不同）
    pub source_partition: Option<PartitionKey>,
    pub assembly_code: String,
    /// 组成表头（独立结构可能没有）
    pub header: Option<Assembly>,
    pub lines: Vec<ResolvedLine>,
    /// 合计（最后统一保留两位小数）
    pub total: f64,
    pub is_fallback: bool,
}

impl CostBreakdown {
    pub fn empty(partition: PartitionKey, assembly_code: &str, header: Option<Assembly>) -> Self {
        Self {
            partition,
            source_partition: None,
            assembly_code: assembly_code.to_string(),
            header,
            lines: Vec::new(),
            total: 0.0,
            is_fallback: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 复制进目录所需的字段
    pub fn catalog_draft(&self) -> Option<CatalogDraft> {
        self.header.as_ref().map(|header| CatalogDraft {
            code: header.code.clone(),
            description: header.description.clone(),
            unit: header.unit.clone(),
            unit_cost: self.total,
        })
    }
}

/// 目录条目草稿（目录写入不在本引擎内）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub unit_cost: f64,
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CostingMode;

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.005_000_1), 10.01);
        assert_eq!(round2(3.333_333), 3.33);
        assert_eq!(round2(-1.234_9), -1.23);
    }

    #[test]
    fn test_lookup_missing_is_zero() {
        assert_eq!(ReferenceLookup::Missing.price(), 0.0);
        assert_eq!(ReferenceLookup::Missing.source(), PriceSource::Missing);
        assert_eq!(ReferenceLookup::Resource(2.5).source(), PriceSource::LiveResource);
    }

    #[test]
    fn test_catalog_draft_requires_header() {
        let key = PartitionKey::new("2025/08", "DF", CostingMode::WithSocialCharges);
        let mut breakdown = CostBreakdown::empty(key.clone(), "100", None);
        assert!(breakdown.catalog_draft().is_none());

        breakdown.header = Some(Assembly::new(&key, "100", "ALVENARIA", "M2", 90.0));
        breakdown.total = 87.5;
        let draft = breakdown.catalog_draft().unwrap();
        assert_eq!(draft.description, "ALVENARIA");
        assert_eq!(draft.unit, "M2");
        assert_eq!(draft.unit_cost, 87.5);
    }
}
