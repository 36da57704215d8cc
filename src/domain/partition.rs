// ==========================================
// 参考成本引擎 - 分区键与复合 ID
// ==========================================
// 分区 = (期次, 地区, 计价模式)，三类实体全部按分区隔离
// 复合 ID 只在存储边界生成，内部一律使用结构化键
// ==========================================

use crate::domain::types::{CostingMode, EntityKind, LineType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 分区键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    /// 期次（如 "2025/08"）
    pub period: String,
    /// 地区代码（如 "DF"）
    pub region: String,
    pub mode: CostingMode,
}

impl PartitionKey {
    pub fn new(period: impl Into<String>, region: impl Into<String>, mode: CostingMode) -> Self {
        Self {
            period: period.into().trim().to_string(),
            region: region.into().trim().to_uppercase(),
            mode,
        }
    }

    /// 同期次同地区、换一种计价模式
    pub fn with_mode(&self, mode: CostingMode) -> Self {
        Self {
            period: self.period.clone(),
            region: self.region.clone(),
            mode,
        }
    }

    fn id_prefix(&self, kind: EntityKind) -> String {
        format!(
            "{}_{}_{}_{}",
            self.period,
            self.region,
            self.mode.code(),
            kind.type_tag()
        )
    }

    /// 资源记录 ID
    pub fn resource_id(&self, code: &str) -> String {
        format!("{}_{}", self.id_prefix(EntityKind::Resource), code.trim())
    }

    /// 组成记录 ID
    pub fn assembly_id(&self, code: &str) -> String {
        format!("{}_{}", self.id_prefix(EntityKind::Assembly), code.trim())
    }

    /// BOM 明细 ID
    ///
    /// 同一组成下资源与子组成可能共用同一个代码，所以类型也要进 ID
    pub fn bom_line_id(&self, assembly_code: &str, line_type: LineType, line_code: &str) -> String {
        format!(
            "{}_{}_{}_{}",
            self.id_prefix(EntityKind::BomLine),
            assembly_code.trim(),
            line_type.to_db_str(),
            line_code.trim()
        )
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.period, self.region, self.mode)
    }
}

/// 已加载分区的统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub partition: PartitionKey,
    pub record_count: usize,
}
