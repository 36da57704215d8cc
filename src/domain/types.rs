// ==========================================
// 参考成本引擎 - 领域类型定义
// ==========================================
// 职责: 计价模式 / 实体类别 / 明细类型 / 单价来源
// 序列化格式: 与数据库存储的代码一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 计价模式 (Costing Mode)
// ==========================================
// 封闭集合: 同一期次、同一地区会按三种口径分别发布
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostingMode {
    /// 含社会负担（CE）
    #[serde(rename = "CE")]
    WithSocialCharges,
    /// 不含社会负担（SE）
    #[serde(rename = "SE")]
    WithoutSocialCharges,
    /// 免税口径（DES）
    #[serde(rename = "DES")]
    TaxExempt,
}

impl CostingMode {
    pub const ALL: [CostingMode; 3] = [
        CostingMode::WithoutSocialCharges,
        CostingMode::WithSocialCharges,
        CostingMode::TaxExempt,
    ];

    /// 存储层使用的模式代码
    pub fn code(&self) -> &'static str {
        match self {
            CostingMode::WithSocialCharges => "CE",
            CostingMode::WithoutSocialCharges => "SE",
            CostingMode::TaxExempt => "DES",
        }
    }
}

impl fmt::Display for CostingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CostingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CE" => Ok(CostingMode::WithSocialCharges),
            "SE" => Ok(CostingMode::WithoutSocialCharges),
            "DES" => Ok(CostingMode::TaxExempt),
            other => Err(format!("未知计价模式: {}", other)),
        }
    }
}

// ==========================================
// 实体类别 (Entity Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Resource,
    Assembly,
    BomLine,
}

impl EntityKind {
    /// 复合 id 中的类型标签
    pub fn type_tag(&self) -> &'static str {
        match self {
            EntityKind::Resource => "RES",
            EntityKind::Assembly => "ASM",
            EntityKind::BomLine => "BOM",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Resource => "ref_resource",
            EntityKind::Assembly => "ref_assembly",
            EntityKind::BomLine => "ref_bom_line",
        }
    }

    /// 搜索时按代码匹配的列
    pub(crate) fn code_column(&self) -> &'static str {
        match self {
            EntityKind::Resource | EntityKind::Assembly => "code",
            EntityKind::BomLine => "line_code",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Resource => write!(f, "RESOURCE"),
            EntityKind::Assembly => write!(f, "ASSEMBLY"),
            EntityKind::BomLine => write!(f, "BOM_LINE"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RESOURCE" | "RES" => Ok(EntityKind::Resource),
            "ASSEMBLY" | "ASM" => Ok(EntityKind::Assembly),
            "BOM_LINE" | "BOM" => Ok(EntityKind::BomLine),
            other => Err(format!("未知实体类别: {}", other)),
        }
    }
}

// ==========================================
// 明细类型 (Line Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineType {
    Resource,
    Assembly,
    Unknown,
}

impl LineType {
    /// 从报表中的类型标签识别（已规范化文本）
    ///
    /// 只接受两种标签，其余返回 None
    pub fn from_tag(normalized: &str) -> Option<LineType> {
        match normalized.trim() {
            "insumo" | "resource" => Some(LineType::Resource),
            "composicao" | "assembly" => Some(LineType::Assembly),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LineType::Resource => "RESOURCE",
            LineType::Assembly => "ASSEMBLY",
            LineType::Unknown => "UNKNOWN",
        }
    }

    pub fn from_db_str(raw: &str) -> LineType {
        match raw.trim() {
            "RESOURCE" => LineType::Resource,
            "ASSEMBLY" => LineType::Assembly,
            _ => LineType::Unknown,
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 单价来源 (Price Source)
// ==========================================
// 每条明细在计算结果中标注单价取自哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    Snapshot,     // 报表原始快照
    LiveAssembly, // 现查组成单价
    LiveResource, // 现查资源单价
    Missing,      // 未找到，按 0 计
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costing_mode_code_roundtrip() {
        for mode in CostingMode::ALL {
            assert_eq!(mode.code().parse::<CostingMode>().unwrap(), mode);
        }
        assert_eq!(" des ".parse::<CostingMode>().unwrap(), CostingMode::TaxExempt);
        assert!("XX".parse::<CostingMode>().is_err());
    }

    #[test]
    fn test_line_type_tags() {
        assert_eq!(LineType::from_tag("insumo"), Some(LineType::Resource));
        assert_eq!(LineType::from_tag("composicao"), Some(LineType::Assembly));
        assert_eq!(LineType::from_tag("observacao"), None);
        assert_eq!(LineType::from_db_str("???"), LineType::Unknown);
    }

    #[test]
    fn test_entity_kind_tags() {
        assert_eq!(EntityKind::Resource.type_tag(), "RES");
        assert_eq!(EntityKind::Assembly.type_tag(), "ASM");
        assert_eq!(EntityKind::BomLine.type_tag(), "BOM");
        assert_eq!("bom".parse::<EntityKind>().unwrap(), EntityKind::BomLine);
    }
}
