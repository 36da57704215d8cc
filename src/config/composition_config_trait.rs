// ==========================================
// 参考成本引擎 - 配置读取 Trait
// ==========================================
// 职责: 定义导入与成本解析所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::CostingMode;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// CompositionConfigReader Trait
// ==========================================
// 用途: 导入器 / 成本解析器读取可调参数
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait CompositionConfigReader: Send + Sync {
    /// 获取回退模式顺序
    ///
    /// # 返回
    /// - Vec<CostingMode>: 按优先级排列；请求模式本身会被调用方剔除
    ///
    /// # 默认值
    /// - [SE, CE, DES]
    async fn get_fallback_mode_order(&self) -> ConfigResult<Vec<CostingMode>>;

    /// 获取表头扫描窗口（行）
    ///
    /// # 默认值
    /// - 25
    async fn get_header_scan_rows(&self) -> ConfigResult<usize>;

    /// 获取检索结果上限
    ///
    /// # 默认值
    /// - 50
    async fn get_search_limit(&self) -> ConfigResult<usize>;
}
