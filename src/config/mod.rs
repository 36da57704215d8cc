// ==========================================
// 参考成本引擎 - 配置层
// ==========================================
// 职责: 可调参数管理（回退顺序 / 表头扫描窗口 / 检索上限）
// 存储: config_kv 表
// ==========================================

pub mod composition_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use composition_config_trait::{CompositionConfigReader, ConfigResult};
pub use config_manager::{config_keys, parse_mode_order, ConfigManager};
