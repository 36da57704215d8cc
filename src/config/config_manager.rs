// ==========================================
// 参考成本引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 缺失或格式错误的配置项一律按默认值处理
// ==========================================

use crate::config::composition_config_trait::{CompositionConfigReader, ConfigResult};
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::types::CostingMode;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 默认回退顺序
pub const DEFAULT_FALLBACK_MODE_ORDER: &str = "SE,CE,DES";

/// 默认检索上限
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?)
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（global scope，存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_positive_usize(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                warn!(config_key = key, value = %value, default = default, "配置值无效，使用默认值");
                Ok(default)
            }
        }
    }
}

/// 解析模式列表（逗号分隔），未知代码跳过，重复只保留首次出现
pub fn parse_mode_order(raw: &str) -> Vec<CostingMode> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<CostingMode>() {
            Ok(mode) if !order.contains(&mode) => order.push(mode),
            Ok(_) => {}
            Err(e) => warn!(value = part, error = %e, "忽略未知的计价模式"),
        }
    }
    order
}

#[async_trait]
impl CompositionConfigReader for ConfigManager {
    async fn get_fallback_mode_order(&self) -> ConfigResult<Vec<CostingMode>> {
        let value =
            self.get_config_or_default(config_keys::FALLBACK_MODE_ORDER, DEFAULT_FALLBACK_MODE_ORDER)?;
        let order = parse_mode_order(&value);
        if order.is_empty() {
            warn!(value = %value, "回退顺序为空，使用默认值");
            return Ok(parse_mode_order(DEFAULT_FALLBACK_MODE_ORDER));
        }
        Ok(order)
    }

    async fn get_header_scan_rows(&self) -> ConfigResult<usize> {
        self.get_positive_usize(
            config_keys::HEADER_SCAN_ROWS,
            crate::importer::column_detector::DEFAULT_HEADER_SCAN_ROWS,
        )
    }

    async fn get_search_limit(&self) -> ConfigResult<usize> {
        self.get_positive_usize(config_keys::SEARCH_RESULT_LIMIT, DEFAULT_SEARCH_LIMIT)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 成本解析
    pub const FALLBACK_MODE_ORDER: &str = "fallback_mode_order";

    // 导入
    pub const HEADER_SCAN_ROWS: &str = "header_scan_rows";

    // 检索
    pub const SEARCH_RESULT_LIMIT: &str = "search_result_limit";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let config = manager();
        assert_eq!(
            config.get_fallback_mode_order().await.unwrap(),
            vec![
                CostingMode::WithoutSocialCharges,
                CostingMode::WithSocialCharges,
                CostingMode::TaxExempt
            ]
        );
        assert_eq!(config.get_header_scan_rows().await.unwrap(), 25);
        assert_eq!(config.get_search_limit().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let config = manager();
        config.set_config_value(config_keys::FALLBACK_MODE_ORDER, "des, ce").unwrap();
        config.set_config_value(config_keys::SEARCH_RESULT_LIMIT, "10").unwrap();
        config.set_config_value(config_keys::SEARCH_RESULT_LIMIT, "20").unwrap();

        assert_eq!(
            config.get_fallback_mode_order().await.unwrap(),
            vec![CostingMode::TaxExempt, CostingMode::WithSocialCharges]
        );
        assert_eq!(config.get_search_limit().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back_to_defaults() {
        let config = manager();
        config.set_config_value(config_keys::HEADER_SCAN_ROWS, "abc").unwrap();
        config.set_config_value(config_keys::FALLBACK_MODE_ORDER, "XX,YY").unwrap();

        assert_eq!(config.get_header_scan_rows().await.unwrap(), 25);
        assert_eq!(config.get_fallback_mode_order().await.unwrap().len(), 3);
    }

    #[test]
    fn test_parse_mode_order_dedups() {
        assert_eq!(
            parse_mode_order("SE,SE,CE"),
            vec![CostingMode::WithoutSocialCharges, CostingMode::WithSocialCharges]
        );
    }
}
