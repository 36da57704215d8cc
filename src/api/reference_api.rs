// ==========================================
// 参考成本引擎 - 参考单价 API
// ==========================================
// 职责: 面向界面层的统一入口（导入 / 查询 / 检索 / 成本解析 / 调价）
// 所有入参在这里校验，下层只处理已校验的数据
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, CompositionConfigReader, ConfigManager};
use crate::db::open_sqlite_connection;
use crate::domain::breakdown::{CatalogDraft, CostBreakdown};
use crate::domain::import_batch::ImportBatch;
use crate::domain::partition::{PartitionKey, PartitionSummary};
use crate::domain::reference::{Assembly, BomLineItem, PriceOverride, ReferenceRecord, Resource};
use crate::domain::types::{CostingMode, EntityKind};
use crate::engine::CompositionResolver;
use crate::importer::ReferenceImporter;
use crate::repository::{ReferenceRepository, ReferenceRepositoryImpl};

fn config_error(e: Box<dyn std::error::Error + Send + Sync>) -> ApiError {
    ApiError::InternalError(format!("配置读写失败: {}", e))
}

fn require_non_empty(value: &str, label: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", label)));
    }
    Ok(())
}

fn validate_partition(partition: &PartitionKey) -> ApiResult<()> {
    require_non_empty(&partition.period, "期次")?;
    require_non_empty(&partition.region, "地区")?;
    Ok(())
}

fn validate_price(value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::InvalidInput(format!("单价必须为非负数: {}", value)));
    }
    Ok(())
}

// ==========================================
// ReferenceApi - 参考单价 API
// ==========================================
pub struct ReferenceApi {
    repo: ReferenceRepositoryImpl,
    config: ConfigManager,
    importer: ReferenceImporter<ReferenceRepositoryImpl, ConfigManager>,
    resolver: CompositionResolver<ReferenceRepositoryImpl, ConfigManager>,
}

impl ReferenceApi {
    /// 打开数据库并创建 API（自动建表）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 API，各组件共用同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let repo = ReferenceRepositoryImpl::from_connection(conn.clone())?;
        let config = ConfigManager::from_connection(conn.clone()).map_err(config_error)?;
        let importer = ReferenceImporter::new(
            ReferenceRepositoryImpl::from_connection(conn.clone())?,
            ConfigManager::from_connection(conn.clone()).map_err(config_error)?,
        );
        let resolver = CompositionResolver::new(
            ReferenceRepositoryImpl::from_connection(conn.clone())?,
            ConfigManager::from_connection(conn).map_err(config_error)?,
        );

        Ok(Self {
            repo,
            config,
            importer,
            resolver,
        })
    }

    /// 由界面输入构造分区键
    ///
    /// # 参数
    /// - period: 期次（如 "2025/08"）
    /// - region: 地区代码
    /// - mode: 模式代码（CE / SE / DES）
    pub fn partition_key(period: &str, region: &str, mode: &str) -> ApiResult<PartitionKey> {
        require_non_empty(period, "期次")?;
        require_non_empty(region, "地区")?;
        let mode = mode.parse::<CostingMode>().map_err(ApiError::InvalidInput)?;
        Ok(PartitionKey::new(period, region, mode))
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 导入报表到分区（替换该分区同类记录）
    pub async fn import_file(
        &self,
        file_path: &str,
        kind: EntityKind,
        partition: &PartitionKey,
        sheet_hint: Option<&str>,
    ) -> ApiResult<ImportBatch> {
        require_non_empty(file_path, "文件路径")?;
        validate_partition(partition)?;

        let batch = self
            .importer
            .import_file(Path::new(file_path), kind, partition, sheet_hint)
            .await?;
        Ok(batch)
    }

    /// 最近的导入批次
    pub async fn list_import_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.repo.list_import_batches(limit).await?)
    }

    // ==========================================
    // 分区管理
    // ==========================================

    pub async fn count_records(&self, kind: EntityKind, partition: &PartitionKey) -> ApiResult<usize> {
        validate_partition(partition)?;
        Ok(self.repo.count(kind, partition).await?)
    }

    pub async fn list_partitions(&self, kind: EntityKind) -> ApiResult<Vec<PartitionSummary>> {
        Ok(self.repo.list_partitions(kind).await?)
    }

    /// 清空分区，返回删除的记录数
    pub async fn clear_partition(&self, kind: EntityKind, partition: &PartitionKey) -> ApiResult<usize> {
        validate_partition(partition)?;
        let removed = self.repo.clear_partition(kind, partition).await?;
        info!(kind = %kind, partition = %partition, removed = removed, "界面清空分区");
        Ok(removed)
    }

    // ==========================================
    // 查询 / 检索
    // ==========================================

    pub async fn get_resource(&self, partition: &PartitionKey, code: &str) -> ApiResult<Option<Resource>> {
        validate_partition(partition)?;
        require_non_empty(code, "资源代码")?;
        Ok(self.repo.find_resource(partition, code.trim()).await?)
    }

    pub async fn get_assembly(&self, partition: &PartitionKey, code: &str) -> ApiResult<Option<Assembly>> {
        validate_partition(partition)?;
        require_non_empty(code, "组成代码")?;
        Ok(self.repo.find_assembly(partition, code.trim()).await?)
    }

    pub async fn list_bom_lines(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> ApiResult<Vec<BomLineItem>> {
        validate_partition(partition)?;
        require_non_empty(assembly_code, "组成代码")?;
        Ok(self.repo.list_bom_lines(partition, assembly_code.trim()).await?)
    }

    /// 分区内检索（结果上限取自配置）
    pub async fn search(
        &self,
        kind: EntityKind,
        partition: &PartitionKey,
        query: &str,
    ) -> ApiResult<Vec<ReferenceRecord>> {
        validate_partition(partition)?;
        let limit = self.config.get_search_limit().await.map_err(config_error)?;
        let records = self.repo.search(kind, partition, query, limit).await?;
        debug!(query = query, hits = records.len(), "界面检索");
        Ok(records)
    }

    // ==========================================
    // 成本解析
    // ==========================================

    pub async fn resolve_assembly(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> ApiResult<CostBreakdown> {
        validate_partition(partition)?;
        require_non_empty(assembly_code, "组成代码")?;
        Ok(self.resolver.resolve(partition, assembly_code).await?)
    }

    /// 复制进目录所需的字段（需要组成表头）
    pub async fn catalog_draft(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> ApiResult<CatalogDraft> {
        let breakdown = self.resolve_assembly(partition, assembly_code).await?;
        breakdown.catalog_draft().ok_or_else(|| {
            ApiError::NotFound(format!("组成 {} 在分区 {} 中没有表头", assembly_code.trim(), partition))
        })
    }

    // ==========================================
    // 人工调价
    // ==========================================

    /// 单点调价，返回是否有记录被更新
    pub async fn override_price(
        &self,
        partition: &PartitionKey,
        target: PriceOverride,
    ) -> ApiResult<bool> {
        validate_partition(partition)?;
        match &target {
            PriceOverride::ResourceUnitPrice { code, unit_price } => {
                require_non_empty(code, "资源代码")?;
                validate_price(*unit_price)?;
            }
            PriceOverride::AssemblyUnitCost { code, unit_cost } => {
                require_non_empty(code, "组成代码")?;
                validate_price(*unit_cost)?;
            }
            PriceOverride::BomLineSnapshotCost {
                assembly_code,
                line_code,
                unit_cost,
                ..
            } => {
                require_non_empty(assembly_code, "组成代码")?;
                require_non_empty(line_code, "明细代码")?;
                validate_price(*unit_cost)?;
            }
        }
        Ok(self.repo.override_price(partition, target).await?)
    }

    // ==========================================
    // 配置
    // ==========================================

    pub async fn get_fallback_mode_order(&self) -> ApiResult<Vec<CostingMode>> {
        self.config.get_fallback_mode_order().await.map_err(config_error)
    }

    /// 设置回退模式顺序
    pub fn set_fallback_mode_order(&self, order: &[CostingMode]) -> ApiResult<()> {
        if order.is_empty() {
            return Err(ApiError::InvalidInput("回退顺序不能为空".to_string()));
        }
        let value = order
            .iter()
            .map(|m| m.code())
            .collect::<Vec<_>>()
            .join(",");
        self.config
            .set_config_value(config_keys::FALLBACK_MODE_ORDER, &value)
            .map_err(config_error)?;
        info!(order = %value, "回退顺序已更新");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ReferenceApi {
        let conn = Connection::open_in_memory().unwrap();
        ReferenceApi::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_partition_key_validation() {
        assert!(ReferenceApi::partition_key("", "DF", "SE").is_err());
        assert!(ReferenceApi::partition_key("2025/08", " ", "SE").is_err());
        assert!(matches!(
            ReferenceApi::partition_key("2025/08", "DF", "XYZ"),
            Err(ApiError::InvalidInput(_))
        ));

        let key = ReferenceApi::partition_key("2025/08", "df", "ce").unwrap();
        assert_eq!(key.region, "DF");
        assert_eq!(key.mode, CostingMode::WithSocialCharges);
    }

    #[tokio::test]
    async fn test_override_rejects_negative_price() {
        let api = api();
        let key = ReferenceApi::partition_key("2025/08", "DF", "SE").unwrap();
        let result = api
            .override_price(
                &key,
                PriceOverride::ResourceUnitPrice {
                    code: "1".to_string(),
                    unit_price: -1.0,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fallback_order_roundtrip() {
        let api = api();
        api.set_fallback_mode_order(&[CostingMode::TaxExempt]).unwrap();
        assert_eq!(
            api.get_fallback_mode_order().await.unwrap(),
            vec![CostingMode::TaxExempt]
        );
        assert!(api.set_fallback_mode_order(&[]).is_err());
    }

    #[tokio::test]
    async fn test_catalog_draft_without_header_is_not_found() {
        let api = api();
        let key = ReferenceApi::partition_key("2025/08", "DF", "SE").unwrap();
        let result = api.catalog_draft(&key, "100").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
