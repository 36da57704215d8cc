// ==========================================
// 参考成本引擎 - 参考单价库 Repository Trait
// ==========================================
// 职责: 定义按分区读写参考单价的接口（不包含业务逻辑）
// 红线: Repository 不含计价规则，只做数据存取
// ==========================================

use crate::domain::import_batch::ImportBatch;
use crate::domain::partition::{PartitionKey, PartitionSummary};
use crate::domain::reference::{
    Assembly, BomLineItem, PriceOverride, ReferenceBatch, ReferenceRecord, Resource,
};
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ReferenceRepository Trait
// ==========================================
// 用途: 参考单价库的数据访问
// 实现者: ReferenceRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    // ===== 批量写入（事务化）=====

    /// 整体替换一个分区
    ///
    /// 先删除该类别在分区内的全部记录，再写入新记录；两步在同一事务中完成
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    /// - Err: 数据库错误（整个事务回滚，旧数据保持不变）
    async fn replace_partition(
        &self,
        partition: &PartitionKey,
        batch: ReferenceBatch,
    ) -> RepositoryResult<usize>;

    /// 清空一个分区，返回删除的记录数
    async fn clear_partition(
        &self,
        kind: EntityKind,
        partition: &PartitionKey,
    ) -> RepositoryResult<usize>;

    // ===== 查询 =====

    /// 按代码查资源（不存在返回 None）
    async fn find_resource(
        &self,
        partition: &PartitionKey,
        code: &str,
    ) -> RepositoryResult<Option<Resource>>;

    /// 按代码查组成（不存在返回 None）
    async fn find_assembly(
        &self,
        partition: &PartitionKey,
        code: &str,
    ) -> RepositoryResult<Option<Assembly>>;

    /// 某组成在分区内的全部明细（按导入顺序）
    async fn list_bom_lines(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> RepositoryResult<Vec<BomLineItem>>;

    /// 分区内某类别的记录数
    async fn count(&self, kind: EntityKind, partition: &PartitionKey) -> RepositoryResult<usize>;

    /// 已加载的分区及记录数
    async fn list_partitions(&self, kind: EntityKind) -> RepositoryResult<Vec<PartitionSummary>>;

    /// 分区内检索
    ///
    /// # 规则
    /// - 单个检索词: 代码包含该词即命中
    /// - 所有检索词都出现在规范化描述中也命中
    /// - 空检索词: 返回分区内前 limit 条
    async fn search(
        &self,
        kind: EntityKind,
        partition: &PartitionKey,
        query: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ReferenceRecord>>;

    // ===== 人工调价 =====

    /// 单点调价，返回是否有记录被更新
    async fn override_price(
        &self,
        partition: &PartitionKey,
        target: PriceOverride,
    ) -> RepositoryResult<bool>;

    // ===== 导入批次 =====

    /// 记录一次导入
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 最近的导入批次（按导入时间倒序）
    async fn list_import_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
