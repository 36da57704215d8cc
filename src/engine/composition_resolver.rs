// ==========================================
// 参考成本引擎 - 组成成本解析器
// ==========================================
// 职责: 给定 (分区, 组成代码)，汇总 BOM 明细得出成本分解
// 输入: 分区键 + 组成代码
// 输出: CostBreakdown（表头 / 已定价明细 / 合计 / 是否回退）
// ==========================================
// 定价优先级（逐行）:
// 1. 非回退且快照单价非零 → 用快照单价；快照合价缺失或为零时 = 系数 × 快照单价
// 2. 否则现查当前请求分区: 组成单价 / 资源单价，均未找到按 0 计
// 合计只在最后保留两位小数
// ==========================================

use crate::config::composition_config_trait::CompositionConfigReader;
use crate::domain::breakdown::{round2, CostBreakdown, ReferenceLookup, ResolvedLine};
use crate::domain::partition::PartitionKey;
use crate::domain::reference::BomLineItem;
use crate::domain::types::{CostingMode, LineType, PriceSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reference_repo::ReferenceRepository;
use tracing::{debug, info, instrument};

// ==========================================
// CompositionResolver - 组成成本解析器
// ==========================================
pub struct CompositionResolver<R, C>
where
    R: ReferenceRepository,
    C: CompositionConfigReader,
{
    repo: R,
    config: C,
}

impl<R, C> CompositionResolver<R, C>
where
    R: ReferenceRepository,
    C: CompositionConfigReader,
{
    pub fn new(repo: R, config: C) -> Self {
        Self { repo, config }
    }

    /// 回退候选模式：配置顺序中剔除请求模式
    pub async fn fallback_modes(&self, requested: CostingMode) -> RepositoryResult<Vec<CostingMode>> {
        let order = self
            .config
            .get_fallback_mode_order()
            .await
            .map_err(|e| RepositoryError::InternalError(format!("读取回退顺序失败: {}", e)))?;
        Ok(order.into_iter().filter(|m| *m != requested).collect())
    }

    /// 计算组成成本分解
    ///
    /// # 返回
    /// - Ok(CostBreakdown): 任何分区都没有明细时返回空分解（不是错误）
    /// - Err: 存储不可用
    #[instrument(skip(self), fields(partition = %partition))]
    pub async fn resolve(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> RepositoryResult<CostBreakdown> {
        let code = assembly_code.trim();
        let header = self.repo.find_assembly(partition, code).await?;

        let mut lines = self.repo.list_bom_lines(partition, code).await?;
        let mut source_partition = partition.clone();
        let mut is_fallback = false;

        if lines.is_empty() {
            for mode in self.fallback_modes(partition.mode).await? {
                let candidate = partition.with_mode(mode);
                let found = self.repo.list_bom_lines(&candidate, code).await?;
                if !found.is_empty() {
                    info!(
                        requested = %partition.mode,
                        fallback = %mode,
                        lines = found.len(),
                        "请求模式无明细，使用回退模式"
                    );
                    lines = found;
                    source_partition = candidate;
                    is_fallback = true;
                    break;
                }
            }
        }

        if lines.is_empty() {
            debug!(assembly_code = code, "所有模式均无明细，返回空分解");
            return Ok(CostBreakdown::empty(partition.clone(), code, header));
        }

        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            resolved.push(self.price_line(partition, line, is_fallback).await?);
        }

        let total = round2(resolved.iter().map(|l| l.total).sum::<f64>());
        debug!(assembly_code = code, lines = resolved.len(), total = total, "成本解析完成");

        Ok(CostBreakdown {
            partition: partition.clone(),
            source_partition: Some(source_partition),
            assembly_code: code.to_string(),
            header,
            lines: resolved,
            total,
            is_fallback,
        })
    }

    /// 单行定价
    async fn price_line(
        &self,
        partition: &PartitionKey,
        line: BomLineItem,
        is_fallback: bool,
    ) -> RepositoryResult<ResolvedLine> {
        // 其他模式的快照对请求模式不可信
        let snapshot = line
            .snapshot_unit_cost
            .filter(|cost| !is_fallback && *cost != 0.0);

        if let Some(unit_price) = snapshot {
            // 报表合价栏为 "-" 时解析为 0，与缺失同样处理
            let total = line
                .snapshot_total_cost
                .filter(|total| *total != 0.0)
                .unwrap_or(line.coefficient * unit_price);
            return Ok(ResolvedLine {
                line,
                unit_price,
                total,
                price_source: PriceSource::Snapshot,
            });
        }

        let lookup = self.lookup(partition, line.line_type, &line.line_code).await?;
        let unit_price = lookup.price();
        Ok(ResolvedLine {
            total: line.coefficient * unit_price,
            unit_price,
            price_source: lookup.source(),
            line,
        })
    }

    /// 按代码现查单价
    ///
    /// 记录的类型决定先查哪个库，另一个库作为兜底；类型未知时先查组成
    pub async fn lookup(
        &self,
        partition: &PartitionKey,
        line_type: LineType,
        code: &str,
    ) -> RepositoryResult<ReferenceLookup> {
        let stores = match line_type {
            LineType::Resource => [LineType::Resource, LineType::Assembly],
            LineType::Assembly | LineType::Unknown => [LineType::Assembly, LineType::Resource],
        };

        for store in stores {
            if store == LineType::Assembly {
                if let Some(assembly) = self.repo.find_assembly(partition, code).await? {
                    return Ok(ReferenceLookup::Assembly(assembly.unit_cost));
                }
            } else if let Some(resource) = self.repo.find_resource(partition, code).await? {
                return Ok(ReferenceLookup::Resource(resource.unit_price));
            }
        }

        debug!(line_type = %line_type, code = code, "引用记录不存在，单价按 0 计");
        Ok(ReferenceLookup::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::domain::reference::{Assembly, ReferenceBatch, Resource};
    use crate::repository::ReferenceRepositoryImpl;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn resolver() -> CompositionResolver<ReferenceRepositoryImpl, ConfigManager> {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = ReferenceRepositoryImpl::from_connection(conn.clone()).unwrap();
        let config = ConfigManager::from_connection(conn).unwrap();
        CompositionResolver::new(repo, config)
    }

    fn key(mode: CostingMode) -> PartitionKey {
        PartitionKey::new("2025/08", "DF", mode)
    }

    #[tokio::test]
    async fn test_lookup_prefers_recorded_type() {
        let r = resolver();
        let p = key(CostingMode::WithSocialCharges);
        r.repo
            .replace_partition(&p, ReferenceBatch::Resources(vec![Resource::new(&p, "7", "R", "KG", 2.0)]))
            .await
            .unwrap();
        r.repo
            .replace_partition(&p, ReferenceBatch::Assemblies(vec![Assembly::new(&p, "7", "A", "M2", 9.0)]))
            .await
            .unwrap();

        assert_eq!(
            r.lookup(&p, LineType::Resource, "7").await.unwrap(),
            ReferenceLookup::Resource(2.0)
        );
        assert_eq!(
            r.lookup(&p, LineType::Assembly, "7").await.unwrap(),
            ReferenceLookup::Assembly(9.0)
        );
        assert_eq!(
            r.lookup(&p, LineType::Unknown, "7").await.unwrap(),
            ReferenceLookup::Assembly(9.0)
        );
        assert_eq!(
            r.lookup(&p, LineType::Resource, "8").await.unwrap(),
            ReferenceLookup::Missing
        );
    }

    #[tokio::test]
    async fn test_lookup_falls_through_to_other_store() {
        let r = resolver();
        let p = key(CostingMode::WithSocialCharges);
        r.repo
            .replace_partition(&p, ReferenceBatch::Resources(vec![Resource::new(&p, "5", "R", "KG", 3.5)]))
            .await
            .unwrap();

        assert_eq!(
            r.lookup(&p, LineType::Assembly, "5").await.unwrap(),
            ReferenceLookup::Resource(3.5)
        );
    }

    #[tokio::test]
    async fn test_fallback_modes_exclude_requested() {
        let r = resolver();
        assert_eq!(
            r.fallback_modes(CostingMode::WithoutSocialCharges).await.unwrap(),
            vec![CostingMode::WithSocialCharges, CostingMode::TaxExempt]
        );
        assert_eq!(
            r.fallback_modes(CostingMode::TaxExempt).await.unwrap(),
            vec![CostingMode::WithoutSocialCharges, CostingMode::WithSocialCharges]
        );
    }

    #[tokio::test]
    async fn test_snapshot_total_used_when_present() {
        let r = resolver();
        let p = key(CostingMode::WithSocialCharges);
        let line = BomLineItem::new(&p, "100", LineType::Resource, "1", 2.0).with_snapshot(Some(3.0), Some(5.99));
        r.repo
            .replace_partition(&p, ReferenceBatch::BomLines(vec![line]))
            .await
            .unwrap();

        let breakdown = r.resolve(&p, "100").await.unwrap();
        assert_eq!(breakdown.lines[0].unit_price, 3.0);
        assert_eq!(breakdown.lines[0].total, 5.99);
        assert_eq!(breakdown.total, 5.99);
        assert!(!breakdown.is_fallback);
    }

    #[tokio::test]
    async fn test_zero_snapshot_total_is_rederived() {
        let r = resolver();
        let p = key(CostingMode::WithSocialCharges);
        let line = BomLineItem::new(&p, "100", LineType::Resource, "34", 2.5).with_snapshot(Some(0.8), Some(0.0));
        r.repo
            .replace_partition(&p, ReferenceBatch::BomLines(vec![line]))
            .await
            .unwrap();

        let breakdown = r.resolve(&p, "100").await.unwrap();
        assert_eq!(breakdown.lines[0].price_source, PriceSource::Snapshot);
        assert_eq!(breakdown.lines[0].total, 2.5 * 0.8);
        assert_eq!(breakdown.total, 2.0);
    }
}
