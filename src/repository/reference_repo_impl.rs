// ==========================================
// 参考成本引擎 - 参考单价库 Repository 实现
// ==========================================
// 职责: 使用 rusqlite 实现 ReferenceRepository
// 存储: ref_resource / ref_assembly / ref_bom_line / ref_import_batch
// 红线: Repository 不含计价规则，只做数据存取
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::import_batch::ImportBatch;
use crate::domain::partition::{PartitionKey, PartitionSummary};
use crate::domain::reference::{
    Assembly, BomLineItem, PriceOverride, ReferenceBatch, ReferenceRecord, Resource,
};
use crate::domain::types::{CostingMode, EntityKind, LineType};
use crate::importer::text_normalizer::{normalize_text, query_terms};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reference_repo::ReferenceRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const RESOURCE_COLUMNS: &str =
    "id, period, region, mode, classification, code, description, unit, price_source, unit_price";

const ASSEMBLY_COLUMNS: &str =
    "id, period, region, mode, group_name, code, description, unit, unit_cost, overhead_percent";

const BOM_LINE_COLUMNS: &str = "id, period, region, mode, assembly_code, group_name, line_type, \
     line_code, line_description, line_unit, coefficient, snapshot_unit_cost, \
     snapshot_total_cost, status";

const IMPORT_BATCH_COLUMNS: &str = "batch_id, entity_kind, period, region, mode, file_name, \
     sheet_name, scanned_rows, accepted_rows, skipped_rows, column_map_json, elapsed_ms, imported_at";

const PARTITION_FILTER: &str = "period = ?1 AND region = ?2 AND mode = ?3";

// ==========================================
// 行映射
// ==========================================
fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// 前四列固定为 id, period, region, mode，分区从第 1~3 列读取
fn partition_from_row(row: &Row) -> rusqlite::Result<PartitionKey> {
    let mode: CostingMode = parse_column(3, &row.get::<_, String>(3)?)?;
    Ok(PartitionKey::new(
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        mode,
    ))
}

fn row_to_resource(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        partition: partition_from_row(row)?,
        classification: row.get(4)?,
        code: row.get(5)?,
        description: row.get(6)?,
        unit: row.get(7)?,
        price_source: row.get(8)?,
        unit_price: row.get(9)?,
    })
}

fn row_to_assembly(row: &Row) -> rusqlite::Result<Assembly> {
    Ok(Assembly {
        id: row.get(0)?,
        partition: partition_from_row(row)?,
        group: row.get(4)?,
        code: row.get(5)?,
        description: row.get(6)?,
        unit: row.get(7)?,
        unit_cost: row.get(8)?,
        overhead_percent: row.get(9)?,
    })
}

fn row_to_bom_line(row: &Row) -> rusqlite::Result<BomLineItem> {
    Ok(BomLineItem {
        id: row.get(0)?,
        partition: partition_from_row(row)?,
        assembly_code: row.get(4)?,
        group: row.get(5)?,
        line_type: LineType::from_db_str(&row.get::<_, String>(6)?),
        line_code: row.get(7)?,
        line_description: row.get(8)?,
        line_unit: row.get(9)?,
        coefficient: row.get(10)?,
        snapshot_unit_cost: row.get(11)?,
        snapshot_total_cost: row.get(12)?,
        status: row.get(13)?,
    })
}

fn row_to_import_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    let kind: EntityKind = parse_column(1, &row.get::<_, String>(1)?)?;
    let mode: CostingMode = parse_column(4, &row.get::<_, String>(4)?)?;
    let imported_at_raw: String = row.get(12)?;
    let imported_at = DateTime::parse_from_rfc3339(&imported_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(ImportBatch {
        batch_id: row.get(0)?,
        kind,
        partition: PartitionKey::new(row.get::<_, String>(2)?, row.get::<_, String>(3)?, mode),
        file_name: row.get(5)?,
        sheet_name: row.get(6)?,
        scanned_rows: row.get::<_, i64>(7)? as usize,
        accepted_rows: row.get::<_, i64>(8)? as usize,
        skipped_rows: row.get::<_, i64>(9)? as usize,
        column_map_json: row.get(10)?,
        elapsed_ms: row.get(11)?,
        imported_at,
    })
}

fn to_record(kind: EntityKind, row: &Row) -> rusqlite::Result<ReferenceRecord> {
    match kind {
        EntityKind::Resource => row_to_resource(row).map(ReferenceRecord::Resource),
        EntityKind::Assembly => row_to_assembly(row).map(ReferenceRecord::Assembly),
        EntityKind::BomLine => row_to_bom_line(row).map(ReferenceRecord::BomLine),
    }
}

fn columns_of(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Resource => RESOURCE_COLUMNS,
        EntityKind::Assembly => ASSEMBLY_COLUMNS,
        EntityKind::BomLine => BOM_LINE_COLUMNS,
    }
}

// ==========================================
// ReferenceRepositoryImpl
// ==========================================
pub struct ReferenceRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 对传入连接再次应用统一 PRAGMA 并建表（均幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn check_partition(partition: &PartitionKey, record_partition: &PartitionKey, id: &str) -> RepositoryResult<()> {
        if record_partition != partition {
            return Err(RepositoryError::ValidationError(format!(
                "记录 {} 属于分区 {}，与目标分区 {} 不一致",
                id, record_partition, partition
            )));
        }
        Ok(())
    }

    /// 同批重复 ID 后出现的覆盖先出现的
    fn note_id(seen: &mut HashSet<String>, kind: EntityKind, id: &str) {
        if !seen.insert(id.to_string()) {
            warn!(kind = %kind, id = id, "同批记录 ID 重复，保留最后一条");
        }
    }

    fn insert_resources_tx(
        tx: &Transaction,
        partition: &PartitionKey,
        records: &[Resource],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT OR REPLACE INTO ref_resource (
                id, period, region, mode, classification, code,
                description, description_norm, unit, price_source, unit_price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;
        let mut seen = HashSet::with_capacity(records.len());

        for r in records {
            Self::check_partition(partition, &r.partition, &r.id)?;
            Self::note_id(&mut seen, EntityKind::Resource, &r.id);
            stmt.execute(params![
                r.id,
                partition.period,
                partition.region,
                partition.mode.code(),
                r.classification,
                r.code,
                r.description,
                normalize_text(&r.description),
                r.unit,
                r.price_source,
                r.unit_price,
            ])?;
        }
        Ok(seen.len())
    }

    fn insert_assemblies_tx(
        tx: &Transaction,
        partition: &PartitionKey,
        records: &[Assembly],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT OR REPLACE INTO ref_assembly (
                id, period, region, mode, group_name, code,
                description, description_norm, unit, unit_cost, overhead_percent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;
        let mut seen = HashSet::with_capacity(records.len());

        for a in records {
            Self::check_partition(partition, &a.partition, &a.id)?;
            Self::note_id(&mut seen, EntityKind::Assembly, &a.id);
            stmt.execute(params![
                a.id,
                partition.period,
                partition.region,
                partition.mode.code(),
                a.group,
                a.code,
                a.description,
                normalize_text(&a.description),
                a.unit,
                a.unit_cost,
                a.overhead_percent,
            ])?;
        }
        Ok(seen.len())
    }

    fn insert_bom_lines_tx(
        tx: &Transaction,
        partition: &PartitionKey,
        records: &[BomLineItem],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT OR REPLACE INTO ref_bom_line (
                id, period, region, mode, assembly_code, group_name, line_type,
                line_code, line_description, description_norm, line_unit,
                coefficient, snapshot_unit_cost, snapshot_total_cost, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )?;
        let mut seen = HashSet::with_capacity(records.len());

        for l in records {
            Self::check_partition(partition, &l.partition, &l.id)?;
            Self::note_id(&mut seen, EntityKind::BomLine, &l.id);
            stmt.execute(params![
                l.id,
                partition.period,
                partition.region,
                partition.mode.code(),
                l.assembly_code,
                l.group,
                l.line_type.to_db_str(),
                l.line_code,
                l.line_description,
                normalize_text(&l.line_description),
                l.line_unit,
                l.coefficient,
                l.snapshot_unit_cost,
                l.snapshot_total_cost,
                l.status,
            ])?;
        }
        Ok(seen.len())
    }

    fn delete_partition_tx(
        tx: &Transaction,
        kind: EntityKind,
        partition: &PartitionKey,
    ) -> RepositoryResult<usize> {
        let sql = format!("DELETE FROM {} WHERE {}", kind.table_name(), PARTITION_FILTER);
        let removed = tx.execute(
            &sql,
            params![partition.period, partition.region, partition.mode.code()],
        )?;
        Ok(removed)
    }

    /// 构造检索条件（?1~?3 为分区，检索词从 ?4 开始）
    fn search_clause(kind: EntityKind, terms: &[String]) -> String {
        let description_terms: Vec<String> = (0..terms.len())
            .map(|i| format!("instr(description_norm, ?{}) > 0", i + 4))
            .collect();

        match terms.len() {
            0 => String::new(),
            1 => format!(
                " AND (instr(lower({}), ?4) > 0 OR {})",
                kind.code_column(),
                description_terms[0]
            ),
            _ => format!(" AND {}", description_terms.join(" AND ")),
        }
    }
}

#[async_trait]
impl ReferenceRepository for ReferenceRepositoryImpl {
    async fn replace_partition(
        &self,
        partition: &PartitionKey,
        batch: ReferenceBatch,
    ) -> RepositoryResult<usize> {
        let kind = batch.kind();
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let removed = Self::delete_partition_tx(&tx, kind, partition)?;
        let inserted = match &batch {
            ReferenceBatch::Resources(records) => Self::insert_resources_tx(&tx, partition, records)?,
            ReferenceBatch::Assemblies(records) => Self::insert_assemblies_tx(&tx, partition, records)?,
            ReferenceBatch::BomLines(records) => Self::insert_bom_lines_tx(&tx, partition, records)?,
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            kind = %kind,
            partition = %partition,
            removed = removed,
            inserted = inserted,
            "分区替换完成"
        );
        Ok(inserted)
    }

    async fn clear_partition(
        &self,
        kind: EntityKind,
        partition: &PartitionKey,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let removed = Self::delete_partition_tx(&tx, kind, partition)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(kind = %kind, partition = %partition, removed = removed, "分区已清空");
        Ok(removed)
    }

    async fn find_resource(
        &self,
        partition: &PartitionKey,
        code: &str,
    ) -> RepositoryResult<Option<Resource>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ref_resource WHERE id = ?1", RESOURCE_COLUMNS);
        let resource = conn
            .query_row(&sql, params![partition.resource_id(code)], row_to_resource)
            .optional()?;
        Ok(resource)
    }

    async fn find_assembly(
        &self,
        partition: &PartitionKey,
        code: &str,
    ) -> RepositoryResult<Option<Assembly>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ref_assembly WHERE id = ?1", ASSEMBLY_COLUMNS);
        let assembly = conn
            .query_row(&sql, params![partition.assembly_id(code)], row_to_assembly)
            .optional()?;
        Ok(assembly)
    }

    async fn list_bom_lines(
        &self,
        partition: &PartitionKey,
        assembly_code: &str,
    ) -> RepositoryResult<Vec<BomLineItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ref_bom_line WHERE {} AND assembly_code = ?4 ORDER BY rowid",
            BOM_LINE_COLUMNS, PARTITION_FILTER
        );
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(
                params![
                    partition.period,
                    partition.region,
                    partition.mode.code(),
                    assembly_code.trim()
                ],
                row_to_bom_line,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    async fn count(&self, kind: EntityKind, partition: &PartitionKey) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", kind.table_name(), PARTITION_FILTER);
        let count: i64 = conn.query_row(
            &sql,
            params![partition.period, partition.region, partition.mode.code()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn list_partitions(&self, kind: EntityKind) -> RepositoryResult<Vec<PartitionSummary>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT period, region, mode, COUNT(*) FROM {} \
             GROUP BY period, region, mode ORDER BY period DESC, region, mode",
            kind.table_name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let summaries = stmt
            .query_map([], |row| {
                let mode: CostingMode = parse_column(2, &row.get::<_, String>(2)?)?;
                Ok(PartitionSummary {
                    partition: PartitionKey::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        mode,
                    ),
                    record_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    async fn search(
        &self,
        kind: EntityKind,
        partition: &PartitionKey,
        query: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ReferenceRecord>> {
        let terms = query_terms(query);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}{} ORDER BY rowid LIMIT {}",
            columns_of(kind),
            kind.table_name(),
            PARTITION_FILTER,
            Self::search_clause(kind, &terms),
            limit
        );

        let mut values = vec![
            partition.period.clone(),
            partition.region.clone(),
            partition.mode.code().to_string(),
        ];
        values.extend(terms.iter().cloned());

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values.iter()), |row| to_record(kind, row))?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            kind = %kind,
            partition = %partition,
            terms = terms.len(),
            hits = records.len(),
            "检索完成"
        );
        Ok(records)
    }

    async fn override_price(
        &self,
        partition: &PartitionKey,
        target: PriceOverride,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = match &target {
            PriceOverride::ResourceUnitPrice { code, unit_price } => conn.execute(
                "UPDATE ref_resource SET unit_price = ?1 WHERE id = ?2",
                params![unit_price, partition.resource_id(code)],
            )?,
            PriceOverride::AssemblyUnitCost { code, unit_cost } => conn.execute(
                "UPDATE ref_assembly SET unit_cost = ?1 WHERE id = ?2",
                params![unit_cost, partition.assembly_id(code)],
            )?,
            PriceOverride::BomLineSnapshotCost {
                assembly_code,
                line_type,
                line_code,
                unit_cost,
            } => conn.execute(
                "UPDATE ref_bom_line \
                 SET snapshot_unit_cost = ?1, snapshot_total_cost = coefficient * ?1 \
                 WHERE id = ?2",
                params![
                    unit_cost,
                    partition.bom_line_id(assembly_code, *line_type, line_code)
                ],
            )?,
        };

        info!(partition = %partition, target = ?target, affected = affected, "人工调价");
        Ok(affected > 0)
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!(
            "INSERT INTO ref_import_batch ({}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            IMPORT_BATCH_COLUMNS
        );
        conn.execute(
            &sql,
            params![
                batch.batch_id,
                batch.kind.to_string(),
                batch.partition.period,
                batch.partition.region,
                batch.partition.mode.code(),
                batch.file_name,
                batch.sheet_name,
                batch.scanned_rows as i64,
                batch.accepted_rows as i64,
                batch.skipped_rows as i64,
                batch.column_map_json,
                batch.elapsed_ms,
                batch.imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn list_import_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ref_import_batch ORDER BY rowid DESC LIMIT ?1",
            IMPORT_BATCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let batches = stmt
            .query_map(params![limit as i64], row_to_import_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}
