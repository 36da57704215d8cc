// ==========================================
// 参考成本引擎 - SQLite 连接与建表
// ==========================================
// 目标:
// - 所有 Connection::open 统一 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等，新库与旧库都可以直接调用 ensure_schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys / busy_timeout 都需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS ref_resource (
    id TEXT PRIMARY KEY,
    period TEXT NOT NULL,
    region TEXT NOT NULL,
    mode TEXT NOT NULL,
    classification TEXT,
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    description_norm TEXT NOT NULL,
    unit TEXT NOT NULL,
    price_source TEXT,
    unit_price REAL NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_ref_resource_key
    ON ref_resource (period, region, mode, code);

CREATE TABLE IF NOT EXISTS ref_assembly (
    id TEXT PRIMARY KEY,
    period TEXT NOT NULL,
    region TEXT NOT NULL,
    mode TEXT NOT NULL,
    group_name TEXT,
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    description_norm TEXT NOT NULL,
    unit TEXT NOT NULL,
    unit_cost REAL NOT NULL DEFAULT 0,
    overhead_percent REAL
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_ref_assembly_key
    ON ref_assembly (period, region, mode, code);

CREATE TABLE IF NOT EXISTS ref_bom_line (
    id TEXT PRIMARY KEY,
    period TEXT NOT NULL,
    region TEXT NOT NULL,
    mode TEXT NOT NULL,
    assembly_code TEXT NOT NULL,
    group_name TEXT NOT NULL DEFAULT '',
    line_type TEXT NOT NULL,
    line_code TEXT NOT NULL,
    line_description TEXT NOT NULL,
    description_norm TEXT NOT NULL,
    line_unit TEXT NOT NULL,
    coefficient REAL NOT NULL DEFAULT 0,
    snapshot_unit_cost REAL,
    snapshot_total_cost REAL,
    status TEXT
);
CREATE INDEX IF NOT EXISTS ix_ref_bom_line_assembly
    ON ref_bom_line (period, region, mode, assembly_code);

CREATE TABLE IF NOT EXISTS ref_import_batch (
    batch_id TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    period TEXT NOT NULL,
    region TEXT NOT NULL,
    mode TEXT NOT NULL,
    file_name TEXT NOT NULL,
    sheet_name TEXT NOT NULL,
    scanned_rows INTEGER NOT NULL,
    accepted_rows INTEGER NOT NULL,
    skipped_rows INTEGER NOT NULL,
    column_map_json TEXT NOT NULL,
    elapsed_ms INTEGER NOT NULL,
    imported_at TEXT NOT NULL
);
"#;

/// 幂等建表，并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
