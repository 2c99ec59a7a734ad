// ==========================================
// 车队维修返工分析系统 - SQLite 连接与建表
// ==========================================
// 目标:
// - 所有 Connection::open 统一 PRAGMA（foreign_keys / busy_timeout）
// - 建表脚本集中维护, 测试与命令行共用
// ==========================================

use crate::perf::{install_sqlite_tracing, SqlPerfSettings};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS work_order (
    order_id            TEXT PRIMARY KEY,
    vehicle_id          TEXT NOT NULL,
    service_description TEXT NOT NULL,
    model_description   TEXT,
    workshop            TEXT,
    section             TEXT,
    mechanic_id         TEXT,
    start_time          TEXT,
    close_time          TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_order_close_time ON work_order(close_time);
CREATE INDEX IF NOT EXISTS idx_work_order_vehicle_service
    ON work_order(vehicle_id, service_description);

CREATE TABLE IF NOT EXISTS part_usage (
    usage_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id   TEXT NOT NULL,
    equipment  TEXT NOT NULL,
    part       TEXT NOT NULL,
    quantity   REAL NOT NULL DEFAULT 0,
    value      REAL NOT NULL DEFAULT 0,
    usage_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_part_usage_order ON part_usage(order_id);
CREATE INDEX IF NOT EXISTS idx_part_usage_date ON part_usage(usage_date);

CREATE TABLE IF NOT EXISTS config_kv (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS schema_version (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 备件记录自然键: 同一工单同一天同一备件只保留一行, 重复导入时覆盖
const PART_USAGE_KEY_SQL: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS uq_part_usage_entry
    ON part_usage(order_id, equipment, part, usage_date);
"#;

const DEDUP_PART_USAGE_SQL: &str = r#"
DELETE FROM part_usage
WHERE usage_id NOT IN (
    SELECT MAX(usage_id) FROM part_usage
    GROUP BY order_id, equipment, part, usage_date
)
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys / busy_timeout 需要每个连接单独设置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置 + SQL 性能统计
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    install_sqlite_tracing(&mut conn, SqlPerfSettings::from_env());
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    let found = read_schema_version(conn)?;
    conn.execute_batch(SCHEMA_SQL)?;
    if matches!(found, Some(v) if v < 2) {
        // v1 的备件表允许重复导入同一台账
        let removed = conn.execute(DEDUP_PART_USAGE_SQL, [])?;
        tracing::info!(removed, "schema v2: 已合并重复的备件记录");
    }
    conn.execute_batch(PART_USAGE_KEY_SQL)?;
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

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 打开数据库并确保表结构存在; 版本不一致时仅告警
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;

    match read_schema_version(&conn)? {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        other => tracing::warn!(
            db_path,
            found = ?other,
            expected = CURRENT_SCHEMA_VERSION,
            "schema_version 与当前代码不一致"
        ),
    }
    Ok(conn)
}
