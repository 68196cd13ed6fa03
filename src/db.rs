// ==========================================
// 月度轮值排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免部分模块外键开启/部分不开启
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表入口，保证测试库与生产库结构一致
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
/// 说明：
/// - foreign_keys 需要每个连接单独开启
/// - busy_timeout 需要每个连接单独配置
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

/// 初始化数据库表结构（幂等）
///
/// # 表
/// - participant: 参与者名册
/// - schedule_day / slot_assignment: 月度排班结果
/// - category_count: 每月各类别轮值次数快照（下月排班的历史输入）
/// - absence_log: 缺席记录
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS participant (
            participant_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            participant_type TEXT NOT NULL,
            gender TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS schedule_day (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            weekday TEXT NOT NULL,
            PRIMARY KEY (year, month, day)
        );

        CREATE TABLE IF NOT EXISTS slot_assignment (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            slot_index INTEGER NOT NULL,
            time TEXT NOT NULL,
            participant_type TEXT NOT NULL,
            category_key TEXT,
            assigned_ids TEXT NOT NULL,
            fixed_for TEXT NOT NULL,
            PRIMARY KEY (year, month, day, slot_index)
        );

        CREATE TABLE IF NOT EXISTS category_count (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            participant_id TEXT NOT NULL,
            category_key TEXT NOT NULL,
            count INTEGER NOT NULL,
            PRIMARY KEY (year, month, participant_id, category_key)
        );

        CREATE TABLE IF NOT EXISTS absence_log (
            participant_id TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            PRIMARY KEY (participant_id, year, month, day)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
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
