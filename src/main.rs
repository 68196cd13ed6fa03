// ==========================================
// 月度轮值排班系统 - 命令行入口
// ==========================================
// 用法:
//   duty-roster [db_path] [year] [month] [seed]
//
// 缺省: db_path=duty_roster.db, year/month=当前年月, seed=当前时间戳
// ==========================================

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use duty_roster::db::{init_schema, open_sqlite_connection};
use duty_roster::domain::WeeklyTemplate;
use duty_roster::engine::RosterOrchestrator;
use duty_roster::storage::SqliteRosterStore;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    duty_roster::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", duty_roster::APP_NAME, duty_roster::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "duty_roster.db".to_string());

    let now = Utc::now();
    let year: i32 = match args.next() {
        Some(s) => s.parse().context("year 参数非法")?,
        None => now.year(),
    };
    let month: u32 = match args.next() {
        Some(s) => s.parse().context("month 参数非法")?,
        None => now.month(),
    };
    if !(1..=12).contains(&month) {
        anyhow::bail!("month 必须在 1..=12 之间: {}", month);
    }

    // 未显式给种子时取时钟,每次运行不同;给定种子可复现
    let seed: u64 = match args.next() {
        Some(s) => s.parse().context("seed 参数非法")?,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };

    tracing::info!(db_path = %db_path, year, month, seed, "运行参数");

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化 schema 失败")?;

    let store = Arc::new(SqliteRosterStore::from_connection(Arc::new(Mutex::new(conn))));
    let orchestrator = RosterOrchestrator::new(store, WeeklyTemplate::standard());

    let result = orchestrator
        .run_month(year, month, seed)
        .await
        .context("月度排班失败")?;

    tracing::info!(
        days = result.days.len(),
        unfilled = result.unfilled_slots,
        "排班完成"
    );
    Ok(())
}
