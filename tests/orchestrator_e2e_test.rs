// ==========================================
// 编排器端到端测试
// ==========================================
// 测试目标: SQLite 存储 + 编排器全流程
// 覆盖范围: 正常排班落库、前置校验中止路径（不留部分写入）
// ==========================================

mod test_helpers;

use chrono::Weekday;
use duty_roster::domain::types::{Gender, ParticipantType};
use duty_roster::domain::WeeklyTemplate;
use duty_roster::engine::{EngineError, RosterOrchestrator};
use duty_roster::storage::{prior_month, SqliteRosterStore};
use std::sync::{Arc, Mutex};
use test_helpers::{assert_schedule_invariants, core_template, create_test_db};

fn open_store(db_path: &str) -> Arc<SqliteRosterStore> {
    let conn = duty_roster::db::open_sqlite_connection(db_path).expect("数据库应可打开");
    Arc::new(SqliteRosterStore::from_connection(Arc::new(Mutex::new(conn))))
}

/// 造一份 8 人名册（两分部各 4 人,男女各半）
fn seed_roster(store: &SqliteRosterStore) -> Vec<String> {
    let mut ids = Vec::new();
    let spec = [
        ("小学甲", ParticipantType::Elementary, Gender::Male),
        ("小学乙", ParticipantType::Elementary, Gender::Male),
        ("小学丙", ParticipantType::Elementary, Gender::Female),
        ("小学丁", ParticipantType::Elementary, Gender::Female),
        ("中学甲", ParticipantType::Middle, Gender::Male),
        ("中学乙", ParticipantType::Middle, Gender::Male),
        ("中学丙", ParticipantType::Middle, Gender::Female),
        ("中学丁", ParticipantType::Middle, Gender::Female),
    ];
    for (name, ptype, gender) in spec {
        ids.push(
            store
                .participant_repo()
                .insert(name, ptype, Some(gender))
                .expect("插入应成功"),
        );
    }
    ids
}

// ==========================================
// 正常流程: 排班 + 双落库
// ==========================================

#[tokio::test]
async fn test_full_run_persists_schedule_and_snapshot() {
    let (_file, db_path) = create_test_db().expect("测试库应可建");
    let store = open_store(&db_path);
    let ids = seed_roster(&store);

    // 上月一条缺席记录
    let (py, pm) = prior_month(2026, 8);
    store
        .absence_repo()
        .insert(&ids[0], py, pm, 5)
        .expect("插入应成功");

    let orchestrator = RosterOrchestrator::new(store.clone(), WeeklyTemplate::standard());
    let result = orchestrator.run_month(2026, 8, 42).await.expect("排班应成功");

    // 落库的排班应与返回结果一致且满足不变量
    let saved_days = store
        .schedule_repo()
        .load_month(2026, 8)
        .expect("读取应成功");
    assert_eq!(saved_days.len(), result.days.len());
    let roster = store
        .participant_repo()
        .list_all()
        .expect("名册应可读");
    assert_schedule_invariants(&saved_days, &roster);

    // 快照已落库,且成为 2026-09 的历史输入
    let snapshot = store
        .category_count_repo()
        .load_month(2026, 8)
        .expect("读取应成功");
    assert!(!snapshot.is_empty());
    for counts in snapshot.values() {
        for count in counts.values() {
            assert!(*count > 0);
        }
    }
}

// ==========================================
// 中止路径: 空名册
// ==========================================

#[tokio::test]
async fn test_empty_roster_aborts_without_writes() {
    let (_file, db_path) = create_test_db().expect("测试库应可建");
    let store = open_store(&db_path);

    let orchestrator = RosterOrchestrator::new(store.clone(), WeeklyTemplate::standard());
    let err = orchestrator
        .run_month(2026, 8, 1)
        .await
        .expect_err("空名册应中止");
    assert!(matches!(err, EngineError::EmptyRoster));

    assert!(store
        .schedule_repo()
        .load_month(2026, 8)
        .expect("读取应成功")
        .is_empty());
    assert!(store
        .category_count_repo()
        .load_month(2026, 8)
        .expect("读取应成功")
        .is_empty());
}

// ==========================================
// 中止路径: 性别缺失
// ==========================================

#[tokio::test]
async fn test_missing_gender_aborts_without_writes() {
    let (_file, db_path) = create_test_db().expect("测试库应可建");
    let store = open_store(&db_path);
    seed_roster(&store);
    store
        .participant_repo()
        .insert("无性别成员", ParticipantType::Elementary, None)
        .expect("插入应成功");

    let orchestrator = RosterOrchestrator::new(
        store.clone(),
        core_template(&[Weekday::Mon], ParticipantType::Elementary),
    );
    let err = orchestrator
        .run_month(2026, 8, 1)
        .await
        .expect_err("性别缺失应中止");
    assert!(matches!(err, EngineError::MissingGender { .. }));

    assert!(store
        .schedule_repo()
        .load_month(2026, 8)
        .expect("读取应成功")
        .is_empty());
}
