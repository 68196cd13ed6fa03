// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、内存存储、测试数据生成
// ==========================================
// 各测试二进制按需使用,未用到的辅助函数不报警
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use duty_roster::domain::types::{CategoryKey, Gender, ParticipantType, SelectionMode};
use duty_roster::domain::{
    CategoryCountRecord, DaySchedule, Participant, SlotTemplate, WeeklyTemplate,
};
use duty_roster::repository::RepositoryResult;
use duty_roster::storage::RosterStore;
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("非法临时路径")?.to_string();

    let conn = Connection::open(&db_path)?;
    duty_roster::db::configure_sqlite_connection(&conn)?;
    duty_roster::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试用参与者（id 显式指定,保证断言可读）
pub fn participant(
    id: &str,
    name: &str,
    participant_type: ParticipantType,
    gender: Option<Gender>,
) -> Participant {
    let now = Utc::now();
    Participant {
        id: id.to_string(),
        name: name.to_string(),
        participant_type,
        gender,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

/// 周模板: 指定星期几各一个核心时段
pub fn core_template(
    weekdays: &[chrono::Weekday],
    participant_type: ParticipantType,
) -> WeeklyTemplate {
    let category = match participant_type {
        ParticipantType::Elementary => CategoryKey::elementary_core(),
        ParticipantType::Middle => CategoryKey::middle_core(),
    };
    WeeklyTemplate::new(
        weekdays
            .iter()
            .map(|&weekday| SlotTemplate {
                weekday,
                time: "06:00".to_string(),
                participant_type,
                selection_mode: SelectionMode::Sequential,
                category_key: Some(category.clone()),
            })
            .collect(),
    )
}

/// 在模板上追加一个非核心时段
pub fn with_extra_slot(
    mut template: WeeklyTemplate,
    weekday: chrono::Weekday,
    participant_type: ParticipantType,
    selection_mode: SelectionMode,
) -> WeeklyTemplate {
    template.slots.push(SlotTemplate {
        weekday,
        time: "20:00".to_string(),
        participant_type,
        selection_mode,
        category_key: None,
    });
    template
}

// ==========================================
// MemoryRosterStore - 内存存储协作方
// ==========================================

/// 测试用内存存储,记录落库调用以便断言
#[derive(Default)]
pub struct MemoryRosterStore {
    pub participants: Vec<Participant>,
    /// (year, month) → participant_id → (category_key → count)
    pub prior_counts: HashMap<(i32, u32), HashMap<String, HashMap<String, u32>>>,
    /// (year, month) → 缺席参与者 id
    pub absentees: HashMap<(i32, u32), Vec<String>>,
    pub saved_schedule: Mutex<Option<(i32, u32, Vec<DaySchedule>)>>,
    pub saved_counts: Mutex<Option<(i32, u32, Vec<CategoryCountRecord>)>>,
}

impl MemoryRosterStore {
    pub fn with_participants(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            ..Default::default()
        }
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn list_participants(&self) -> RepositoryResult<Vec<Participant>> {
        Ok(self.participants.clone())
    }

    async fn category_counts(
        &self,
        year: i32,
        month: u32,
    ) -> RepositoryResult<HashMap<String, HashMap<String, u32>>> {
        Ok(self
            .prior_counts
            .get(&(year, month))
            .cloned()
            .unwrap_or_default())
    }

    async fn absentees(&self, year: i32, month: u32) -> RepositoryResult<Vec<String>> {
        Ok(self.absentees.get(&(year, month)).cloned().unwrap_or_default())
    }

    async fn save_schedule(
        &self,
        year: i32,
        month: u32,
        days: &[DaySchedule],
    ) -> RepositoryResult<()> {
        *self.saved_schedule.lock().unwrap() = Some((year, month, days.to_vec()));
        Ok(())
    }

    async fn save_category_counts(
        &self,
        year: i32,
        month: u32,
        records: &[CategoryCountRecord],
    ) -> RepositoryResult<()> {
        *self.saved_counts.lock().unwrap() = Some((year, month, records.to_vec()));
        Ok(())
    }
}

// ==========================================
// 不变量断言
// ==========================================

/// 对排班结果断言核心不变量:
/// - 每时段 0 或 2 人
/// - 两人同性别且分部与时段一致
/// - 同一人同一天至多一个时段
/// - 每人当月总数 ≤ 3
pub fn assert_schedule_invariants(days: &[DaySchedule], roster: &[Participant]) {
    let by_id: HashMap<&str, &Participant> =
        roster.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut totals: HashMap<String, u32> = HashMap::new();

    for day in days {
        let mut seen_today: Vec<&str> = Vec::new();
        for slot in &day.slots {
            assert!(
                slot.assigned.is_empty() || slot.assigned.len() == 2,
                "{} 时段人数非法: {:?}",
                day.date,
                slot.assigned
            );
            if slot.assigned.len() == 2 {
                let a = by_id
                    .get(slot.assigned[0].as_str())
                    .unwrap_or_else(|| panic!("未知参与者 {}", slot.assigned[0]));
                let b = by_id
                    .get(slot.assigned[1].as_str())
                    .unwrap_or_else(|| panic!("未知参与者 {}", slot.assigned[1]));
                assert_eq!(a.gender, b.gender, "{} 时段性别混排", day.date);
                assert_eq!(a.participant_type, slot.participant_type);
                assert_eq!(b.participant_type, slot.participant_type);

                for id in &slot.assigned {
                    assert!(
                        !seen_today.contains(&id.as_str()),
                        "{} 同日重复分配: {}",
                        day.date,
                        id
                    );
                    seen_today.push(id.as_str());
                    *totals.entry(id.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    for (id, total) in totals {
        assert!(total <= 3, "参与者 {} 超过月上限: {}", id, total);
    }
}
