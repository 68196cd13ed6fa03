// ==========================================
// 月度轮值排班系统 - 月度排班仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 落库语义: 以 (year, month) 为单位整月替换,不做逐行 upsert
// ==========================================

use crate::domain::schedule::{DaySchedule, SlotAssignment};
use crate::domain::types::{CategoryKey, ParticipantType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ScheduleRepository - 月度排班仓储
// ==========================================

/// 月度排班仓储
/// 职责: 管理 schedule_day / slot_assignment 表
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整月保存排班结果（事务内先删后插）
    pub fn save_month(
        &self,
        year: i32,
        month: u32,
        days: &[DaySchedule],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM schedule_day WHERE year = ?1 AND month = ?2",
            params![year, month],
        )?;
        tx.execute(
            "DELETE FROM slot_assignment WHERE year = ?1 AND month = ?2",
            params![year, month],
        )?;

        for day in days {
            tx.execute(
                r#"
                INSERT INTO schedule_day (year, month, day, weekday)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![year, month, day.date.day(), weekday_str(day.weekday)],
            )?;

            for (slot_index, slot) in day.slots.iter().enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO slot_assignment
                        (year, month, day, slot_index, time, participant_type,
                         category_key, assigned_ids, fixed_for)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        year,
                        month,
                        day.date.day(),
                        slot_index as i64,
                        slot.time,
                        slot.participant_type.to_string(),
                        slot.category_key.as_ref().map(|k| k.as_str().to_string()),
                        serde_json::to_string(&slot.assigned)?,
                        serde_json::to_string(&slot.fixed_for)?,
                    ],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按年月加载整月排班
    pub fn load_month(&self, year: i32, month: u32) -> RepositoryResult<Vec<DaySchedule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT day, slot_index, time, participant_type, category_key,
                   assigned_ids, fixed_for
            FROM slot_assignment
            WHERE year = ?1 AND month = ?2
            ORDER BY day, slot_index
            "#,
        )?;

        struct SlotRow {
            day: u32,
            slot: SlotAssignment,
        }

        let rows = stmt.query_map(params![year, month], |row| {
            let day: u32 = row.get(0)?;
            let time: String = row.get(2)?;
            let type_str: String = row.get(3)?;
            let category_key: Option<String> = row.get(4)?;
            let assigned_json: String = row.get(5)?;
            let fixed_json: String = row.get(6)?;
            Ok((day, time, type_str, category_key, assigned_json, fixed_json))
        })?;

        let mut slot_rows: Vec<SlotRow> = Vec::new();
        for row in rows {
            let (day, time, type_str, category_key, assigned_json, fixed_json) = row?;
            let participant_type = ParticipantType::parse(&type_str).ok_or_else(|| {
                RepositoryError::InvalidEnumValue {
                    field: "participant_type".to_string(),
                    value: type_str.clone(),
                }
            })?;
            slot_rows.push(SlotRow {
                day,
                slot: SlotAssignment {
                    time,
                    participant_type,
                    category_key: category_key.map(CategoryKey::new),
                    assigned: serde_json::from_str(&assigned_json)?,
                    fixed_for: serde_json::from_str(&fixed_json)?,
                },
            });
        }

        // 按日聚合
        let mut by_day: BTreeMap<u32, Vec<SlotAssignment>> = BTreeMap::new();
        for row in slot_rows {
            by_day.entry(row.day).or_default().push(row.slot);
        }

        let mut days = Vec::new();
        for (day, slots) in by_day {
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                RepositoryError::DatabaseQueryError(format!(
                    "非法日期: {}-{}-{}",
                    year, month, day
                ))
            })?;
            days.push(DaySchedule {
                date,
                weekday: date.weekday(),
                slots,
            });
        }
        Ok(days)
    }

    /// 删除整月排班
    pub fn delete_month(&self, year: i32, month: u32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM schedule_day WHERE year = ?1 AND month = ?2",
            params![year, month],
        )?;
        conn.execute(
            "DELETE FROM slot_assignment WHERE year = ?1 AND month = ?2",
            params![year, month],
        )?;
        Ok(())
    }
}

/// weekday 存储格式（与 chrono 缩写一致）
fn weekday_str(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}
