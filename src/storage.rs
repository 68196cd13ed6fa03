// ==========================================
// 月度轮值排班系统 - 存储协作方契约
// ==========================================
// 职责: 聚合排班引擎所需的全部数据访问,简化依赖注入
// 约束: 引擎对名册只读;排班结果与快照一次性整月落库
// ==========================================

use crate::domain::participant::Participant;
use crate::domain::schedule::{CategoryCountRecord, DaySchedule};
use crate::repository::{
    AbsenceRepository, CategoryCountRepository, ParticipantRepository, RepositoryResult,
    ScheduleRepository,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// RosterStore - 存储协作方契约
// ==========================================

/// 排班引擎消费/产出数据的统一入口
///
/// 引擎开始时读取: 名册全集、上月各类别次数快照、上月缺席名单;
/// 引擎结束时写入: 整月排班结果、本月类别次数快照。
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// 名册全集（含停用，引擎自行过滤）
    async fn list_participants(&self) -> RepositoryResult<Vec<Participant>>;

    /// 指定月份的类别次数快照: participant_id → (category_key → count)
    async fn category_counts(
        &self,
        year: i32,
        month: u32,
    ) -> RepositoryResult<HashMap<String, HashMap<String, u32>>>;

    /// 指定月份有缺席记录的参与者 id
    async fn absentees(&self, year: i32, month: u32) -> RepositoryResult<Vec<String>>;

    /// 整月保存排班结果
    async fn save_schedule(
        &self,
        year: i32,
        month: u32,
        days: &[DaySchedule],
    ) -> RepositoryResult<()>;

    /// 整月保存类别次数快照（count > 0 的行）
    async fn save_category_counts(
        &self,
        year: i32,
        month: u32,
        records: &[CategoryCountRecord],
    ) -> RepositoryResult<()>;
}

// ==========================================
// SqliteRosterStore - SQLite 实现
// ==========================================

/// 基于 SQLite 仓储的存储协作方
pub struct SqliteRosterStore {
    participant_repo: ParticipantRepository,
    schedule_repo: ScheduleRepository,
    category_count_repo: CategoryCountRepository,
    absence_repo: AbsenceRepository,
}

impl SqliteRosterStore {
    /// 从共享连接创建（各仓储复用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            participant_repo: ParticipantRepository::from_connection(conn.clone()),
            schedule_repo: ScheduleRepository::from_connection(conn.clone()),
            category_count_repo: CategoryCountRepository::from_connection(conn.clone()),
            absence_repo: AbsenceRepository::from_connection(conn),
        }
    }

    pub fn participant_repo(&self) -> &ParticipantRepository {
        &self.participant_repo
    }

    pub fn schedule_repo(&self) -> &ScheduleRepository {
        &self.schedule_repo
    }

    pub fn category_count_repo(&self) -> &CategoryCountRepository {
        &self.category_count_repo
    }

    pub fn absence_repo(&self) -> &AbsenceRepository {
        &self.absence_repo
    }
}

#[async_trait]
impl RosterStore for SqliteRosterStore {
    async fn list_participants(&self) -> RepositoryResult<Vec<Participant>> {
        self.participant_repo.list_all()
    }

    async fn category_counts(
        &self,
        year: i32,
        month: u32,
    ) -> RepositoryResult<HashMap<String, HashMap<String, u32>>> {
        self.category_count_repo.load_month(year, month)
    }

    async fn absentees(&self, year: i32, month: u32) -> RepositoryResult<Vec<String>> {
        self.absence_repo.absentee_ids(year, month)
    }

    async fn save_schedule(
        &self,
        year: i32,
        month: u32,
        days: &[DaySchedule],
    ) -> RepositoryResult<()> {
        self.schedule_repo.save_month(year, month, days)
    }

    async fn save_category_counts(
        &self,
        year: i32,
        month: u32,
        records: &[CategoryCountRecord],
    ) -> RepositoryResult<()> {
        self.category_count_repo.save_month(year, month, records)
    }
}

/// 目标月份的上一个月 (跨年处理)
pub fn prior_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_month_rollover() {
        assert_eq!(prior_month(2026, 1), (2025, 12));
        assert_eq!(prior_month(2026, 8), (2026, 7));
    }
}
