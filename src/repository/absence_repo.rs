// ==========================================
// 月度轮值排班系统 - 缺席记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AbsenceRepository - 缺席记录仓储
// ==========================================

/// 缺席记录仓储
/// 职责: 管理 absence_log 表
pub struct AbsenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AbsenceRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录一次缺席（同日重复记录幂等）
    pub fn insert(
        &self,
        participant_id: &str,
        year: i32,
        month: u32,
        day: u32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO absence_log (participant_id, year, month, day)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![participant_id, year, month, day],
        )?;
        Ok(())
    }

    /// 删除一次缺席记录（考勤开关的撤销路径）
    pub fn delete(
        &self,
        participant_id: &str,
        year: i32,
        month: u32,
        day: u32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            DELETE FROM absence_log
            WHERE participant_id = ?1 AND year = ?2 AND month = ?3 AND day = ?4
            "#,
            params![participant_id, year, month, day],
        )?;
        Ok(())
    }

    /// 指定月份有缺席记录的参与者 id（去重，按 id 排序保证确定性）
    pub fn absentee_ids(&self, year: i32, month: u32) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT participant_id
            FROM absence_log
            WHERE year = ?1 AND month = ?2
            ORDER BY participant_id
            "#,
        )?;

        let rows = stmt.query_map(params![year, month], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
