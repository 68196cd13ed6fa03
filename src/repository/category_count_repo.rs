// ==========================================
// 月度轮值排班系统 - 类别次数快照仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 跨月反馈: 本月保存的快照即下月排班的历史输入
// ==========================================

use crate::domain::schedule::CategoryCountRecord;
use crate::domain::types::CategoryKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CategoryCountRepository - 快照仓储
// ==========================================

/// 类别次数快照仓储
/// 职责: 管理 category_count 表,按年月整月替换
pub struct CategoryCountRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CategoryCountRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整月保存类别次数快照（事务内先删后插，只接受 count > 0 的行）
    pub fn save_month(
        &self,
        year: i32,
        month: u32,
        records: &[CategoryCountRecord],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM category_count WHERE year = ?1 AND month = ?2",
            params![year, month],
        )?;

        for record in records.iter().filter(|r| r.count > 0) {
            tx.execute(
                r#"
                INSERT INTO category_count (year, month, participant_id, category_key, count)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    year,
                    month,
                    record.participant_id,
                    record.category_key.as_str(),
                    record.count,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按年月加载快照: participant_id → (category_key → count)
    pub fn load_month(
        &self,
        year: i32,
        month: u32,
    ) -> RepositoryResult<HashMap<String, HashMap<String, u32>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT participant_id, category_key, count
            FROM category_count
            WHERE year = ?1 AND month = ?2
            "#,
        )?;

        let rows = stmt.query_map(params![year, month], |row| {
            let participant_id: String = row.get(0)?;
            let category_key: String = row.get(1)?;
            let count: u32 = row.get(2)?;
            Ok((participant_id, category_key, count))
        })?;

        let mut counts: HashMap<String, HashMap<String, u32>> = HashMap::new();
        for row in rows {
            let (participant_id, category_key, count) = row?;
            counts
                .entry(participant_id)
                .or_default()
                .insert(category_key, count);
        }
        Ok(counts)
    }

    /// 按年月加载快照行（校验/导出用）
    pub fn load_month_records(
        &self,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<CategoryCountRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT participant_id, category_key, count
            FROM category_count
            WHERE year = ?1 AND month = ?2
            ORDER BY participant_id, category_key
            "#,
        )?;

        let rows = stmt.query_map(params![year, month], |row| {
            Ok(CategoryCountRecord {
                participant_id: row.get(0)?,
                category_key: CategoryKey::new(row.get::<_, String>(1)?),
                count: row.get(2)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
