// ==========================================
// 月度轮值排班系统 - 参与者名册仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::participant::Participant;
use crate::domain::types::{Gender, ParticipantType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ParticipantRepository - 名册仓储
// ==========================================

/// 参与者名册仓储
/// 职责: 管理 participant 表的 CRUD 操作
pub struct ParticipantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ParticipantRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增参与者（id 由仓储生成）
    ///
    /// # 返回
    /// - Ok(String): 新参与者 id
    pub fn insert(
        &self,
        name: &str,
        participant_type: ParticipantType,
        gender: Option<Gender>,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            r#"
            INSERT INTO participant (participant_id, name, participant_type, gender, active)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
            params![
                id,
                name,
                participant_type.to_string(),
                gender.map(|g| g.to_string()),
            ],
        )?;

        Ok(id)
    }

    /// 查询全部参与者（含停用）
    pub fn list_all(&self) -> RepositoryResult<Vec<Participant>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT participant_id, name, participant_type, gender, active,
                   created_at, updated_at
            FROM participant
            ORDER BY participant_id
            "#,
        )?;

        let rows = stmt.query_map([], Self::map_row)?;

        let mut participants = Vec::new();
        for row in rows {
            participants.push(row??);
        }
        Ok(participants)
    }

    /// 按 id 查询单个参与者
    pub fn find_by_id(&self, participant_id: &str) -> RepositoryResult<Option<Participant>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT participant_id, name, participant_type, gender, active,
                   created_at, updated_at
            FROM participant
            WHERE participant_id = ?1
            "#,
        )?;

        let participant = stmt
            .query_row(params![participant_id], Self::map_row)
            .optional()?;

        participant.transpose()
    }

    /// 设置启用/停用标记
    pub fn set_active(&self, participant_id: &str, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE participant
            SET active = ?2, updated_at = datetime('now')
            WHERE participant_id = ?1
            "#,
            params![participant_id, active as i32],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "participant".to_string(),
                id: participant_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除参与者
    pub fn delete(&self, participant_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM participant WHERE participant_id = ?1",
            params![participant_id],
        )?;
        Ok(())
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Participant>> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let type_str: String = row.get(2)?;
        let gender_str: Option<String> = row.get(3)?;
        let active: i32 = row.get(4)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(Self::build_participant(
            id, name, type_str, gender_str, active, created_at, updated_at,
        ))
    }

    fn build_participant(
        id: String,
        name: String,
        type_str: String,
        gender_str: Option<String>,
        active: i32,
        created_at: String,
        updated_at: String,
    ) -> RepositoryResult<Participant> {
        let participant_type = ParticipantType::parse(&type_str).ok_or_else(|| {
            RepositoryError::InvalidEnumValue {
                field: "participant_type".to_string(),
                value: type_str.clone(),
            }
        })?;

        // gender 允许为空（名册数据不完整由引擎前置校验兜底）
        let gender = match gender_str {
            Some(g) => Some(Gender::parse(&g).ok_or_else(|| {
                RepositoryError::InvalidEnumValue {
                    field: "gender".to_string(),
                    value: g.clone(),
                }
            })?),
            None => None,
        };

        Ok(Participant {
            id,
            name,
            participant_type,
            gender,
            active: active != 0,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }
}

/// 解析 sqlite datetime('now') 文本（解析失败回退为当前时间）
fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}
