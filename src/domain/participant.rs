// ==========================================
// 月度轮值排班系统 - 参与者实体
// ==========================================
// 依据: Roster_Rules_v1.md - 1. 名册
// 红线: 引擎侧只读,增删改由名册管理方负责
// ==========================================

use crate::domain::types::{Gender, ParticipantType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 参与者
///
/// gender 为 None 表示名册数据不完整，引擎在运行前置校验时拒绝整次排班。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub participant_type: ParticipantType,
    pub gender: Option<Gender>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// 构造一个启用状态的参与者（id 由仓储层生成）
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        participant_type: ParticipantType,
        gender: Gender,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            participant_type,
            gender: Some(gender),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
