// ==========================================
// 月度轮值排班系统 - 领域类型定义
// ==========================================
// 依据: Roster_Rules_v1.md - 0.1 参与者分部与核心类别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 参与者分部 (Participant Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Elementary, // 小学部
    Middle,     // 中学部
}

impl ParticipantType {
    /// 本分部对应的核心类别键
    pub fn core_category(&self) -> CategoryKey {
        match self {
            ParticipantType::Elementary => CategoryKey::elementary_core(),
            ParticipantType::Middle => CategoryKey::middle_core(),
        }
    }
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantType::Elementary => write!(f, "ELEMENTARY"),
            ParticipantType::Middle => write!(f, "MIDDLE"),
        }
    }
}

impl ParticipantType {
    /// 从数据库字符串解析（未知值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ELEMENTARY" => Some(ParticipantType::Elementary),
            "MIDDLE" => Some(ParticipantType::Middle),
            _ => None,
        }
    }
}

// ==========================================
// 性别 (Gender)
// ==========================================
// 红线: 同一时段的两人必须同性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
        }
    }
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            _ => None,
        }
    }
}

// ==========================================
// 选择模式 (Selection Mode)
// ==========================================
// SEQUENTIAL: 按优先级级联分配 (核心类别走 A/B/兜底各阶段)
// RANDOM: 公平加权随机分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMode {
    Sequential,
    Random,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Sequential => write!(f, "SEQUENTIAL"),
            SelectionMode::Random => write!(f, "RANDOM"),
        }
    }
}

// ==========================================
// 类别键 (Category Key)
// ==========================================
// 两个固定核心类别之外允许任意分组标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey(pub String);

/// 小学部核心类别键
pub const ELEMENTARY_CORE_KEY: &str = "elementary-core";

/// 中学部核心类别键
pub const MIDDLE_CORE_KEY: &str = "middle-core";

/// 合成总次数键（台账内部使用，也随快照持久化）
pub const TOTAL_KEY: &str = "total";

impl CategoryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn elementary_core() -> Self {
        Self(ELEMENTARY_CORE_KEY.to_string())
    }

    pub fn middle_core() -> Self {
        Self(MIDDLE_CORE_KEY.to_string())
    }

    pub fn total() -> Self {
        Self(TOTAL_KEY.to_string())
    }

    /// 是否为核心类别
    pub fn is_core(&self) -> bool {
        self.0 == ELEMENTARY_CORE_KEY || self.0 == MIDDLE_CORE_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
