// ==========================================
// 月度轮值排班系统 - 排班实体
// ==========================================
// 依据: Roster_Rules_v1.md - 2. 周模板与月度排班
// ==========================================
// SlotTemplate: 静态周模板,不随排班结果持久化
// DaySchedule / SlotAssignment: 每次排班运行新建,最终落库
// ==========================================

use crate::domain::types::{CategoryKey, ParticipantType, SelectionMode};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// SlotTemplate - 周模板时段
// ==========================================

/// 周模板中的一个时段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotTemplate {
    pub weekday: Weekday,
    /// 当日时刻，如 "06:00"
    pub time: String,
    pub participant_type: ParticipantType,
    pub selection_mode: SelectionMode,
    /// 分组标签；elementary-core / middle-core 为核心类别
    pub category_key: Option<CategoryKey>,
}

// ==========================================
// WeeklyTemplate - 周模板
// ==========================================

/// 固定周模板：weekday → 当日时段列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    pub slots: Vec<SlotTemplate>,
}

impl WeeklyTemplate {
    pub fn new(slots: Vec<SlotTemplate>) -> Self {
        Self { slots }
    }

    /// 指定星期几的时段（保持模板内顺序）
    pub fn slots_for(&self, weekday: Weekday) -> impl Iterator<Item = &SlotTemplate> {
        self.slots.iter().filter(move |s| s.weekday == weekday)
    }

    /// 标准周模板
    ///
    /// - 周一/三/五 06:00 中学部晨祷（核心，级联分配）
    /// - 周二/四/六 06:00 小学部晨祷（核心，级联分配）
    /// - 周六 20:00 小学部/中学部晚会值守（随机分配）
    pub fn standard() -> Self {
        let mut slots = Vec::new();
        for weekday in [Weekday::Mon, Weekday::Wed, Weekday::Fri] {
            slots.push(SlotTemplate {
                weekday,
                time: "06:00".to_string(),
                participant_type: ParticipantType::Middle,
                selection_mode: SelectionMode::Sequential,
                category_key: Some(CategoryKey::middle_core()),
            });
        }
        for weekday in [Weekday::Tue, Weekday::Thu, Weekday::Sat] {
            slots.push(SlotTemplate {
                weekday,
                time: "06:00".to_string(),
                participant_type: ParticipantType::Elementary,
                selection_mode: SelectionMode::Sequential,
                category_key: Some(CategoryKey::elementary_core()),
            });
        }
        slots.push(SlotTemplate {
            weekday: Weekday::Sat,
            time: "20:00".to_string(),
            participant_type: ParticipantType::Elementary,
            selection_mode: SelectionMode::Random,
            category_key: None,
        });
        slots.push(SlotTemplate {
            weekday: Weekday::Sat,
            time: "20:00".to_string(),
            participant_type: ParticipantType::Middle,
            selection_mode: SelectionMode::Random,
            category_key: None,
        });
        Self { slots }
    }
}

// ==========================================
// SlotAssignment - 时段分配结果
// ==========================================

/// 一个时段的分配结果
///
/// assigned 恒为 0 人或 2 人；1 人是非法状态，任何阶段都不允许落单。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub time: String,
    pub participant_type: ParticipantType,
    pub category_key: Option<CategoryKey>,
    /// 已分配的参与者 id（0 或 2 个）
    pub assigned: Vec<String>,
    /// 其中消耗了缺席者保障配额的参与者 id
    pub fixed_for: Vec<String>,
}

impl SlotAssignment {
    /// 从模板时段生成空白分配
    pub fn from_template(template: &SlotTemplate) -> Self {
        Self {
            time: template.time.clone(),
            participant_type: template.participant_type,
            category_key: template.category_key.clone(),
            assigned: Vec::new(),
            fixed_for: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.assigned.iter().any(|id| id == participant_id)
    }
}

// ==========================================
// DaySchedule - 单日排班
// ==========================================

/// 单日排班：当日所有时段的分配结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub slots: Vec<SlotAssignment>,
}

impl DaySchedule {
    /// 指定参与者当日是否已有分配
    pub fn has_participant(&self, participant_id: &str) -> bool {
        self.slots.iter().any(|s| s.contains(participant_id))
    }
}

// ==========================================
// CategoryCountRecord - 类别次数快照行
// ==========================================

/// 每月各类别轮值次数快照（count > 0 的行才持久化）
///
/// 本月的快照是下月排班的历史输入，形成跨月反馈。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCountRecord {
    pub participant_id: String,
    pub category_key: CategoryKey,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_template_weekday_slots() {
        let template = WeeklyTemplate::standard();
        let monday: Vec<_> = template.slots_for(Weekday::Mon).collect();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].participant_type, ParticipantType::Middle);

        let saturday: Vec<_> = template.slots_for(Weekday::Sat).collect();
        // 小学部核心 + 两个随机晚会时段
        assert_eq!(saturday.len(), 3);

        let sunday: Vec<_> = template.slots_for(Weekday::Sun).collect();
        assert!(sunday.is_empty());
    }

    #[test]
    fn test_blank_assignment_from_template() {
        let template = WeeklyTemplate::standard();
        let slot = SlotAssignment::from_template(&template.slots[0]);
        assert!(slot.is_empty());
        assert!(slot.fixed_for.is_empty());
        assert_eq!(slot.participant_type, ParticipantType::Middle);
    }
}
