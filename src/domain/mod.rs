// ==========================================
// 月度轮值排班系统 - 领域层
// ==========================================
// 依据: Roster_Rules_v1.md - 领域模型
// ==========================================
// 职责: 定义实体与值类型,不含持久化与规则逻辑
// ==========================================

pub mod participant;
pub mod schedule;
pub mod types;

// 重导出核心实体
pub use participant::Participant;
pub use schedule::{
    CategoryCountRecord, DaySchedule, SlotAssignment, SlotTemplate, WeeklyTemplate,
};
pub use types::{CategoryKey, Gender, ParticipantType, SelectionMode};
