// ==========================================
// 月度轮值排班系统 - 核心库
// ==========================================
// 依据: Roster_Rules_v1.md - 排班规则全集
// 技术栈: Rust + SQLite
// 系统定位: 月度轮值自动分配引擎 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 存储协作方 - 引擎与仓储的契约
pub mod storage;

// 引擎层 - 排班规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryKey, Gender, ParticipantType, SelectionMode};

// 领域实体
pub use domain::{
    CategoryCountRecord, DaySchedule, Participant, SlotAssignment, SlotTemplate, WeeklyTemplate,
};

// 引擎
pub use engine::{
    AssignContext, BackfillSweeper, CalendarExpander, CoreAssigner, EngineError, EngineResult,
    FairnessLedger, MonthScheduleResult, RandomAssigner, RosterOrchestrator,
};

// 存储
pub use storage::{RosterStore, SqliteRosterStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "月度轮值排班系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
