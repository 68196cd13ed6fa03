// ==========================================
// 月度轮值排班系统 - 引擎层
// ==========================================
// 依据: Roster_Rules_v1.md - 4~8. 分配规则
// ==========================================
// 职责: 实现排班规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL;公平性台账显式传递,绝不做全局单例
// ==========================================

pub mod backfill;
pub mod calendar;
pub mod context;
pub mod core_assigner;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod priority;
pub mod random_assigner;

// 重导出核心引擎
pub use backfill::BackfillSweeper;
pub use calendar::CalendarExpander;
pub use context::{AssignContext, RosterMember};
pub use core_assigner::{CoreAssigner, PairDecision};
pub use error::{EngineError, EngineResult};
pub use ledger::{AbsenteeRecord, CoreSlotQuota, FairnessLedger, MAX_ASSIGNMENTS_PER_MONTH};
pub use orchestrator::{MonthScheduleResult, RosterOrchestrator};
pub use priority::PriorityRanker;
pub use random_assigner::RandomAssigner;
