// ==========================================
// 月度轮值排班系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod absence_repo;
pub mod category_count_repo;
pub mod error;
pub mod participant_repo;
pub mod schedule_repo;

// 重导出核心仓储
pub use absence_repo::AbsenceRepository;
pub use category_count_repo::CategoryCountRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use participant_repo::ParticipantRepository;
pub use schedule_repo::ScheduleRepository;
