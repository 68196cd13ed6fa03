// ==========================================
// 月度轮值排班系统 - 引擎层错误类型
// ==========================================
// 前置校验失败整次中止,不落任何数据
// 时段无人可排是软结果,不是错误
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 前置校验错误 =====
    #[error("名册为空,无法排班")]
    EmptyRoster,

    #[error("参与者缺少性别信息: id={participant_id}, name={name}")]
    MissingGender { participant_id: String, name: String },

    // ===== 协作方错误（原样向上传播） =====
    #[error("存储协作方失败: {0}")]
    Repository(#[from] RepositoryError),
}

/// 引擎层结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
