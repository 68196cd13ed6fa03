// ==========================================
// 月度轮值排班系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 数据质量错误 =====
    #[error("非法枚举值: 字段={field}, 值={value}")]
    InvalidEnumValue { field: String, value: String },

    #[error("数据反序列化失败: {0}")]
    DeserializationError(String),

    // ===== 通用错误 =====
    #[error("SQLite 错误: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::DeserializationError(e.to_string())
    }
}

/// 仓储层结果类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
