// ==========================================
// e-curatif - API 层错误类型
// ==========================================
// 职责: 将导入/仓储层的技术错误转换为面向调用方的错误
// ==========================================

use crate::domain::ImportReport;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("文件格式不支持: {0}")]
    UnsupportedFormat(String),

    #[error("上传文件过大: {size} 字节，上限 {limit} 字节")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    /// report 为取消前已处理部分
    #[error("导入已取消: 已落库 {persisted_rows} 行")]
    Cancelled {
        persisted_rows: usize,
        report: Box<ImportReport>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) | RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(msg)
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::BatchRowFailed { row_index, message } => {
                ApiError::DatabaseTransactionError(format!("行 {}: {}", row_index, message))
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg)
            | RepositoryError::NotNullViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat { file_name, reason } => {
                ApiError::UnsupportedFormat(format!("{}（{}）", file_name, reason))
            }
            ImportError::UploadTooLarge { size, limit } => ApiError::PayloadTooLarge { size, limit },
            ImportError::EntityNotFound { name } => {
                ApiError::NotFound(format!("Source 不存在: {}", name))
            }
            ImportError::Repository(e) => ApiError::from(e),
            ImportError::Cancelled {
                persisted_rows,
                report,
                ..
            } => ApiError::Cancelled {
                persisted_rows,
                report,
            },
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
