// ==========================================
// e-curatif - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层:
// - ImportError: 管道级前置条件失败，整个导入中止
// - RowError: 行级失败，写入 ImportReport 后继续
// ==========================================

use crate::config::ConfigError;
use crate::domain::{ImportReport, RowErrorKind};
use crate::repository::RepositoryError;
use thiserror::Error;

/// 编码探测/转码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("无法识别文件编码")]
    DetectionFailed,

    #[error("不支持的编码: {0}")]
    Unsupported(String),

    #[error("转码失败 ({from} → {to}): {message}")]
    TranscodeFailed {
        from: String,
        to: String,
        message: String,
    },
}

/// 文件结构解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("文件为空")]
    Empty,

    #[error("首行首格缺少 Source 名称")]
    MissingEntityName,

    #[error("内容不是合法 UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("CSV 解析失败: {0}")]
    Malformed(String),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// 导入模块错误类型（管道级，导入中止）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 前置条件 =====
    #[error("文件格式不支持: {file_name}（{reason}）")]
    UnsupportedFormat { file_name: String, reason: String },

    #[error("上传文件过大: {size} 字节，上限 {limit} 字节")]
    UploadTooLarge { size: usize, limit: usize },

    #[error("文件编码错误: {0}")]
    Encoding(#[from] EncodingError),

    #[error("文件解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("Source 不存在: {name}")]
    EntityNotFound { name: String },

    #[error("导入模板无效: {0}")]
    InvalidSchema(String),

    // ===== 基础设施 =====
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("数据库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("归档失败: {0}")]
    Archive(String),

    // ===== 取消 =====
    /// report 只包含取消前已处理的行（含已落库行的 record_id）
    #[error("导入已取消 (import_id={import_id}): 已落库 {persisted_rows} 行")]
    Cancelled {
        import_id: String,
        persisted_rows: usize,
        report: Box<ImportReport>,
    },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Archive(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

/// 行级错误（不中止导入）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("列数不足: 需要 {expected} 列，实际 {actual} 列")]
    RowShape {
        row_index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("字段 {field} 解析失败: {value:?}")]
    FieldParse {
        row_index: usize,
        field: &'static str,
        value: String,
    },

    #[error("落库失败: {message}")]
    Persistence { row_index: usize, message: String },

    #[error("状态组合未定义: 负责人为空但完成日期为 {day_done:?}")]
    UnspecifiedStatusCombination { row_index: usize, day_done: String },
}

impl RowError {
    pub fn row_index(&self) -> usize {
        match self {
            RowError::RowShape { row_index, .. }
            | RowError::FieldParse { row_index, .. }
            | RowError::Persistence { row_index, .. }
            | RowError::UnspecifiedStatusCombination { row_index, .. } => *row_index,
        }
    }

    pub fn kind(&self) -> RowErrorKind {
        match self {
            RowError::RowShape { .. } => RowErrorKind::RowShape,
            RowError::FieldParse { .. } => RowErrorKind::FieldParse,
            RowError::Persistence { .. } => RowErrorKind::Persistence,
            RowError::UnspecifiedStatusCombination { .. } => {
                RowErrorKind::UnspecifiedStatusCombination
            }
        }
    }
}
