// ==========================================
// e-curatif - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入逻辑
// ==========================================

pub mod import;
pub mod info;
pub mod types;

// 重导出核心类型
pub use import::{
    ImportBatch, ImportReport, ImportReportBuilder, RowErrorKind, RowFailure, RowSuccess,
    UploadedArtifact,
};
pub use info::{CandidateRecord, Source};
pub use types::{InfoStatus, TransactionPolicy, UnknownStatusPolicy};
