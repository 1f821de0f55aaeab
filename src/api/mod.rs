// ==========================================
// e-curatif - API 层
// ==========================================
// 职责: 对上层（HTTP 处理器 / CLI）暴露导入接口
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{DefaultImportApi, ImportApi, ImportApiResponse, ImportHandle};
