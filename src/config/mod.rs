// ==========================================
// e-curatif - 配置层
// ==========================================
// 职责: 系统配置管理,支持覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod import_config_trait;
pub mod import_settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use import_config_trait::ImportConfigReader;
pub use import_settings::ImportSettings;
