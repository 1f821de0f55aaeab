// ==========================================
// e-curatif - 导入配置快照
// ==========================================
// 生命周期: 每次导入开始时加载一次，导入期间不变
// ==========================================

use crate::config::config_manager::{DEFAULT_ALLOWED_EXTENSION, DEFAULT_MAX_UPLOAD_BYTES};
use crate::config::error::ConfigResult;
use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::{TransactionPolicy, UnknownStatusPolicy};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub allowed_extension: String,
    pub transaction_policy: TransactionPolicy,
    pub unknown_status_policy: UnknownStatusPolicy,
    pub max_upload_bytes: usize,
    pub archive_dir: Option<PathBuf>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            allowed_extension: DEFAULT_ALLOWED_EXTENSION.to_string(),
            transaction_policy: TransactionPolicy::default(),
            unknown_status_policy: UnknownStatusPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            archive_dir: None,
        }
    }
}

impl ImportSettings {
    /// 从配置读取器加载快照
    pub async fn load(reader: &dyn ImportConfigReader) -> ConfigResult<Self> {
        Ok(Self {
            allowed_extension: reader.get_allowed_extension().await?,
            transaction_policy: reader.get_transaction_policy().await?,
            unknown_status_policy: reader.get_unknown_status_policy().await?,
            max_upload_bytes: reader.get_max_upload_bytes().await?,
            archive_dir: reader.get_archive_dir().await?,
        })
    }
}
