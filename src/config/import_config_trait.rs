// ==========================================
// e-curatif - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::{TransactionPolicy, UnknownStatusPolicy};
use async_trait::async_trait;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 允许的文件扩展名（含点，大小写敏感）
    ///
    /// # 默认值
    /// - ".csv"
    async fn get_allowed_extension(&self) -> ConfigResult<String>;

    /// 落库事务策略
    ///
    /// # 默认值
    /// - BEST_EFFORT
    async fn get_transaction_policy(&self) -> ConfigResult<TransactionPolicy>;

    /// 未定义状态组合（无负责人、有完成日期）的处理策略
    ///
    /// # 默认值
    /// - REJECT
    async fn get_unknown_status_policy(&self) -> ConfigResult<UnknownStatusPolicy>;

    /// 上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 1_000_000
    async fn get_max_upload_bytes(&self) -> ConfigResult<usize>;

    /// 归档目录
    ///
    /// # 返回
    /// - Some(path): 导入完成后归档规范化内容
    /// - None: 不归档，导入结束即丢弃
    async fn get_archive_dir(&self) -> ConfigResult<Option<PathBuf>>;
}
