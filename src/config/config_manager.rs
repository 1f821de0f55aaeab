// ==========================================
// e-curatif - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::{TransactionPolicy, UnknownStatusPolicy};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const ALLOWED_EXTENSION: &str = "import.allowed_extension";
    pub const TRANSACTION_POLICY: &str = "import.transaction_policy";
    pub const UNKNOWN_STATUS_POLICY: &str = "import.unknown_status_policy";
    pub const MAX_UPLOAD_BYTES: &str = "import.max_upload_bytes";
    pub const ARCHIVE_DIR: &str = "import.archive_dir";
}

/// 默认值
pub const DEFAULT_ALLOWED_EXTENSION: &str = ".csv";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1_000_000;

/// 全局 scope
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ConfigError::ReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ConfigError::ReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 的配置值（覆写）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )
        .map_err(|e| ConfigError::ReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

fn invalid_value(key: &str, value: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.into(),
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_allowed_extension(&self) -> ConfigResult<String> {
        let value =
            self.get_config_or_default(config_keys::ALLOWED_EXTENSION, DEFAULT_ALLOWED_EXTENSION)?;
        if !value.starts_with('.') || value.len() < 2 {
            return Err(invalid_value(
                config_keys::ALLOWED_EXTENSION,
                &value,
                "扩展名必须以 '.' 开头",
            ));
        }
        Ok(value)
    }

    // 策略类配置不做静默回退：拼写错误必须暴露出来
    async fn get_transaction_policy(&self) -> ConfigResult<TransactionPolicy> {
        match self.get_config_value(config_keys::TRANSACTION_POLICY)? {
            None => Ok(TransactionPolicy::default()),
            Some(value) => value
                .parse::<TransactionPolicy>()
                .map_err(|msg| invalid_value(config_keys::TRANSACTION_POLICY, &value, msg)),
        }
    }

    async fn get_unknown_status_policy(&self) -> ConfigResult<UnknownStatusPolicy> {
        match self.get_config_value(config_keys::UNKNOWN_STATUS_POLICY)? {
            None => Ok(UnknownStatusPolicy::default()),
            Some(value) => value
                .parse::<UnknownStatusPolicy>()
                .map_err(|msg| invalid_value(config_keys::UNKNOWN_STATUS_POLICY, &value, msg)),
        }
    }

    async fn get_max_upload_bytes(&self) -> ConfigResult<usize> {
        match self.get_config_value(config_keys::MAX_UPLOAD_BYTES)? {
            None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    invalid_value(config_keys::MAX_UPLOAD_BYTES, &value, "必须为正整数")
                }),
        }
    }

    async fn get_archive_dir(&self) -> ConfigResult<Option<PathBuf>> {
        Ok(self
            .get_config_value(config_keys::ARCHIVE_DIR)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from))
    }
}
