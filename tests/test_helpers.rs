// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、CSV 构造、Mock 实现
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use ecuratif::config::{ConfigManager, ConfigResult, ImportConfigReader};
use ecuratif::domain::{
    CandidateRecord, ImportBatch, TransactionPolicy, UnknownStatusPolicy,
};
use ecuratif::importer::{ImportCancellation, ImportPipeline};
use ecuratif::repository::{
    InfoImportRepository, InfoImportRepositoryImpl, RepositoryResult,
};
use rusqlite::{params, Connection};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_test_connection(&db_path)?;
    ecuratif::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（与生产一致的 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(ecuratif::db::open_sqlite_connection(db_path)?)
}

/// 插入 Source 并返回 ID
pub fn insert_source(db_path: &str, name: &str) -> i64 {
    let conn = open_test_connection(db_path).unwrap();
    conn.execute(
        "INSERT INTO source (name, code_gmao) VALUES (?1, ?2)",
        params![name, format!("GMAO-{}", name.len())],
    )
    .unwrap();
    conn.last_insert_rowid()
}

/// 写入全局配置
pub fn set_config(db_path: &str, key: &str, value: &str) {
    let config = ConfigManager::new(db_path).unwrap();
    config.set_global_config_value(key, value).unwrap();
}

/// 按 Source 统计 info 行数
pub fn count_info_rows(db_path: &str, source_id: i64) -> i64 {
    let conn = open_test_connection(db_path).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM info WHERE source_id = ?1",
        params![source_id],
        |row| row.get(0),
    )
    .unwrap()
}

/// 读取某 Source 下全部状态（按 id 排序）
pub fn load_statuses(db_path: &str, source_id: i64) -> Vec<String> {
    let conn = open_test_connection(db_path).unwrap();
    let mut stmt = conn
        .prepare("SELECT status FROM info WHERE source_id = ?1 ORDER BY id")
        .unwrap();
    stmt.query_map(params![source_id], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}

/// 让 agent 为指定值的 INSERT 失败（模拟落库错误）
pub fn install_reject_trigger(db_path: &str, agent: &str) {
    let conn = open_test_connection(db_path).unwrap();
    conn.execute_batch(&format!(
        r#"
        CREATE TRIGGER reject_agent BEFORE INSERT ON info
        WHEN NEW.agent = '{}'
        BEGIN
            SELECT RAISE(ABORT, 'agent refusé');
        END;
        "#,
        agent
    ))
    .unwrap();
}

/// 创建基于 SQLite 的导入管道
pub fn create_test_pipeline(db_path: &str) -> ImportPipeline<InfoImportRepositoryImpl, ConfigManager> {
    let repo = InfoImportRepositoryImpl::new(db_path).expect("Failed to create repo");
    let config = ConfigManager::new(db_path).expect("Failed to create config");
    ImportPipeline::new(repo, config).expect("Failed to create pipeline")
}

// ==========================================
// CSV 构造
// ==========================================

/// 单行数据（14 列）
#[derive(Debug, Clone)]
pub struct InfoRow {
    pub agent: String,
    pub event: String,
    pub created: String,
    pub material: String,
    pub detail: String,
    pub target: String,
    pub day_done: String,
    pub priority: String,
}

impl InfoRow {
    pub fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            event: "Fuite".to_string(),
            created: "12/03/2024".to_string(),
            material: "Joint".to_string(),
            detail: "Remplacement du joint".to_string(),
            target: String::new(),
            day_done: String::new(),
            priority: "2".to_string(),
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    pub fn day_done(mut self, day_done: &str) -> Self {
        self.day_done = day_done.to_string();
        self
    }

    pub fn priority(mut self, priority: &str) -> Self {
        self.priority = priority.to_string();
        self
    }

    pub fn detail(mut self, detail: &str) -> Self {
        self.detail = detail.to_string();
        self
    }

    pub fn to_line(&self) -> String {
        [
            self.agent.as_str(),
            self.event.as_str(),
            self.created.as_str(),
            self.material.as_str(),
            self.detail.as_str(),
            self.target.as_str(),
            "",
            "",
            self.day_done.as_str(),
            self.priority.as_str(),
            "1h",
            "",
            "",
            "",
        ]
        .join(",")
    }
}

/// 构造完整 CSV 文本（Source 行 + 表头 + 数据行）
pub fn build_csv(entity_name: &str, rows: &[String]) -> String {
    let mut csv = format!("{},,,\n", entity_name);
    csv.push_str("agent,event,created,material,detail,target,,,day_done,priority,estimate,oups,brips,ameps\n");
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}

/// n 行合法数据
pub fn valid_rows(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| InfoRow::new(&format!("Agent{}", i)).to_line())
        .collect()
}

// ==========================================
// Mock 配置
// ==========================================

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub allowed_extension: String,
    pub transaction_policy: TransactionPolicy,
    pub unknown_status_policy: UnknownStatusPolicy,
    pub max_upload_bytes: usize,
    pub archive_dir: Option<PathBuf>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            allowed_extension: ".csv".to_string(),
            transaction_policy: TransactionPolicy::BestEffort,
            unknown_status_policy: UnknownStatusPolicy::Reject,
            max_upload_bytes: 1_000_000,
            archive_dir: None,
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_allowed_extension(&self) -> ConfigResult<String> {
        Ok(self.allowed_extension.clone())
    }

    async fn get_transaction_policy(&self) -> ConfigResult<TransactionPolicy> {
        Ok(self.transaction_policy)
    }

    async fn get_unknown_status_policy(&self) -> ConfigResult<UnknownStatusPolicy> {
        Ok(self.unknown_status_policy)
    }

    async fn get_max_upload_bytes(&self) -> ConfigResult<usize> {
        Ok(self.max_upload_bytes)
    }

    async fn get_archive_dir(&self) -> ConfigResult<Option<PathBuf>> {
        Ok(self.archive_dir.clone())
    }
}

// ==========================================
// Mock 仓储（计数所有存储访问）
// ==========================================

#[derive(Debug, Default)]
pub struct CountingRepo {
    pub known_source: Option<(String, i64)>,
    pub lookups: AtomicUsize,
    pub inserts: AtomicUsize,
    pub batches: Mutex<Vec<ImportBatch>>,
    /// 第 n 次 insert_info 成功后触发取消
    pub cancel_after: Option<(usize, ImportCancellation)>,
}

impl CountingRepo {
    pub fn with_source(name: &str, id: i64) -> Self {
        Self {
            known_source: Some((name.to_string(), id)),
            ..Default::default()
        }
    }

    pub fn cancelling_after(mut self, inserts: usize, cancellation: ImportCancellation) -> Self {
        self.cancel_after = Some((inserts, cancellation));
        self
    }

    /// 全部存储调用次数（查找 + 写入 + 批次日志）
    pub fn storage_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
            + self.inserts.load(Ordering::SeqCst)
            + self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl InfoImportRepository for CountingRepo {
    async fn find_source_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .known_source
            .as_ref()
            .filter(|(known, _)| known == name)
            .map(|(_, id)| *id))
    }

    async fn insert_info(&self, _record: &CandidateRecord) -> RepositoryResult<i64> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, cancellation)) = &self.cancel_after {
            if n >= *after {
                cancellation.cancel();
            }
        }
        Ok(n as i64)
    }

    async fn insert_info_batch_atomic(
        &self,
        records: &[CandidateRecord],
    ) -> RepositoryResult<Vec<i64>> {
        let start = self.inserts.fetch_add(records.len(), Ordering::SeqCst);
        Ok((0..records.len()).map(|i| (start + i + 1) as i64).collect())
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_open_infos(&self, _source_id: i64) -> RepositoryResult<i64> {
        Ok(self.inserts.load(Ordering::SeqCst) as i64)
    }

    async fn count_infos(&self, _source_id: i64) -> RepositoryResult<i64> {
        Ok(self.inserts.load(Ordering::SeqCst) as i64)
    }
}
