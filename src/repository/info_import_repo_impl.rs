// ==========================================
// e-curatif - 维护事件导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::{CandidateRecord, ImportBatch, InfoStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::info_import_repo::InfoImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

const INSERT_INFO_SQL: &str = r#"
    INSERT INTO info (
        source_id, agent, event, material, detail, target, day_done,
        priority, estimate, oups, brips, ameps, status, created
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
    )
"#;

// ==========================================
// InfoImportRepositoryImpl
// ==========================================
pub struct InfoImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl InfoImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 执行单条 INSERT 并返回新 ID
    fn insert_info_with(conn: &Connection, record: &CandidateRecord) -> rusqlite::Result<i64> {
        let mut stmt = conn.prepare_cached(INSERT_INFO_SQL)?;
        stmt.execute(params![
            record.source_id,
            record.agent,
            record.event,
            record.material,
            record.detail,
            record.target,
            record.day_done,
            record.priority,
            record.estimate,
            record.oups,
            record.brips,
            record.ameps,
            record.status.as_db_str(),
            record.created.format("%Y-%m-%d").to_string(),
        ])?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl InfoImportRepository for InfoImportRepositoryImpl {
    async fn find_source_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.lock()?;

        let id = conn
            .query_row(
                "SELECT id FROM source WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(id)
    }

    async fn insert_info(&self, record: &CandidateRecord) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        Ok(Self::insert_info_with(&conn, record)?)
    }

    /// 事务化批量插入（ALL_OR_NOTHING 策略）
    async fn insert_info_batch_atomic(
        &self,
        records: &[CandidateRecord],
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            match Self::insert_info_with(&tx, record) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    // tx 在 drop 时回滚
                    return Err(RepositoryError::BatchRowFailed {
                        row_index: record.row_index,
                        message: RepositoryError::from(e).to_string(),
                    });
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(ids)
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                import_id, source_id, file_name, total_rows, success_rows,
                failed_rows, imported_at, elapsed_ms, archived_path, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.import_id,
                batch.source_id,
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.failed_rows,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
                batch.archived_path,
                batch.report_json,
            ],
        )?;

        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT import_id, source_id, file_name, total_rows, success_rows,
                   failed_rows, imported_at, elapsed_ms, archived_path, report_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], |row| {
                let imported_at: String = row.get(6)?;
                let imported_at = DateTime::parse_from_rfc3339(&imported_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            6,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                Ok(ImportBatch {
                    import_id: row.get(0)?,
                    source_id: row.get(1)?,
                    file_name: row.get(2)?,
                    total_rows: row.get(3)?,
                    success_rows: row.get(4)?,
                    failed_rows: row.get(5)?,
                    imported_at,
                    elapsed_ms: row.get(7)?,
                    archived_path: row.get(8)?,
                    report_json: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    async fn count_open_infos(&self, source_id: i64) -> RepositoryResult<i64> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM info WHERE source_id = ?1 AND status <> ?2 AND status <> ?3",
            params![source_id, InfoStatus::RESOLVED_DB, InfoStatus::ARCHIVED_DB],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    async fn count_infos(&self, source_id: i64) -> RepositoryResult<i64> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM info WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::NaiveDate;

    fn setup() -> (InfoImportRepositoryImpl, i64) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute("INSERT INTO source (name) VALUES ('Pompe P1')", [])
            .unwrap();
        let source_id = conn.last_insert_rowid();
        let repo = InfoImportRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        (repo, source_id)
    }

    fn record(source_id: i64, row_index: usize, status: InfoStatus) -> CandidateRecord {
        CandidateRecord {
            row_index,
            source_id,
            agent: "Dupont".to_string(),
            event: "Fuite".to_string(),
            created: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            material: "Joint".to_string(),
            detail: "Remplacement".to_string(),
            target: String::new(),
            day_done: String::new(),
            priority: 2,
            estimate: String::new(),
            oups: String::new(),
            brips: String::new(),
            ameps: String::new(),
            status,
        }
    }

    #[tokio::test]
    async fn test_find_source_id_by_name() {
        let (repo, source_id) = setup();
        assert_eq!(
            repo.find_source_id_by_name("Pompe P1").await.unwrap(),
            Some(source_id)
        );
        assert_eq!(repo.find_source_id_by_name("pompe p1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_info_and_open_count() {
        let (repo, source_id) = setup();
        repo.insert_info(&record(source_id, 2, InfoStatus::Pending))
            .await
            .unwrap();
        repo.insert_info(&record(source_id, 3, InfoStatus::Resolved))
            .await
            .unwrap();

        assert_eq!(repo.count_infos(source_id).await.unwrap(), 2);
        assert_eq!(repo.count_open_infos(source_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_atomic_batch_rolls_back_on_foreign_key_failure() {
        let (repo, source_id) = setup();
        let records = vec![
            record(source_id, 2, InfoStatus::Pending),
            record(source_id + 100, 3, InfoStatus::Pending),
        ];

        let err = repo.insert_info_batch_atomic(&records).await.unwrap_err();
        match err {
            RepositoryError::BatchRowFailed { row_index, .. } => assert_eq!(row_index, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.count_infos(source_id).await.unwrap(), 0);
    }
}
