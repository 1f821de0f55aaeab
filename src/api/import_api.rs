// ==========================================
// e-curatif - 维护事件导入 API
// ==========================================
// 职责: 封装导入管道，供上层处理器调用
// 规则: 超过 import.max_upload_bytes 的上传在进入管道前拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::{ImportBatch, ImportReport, UploadedArtifact};
use crate::importer::{ImportCancellation, ImportPipeline, InfoImporter};
use crate::repository::{InfoImportRepository, InfoImportRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 导入 API 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 逐行结果
    pub report: ImportReport,
    /// 面向用户的一行摘要
    pub summary: String,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 后台导入句柄
pub struct ImportHandle {
    cancellation: ImportCancellation,
    handle: JoinHandle<ApiResult<ImportReport>>,
}

impl ImportHandle {
    /// 请求取消（在行与行之间生效）
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn cancellation(&self) -> &ImportCancellation {
        &self.cancellation
    }

    /// 等待导入结束
    pub async fn wait(self) -> ApiResult<ImportReport> {
        self.handle
            .await
            .map_err(|e| ApiError::InternalError(format!("导入任务异常退出: {}", e)))?
    }
}

/// 默认装配（SQLite 仓储 + SQLite 配置）
pub type DefaultImportApi = ImportApi<InfoImportRepositoryImpl, ConfigManager>;

/// 导入 API
pub struct ImportApi<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    pipeline: Arc<ImportPipeline<R, C>>,
}

impl<R, C> Clone for ImportApi<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl DefaultImportApi {
    /// 按数据库路径装配，仓储与配置共享同一连接
    ///
    /// 数据库须已由 init_schema 初始化，且 schema_version 与当前代码一致
    pub fn from_db_path(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;

        match read_schema_version(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))? {
            Some(version) if version == CURRENT_SCHEMA_VERSION => {}
            Some(version) => {
                return Err(ApiError::DatabaseConnectionError(format!(
                    "{}: schema_version={}，期望 {}",
                    db_path, version, CURRENT_SCHEMA_VERSION
                )))
            }
            None => {
                return Err(ApiError::DatabaseConnectionError(format!(
                    "{}: 数据库未初始化",
                    db_path
                )))
            }
        }
        let conn = Arc::new(Mutex::new(conn));

        let repo = InfoImportRepositoryImpl::from_connection(Arc::clone(&conn))?;
        let config = ConfigManager::from_connection(conn);
        let pipeline = ImportPipeline::new(repo, config)?;

        Ok(Self::new(Arc::new(pipeline)))
    }
}

impl<R, C> ImportApi<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    pub fn new(pipeline: Arc<ImportPipeline<R, C>>) -> Self {
        Self { pipeline }
    }

    /// 导入维护事件 CSV
    ///
    /// # 参数
    /// - file_name: 客户端声明的文件名
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 逐行结果（部分失败不视为错误）
    /// - Err(ApiError): 前置条件失败，无任何行落库
    pub async fn import_info_csv(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        self.check_upload_size(bytes.len()).await?;

        let report = self
            .pipeline
            .run_import(UploadedArtifact::new(file_name, bytes))
            .await?;

        let summary = report.summary_line();
        info!(file_name = %file_name, "{}", summary);

        Ok(ImportApiResponse {
            report,
            summary,
            elapsed_ms: started.elapsed().as_millis() as i64,
        })
    }

    /// 最近的导入批次
    pub async fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let limit = limit.clamp(1, 100);
        Ok(self.pipeline.repository().get_recent_batches(limit).await?)
    }

    /// 指定 Source 下未结束的事件数
    pub async fn count_open_infos(&self, source_id: i64) -> ApiResult<i64> {
        Ok(self.pipeline.repository().count_open_infos(source_id).await?)
    }

    async fn check_upload_size(&self, size: usize) -> ApiResult<()> {
        let limit = self.pipeline.load_settings().await?.max_upload_bytes;
        if size > limit {
            warn!(size, limit, "上传文件超出大小上限");
            return Err(ApiError::PayloadTooLarge { size, limit });
        }
        Ok(())
    }
}

impl<R, C> ImportApi<R, C>
where
    R: InfoImportRepository + 'static,
    C: ImportConfigReader + 'static,
{
    /// 后台导入，返回可取消的句柄
    pub async fn spawn_import(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<ImportHandle> {
        self.check_upload_size(bytes.len()).await?;

        let cancellation = ImportCancellation::new();
        let pipeline = Arc::clone(&self.pipeline);
        let artifact = UploadedArtifact::new(file_name, bytes);
        let task_cancellation = cancellation.clone();

        let handle = tokio::spawn(async move {
            pipeline
                .run_import_cancellable(artifact, task_cancellation)
                .await
                .map_err(ApiError::from)
        });

        Ok(ImportHandle {
            cancellation,
            handle,
        })
    }
}
