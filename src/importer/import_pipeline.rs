// ==========================================
// e-curatif - 导入管道实现
// ==========================================
// 职责: 编排一次完整的 CSV 导入，从上传文件到数据库
// 流程: 扩展名校验 → 转码 → 暂存归档 → 解析 → Source 解析
//       → 行映射/状态派生 → 落库 → 提交归档 → 批次日志
// 红线:
// - 扩展名校验失败时不触碰存储
// - Source 不存在时不写入任何行
// - 每次导入状态独立，多个导入可并发执行
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::{
    CandidateRecord, ImportBatch, ImportReport, ImportReportBuilder, UnknownStatusPolicy,
    UploadedArtifact,
};
use crate::importer::artifact_archiver::{ArtifactArchiver, StagedArchive};
use crate::importer::batch_inserter::{BatchInserter, InsertOutcome};
use crate::importer::encoding_normalizer::EncodingNormalizer;
use crate::importer::error::{ImportError, ImportResult, RowError};
use crate::importer::file_type_gate::{FileTypeGate, GateDecision};
use crate::importer::info_importer_trait::{ImportCancellation, InfoImporter};
use crate::importer::record_parser::RecordParser;
use crate::importer::row_mapper::RowMapper;
use crate::importer::schema::{SchemaDescriptor, INFO_CSV_SCHEMA_V1};
use crate::importer::source_resolver::SourceResolver;
use crate::repository::InfoImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::borrow::Cow;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportPipeline - 导入管道
// ==========================================
pub struct ImportPipeline<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    normalizer: EncodingNormalizer,
    parser: RecordParser,
    mapper: RowMapper,
}

impl<R, C> ImportPipeline<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    /// 使用默认模板与默认编码器创建管道
    pub fn new(repo: R, config: C) -> ImportResult<Self> {
        Self::with_components(repo, config, &INFO_CSV_SCHEMA_V1, EncodingNormalizer::default())
    }

    /// 注入自定义模板与编码规范化器
    ///
    /// # 参数
    /// - schema: 列布局（创建时校验一次）
    /// - normalizer: 编码探测/转码实现
    pub fn with_components(
        repo: R,
        config: C,
        schema: &SchemaDescriptor,
        normalizer: EncodingNormalizer,
    ) -> ImportResult<Self> {
        let mapper = RowMapper::new(schema)?;
        info!(
            schema_version = mapper.schema_version(),
            required_width = mapper.required_width(),
            "导入管道已创建"
        );

        Ok(Self {
            repo,
            config,
            normalizer,
            parser: RecordParser,
            mapper,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 加载本次导入的配置快照
    pub async fn load_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings::load(&self.config).await?)
    }

    #[instrument(
        skip(self, artifact, cancellation),
        fields(file_name = %artifact.file_name(), import_id = tracing::field::Empty)
    )]
    async fn execute(
        &self,
        mut artifact: UploadedArtifact,
        cancellation: ImportCancellation,
    ) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let import_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("import_id", import_id.as_str());

        let settings = self.load_settings().await?;

        // ===== 步骤 1: 扩展名校验 =====
        let gate = FileTypeGate::new(settings.allowed_extension.clone());
        if let GateDecision::Rejected(reason) = gate.verify(&artifact) {
            warn!(reason = %reason, "文件类型被拒绝");
            return Err(ImportError::UnsupportedFormat {
                file_name: artifact.file_name().to_string(),
                reason,
            });
        }

        if artifact.len() > settings.max_upload_bytes {
            return Err(ImportError::UploadTooLarge {
                size: artifact.len(),
                limit: settings.max_upload_bytes,
            });
        }

        // ===== 步骤 2: 编码规范化 =====
        let transcoded = match self.normalizer.normalize(artifact.bytes())? {
            Cow::Borrowed(_) => None,
            Cow::Owned(converted) => Some(converted),
        };
        if let Some(converted) = transcoded {
            debug!(len = converted.len(), "已转码为 UTF-8");
            artifact.replace_bytes(converted);
        }

        // ===== 步骤 3: 暂存归档（导入完成后才提交）=====
        // 暂存与提交一样只影响归档，失败不中止导入
        let staged = match &settings.archive_dir {
            Some(dir) => match ArtifactArchiver::new(dir).stage(
                &import_id,
                artifact.file_name(),
                artifact.bytes(),
            ) {
                Ok(staged) => {
                    debug!(target_path = %staged.target().display(), "上传文件已暂存");
                    Some(staged)
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "上传文件暂存失败，本次不归档");
                    None
                }
            },
            None => None,
        };

        // ===== 步骤 4: 解析 =====
        let parsed = self.parser.parse(artifact.bytes())?;
        info!(
            entity_name = %parsed.entity_name,
            data_rows = parsed.rows.len(),
            "文件解析完成"
        );

        // ===== 步骤 5: Source 解析（仅一次）=====
        let source = SourceResolver::new(&self.repo)
            .resolve(&parsed.entity_name)
            .await?;
        let source_id = source.id;

        // ===== 步骤 6: 行映射 + 状态派生 =====
        let mut report =
            ImportReportBuilder::new(import_id.clone(), source_id, settings.transaction_policy);
        let mut candidates: Vec<CandidateRecord> = Vec::with_capacity(parsed.rows.len());
        let mut cancelled_while_mapping = false;

        for row in &parsed.rows {
            if cancellation.is_cancelled() {
                cancelled_while_mapping = true;
                break;
            }

            match self.mapper.map(row, source_id) {
                Ok(record) if !record.status.is_lifecycle() => match settings.unknown_status_policy {
                    UnknownStatusPolicy::Reject => {
                        let row_error = RowError::UnspecifiedStatusCombination {
                            row_index: record.row_index,
                            day_done: record.day_done,
                        };
                        debug!(row_index = row_error.row_index(), "状态组合未定义，跳过");
                        report.record_failure(row_error.row_index(), row_error.kind(), row_error.to_string());
                    }
                    UnknownStatusPolicy::Persist => {
                        warn!(
                            row_index = record.row_index,
                            status = record.status.as_db_str(),
                            "状态组合未定义，按 PERSIST 策略落库"
                        );
                        candidates.push(record);
                    }
                },
                Ok(record) => candidates.push(record),
                Err(row_error) => {
                    debug!(row_index = row_error.row_index(), error = %row_error, "行映射失败");
                    report.record_failure(row_error.row_index(), row_error.kind(), row_error.to_string());
                }
            }
        }

        // ===== 步骤 7: 落库 =====
        let outcome = if cancelled_while_mapping {
            InsertOutcome::Cancelled { persisted: 0 }
        } else {
            BatchInserter::new(&self.repo, settings.transaction_policy)
                .insert_all(candidates, &mut report, &cancellation)
                .await
        };
        let persisted = outcome.persisted();
        let examined = report.examined();
        let report = report.finish();

        // ===== 步骤 8: 提交归档（取消时丢弃暂存文件）=====
        let archived_path = match outcome {
            InsertOutcome::Completed { .. } => staged.and_then(commit_archive),
            InsertOutcome::Cancelled { .. } => None,
        };

        // ===== 步骤 9: 批次日志（取消时同样记录已处理部分）=====
        let elapsed_ms = started.elapsed().as_millis() as i64;
        let batch = ImportBatch {
            import_id: import_id.clone(),
            source_id,
            file_name: artifact.file_name().to_string(),
            total_rows: report.total_rows() as i32,
            success_rows: report.succeeded().len() as i32,
            failed_rows: report.failed().len() as i32,
            imported_at: Utc::now(),
            elapsed_ms,
            archived_path,
            report_json: serde_json::to_string(&report).unwrap_or_default(),
        };
        if let Err(e) = self.repo.insert_import_batch(&batch).await {
            warn!(error = %e, "批次日志写入失败");
        }

        if let InsertOutcome::Cancelled { .. } = outcome {
            warn!(
                source = %source.name,
                examined,
                data_rows = parsed.rows.len(),
                persisted,
                elapsed_ms,
                "导入已取消"
            );
            return Err(ImportError::Cancelled {
                import_id,
                persisted_rows: persisted,
                report: Box::new(report),
            });
        }

        info!(
            source = %source.name,
            source_id,
            total_rows = report.total_rows(),
            persisted,
            failed = report.failed().len(),
            elapsed_ms,
            "{}",
            report.summary_line()
        );

        Ok(report)
    }
}

/// 提交归档；失败只记录日志，不影响导入结果
fn commit_archive(staged: StagedArchive) -> Option<String> {
    match staged.commit() {
        Ok(path) => {
            info!(path = %path.display(), "上传文件已归档");
            Some(path.display().to_string())
        }
        Err(e) => {
            warn!(error = %e, "上传文件归档失败");
            None
        }
    }
}

#[async_trait]
impl<R, C> InfoImporter for ImportPipeline<R, C>
where
    R: InfoImportRepository,
    C: ImportConfigReader,
{
    async fn run_import(&self, artifact: UploadedArtifact) -> ImportResult<ImportReport> {
        self.execute(artifact, ImportCancellation::new()).await
    }

    async fn run_import_cancellable(
        &self,
        artifact: UploadedArtifact,
        cancellation: ImportCancellation,
    ) -> ImportResult<ImportReport> {
        self.execute(artifact, cancellation).await
    }
}
