// ==========================================
// e-curatif - 批量落库
// ==========================================
// 事务策略:
// - BEST_EFFORT: 每行独立 INSERT，失败记入报表后继续
// - ALL_OR_NOTHING: 单一事务，任一行失败整体回滚，全部行记为失败
// ==========================================

use crate::domain::{CandidateRecord, ImportReportBuilder, RowErrorKind, TransactionPolicy};
use crate::importer::error::RowError;
use crate::importer::info_importer_trait::ImportCancellation;
use crate::repository::{InfoImportRepository, RepositoryError};
use tracing::{debug, warn};

/// 落库结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 全部候选记录已处理
    Completed { persisted: usize },
    /// 收到取消信号，剩余记录未处理
    Cancelled { persisted: usize },
}

impl InsertOutcome {
    pub fn persisted(&self) -> usize {
        match self {
            InsertOutcome::Completed { persisted } | InsertOutcome::Cancelled { persisted } => {
                *persisted
            }
        }
    }
}

pub struct BatchInserter<'a, R: ?Sized> {
    repo: &'a R,
    policy: TransactionPolicy,
}

impl<'a, R> BatchInserter<'a, R>
where
    R: InfoImportRepository + ?Sized,
{
    pub fn new(repo: &'a R, policy: TransactionPolicy) -> Self {
        Self { repo, policy }
    }

    /// 落库全部候选记录，每行结果写入 report
    ///
    /// # 返回
    /// - Completed: 已处理全部记录
    /// - Cancelled: 收到取消信号；已落库的行保留，并已记入 report
    pub async fn insert_all(
        &self,
        candidates: Vec<CandidateRecord>,
        report: &mut ImportReportBuilder,
        cancellation: &ImportCancellation,
    ) -> InsertOutcome {
        match self.policy {
            TransactionPolicy::BestEffort => {
                self.insert_each(candidates, report, cancellation).await
            }
            TransactionPolicy::AllOrNothing => {
                self.insert_atomic(candidates, report, cancellation).await
            }
        }
    }

    async fn insert_each(
        &self,
        candidates: Vec<CandidateRecord>,
        report: &mut ImportReportBuilder,
        cancellation: &ImportCancellation,
    ) -> InsertOutcome {
        let mut persisted = 0;

        for record in candidates {
            if cancellation.is_cancelled() {
                return InsertOutcome::Cancelled { persisted };
            }

            match self.repo.insert_info(&record).await {
                Ok(id) => {
                    debug!(row_index = record.row_index, record_id = id, "行已落库");
                    report.record_success(record.row_index, id);
                    persisted += 1;
                }
                Err(e) => {
                    let row_error = RowError::Persistence {
                        row_index: record.row_index,
                        message: e.to_string(),
                    };
                    warn!(row_index = record.row_index, error = %e, "行落库失败");
                    report.record_failure(record.row_index, row_error.kind(), row_error.to_string());
                }
            }
        }

        InsertOutcome::Completed { persisted }
    }

    async fn insert_atomic(
        &self,
        candidates: Vec<CandidateRecord>,
        report: &mut ImportReportBuilder,
        cancellation: &ImportCancellation,
    ) -> InsertOutcome {
        if cancellation.is_cancelled() {
            return InsertOutcome::Cancelled { persisted: 0 };
        }
        if candidates.is_empty() {
            return InsertOutcome::Completed { persisted: 0 };
        }

        match self.repo.insert_info_batch_atomic(&candidates).await {
            Ok(ids) => {
                for (record, id) in candidates.iter().zip(ids.iter()) {
                    report.record_success(record.row_index, *id);
                }
                InsertOutcome::Completed {
                    persisted: ids.len(),
                }
            }
            Err(RepositoryError::BatchRowFailed { row_index, message }) => {
                warn!(row_index, error = %message, "事务内行失败，整体回滚");
                for record in &candidates {
                    let detail = if record.row_index == row_index {
                        RowError::Persistence {
                            row_index,
                            message: message.clone(),
                        }
                        .to_string()
                    } else {
                        format!("事务回滚: 行 {} 落库失败", row_index)
                    };
                    report.record_failure(record.row_index, RowErrorKind::Persistence, detail);
                }
                InsertOutcome::Completed { persisted: 0 }
            }
            Err(e) => {
                warn!(error = %e, "事务落库失败，整体回滚");
                for record in &candidates {
                    report.record_failure(
                        record.row_index,
                        RowErrorKind::Persistence,
                        format!("事务回滚: {}", e),
                    );
                }
                InsertOutcome::Completed { persisted: 0 }
            }
        }
    }
}
