// ==========================================
// e-curatif - 导入领域模型
// ==========================================
// 对外契约: run_import -> ImportReport
// ==========================================

use crate::domain::types::TransactionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// UploadedArtifact - 上传文件
// ==========================================
// 所有权: 由调用方移交给管道，管道退出时释放（或归档）
pub struct UploadedArtifact {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadedArtifact {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// 声明的文件名（客户端提供，不可信）
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 用转码后的内容替换原始内容
    pub(crate) fn replace_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }
}

impl fmt::Debug for UploadedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedArtifact")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ==========================================
// RowErrorKind - 行级错误类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    RowShape,                     // 列数不足
    FieldParse,                   // 字段解析失败（priority / created）
    Persistence,                  // 落库失败
    UnspecifiedStatusCombination, // 无负责人但有完成日期
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::RowShape => write!(f, "row_shape"),
            RowErrorKind::FieldParse => write!(f, "field_parse"),
            RowErrorKind::Persistence => write!(f, "persistence"),
            RowErrorKind::UnspecifiedStatusCombination => {
                write!(f, "unspecified_status_combination")
            }
        }
    }
}

// ==========================================
// RowSuccess / RowFailure - 单行结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSuccess {
    pub row_index: usize, // 原始文件行号
    pub record_id: i64,   // info.id
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_index: usize,         // 原始文件行号
    pub error_kind: RowErrorKind, // 错误类型
    pub detail: String,           // 可读描述
}

// ==========================================
// ImportReport - 导入报表
// ==========================================
// 不变量: total_rows = succeeded.len() + failed.len()
// 返回后不可变（字段私有，仅提供只读访问）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    import_id: String,
    entity_id: i64,
    total_rows: usize,
    transaction_policy: TransactionPolicy,
    succeeded: Vec<RowSuccess>,
    failed: Vec<RowFailure>,
}

impl ImportReport {
    pub fn import_id(&self) -> &str {
        &self.import_id
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn transaction_policy(&self) -> TransactionPolicy {
        self.transaction_policy
    }

    pub fn succeeded(&self) -> &[RowSuccess] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[RowFailure] {
        &self.failed
    }

    /// 按行号查找失败记录
    pub fn failure_at(&self, row_index: usize) -> Option<&RowFailure> {
        self.failed.iter().find(|f| f.row_index == row_index)
    }

    /// 面向用户的一行摘要
    ///
    /// 例: "导入完成: 42 成功, 3 跳过 | 行 7: ..."
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "导入完成: {} 成功, {} 跳过",
            self.succeeded.len(),
            self.failed.len()
        );
        if let Some(first) = self.failed.first() {
            line.push_str(&format!(" | 行 {}: {}", first.row_index, first.detail));
        }
        line
    }
}

// ==========================================
// ImportReportBuilder - 报表累加器
// ==========================================
// 生命周期: 管道开始时创建，逐行累加，finish() 后移交调用方
#[derive(Debug)]
pub struct ImportReportBuilder {
    import_id: String,
    entity_id: i64,
    transaction_policy: TransactionPolicy,
    succeeded: Vec<RowSuccess>,
    failed: Vec<RowFailure>,
}

impl ImportReportBuilder {
    pub fn new(import_id: String, entity_id: i64, transaction_policy: TransactionPolicy) -> Self {
        Self {
            import_id,
            entity_id,
            transaction_policy,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record_success(&mut self, row_index: usize, record_id: i64) {
        self.succeeded.push(RowSuccess {
            row_index,
            record_id,
        });
    }

    pub fn record_failure(
        &mut self,
        row_index: usize,
        error_kind: RowErrorKind,
        detail: impl Into<String>,
    ) {
        self.failed.push(RowFailure {
            row_index,
            error_kind,
            detail: detail.into(),
        });
    }

    pub fn examined(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn finish(mut self) -> ImportReport {
        // 报表按原始行序输出
        self.succeeded.sort_by_key(|s| s.row_index);
        self.failed.sort_by_key(|f| f.row_index);

        ImportReport {
            total_rows: self.examined(),
            import_id: self.import_id,
            entity_id: self.entity_id,
            transaction_policy: self.transaction_policy,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }
}

// ==========================================
// ImportBatch - 导入批次日志
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub import_id: String,             // 导入 ID（UUID）
    pub source_id: i64,                // 关联 Source
    pub file_name: String,             // 源文件名
    pub total_rows: i32,               // 总行数
    pub success_rows: i32,             // 成功行数
    pub failed_rows: i32,              // 失败行数
    pub imported_at: DateTime<Utc>,    // 导入时间
    pub elapsed_ms: i64,               // 导入耗时（毫秒）
    pub archived_path: Option<String>, // 归档路径
    pub report_json: String,           // 报表 JSON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_invariant_and_order() {
        let mut builder =
            ImportReportBuilder::new("imp-1".to_string(), 7, TransactionPolicy::BestEffort);
        builder.record_success(4, 100);
        builder.record_failure(3, RowErrorKind::RowShape, "列数不足");
        builder.record_success(2, 99);

        let report = builder.finish();
        assert_eq!(report.total_rows(), 3);
        assert_eq!(
            report.total_rows(),
            report.succeeded().len() + report.failed().len()
        );
        assert_eq!(report.succeeded()[0].row_index, 2);
        assert_eq!(report.succeeded()[1].row_index, 4);
        assert!(report.failure_at(3).is_some());
    }

    #[test]
    fn test_report_serializes_contract_shape() {
        let mut builder =
            ImportReportBuilder::new("imp-2".to_string(), 1, TransactionPolicy::AllOrNothing);
        builder.record_failure(
            5,
            RowErrorKind::UnspecifiedStatusCombination,
            "负责人为空但完成日期非空",
        );
        let value = serde_json::to_value(builder.finish()).unwrap();

        assert_eq!(value["entity_id"], 1);
        assert_eq!(value["total_rows"], 1);
        assert_eq!(value["transaction_policy"], "ALL_OR_NOTHING");
        assert_eq!(
            value["failed"][0]["error_kind"],
            "unspecified_status_combination"
        );
    }

    #[test]
    fn test_summary_line_mentions_first_failure() {
        let mut builder =
            ImportReportBuilder::new("imp-3".to_string(), 1, TransactionPolicy::BestEffort);
        builder.record_success(2, 1);
        builder.record_failure(7, RowErrorKind::FieldParse, "priority 非数字: abc");
        let line = builder.finish().summary_line();
        assert!(line.contains("1 成功"));
        assert!(line.contains("行 7"));
    }

    #[test]
    fn test_artifact_debug_hides_content() {
        let artifact = UploadedArtifact::new("data.csv", b"secret".to_vec());
        let dbg = format!("{:?}", artifact);
        assert!(dbg.contains("data.csv"));
        assert!(!dbg.contains("secret"));
    }
}
