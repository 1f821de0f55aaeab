// ==========================================
// e-curatif - 维护事件导入 Trait
// ==========================================
// 职责: 定义导入管道及其可注入能力的接口（不包含实现）
// ==========================================

use crate::domain::{ImportReport, UploadedArtifact};
use crate::importer::error::{EncodingError, ImportResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ==========================================
// InfoImporter Trait
// ==========================================
// 用途: 导入主接口（对上层 API 暴露）
// 实现者: ImportPipeline
#[async_trait]
pub trait InfoImporter: Send + Sync {
    /// 执行一次 CSV 导入
    ///
    /// # 参数
    /// - artifact: 上传文件（所有权移交，退出时释放）
    ///
    /// # 返回
    /// - Ok(ImportReport): 每行的成功/失败明细
    /// - Err: 前置条件失败（格式/编码/解析/Source 不存在），无任何行落库
    ///
    /// # 导入流程
    /// 1. 扩展名校验
    /// 2. 编码探测与转码
    /// 3. 解析 CSV，提取 Source 名称
    /// 4. 解析 Source ID（仅一次）
    /// 5. 逐行映射 + 状态派生
    /// 6. 落库（按事务策略）
    async fn run_import(&self, artifact: UploadedArtifact) -> ImportResult<ImportReport>;

    /// 可取消的导入
    ///
    /// 取消信号在行与行之间检查；已开始的单行写入会完成
    async fn run_import_cancellable(
        &self,
        artifact: UploadedArtifact,
        cancellation: ImportCancellation,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// CharsetDetector Trait
// ==========================================
// 用途: 字节编码探测
// 实现者: EncodingRsCodec
pub trait CharsetDetector: Send + Sync {
    /// 探测编码
    ///
    /// # 返回
    /// - Ok(label): WHATWG 编码标签（如 "UTF-8", "windows-1252"）
    /// - Err: 无法判断
    fn detect(&self, bytes: &[u8]) -> Result<String, EncodingError>;
}

// ==========================================
// Transcoder Trait
// ==========================================
// 用途: 编码转换
// 实现者: EncodingRsCodec
pub trait Transcoder: Send + Sync {
    /// 将 bytes 从 from 编码转换到 to 编码
    fn convert(&self, bytes: &[u8], from: &str, to: &str) -> Result<Vec<u8>, EncodingError>;
}

// ==========================================
// ImportCancellation - 取消信号
// ==========================================
// 每次导入独立一份，可跨任务克隆
#[derive(Debug, Clone, Default)]
pub struct ImportCancellation {
    flag: Arc<AtomicBool>,
}

impl ImportCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
