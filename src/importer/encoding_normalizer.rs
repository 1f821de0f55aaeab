// ==========================================
// e-curatif - 编码规范化
// ==========================================
// 职责: 探测上传文件编码，必要时转码为 UTF-8
// 依据: 表格软件导出的 CSV 常为 windows-1252 / ISO-8859-1
// 红线: 探测失败必须中止，禁止带着未规范化字节继续
// ==========================================

use crate::importer::error::EncodingError;
use crate::importer::info_importer_trait::{CharsetDetector, Transcoder};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

/// 规范编码
pub const CANONICAL_ENCODING: &str = "UTF-8";

// ==========================================
// EncodingRsCodec - 基于 chardetng + encoding_rs
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsCodec;

impl CharsetDetector for EncodingRsCodec {
    fn detect(&self, bytes: &[u8]) -> Result<String, EncodingError> {
        // 1. BOM 优先
        if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
            return Ok(encoding.name().to_string());
        }

        // 2. 合法 UTF-8（含纯 ASCII）
        if std::str::from_utf8(bytes).is_ok() {
            return Ok(UTF_8.name().to_string());
        }

        // 3. 统计猜测；已排除合法 UTF-8，猜到 UTF-8 说明无法判断
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let guess = detector.guess(None, false);
        if guess == UTF_8 || guess == REPLACEMENT {
            return Err(EncodingError::DetectionFailed);
        }

        Ok(guess.name().to_string())
    }
}

impl Transcoder for EncodingRsCodec {
    fn convert(&self, bytes: &[u8], from: &str, to: &str) -> Result<Vec<u8>, EncodingError> {
        let source = lookup(from)?;
        let target = lookup(to)?;
        if target != UTF_8 {
            // encoding_rs 只提供到 UTF-8 的无损输出
            return Err(EncodingError::Unsupported(to.to_string()));
        }

        let (text, had_errors) = source.decode_with_bom_removal(bytes);
        if had_errors {
            return Err(EncodingError::TranscodeFailed {
                from: from.to_string(),
                to: to.to_string(),
                message: "输入包含该编码下的非法字节序列".to_string(),
            });
        }

        Ok(text.into_owned().into_bytes())
    }
}

fn lookup(label: &str) -> Result<&'static Encoding, EncodingError> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) if encoding != REPLACEMENT => Ok(encoding),
        _ => Err(EncodingError::Unsupported(label.to_string())),
    }
}

fn is_canonical(label: &str) -> bool {
    matches!(Encoding::for_label(label.trim().as_bytes()), Some(e) if e == UTF_8)
}

// ==========================================
// EncodingNormalizer
// ==========================================
#[derive(Clone)]
pub struct EncodingNormalizer {
    detector: Arc<dyn CharsetDetector>,
    transcoder: Arc<dyn Transcoder>,
}

impl Default for EncodingNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(EncodingRsCodec), Arc::new(EncodingRsCodec))
    }
}

impl EncodingNormalizer {
    pub fn new(detector: Arc<dyn CharsetDetector>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            detector,
            transcoder,
        }
    }

    /// 规范化为 UTF-8
    ///
    /// # 返回
    /// - Cow::Borrowed: 已是 UTF-8，原样返回（幂等）
    /// - Cow::Owned: 转码后的 UTF-8 内容
    /// - Err: 探测失败或编码不受支持
    pub fn normalize<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>, EncodingError> {
        let detected = self.detector.detect(bytes)?;
        debug!(encoding = %detected, len = bytes.len(), "编码探测完成");

        if is_canonical(&detected) {
            return Ok(Cow::Borrowed(bytes));
        }

        let converted = self
            .transcoder
            .convert(bytes, &detected, CANONICAL_ENCODING)?;

        // 转码结果必须是合法 UTF-8，否则后续字段比较不可靠
        if let Err(e) = std::str::from_utf8(&converted) {
            return Err(EncodingError::TranscodeFailed {
                from: detected,
                to: CANONICAL_ENCODING.to_string(),
                message: e.to_string(),
            });
        }

        info!(
            from = %detected,
            to = CANONICAL_ENCODING,
            before = bytes.len(),
            after = converted.len(),
            "文件已转码"
        );
        Ok(Cow::Owned(converted))
    }
}
