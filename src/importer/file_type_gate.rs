// ==========================================
// e-curatif - 文件类型闸门
// ==========================================
// 职责: 根据声明的文件名扩展名接受/拒绝上传文件
// 红线: 只看文件名，不读取文件内容
// ==========================================

use crate::domain::UploadedArtifact;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Accepted,
    Rejected(String),
}

pub struct FileTypeGate {
    allowed_extension: String,
}

impl FileTypeGate {
    /// # 参数
    /// - allowed_extension: 含点的扩展名，如 ".csv"（大小写敏感）
    pub fn new(allowed_extension: impl Into<String>) -> Self {
        Self {
            allowed_extension: allowed_extension.into(),
        }
    }

    pub fn verify(&self, artifact: &UploadedArtifact) -> GateDecision {
        match declared_extension(artifact.file_name()) {
            Some(ext) if ext == self.allowed_extension => GateDecision::Accepted,
            Some(ext) => GateDecision::Rejected(format!(
                "扩展名 {} 不是 {}",
                ext, self.allowed_extension
            )),
            None => GateDecision::Rejected(format!(
                "文件名缺少扩展名，仅接受 {}",
                self.allowed_extension
            )),
        }
    }
}

/// 取最后一个路径分量中最后一个 '.' 起的后缀（含点）
fn declared_extension(file_name: &str) -> Option<&str> {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    base.rfind('.').map(|idx| &base[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> UploadedArtifact {
        UploadedArtifact::new(name, Vec::new())
    }

    #[test]
    fn test_accepts_csv() {
        let gate = FileTypeGate::new(".csv");
        assert_eq!(gate.verify(&artifact("export.csv")), GateDecision::Accepted);
        assert_eq!(
            gate.verify(&artifact("dir/sub/export.v2.csv")),
            GateDecision::Accepted
        );
    }

    #[test]
    fn test_rejects_other_extensions() {
        let gate = FileTypeGate::new(".csv");
        assert!(matches!(
            gate.verify(&artifact("data.txt")),
            GateDecision::Rejected(_)
        ));
        // 大小写敏感
        assert!(matches!(
            gate.verify(&artifact("DATA.CSV")),
            GateDecision::Rejected(_)
        ));
        assert!(matches!(
            gate.verify(&artifact("csv")),
            GateDecision::Rejected(_)
        ));
        assert!(matches!(
            gate.verify(&artifact("data.csv/evil.sh")),
            GateDecision::Rejected(_)
        ));
    }
}
