// ==========================================
// e-curatif - 上传文件归档
// ==========================================
// 规则:
// - 先写入归档目录内的临时文件，导入完成后才落为正式文件
// - 导入中止/取消时临时文件随 drop 删除，不留残件
// - 文件名: <import_id>_<清洗后的原文件名>，不覆盖已有文件
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ArtifactArchiver {
    dir: PathBuf,
}

impl ArtifactArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 暂存规范化后的内容
    pub fn stage(
        &self,
        import_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> ImportResult<StagedArchive> {
        std::fs::create_dir_all(&self.dir)?;

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;

        let target = self
            .dir
            .join(format!("{}_{}", import_id, sanitize_file_name(file_name)));

        Ok(StagedArchive { temp, target })
    }
}

/// 已暂存、尚未提交的归档
pub struct StagedArchive {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedArchive {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// 提交为正式文件（目标已存在时失败，不覆盖）
    pub fn commit(self) -> ImportResult<PathBuf> {
        self.temp
            .persist_noclobber(&self.target)
            .map_err(|e| ImportError::Archive(format!("{}: {}", self.target.display(), e.error)))?;
        Ok(self.target)
    }
}

/// 清洗客户端提供的文件名
///
/// - 去掉路径分量
/// - 仅保留字母数字与 `.` `-` `_`，其余替换为 `_`
/// - 去掉前导 `.`
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload.csv".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("export.csv"), "export.csv");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\relevé mars.csv"), "relevé_mars.csv");
        assert_eq!(sanitize_file_name("a;rm -rf.csv"), "a_rm_-rf.csv");
        assert_eq!(sanitize_file_name("..."), "upload.csv");
        assert_eq!(sanitize_file_name(""), "upload.csv");
    }

    #[test]
    fn test_stage_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = ArtifactArchiver::new(dir.path().join("csv"));

        let staged = archiver.stage("imp-1", "export.csv", b"Pompe\n").unwrap();
        let path = staged.commit().unwrap();

        assert_eq!(path.file_name().unwrap(), "imp-1_export.csv");
        assert_eq!(std::fs::read(&path).unwrap(), b"Pompe\n");
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());

        let staged = archiver.stage("imp-2", "export.csv", b"x").unwrap();
        drop(staged);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = ArtifactArchiver::new(dir.path());
        std::fs::write(dir.path().join("imp-3_export.csv"), b"old").unwrap();

        let staged = archiver.stage("imp-3", "export.csv", b"new").unwrap();
        assert!(staged.commit().is_err());
        assert_eq!(
            std::fs::read(dir.path().join("imp-3_export.csv")).unwrap(),
            b"old"
        );
    }
}
