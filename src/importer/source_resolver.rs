// ==========================================
// e-curatif - Source 解析
// ==========================================
// 红线: 每次导入只查一次，且在任何行映射之前
// ==========================================

use crate::domain::Source;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::InfoImportRepository;
use tracing::{info, warn};

pub struct SourceResolver<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> SourceResolver<'a, R>
where
    R: InfoImportRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// 名称 → Source
    ///
    /// # 返回
    /// - Ok(Source)
    /// - Err(EntityNotFound): 名称不存在，导入中止
    /// - Err(Repository): 查询失败
    pub async fn resolve(&self, entity_name: &str) -> ImportResult<Source> {
        match self.repo.find_source_id_by_name(entity_name).await? {
            Some(id) => {
                info!(entity_name = %entity_name, source_id = id, "Source 已解析");
                Ok(Source {
                    id,
                    name: entity_name.to_string(),
                })
            }
            None => {
                warn!(entity_name = %entity_name, "Source 不存在，导入中止");
                Err(ImportError::EntityNotFound {
                    name: entity_name.to_string(),
                })
            }
        }
    }
}
