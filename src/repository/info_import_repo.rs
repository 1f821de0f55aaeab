// ==========================================
// e-curatif - 维护事件导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{CandidateRecord, ImportBatch};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// InfoImportRepository Trait
// ==========================================
// 用途: 导入管道的存储协作方
// 实现者: InfoImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait InfoImportRepository: Send + Sync {
    // ===== Source 查询（只读）=====

    /// 按名称查找 Source ID
    ///
    /// # 返回
    /// - Ok(Some(id)): 找到
    /// - Ok(None): 不存在
    /// - Err: 数据库错误
    async fn find_source_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>>;

    // ===== Info 写入 =====

    /// 插入单条维护事件
    ///
    /// # 返回
    /// - Ok(i64): 新记录 ID
    async fn insert_info(&self, record: &CandidateRecord) -> RepositoryResult<i64>;

    /// 在单一事务中插入全部记录
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 与输入顺序一致的新记录 ID
    /// - Err(BatchRowFailed): 某一行失败，事务已回滚，无任何记录落库
    async fn insert_info_batch_atomic(
        &self,
        records: &[CandidateRecord],
    ) -> RepositoryResult<Vec<i64>>;

    // ===== 批次日志 =====

    /// 写入导入批次日志
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 统计 =====

    /// 统计 Source 下未关闭（非 résolu / archivé）的记录数
    async fn count_open_infos(&self, source_id: i64) -> RepositoryResult<i64>;

    /// 统计 Source 下的全部记录数
    async fn count_infos(&self, source_id: i64) -> RepositoryResult<i64>;
}
