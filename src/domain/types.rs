// ==========================================
// e-curatif - 领域类型定义
// ==========================================
// 依据: 维护事件生命周期 (en attente / affecté / résolu / archivé)
// 红线: 状态字符串是其他模块的过滤谓词，禁止改写
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 维护事件状态 (Info Status)
// ==========================================
// 序列化格式: snake_case (报表/API)
// 落库格式: 法文领域词汇 (见 as_db_str)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoStatus {
    Pending,  // 待处理: 无负责人、无完成日期
    Assigned, // 已分派: 有负责人、无完成日期
    Resolved, // 已解决: 有负责人、有完成日期
    Archived, // 已归档: 仅由 CRUD 层设置，导入不会派生
    Unknown,  // 未定义组合: 无负责人但有完成日期
}

impl InfoStatus {
    pub const PENDING_DB: &'static str = "en attente";
    pub const ASSIGNED_DB: &'static str = "affecté";
    pub const RESOLVED_DB: &'static str = "résolu";
    pub const ARCHIVED_DB: &'static str = "archivé";
    pub const UNKNOWN_DB: &'static str = "inconnu";

    /// 数据库中的状态字符串
    pub fn as_db_str(&self) -> &'static str {
        match self {
            InfoStatus::Pending => Self::PENDING_DB,
            InfoStatus::Assigned => Self::ASSIGNED_DB,
            InfoStatus::Resolved => Self::RESOLVED_DB,
            InfoStatus::Archived => Self::ARCHIVED_DB,
            InfoStatus::Unknown => Self::UNKNOWN_DB,
        }
    }

    /// 是否属于三种已定义的生命周期状态
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            InfoStatus::Pending | InfoStatus::Assigned | InfoStatus::Resolved
        )
    }
}

impl fmt::Display for InfoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ==========================================
// 事务策略 (Transaction Policy)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与 config_kv 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionPolicy {
    /// 逐行独立写入，单行失败不影响其他行
    #[default]
    BestEffort,
    /// 单一事务，任一行失败则整体回滚
    AllOrNothing,
}

impl fmt::Display for TransactionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionPolicy::BestEffort => write!(f, "BEST_EFFORT"),
            TransactionPolicy::AllOrNothing => write!(f, "ALL_OR_NOTHING"),
        }
    }
}

impl FromStr for TransactionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BEST_EFFORT" => Ok(TransactionPolicy::BestEffort),
            "ALL_OR_NOTHING" => Ok(TransactionPolicy::AllOrNothing),
            other => Err(format!("未知事务策略: {}", other)),
        }
    }
}

// ==========================================
// 未定义状态组合处理策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnknownStatusPolicy {
    /// 不落库，作为行级失败写入报表
    #[default]
    Reject,
    /// 以 "inconnu" 落库
    ///
    /// "inconnu" 不属于 en attente / affecté / résolu 三种生命周期状态，
    /// 按状态过滤的查询不会命中这些记录；需显式开启，落库时逐行 warn!
    Persist,
}

impl fmt::Display for UnknownStatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownStatusPolicy::Reject => write!(f, "REJECT"),
            UnknownStatusPolicy::Persist => write!(f, "PERSIST"),
        }
    }
}

impl FromStr for UnknownStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "REJECT" => Ok(UnknownStatusPolicy::Reject),
            "PERSIST" => Ok(UnknownStatusPolicy::Persist),
            other => Err(format!("未知状态策略: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_labels() {
        assert_eq!(InfoStatus::Pending.as_db_str(), "en attente");
        assert_eq!(InfoStatus::Assigned.as_db_str(), "affecté");
        assert_eq!(InfoStatus::Resolved.as_db_str(), "résolu");
        assert_eq!(InfoStatus::Archived.as_db_str(), "archivé");
        assert_eq!(InfoStatus::Unknown.to_string(), "inconnu");
    }

    #[test]
    fn test_lifecycle_statuses() {
        assert!(InfoStatus::Pending.is_lifecycle());
        assert!(InfoStatus::Assigned.is_lifecycle());
        assert!(InfoStatus::Resolved.is_lifecycle());
        assert!(!InfoStatus::Archived.is_lifecycle());
        assert!(!InfoStatus::Unknown.is_lifecycle());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "all_or_nothing".parse::<TransactionPolicy>(),
            Ok(TransactionPolicy::AllOrNothing)
        );
        assert_eq!(
            " BEST_EFFORT ".parse::<TransactionPolicy>(),
            Ok(TransactionPolicy::BestEffort)
        );
        assert!("sometimes".parse::<TransactionPolicy>().is_err());
        assert_eq!(
            "persist".parse::<UnknownStatusPolicy>(),
            Ok(UnknownStatusPolicy::Persist)
        );
    }
}
