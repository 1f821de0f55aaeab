// ==========================================
// e-curatif - 维护事件领域模型
// ==========================================
// 依据: info / source 表结构
// ==========================================

use crate::domain::types::InfoStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Source - 设备/地点
// ==========================================
// 用途: CRUD 层维护，导入管道只读（名称 → ID）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,      // 主键
    pub name: String, // 显示名称（导入文件首格）
}

// ==========================================
// CandidateRecord - 待落库的维护事件
// ==========================================
// 用途: RawRow 的类型化投影，逐行生成，落库后即丢弃
// 对齐: info 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    // ===== 元信息 =====
    pub row_index: usize, // 原始文件行号（从 0 开始）
    pub source_id: i64,   // 所属 Source（整个导入共享）

    // ===== 事件内容 =====
    pub agent: String,
    pub event: String,
    pub created: NaiveDate, // 源格式 DD/MM/YYYY
    pub material: String,
    pub detail: String,
    pub target: String,   // 负责人
    pub day_done: String, // 完成日期（原样保留）
    pub priority: i32,
    pub estimate: String,
    pub oups: String,
    pub brips: String,
    pub ameps: String,

    // ===== 派生字段 =====
    pub status: InfoStatus,
}
