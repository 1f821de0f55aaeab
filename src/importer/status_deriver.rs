// ==========================================
// e-curatif - 状态派生
// ==========================================
// 规则（按序判定）:
// | target | day_done | 结果     |
// |--------|----------|----------|
// | 空     | 空       | Pending  |
// | 非空   | 空       | Assigned |
// | 非空   | 非空     | Resolved |
// | 空     | 非空     | Unknown  |
// 红线: 状态每行重新计算，从不读取源文件中的状态
// ==========================================

use crate::domain::InfoStatus;

/// 派生生命周期状态（纯函数）
///
/// 仅含空白字符的单元格视为空
pub fn derive(target: &str, day_done: &str) -> InfoStatus {
    let has_target = !target.trim().is_empty();
    let has_day_done = !day_done.trim().is_empty();

    match (has_target, has_day_done) {
        (false, false) => InfoStatus::Pending,
        (true, false) => InfoStatus::Assigned,
        (true, true) => InfoStatus::Resolved,
        (false, true) => InfoStatus::Unknown,
    }
}
