/// 修订历史
///
/// 记录每一次提交的修订（提交前后的替换文本），支持撤销/重做。
/// 历史只描述修订映射的变化，不涉及文档内容。
use std::time::Instant;

use crate::extract::UnitId;
use crate::utils::truncate_for_display;

/// 一次提交
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionChange {
    pub unit_id: UnitId,
    /// 提交前映射中的替换文本，`None` 表示此前没有修订
    pub previous: Option<String>,
    pub revised: String,
    pub applied_at: Instant,
}

impl RevisionChange {
    pub fn new(unit_id: UnitId, previous: Option<String>, revised: impl Into<String>) -> Self {
        Self {
            unit_id,
            previous,
            revised: revised.into(),
            applied_at: Instant::now(),
        }
    }
}

impl std::fmt::Display for RevisionChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] \"{}\" -> \"{}\"",
            self.unit_id,
            self.previous
                .as_deref()
                .map(|text| truncate_for_display(text, 30))
                .unwrap_or_else(|| "(原文)".to_string()),
            truncate_for_display(&self.revised, 30)
        )
    }
}

/// 撤销/重做栈
///
/// 所有提交按时间顺序保存在 `changes` 中，两个栈只保存索引。
/// 新提交会清空重做栈。
#[derive(Debug, Clone, Default)]
pub struct RevisionHistory {
    changes: Vec<RevisionChange>,
    undo_stack: Vec<usize>,
    redo_stack: Vec<usize>,
}

impl RevisionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, change: RevisionChange) {
        let index = self.changes.len();
        self.changes.push(change);
        self.undo_stack.push(index);
        self.redo_stack.clear();
    }

    /// 弹出最近一次有效提交
    pub fn undo(&mut self) -> Option<&RevisionChange> {
        let index = self.undo_stack.pop()?;
        self.redo_stack.push(index);
        Some(&self.changes[index])
    }

    /// 恢复最近一次撤销的提交
    pub fn redo(&mut self) -> Option<&RevisionChange> {
        let index = self.redo_stack.pop()?;
        self.undo_stack.push(index);
        Some(&self.changes[index])
    }

    /// 有效提交数（不含已撤销的）
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// 按提交顺序遍历有效提交
    pub fn iter(&self) -> impl Iterator<Item = &RevisionChange> {
        self.undo_stack.iter().map(|&index| &self.changes[index])
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// 某个单元的有效提交
    pub fn changes_for(&self, unit_id: &UnitId) -> Vec<&RevisionChange> {
        self.iter().filter(|change| &change.unit_id == unit_id).collect()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn summary(&self) -> String {
        format!(
            "提交总数: {}, 有效提交: {}, 可撤销: {}, 可重做: {}",
            self.changes.len(),
            self.undo_stack.len(),
            self.can_undo(),
            self.can_redo()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(block: usize, previous: Option<&str>, revised: &str) -> RevisionChange {
        RevisionChange::new(
            UnitId::new("ch.xhtml", block, 0),
            previous.map(str::to_string),
            revised,
        )
    }

    #[test]
    fn test_undo_redo_order() {
        let mut history = RevisionHistory::new();
        history.record(change(1, None, "a"));
        history.record(change(2, None, "b"));
        history.record(change(3, None, "c"));
        assert_eq!(history.len(), 3);

        assert_eq!(history.undo().unwrap().unit_id.block_index, 3);
        assert_eq!(history.undo().unwrap().unit_id.block_index, 2);
        assert_eq!(history.len(), 1);

        assert_eq!(history.redo().unwrap().unit_id.block_index, 2);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = RevisionHistory::new();
        history.record(change(1, None, "a"));
        history.undo();
        assert!(history.can_redo());

        history.record(change(2, None, "b"));
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_empty_history() {
        let mut history = RevisionHistory::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_changes_for_unit() {
        let mut history = RevisionHistory::new();
        history.record(change(1, None, "first"));
        history.record(change(2, None, "other"));
        history.record(change(1, Some("first"), "second"));

        let changes = history.changes_for(&UnitId::new("ch.xhtml", 1, 0));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].previous.as_deref(), Some("first"));
    }

    #[test]
    fn test_display_and_summary() {
        let mut history = RevisionHistory::new();
        history.record(change(4, None, "new text"));
        assert_eq!(
            history.iter().next().unwrap().to_string(),
            "[ch.xhtml#4-0] \"(原文)\" -> \"new text\""
        );

        history.undo();
        let summary = history.summary();
        assert!(summary.contains("提交总数: 1"));
        assert!(summary.contains("有效提交: 0"));
        history.clear();
        assert!(!history.can_redo());
    }
}
