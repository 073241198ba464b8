//! 状态追踪器 - 业务能力层
//!
//! 维护 incomplete / active / done 三个索引集合，判定批次是否完成。
//! 不变量：`active ⊆ incomplete`，`done ∩ incomplete = ∅`，`|incomplete| + |done| = N`

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    incomplete: BTreeSet<usize>,
    active: BTreeSet<usize>,
    done: BTreeSet<usize>,
}

impl StateTracker {
    pub fn new(total_files: usize) -> Self {
        Self {
            incomplete: (0..total_files).collect(),
            active: BTreeSet::new(),
            done: BTreeSet::new(),
        }
    }

    /// 标记开始上传，返回是否发生了变化
    pub fn on_start(&mut self, index: usize) -> bool {
        if !self.incomplete.contains(&index) {
            return false;
        }
        self.active.insert(index)
    }

    /// 标记进入终态，返回是否发生了变化
    ///
    /// 开始前取消的文件不在 active 中，移除时自然是空操作
    pub fn on_terminal(&mut self, index: usize) -> bool {
        if !self.incomplete.remove(&index) {
            return false;
        }
        self.active.remove(&index);
        self.done.insert(index)
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }

    pub fn incomplete_count(&self) -> usize {
        self.incomplete.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(tracker: &StateTracker, total: usize) {
        assert!(tracker.active.is_subset(&tracker.incomplete));
        assert!(tracker.done.is_disjoint(&tracker.incomplete));
        assert_eq!(tracker.incomplete_count() + tracker.done_count(), total);
    }

    #[test]
    fn test_lifecycle_keeps_invariants() {
        let mut tracker = StateTracker::new(3);
        assert_invariants(&tracker, 3);
        assert!(!tracker.is_complete());

        assert!(tracker.on_start(0));
        assert!(tracker.on_start(1));
        assert_eq!(tracker.active_count(), 2);
        assert_invariants(&tracker, 3);

        assert!(tracker.on_terminal(0));
        assert!(tracker.on_terminal(2)); // 开始前取消
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.done_count(), 2);
        assert_invariants(&tracker, 3);

        assert!(tracker.on_terminal(1));
        assert!(tracker.is_complete());
        assert_invariants(&tracker, 3);
    }

    #[test]
    fn test_terminal_state_never_reopens() {
        let mut tracker = StateTracker::new(1);
        tracker.on_start(0);
        tracker.on_terminal(0);

        assert!(!tracker.on_start(0));
        assert!(!tracker.on_terminal(0));
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.done_count(), 1);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        assert!(StateTracker::new(0).is_complete());
    }
}
