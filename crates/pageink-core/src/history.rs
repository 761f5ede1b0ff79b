//! Append-only action log with a cursor.
//!
//! Live annotations are always the replay of the applied prefix of the log.
//! Undo and redo only move the cursor; callers rebuild live state with
//! [`History::replay`].

use crate::annotation::{Annotation, AnnotationSet, PageId};
use serde::{Deserialize, Serialize};

/// Kind of logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Add,
}

/// One logged action with the annotation it applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub page_id: PageId,
    pub annotation: Annotation,
}

impl HistoryEntry {
    pub fn add(page_id: impl Into<PageId>, annotation: Annotation) -> Self {
        Self {
            action: HistoryAction::Add,
            page_id: page_id.into(),
            annotation,
        }
    }
}

/// The undo/redo log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Number of entries currently applied.
    applied: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor as the index of the last applied entry; −1 when nothing is applied.
    pub fn index(&self) -> isize {
        self.applied as isize - 1
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Record an added annotation.
    ///
    /// Entries after the cursor are discarded first; they can no longer be
    /// redone.
    pub fn append(&mut self, page_id: impl Into<PageId>, annotation: Annotation) {
        if self.applied < self.entries.len() {
            log::debug!("discarding {} redo entries", self.entries.len() - self.applied);
            self.entries.truncate(self.applied);
        }
        self.entries.push(HistoryEntry::add(page_id, annotation));
        self.applied = self.entries.len();
    }

    /// Step the cursor back. Returns false at the start of the log.
    pub fn undo(&mut self) -> bool {
        if self.applied == 0 {
            return false;
        }
        self.applied -= 1;
        true
    }

    /// Step the cursor forward. Returns false at the end of the log.
    pub fn redo(&mut self) -> bool {
        if self.applied >= self.entries.len() {
            return false;
        }
        self.applied += 1;
        true
    }

    /// Live annotations implied by the applied prefix. Grid overlays are skipped.
    pub fn replay(&self) -> AnnotationSet {
        Self::replay_entries(&self.entries[..self.applied])
    }

    /// Annotations implied by the first `count` entries.
    pub fn replay_prefix(&self, count: usize) -> AnnotationSet {
        Self::replay_entries(&self.entries[..count.min(self.entries.len())])
    }

    fn replay_entries(entries: &[HistoryEntry]) -> AnnotationSet {
        let mut set = AnnotationSet::new();
        for entry in entries {
            if entry.annotation.is_grid() {
                continue;
            }
            match entry.action {
                HistoryAction::Add => set
                    .entry(entry.page_id.clone())
                    .or_default()
                    .push(entry.annotation.clone()),
            }
        }
        set
    }

    /// Remove every entry referencing `page_id`.
    ///
    /// The cursor moves to the end of the filtered log, so this cannot be
    /// undone and any entries that had been undone elsewhere become applied
    /// again.
    pub fn clear_page(&mut self, page_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.page_id != page_id);
        self.applied = self.entries.len();
        before - self.entries.len()
    }

    /// Replace the log with one `Add` per annotation, cursor at the end.
    pub fn rebuild_from(&mut self, set: &AnnotationSet) {
        self.entries = set
            .iter()
            .flat_map(|(page, annotations)| {
                annotations
                    .iter()
                    .filter(|a| !a.is_grid())
                    .map(move |a| HistoryEntry::add(page.clone(), a.clone()))
            })
            .collect();
        self.applied = self.entries.len();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationPoint, InkColor, ToolKind};

    fn stroke(x: f64) -> Annotation {
        Annotation::new(
            ToolKind::Pen,
            InkColor::black(),
            2.0,
            1.0,
            vec![AnnotationPoint::new(x, 0.0), AnnotationPoint::new(x, 10.0)],
        )
    }

    fn count(set: &AnnotationSet) -> usize {
        set.values().map(Vec::len).sum()
    }

    #[test]
    fn test_empty() {
        let mut history = History::new();
        assert_eq!(history.index(), -1);
        assert!(!history.undo());
        assert!(!history.redo());
        assert!(history.replay().is_empty());
    }

    #[test]
    fn test_replay_prefixes() {
        let mut history = History::new();
        for i in 0..5 {
            history.append("1", stroke(i as f64));
        }
        for k in 0..5 {
            let set = history.replay_prefix(k + 1);
            assert_eq!(set["1"].len(), k + 1);
            assert_eq!(set["1"][k], stroke(k as f64));
            // Replaying again gives the same result
            assert_eq!(history.replay_prefix(k + 1), set);
        }
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        for i in 0..4 {
            history.append(if i % 2 == 0 { "1" } else { "2" }, stroke(i as f64));
        }
        let after = history.replay();
        while history.undo() {}
        assert_eq!(history.index(), -1);
        assert_eq!(count(&history.replay()), 0);
        while history.redo() {}
        assert_eq!(history.replay(), after);
        assert_eq!(history.index(), 3);
    }

    #[test]
    fn test_truncation_on_branch() {
        let mut history = History::new();
        history.append("1", stroke(1.0));
        history.append("1", stroke(2.0));
        assert!(history.undo());
        history.append("1", stroke(3.0));
        assert!(!history.redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.replay()["1"], vec![stroke(1.0), stroke(3.0)]);
    }

    #[test]
    fn test_clear_page_filters_log() {
        let mut history = History::new();
        history.append("1", stroke(1.0));
        history.append("2", stroke(2.0));
        history.append("1", stroke(3.0));
        history.append("2", stroke(4.0));
        history.undo();
        assert_eq!(history.clear_page("1"), 2);
        assert_eq!(history.index(), 1);
        // The undone entry on page 2 is applied again after the filter.
        assert_eq!(history.replay()["2"].len(), 2);
        assert!(!history.replay().contains_key("1"));
    }

    #[test]
    fn test_rebuild_skips_grid() {
        let mut set = AnnotationSet::new();
        set.insert(
            "1".to_string(),
            vec![stroke(1.0), Annotation::grid(InkColor::black(), 1.0, 10, 10), stroke(2.0)],
        );
        let mut history = History::new();
        history.rebuild_from(&set);
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert_eq!(history.replay()["1"], vec![stroke(1.0), stroke(2.0)]);
    }

    #[test]
    fn test_entry_wire_shape() {
        let json = serde_json::to_value(HistoryEntry::add("3", stroke(0.0))).unwrap();
        assert_eq!(json["action"], "add");
        assert_eq!(json["pageId"], "3");
    }
}
