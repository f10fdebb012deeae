//! Fixed-capacity ring buffer of recently played tracks (§3, §4.C).

use std::collections::HashSet;
use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::model::{Track, TrackId};

/// One retained play, newest entries live at the back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Track identity.
    pub identity: TrackId,
    /// Display title.
    pub title: String,
}

impl From<&Track> for HistoryEntry {
    fn from(track: &Track) -> Self {
        Self {
            identity: track.identity.clone(),
            title: track.title.clone(),
        }
    }
}

/// Ring buffer of recent starts, newest last, bounded to a fixed capacity.
pub struct History {
    capacity: usize,
    entries: RwLock<VecDeque<HistoryEntry>>,
}

impl History {
    /// Creates a history ring buffer with the given capacity (§6
    /// `history_size`, default 50). A capacity of 0 is treated as 1 to avoid
    /// a buffer that can never retain anything.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Records a newly started track, evicting the oldest entry if full.
    pub fn record(&self, entry: HistoryEntry) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns up to `k` most recent entries, in chronological order
    /// (oldest of the selected window first).
    #[must_use]
    pub fn get_recent(&self, k: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.read();
        let skip = entries.len().saturating_sub(k);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Returns the set of currently-retained identities.
    #[must_use]
    pub fn all_identities(&self) -> HashSet<TrackId> {
        self.entries.read().iter().map(|e| e.identity.clone()).collect()
    }

    /// Whether `identity` is currently retained in history.
    #[must_use]
    pub fn contains(&self, identity: &TrackId) -> bool {
        self.entries.read().iter().any(|e| &e.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str) -> HistoryEntry {
        HistoryEntry {
            identity: TrackId::new(id),
            title: title.into(),
        }
    }

    #[test]
    fn record_evicts_oldest_when_full() {
        let h = History::new(2);
        h.record(entry("a", "A"));
        h.record(entry("b", "B"));
        h.record(entry("c", "C"));
        let all = h.all_identities();
        assert!(!all.contains(&TrackId::new("a")));
        assert!(all.contains(&TrackId::new("b")));
        assert!(all.contains(&TrackId::new("c")));
    }

    #[test]
    fn get_recent_returns_chronological_order() {
        let h = History::new(10);
        h.record(entry("a", "A"));
        h.record(entry("b", "B"));
        h.record(entry("c", "C"));
        let recent = h.get_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "B");
        assert_eq!(recent[1].title, "C");
    }

    #[test]
    fn contains_reflects_retained_entries() {
        let h = History::new(1);
        h.record(entry("a", "A"));
        assert!(h.contains(&TrackId::new("a")));
        h.record(entry("b", "B"));
        assert!(!h.contains(&TrackId::new("a")));
    }
}
