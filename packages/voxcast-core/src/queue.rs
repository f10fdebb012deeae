//! Per-guild ordered queue of pending [`QueueItem`]s (§3, §4.C).
//!
//! Short critical sections only — the mutex is never held across a
//! suspension point, per §5's shared-resource policy.

use parking_lot::Mutex;
use rand::seq::SliceRandom;

use crate::error::{VoxError, VoxResult};
use crate::model::QueueItem;

/// Mutex-guarded FIFO queue of queue items for one guild.
#[derive(Default)]
pub struct Queue {
    items: Mutex<Vec<QueueItem>>,
}

impl Queue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to the back of the queue.
    pub fn add(&self, item: QueueItem) {
        self.items.lock().push(item);
    }

    /// Prepends an item to the front of the queue. Used by recovery to
    /// re-insert a fresh, reader-less item ahead of whatever remains (§4.C).
    pub fn prepend(&self, item: QueueItem) {
        self.items.lock().insert(0, item);
    }

    /// Removes and returns the title of the item at 1-based position `i`
    /// (defaults to 1, the head).
    ///
    /// # Errors
    ///
    /// Returns [`VoxError::QueueUnderflow`] if `i` is out of range or the
    /// queue is empty.
    pub fn remove(&self, i: usize) -> VoxResult<String> {
        let mut items = self.items.lock();
        let index = i.saturating_sub(1);
        if index >= items.len() {
            return Err(VoxError::QueueUnderflow {
                reason: format!("remove({i}) on queue of length {}", items.len()),
            });
        }
        Ok(items.remove(index).track.title)
    }

    /// Drops all items.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Randomizes order, preserving the head when `preserve_head` is set
    /// (i.e. something is currently playing). Returns the number of items
    /// shuffled (excluding the preserved head).
    pub fn shuffle(&self, preserve_head: bool) -> usize {
        let mut items = self.items.lock();
        if items.is_empty() {
            return 0;
        }
        let mut rng = rand::rng();
        if preserve_head && items.len() > 1 {
            items[1..].shuffle(&mut rng);
            items.len() - 1
        } else {
            items.shuffle(&mut rng);
            items.len()
        }
    }

    /// Returns the title of the head item, if any, without removing it.
    #[must_use]
    pub fn peek_next_title(&self) -> Option<String> {
        self.items.lock().first().map(|i| i.track.title.clone())
    }

    /// Removes and returns the head item.
    pub fn pop_front(&self) -> Option<QueueItem> {
        let mut items = self.items.lock();
        if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        }
    }

    /// Runs `f` against the head item (without removing it), if any.
    pub fn with_head<R>(&self, f: impl FnOnce(&QueueItem) -> R) -> Option<R> {
        self.items.lock().first().map(f)
    }

    /// Runs `f` against the head item mutably (without removing it), if any.
    pub fn with_head_mut<R>(&self, f: impl FnOnce(&mut QueueItem) -> R) -> Option<R> {
        self.items.lock().first_mut().map(f)
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue currently has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Whether any item in the queue (by identity) matches `identity`.
    #[must_use]
    pub fn contains_identity(&self, identity: &crate::model::TrackId) -> bool {
        self.items.lock().iter().any(|i| &i.track.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Requester, Track, TrackId};

    fn item(id: &str, title: &str) -> QueueItem {
        QueueItem::fresh(
            Track {
                identity: TrackId::new(id),
                title: title.into(),
            },
            Requester::User {
                id: "u1".into(),
                name: None,
            },
            0,
        )
    }

    #[test]
    fn add_and_pop_preserve_fifo_order() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        q.add(item("b", "Track B"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop_front().unwrap().track.title, "Track A");
        assert_eq!(q.pop_front().unwrap().track.title, "Track B");
        assert!(q.pop_front().is_none());
    }

    #[test]
    fn remove_on_empty_queue_is_underflow() {
        let q = Queue::new();
        assert!(q.remove(1).is_err());
    }

    #[test]
    fn remove_is_one_based() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        q.add(item("b", "Track B"));
        let removed = q.remove(2).unwrap();
        assert_eq!(removed, "Track B");
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn clear_drops_all_items() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn shuffle_preserving_head_keeps_first_item() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        q.add(item("b", "Track B"));
        q.add(item("c", "Track C"));
        let shuffled = q.shuffle(true);
        assert_eq!(shuffled, 2);
        assert_eq!(q.peek_next_title().unwrap(), "Track A");
    }

    #[test]
    fn prepend_places_item_at_front() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        q.prepend(item("z", "Track Z"));
        assert_eq!(q.peek_next_title().unwrap(), "Track Z");
    }

    #[test]
    fn contains_identity_checks_all_items() {
        let q = Queue::new();
        q.add(item("a", "Track A"));
        assert!(q.contains_identity(&TrackId::new("a")));
        assert!(!q.contains_identity(&TrackId::new("b")));
    }
}
