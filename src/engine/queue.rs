//! Bounded local prefetch queue.

use std::collections::VecDeque;

use crate::model::WorklistItem;

/// How an entry got into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Fetched from the source; a later refill can fetch it again.
    Refill,
    /// Swapped out of the current slot. The host may still hold a claim on
    /// it, which hides it from the source.
    Swapped,
}

/// FIFO of not-yet-delivered items, never longer than its capacity.
#[derive(Debug, Clone)]
pub struct PrefetchQueue {
    items: VecDeque<(WorklistItem, Origin)>,
    capacity: usize,
}

impl PrefetchQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Append to the back. Returns the item back if the queue is full.
    pub fn push(&mut self, item: WorklistItem) -> Result<(), WorklistItem> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back((item, Origin::Refill));
        Ok(())
    }

    /// Append an item swapped out of the current slot. If the queue is full,
    /// the newest fetched entry is evicted first; swapped entries go only
    /// when nothing else is left.
    pub fn push_evicting(&mut self, item: WorklistItem) -> Option<WorklistItem> {
        let evicted = if self.is_full() {
            let victim = self
                .items
                .iter()
                .rposition(|(_, origin)| *origin == Origin::Refill)
                .or_else(|| self.items.len().checked_sub(1));
            victim.and_then(|pos| self.items.remove(pos)).map(|(i, _)| i)
        } else {
            None
        };
        self.items.push_back((item, Origin::Swapped));
        evicted
    }

    pub fn pop(&mut self) -> Option<WorklistItem> {
        self.items.pop_front().map(|(item, _)| item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorklistItem> {
        self.items.iter().map(|(item, _)| item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> WorklistItem {
        WorklistItem::new("", "interpretation")
    }

    #[test]
    fn push_refuses_past_capacity() {
        let mut q = PrefetchQueue::new(2);
        assert!(q.push(item()).is_ok());
        assert!(q.push(item()).is_ok());
        assert!(q.is_full());
        assert!(q.push(item()).is_err());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn push_evicting_spares_swapped_entries() {
        let (a, b, c, d) = (item(), item(), item(), item());
        let mut q = PrefetchQueue::new(3);
        q.push(a.clone()).unwrap();
        q.push(b.clone()).unwrap();
        assert!(q.push_evicting(c.clone()).is_none());

        let evicted = q.push_evicting(d.clone()).expect("queue was full");
        assert!(evicted.is_same_item(&b));
        let order: Vec<_> = q.iter().map(|i| i.item_ref.id).collect();
        assert_eq!(order, vec![a.item_ref.id, c.item_ref.id, d.item_ref.id]);
    }

    #[test]
    fn push_evicting_drops_newest_swapped_when_nothing_was_fetched() {
        let (a, b) = (item(), item());
        let mut q = PrefetchQueue::new(1);
        assert!(q.push_evicting(a.clone()).is_none());

        let evicted = q.push_evicting(b.clone()).expect("queue was full");
        assert!(evicted.is_same_item(&a));
        assert!(q.pop().unwrap().is_same_item(&b));
    }

    #[test]
    fn push_evicting_drops_newest_and_keeps_order() {
        let (a, b, c) = (item(), item(), item());
        let mut q = PrefetchQueue::new(2);
        q.push(a.clone()).unwrap();
        q.push(b.clone()).unwrap();

        let evicted = q.push_evicting(c.clone()).expect("queue was full");
        assert!(evicted.is_same_item(&b));
        assert_eq!(q.len(), 2);
        assert!(q.pop().unwrap().is_same_item(&a));
        assert!(q.pop().unwrap().is_same_item(&c));
        assert!(q.pop().is_none());
    }
}
