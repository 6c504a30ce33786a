//! In-process worklist source.
//!
//! Holds the available items in a `Vec` in listing order. Used for offline
//! sessions and to drive the engine in tests: it counts every call and can
//! be told to fail a specific page.

use crate::error::{Error, Result};
use crate::model::{ItemRef, WorklistItem};

use super::{WorklistContext, WorklistSource};

#[derive(Debug, Default)]
pub struct MemoryWorklistSource {
    items: Vec<WorklistItem>,
    /// Extra items the count reports but the stream never yields.
    count_skew: i64,
    fail_count: bool,
    fail_at_offset: Option<usize>,
    count_calls: usize,
    stream_calls: usize,
}

impl MemoryWorklistSource {
    pub fn new(items: Vec<WorklistItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Items are listed only for contexts naming their worklist; an empty
    /// worklist name on an item matches every context.
    fn matching<'a>(
        &'a self,
        context: &'a WorklistContext,
    ) -> impl Iterator<Item = &'a WorklistItem> {
        self.items
            .iter()
            .filter(move |i| i.worklist.is_empty() || i.worklist == context.worklist)
    }

    pub fn push(&mut self, item: WorklistItem) {
        self.items.push(item);
    }

    /// Drop an item from the listing, e.g. once the server has caught up
    /// with its completion.
    pub fn remove(&mut self, item_ref: &ItemRef) -> Option<WorklistItem> {
        let pos = self
            .items
            .iter()
            .position(|i| i.item_ref.same_entity(item_ref))?;
        Some(self.items.remove(pos))
    }

    pub fn items(&self) -> &[WorklistItem] {
        &self.items
    }

    /// Make `count` overreport by `skew` items.
    pub fn with_count_skew(mut self, skew: i64) -> Self {
        self.count_skew = skew;
        self
    }

    /// Make the next `count` call fail.
    pub fn fail_next_count(&mut self) {
        self.fail_count = true;
    }

    /// Make the next `stream` call for this offset fail.
    pub fn fail_stream_at(&mut self, offset: usize) {
        self.fail_at_offset = Some(offset);
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls
    }

    /// Total remote round trips so far.
    pub fn calls(&self) -> usize {
        self.count_calls + self.stream_calls
    }
}

impl WorklistSource for MemoryWorklistSource {
    fn count(&mut self, context: &WorklistContext) -> Result<i64> {
        self.count_calls += 1;
        if std::mem::take(&mut self.fail_count) {
            return Err(Error::Remote(format!(
                "count unavailable for worklist {}",
                context.worklist
            )));
        }
        Ok(self.matching(context).count() as i64 + self.count_skew)
    }

    fn stream(
        &mut self,
        context: &WorklistContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorklistItem>> {
        self.stream_calls += 1;
        if self.fail_at_offset == Some(offset) {
            self.fail_at_offset = None;
            return Err(Error::Remote(format!(
                "page at offset {offset} unavailable for worklist {}",
                context.worklist
            )));
        }
        Ok(self
            .matching(context)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<WorklistItem> {
        (0..n)
            .map(|_| WorklistItem::new("mr-reporting", "interpretation"))
            .collect()
    }

    #[test]
    fn pages_walk_the_listing() {
        let mut source = MemoryWorklistSource::new(items(5));
        let ctx = WorklistContext::new("MR", "mr-reporting");

        assert_eq!(source.stream(&ctx, 0, 2).unwrap().len(), 2);
        assert_eq!(source.stream(&ctx, 4, 2).unwrap().len(), 1);
        assert!(source.stream(&ctx, 6, 2).unwrap().is_empty());
        assert_eq!(source.stream_calls(), 3);
    }

    #[test]
    fn other_worklists_are_filtered_out() {
        let mut all = items(2);
        all.push(WorklistItem::new("ct-reporting", "interpretation"));
        let mut source = MemoryWorklistSource::new(all);

        let ctx = WorklistContext::new("MR", "mr-reporting");
        assert_eq!(source.count(&ctx).unwrap(), 2);
        assert_eq!(source.stream(&ctx, 0, 25).unwrap().len(), 2);
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut source = MemoryWorklistSource::new(items(3));
        let ctx = WorklistContext::new("MR", "mr-reporting");

        source.fail_next_count();
        assert!(matches!(source.count(&ctx), Err(Error::Remote(_))));
        assert_eq!(source.count(&ctx).unwrap(), 3);

        source.fail_stream_at(0);
        assert!(source.stream(&ctx, 0, 25).is_err());
        assert_eq!(source.stream(&ctx, 0, 25).unwrap().len(), 3);
    }

    #[test]
    fn remove_matches_any_version() {
        let all = items(2);
        let target = all[1].item_ref.bumped();
        let mut source = MemoryWorklistSource::new(all);

        assert!(source.remove(&target).is_some());
        assert_eq!(source.items().len(), 1);
        assert!(source.remove(&target).is_none());
    }
}
