//! Remote worklist sources.
//!
//! A source answers two questions for a worklist context: roughly how many
//! items are still outstanding, and what the next page of them is. Both
//! answers may lag the client; the engine corrects for that itself.

pub mod memory;
pub mod pg;

use crate::error::Result;
use crate::model::WorklistItem;

/// Which worklist a session is traversing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklistContext {
    /// Folder label shown to the user.
    pub folder: String,
    /// Worklist identifier understood by the source.
    pub worklist: String,
    /// Restrict the query to items entered during downtime.
    pub downtime_recovery: bool,
}

impl WorklistContext {
    pub fn new(folder: impl Into<String>, worklist: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            worklist: worklist.into(),
            downtime_recovery: false,
        }
    }

    pub fn downtime_recovery(mut self, enabled: bool) -> Self {
        self.downtime_recovery = enabled;
        self
    }
}

/// Server-hosted queue of pending worklist items.
///
/// Calls block until the source answers. Implementations report failures as
/// errors and never retry on the engine's behalf.
pub trait WorklistSource {
    /// Fast approximate count of outstanding items. May overcount.
    fn count(&mut self, context: &WorklistContext) -> Result<i64>;

    /// Page of items starting at `offset`. An empty page means the stream
    /// is exhausted.
    fn stream(
        &mut self,
        context: &WorklistContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorklistItem>>;
}

impl<S: WorklistSource + ?Sized> WorklistSource for Box<S> {
    fn count(&mut self, context: &WorklistContext) -> Result<i64> {
        (**self).count(context)
    }

    fn stream(
        &mut self,
        context: &WorklistContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorklistItem>> {
        (**self).stream(context, offset, limit)
    }
}
