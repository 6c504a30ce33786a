//! Continuous worklist traversal.
//!
//! A [`TraversalEngine`] walks one user through a server-hosted worklist,
//! one item at a time. It keeps a small prefetch queue so most advances do
//! not touch the server, and a ledger of items already completed or skipped
//! so that stale server listings never hand the user the same item twice.
//!
//! The engine is synchronous and single-threaded: every source call blocks
//! the caller, and callers must serialize access to one engine.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Span, debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Classifier, WorkflowMode, WorklistItem};
use crate::preferences::PreferenceStore;
use crate::source::{WorklistContext, WorklistSource};
use crate::telemetry::{metrics, session};

use super::queue::PrefetchQueue;

/// Items requested from the source per page during a refill.
pub const PAGE_SIZE: usize = 25;

/// How the user finished with the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemResult {
    Completed,
    Skipped,
    /// The item became unusable (e.g. changed underneath the user). The
    /// session moves on without recording it, so it may be offered again.
    Invalid,
}

impl ItemResult {
    fn as_str(self) -> &'static str {
        match self {
            ItemResult::Completed => "completed",
            ItemResult::Skipped => "skipped",
            ItemResult::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for ItemResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    /// There is a current item to work on.
    Active,
    /// No current item. Terminal for this engine.
    Finished,
}

type Observer<S, P> = Box<dyn FnMut(&TraversalEngine<S, P>)>;

/// Session state for one continuous run through a worklist.
pub struct TraversalEngine<S, P> {
    source: S,
    /// `None` means the session is not bound to a worklist and never
    /// refills.
    context: Option<WorklistContext>,
    preferences: P,
    classify: Classifier,
    mode: Option<WorkflowMode>,

    current: Option<WorklistItem>,
    queue: PrefetchQueue,
    visited: Vec<WorklistItem>,

    available_count: i64,
    completed_count: u32,
    skipped_count: u32,
    is_initial_item: bool,
    continue_enabled: bool,

    observers: Vec<Observer<S, P>>,
    span: Span,
}

impl<S: WorklistSource, P: PreferenceStore> TraversalEngine<S, P> {
    /// Create an engine. Nothing is fetched and the classifier is not run
    /// until [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `prefetch_capacity` is zero.
    pub fn new(
        source: S,
        context: Option<WorklistContext>,
        preferences: P,
        classify: Classifier,
        prefetch_capacity: usize,
    ) -> Result<Self> {
        if prefetch_capacity == 0 {
            return Err(Error::Config("prefetch capacity must be at least 1".to_string()));
        }

        let span = match context {
            Some(ref ctx) => {
                session::start_session_span(&ctx.folder, Some(ctx.worklist.as_str()))
            }
            None => session::start_session_span("", None),
        };

        Ok(Self {
            source,
            context,
            preferences,
            classify,
            mode: None,
            current: None,
            queue: PrefetchQueue::new(prefetch_capacity),
            visited: Vec::new(),
            available_count: 0,
            completed_count: 0,
            skipped_count: 0,
            is_initial_item: true,
            continue_enabled: false,
            observers: Vec::new(),
            span,
        })
    }

    /// Start the session on `item`, fixing the workflow mode for its
    /// whole lifetime.
    pub fn initialize(&mut self, item: Option<WorklistItem>) -> Result<()> {
        if self.mode.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let mode = (self.classify)(item.as_ref());
        self.mode = Some(mode);
        self.continue_enabled = self.preferences.auto_advance() && mode.can_continue;
        self.is_initial_item = true;
        self.current = item;

        self.span.in_scope(|| {
            info!(
                item = %self.current.as_ref().map(|i| i.item_ref.to_string()).unwrap_or_default(),
                can_continue = mode.can_continue,
                auto_advance = self.continue_enabled,
                "session initialized"
            );
        });

        self.notify();
        Ok(())
    }

    /// Record how the current item ended and move to the next one.
    ///
    /// With auto-advance off, or when `override_auto_advance` is set, the
    /// session ends instead. A source failure during the refill is returned
    /// as is; the current item is then left in place, the queue holds
    /// whatever was fetched before the failure, and observers are still
    /// notified of the updated counters.
    pub fn proceed_to_next(
        &mut self,
        result: ItemResult,
        override_auto_advance: bool,
    ) -> Result<()> {
        let mode = self.mode.ok_or(Error::NotInitialized)?;
        let Some(finished) = self.current.as_ref() else {
            return Err(Error::SessionFinished);
        };
        let finished_ref = finished.item_ref;

        match result {
            ItemResult::Completed => {
                self.completed_count += 1;
                self.visited.push(finished.clone());
            }
            ItemResult::Skipped => {
                self.skipped_count += 1;
                self.visited.push(finished.clone());
            }
            // Not recorded: the item's true state is unknown.
            ItemResult::Invalid => {}
        }
        metrics::items_advanced().add(1, &[KeyValue::new("result", result.as_str())]);

        self.is_initial_item = false;

        if self.continue_enabled && mode.can_continue && !override_auto_advance {
            if self.queue.is_empty() {
                if let Err(e) = self.refill("advance") {
                    self.notify();
                    return Err(e);
                }
            }
            self.current = self.queue.pop();
            if self.current.is_some() {
                self.available_count -= 1;
            }
        } else {
            self.current = None;
        }

        session::record_advance(
            &self.span,
            Some(&finished_ref),
            self.current.as_ref().map(|i| &i.item_ref),
            result.as_str(),
        );

        self.notify();
        Ok(())
    }

    /// Make `new_item` the current item, pushing the old one to the back of
    /// the queue. Counters are left alone.
    ///
    /// `new_item` is taken off the visited ledger if a previous pass put it
    /// there. The queue is not checked for `new_item`, so it may end up both
    /// current and queued. If the queue is full, its newest fetched entry is
    /// dropped to make room; a later refill brings it back. Items swapped out
    /// earlier are only dropped when the queue holds nothing else.
    pub fn swap_current_item(&mut self, new_item: WorklistItem) -> Result<()> {
        if self.mode.is_none() {
            return Err(Error::NotInitialized);
        }
        let Some(old) = self.current.take() else {
            return Err(Error::SessionFinished);
        };
        if old.is_same_item(&new_item) {
            self.current = Some(old);
            return Ok(());
        }

        if let Some(pos) = self.visited.iter().position(|v| v.is_same_item(&new_item)) {
            self.visited.remove(pos);
        }

        let old_ref = old.item_ref;
        if let Some(evicted) = self.queue.push_evicting(old) {
            debug!(evicted = %evicted.item_ref, "prefetch queue full, dropped an entry");
        }

        self.span.in_scope(|| {
            info!(from = %old_ref, to = %new_item.item_ref, "current item swapped");
        });
        self.current = Some(new_item);

        self.notify();
        Ok(())
    }

    /// Mark `items` as handled without user action (e.g. folded into the
    /// current item) and rebuild the queue without them. Observers are
    /// notified even if the refill fails.
    pub fn ignore_worklist_items(&mut self, items: &[WorklistItem]) -> Result<()> {
        if self.mode.is_none() {
            return Err(Error::NotInitialized);
        }
        if items.is_empty() {
            return Ok(());
        }

        self.visited.extend_from_slice(items);
        let refilled = self.refill("ignore");

        self.notify();
        refilled
    }

    /// Turn auto-advance on or off and persist the choice.
    pub fn set_auto_advance(&mut self, enabled: bool) -> Result<()> {
        self.preferences.set_auto_advance(enabled)?;
        self.continue_enabled = enabled;
        Ok(())
    }

    /// Register an observer called after every state change. Observers
    /// read the new state through the accessors.
    pub fn on_change(&mut self, observer: impl FnMut(&Self) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn current(&self) -> Option<&WorklistItem> {
        self.current.as_ref()
    }

    pub fn mode(&self) -> Option<WorkflowMode> {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        match (self.mode, &self.current) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), Some(_)) => SessionState::Active,
            (Some(_), None) => SessionState::Finished,
        }
    }

    pub fn has_worklist_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&WorklistContext> {
        self.context.as_ref()
    }

    /// Whether the host should release its claim on an abandoned item.
    pub fn should_unclaim(&self) -> bool {
        self.mode.is_some_and(|m| m.should_unclaim)
    }

    pub fn status_text_visible(&self) -> bool {
        self.mode.is_some_and(|m| m.show_status_text) && self.has_worklist_context()
    }

    /// Folder label, plus progress once the user has moved past the first
    /// item.
    pub fn status_text(&self) -> String {
        let folder = self.context.as_ref().map_or("", |c| c.folder.as_str());
        if self.is_initial_item {
            format!("Folder: {folder}")
        } else {
            format!(
                "Folder: {folder} - Available: {}, Completed: {}, Skipped: {}",
                self.available_count, self.completed_count, self.skipped_count
            )
        }
    }

    /// The auto-advance toggle as the user last set it.
    pub fn auto_advance(&self) -> bool {
        self.continue_enabled
    }

    /// Whether the auto-advance toggle is meaningful for this session.
    pub fn auto_advance_enabled(&self) -> bool {
        self.mode.is_some_and(|m| m.can_continue) && self.has_worklist_context()
    }

    pub fn can_skip(&self) -> bool {
        self.continue_enabled && self.auto_advance_enabled()
    }

    pub fn is_initial_item(&self) -> bool {
        self.is_initial_item
    }

    pub fn available_count(&self) -> i64 {
        self.available_count
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn skipped_count(&self) -> u32 {
        self.skipped_count
    }

    pub fn visited(&self) -> &[WorklistItem] {
        &self.visited
    }

    pub fn queued(&self) -> impl Iterator<Item = &WorklistItem> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn prefetch_capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn was_visited(visited: &[WorklistItem], item: &WorklistItem) -> bool {
        visited.iter().any(|v| v.is_same_item(item))
    }

    /// Rebuild the queue from the source, skipping anything this session
    /// has already visited and correcting the available count for it.
    fn refill(&mut self, trigger: &'static str) -> Result<()> {
        let Some(ref context) = self.context else {
            debug!("no worklist context, not refilling");
            return Ok(());
        };
        let started = Instant::now();

        self.available_count = self.source.count(context)?;
        self.queue.clear();

        let mut offset = 0;
        let mut stale = 0u64;
        let mut overflow = 0usize;
        loop {
            let page = match self.source.stream(context, offset, PAGE_SIZE) {
                Ok(page) => page,
                Err(e) => {
                    warn!(offset, queued = self.queue.len(), error = %e, "refill aborted");
                    return Err(e);
                }
            };
            if page.is_empty() {
                break;
            }

            for item in page {
                if Self::was_visited(&self.visited, &item) {
                    self.available_count -= 1;
                    stale += 1;
                } else if self.queue.push(item).is_err() {
                    // Full: the rest of the page only corrects the count.
                    overflow += 1;
                }
            }

            if self.queue.is_full() {
                break;
            }
            offset += PAGE_SIZE;
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::refills().add(1, &[KeyValue::new("trigger", trigger)]);
        metrics::stale_filtered().add(stale, &[]);
        metrics::refill_duration_ms().record(elapsed_ms, &[]);

        self.span.in_scope(|| {
            debug!(
                trigger,
                queued = self.queue.len(),
                available = self.available_count,
                stale,
                overflow,
                "prefetch queue refilled"
            );
        });
        Ok(())
    }

    fn notify(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer(self);
        }
        self.observers = observers;
    }
}
