//! Traversal engine: session lifecycle, prefetching, visited-item accounting.

pub mod queue;
pub mod traversal;

pub use queue::PrefetchQueue;
pub use traversal::{ItemResult, PAGE_SIZE, SessionState, TraversalEngine};
