//! # worklist-rs
//!
//! Continuous traversal of server-hosted worklists.
//!
//! A [`TraversalEngine`](engine::TraversalEngine) walks a user through a
//! remote queue of pending work one item at a time. It prefetches a bounded
//! number of items, filters out items the server still lists after the user
//! finished them, and keeps per-session completed/skipped counts. Sources
//! plug in through [`WorklistSource`](source::WorklistSource); a Postgres
//! adapter (SQLx) and an in-memory one ship with the crate.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod preferences;
pub mod source;
pub mod telemetry;
