//! Core data model.
//!
//! A worklist item is something a user needs to work on. It has identity
//! (an entity reference tolerant of version bumps) and pass-through domain
//! attributes. A workflow mode is the per-session policy derived from the
//! first item of a session.

pub mod item;
pub mod mode;

pub use item::{ItemRef, StepStatus, WorklistItem};
pub use mode::{Classifier, WorkflowMode};
