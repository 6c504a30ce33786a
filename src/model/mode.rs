//! Per-session workflow modes and the classifiers that choose them.
//!
//! A mode is chosen once, from the item a session starts with, and holds
//! for every item visited afterwards.

use serde::{Deserialize, Serialize};

use super::item::{StepStatus, WorklistItem};

/// Capability flags for one traversal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowMode {
    /// Release the server-side claim when the user abandons an item.
    pub should_unclaim: bool,
    /// Show folder progress text to the user.
    pub show_status_text: bool,
    /// Advancing to the next item is allowed at all.
    pub can_continue: bool,
}

impl WorkflowMode {
    /// Working freshly claimed items from a folder, one after another.
    pub const ASSIGNED: WorkflowMode = WorkflowMode {
        should_unclaim: true,
        show_status_text: true,
        can_continue: true,
    };

    /// Picking up an item the user already owns; keep going afterwards.
    pub const RESUME: WorkflowMode = WorkflowMode {
        should_unclaim: false,
        show_status_text: true,
        can_continue: true,
    };

    /// Opening a single item for editing. No continuation.
    pub const EDIT: WorkflowMode = WorkflowMode {
        should_unclaim: false,
        show_status_text: false,
        can_continue: false,
    };
}

/// Picks the session mode from the initial item. Must handle `None`.
pub type Classifier = fn(Option<&WorklistItem>) -> WorkflowMode;

fn step_is(item: &WorklistItem, step: &str) -> bool {
    item.procedure_step.eq_ignore_ascii_case(step)
}

/// Reporting: scheduled interpretation, transcription review and
/// verification steps are worked as a continuous folder run.
pub fn reporting_mode(item: Option<&WorklistItem>) -> WorkflowMode {
    let Some(item) = item else {
        return WorkflowMode::EDIT;
    };

    let continuous_step = step_is(item, "interpretation")
        || step_is(item, "transcription_review")
        || step_is(item, "verification");

    if item.status == StepStatus::Scheduled && continuous_step {
        WorkflowMode::ASSIGNED
    } else {
        WorkflowMode::EDIT
    }
}

/// Transcription: only scheduled items continue.
pub fn transcription_mode(item: Option<&WorklistItem>) -> WorkflowMode {
    match item {
        Some(item) if item.status == StepStatus::Scheduled => WorkflowMode::ASSIGNED,
        _ => WorkflowMode::EDIT,
    }
}

/// Protocolling: scheduled items are claimed; items already in progress
/// are resumed without releasing the claim on the way out.
pub fn protocolling_mode(item: Option<&WorklistItem>) -> WorkflowMode {
    match item.map(|i| i.status) {
        Some(StepStatus::Scheduled) => WorkflowMode::ASSIGNED,
        Some(StepStatus::InProgress) => WorkflowMode::RESUME,
        _ => WorkflowMode::EDIT,
    }
}
