//! Worklist item types.
//!
//! A worklist item is one unit of clinical work (a report to dictate, a
//! transcription to type, a protocol to assign). The traversal engine only
//! cares about its identity; everything else rides along for the host and
//! the mode classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Item reference
// ---------------------------------------------------------------------------

/// Reference to the entity behind a worklist item.
///
/// The server bumps `version` whenever the underlying procedure step changes,
/// so two references to the same step may differ only in version. Use
/// [`ItemRef::same_entity`] for identity, not `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: Uuid,
    pub version: u32,
}

impl ItemRef {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 0,
        }
    }

    /// Same reference at a later version.
    pub fn bumped(self) -> Self {
        Self {
            id: self.id,
            version: self.version + 1,
        }
    }

    /// Identity comparison that ignores the version suffix.
    pub fn same_entity(&self, other: &ItemRef) -> bool {
        self.id == other.id
    }
}

impl Default for ItemRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID plus version
        write!(f, "{}:{}", &self.id.to_string()[..8], self.version)
    }
}

// ---------------------------------------------------------------------------
// Step status
// ---------------------------------------------------------------------------

/// Workflow status of the procedure step behind an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Scheduled,
    InProgress,
    Suspended,
    Completed,
    Discontinued,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Scheduled => "scheduled",
            StepStatus::InProgress => "in_progress",
            StepStatus::Suspended => "suspended",
            StepStatus::Completed => "completed",
            StepStatus::Discontinued => "discontinued",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for StepStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(StepStatus::Scheduled),
            "in_progress" => Ok(StepStatus::InProgress),
            "suspended" => Ok(StepStatus::Suspended),
            "completed" => Ok(StepStatus::Completed),
            "discontinued" => Ok(StepStatus::Discontinued),
            other => Err(crate::error::Error::Other(format!(
                "unknown step status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Worklist item
// ---------------------------------------------------------------------------

/// A pending unit of work as returned by a worklist query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistItem {
    pub item_ref: ItemRef,

    /// Worklist (folder query) the item was listed under.
    pub worklist: String,

    /// Step type, e.g. "interpretation", "verification", "transcription",
    /// "protocol_assignment".
    pub procedure_step: String,

    pub status: StepStatus,

    pub scheduled_at: Option<DateTime<Utc>>,

    /// Domain attributes. Opaque to the engine.
    pub attributes: serde_json::Value,
}

impl WorklistItem {
    pub fn new(worklist: impl Into<String>, procedure_step: impl Into<String>) -> Self {
        Self {
            item_ref: ItemRef::new(),
            worklist: worklist.into(),
            procedure_step: procedure_step.into(),
            status: StepStatus::Scheduled,
            scheduled_at: None,
            attributes: serde_json::Value::Null,
        }
    }

    pub fn status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Does `other` denote the same unit of work (version-insensitive)?
    pub fn is_same_item(&self, other: &WorklistItem) -> bool {
        self.item_ref.same_entity(&other.item_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_entity_ignores_version() {
        let r = ItemRef::new();
        let later = r.bumped().bumped();
        assert_ne!(r, later);
        assert!(r.same_entity(&later));
        assert!(!r.same_entity(&ItemRef::new()));
    }

    #[test]
    fn items_compare_by_reference_only() {
        let a = WorklistItem::new("ct-reporting", "interpretation");
        let mut b = a.clone();
        b.item_ref = b.item_ref.bumped();
        b.status = StepStatus::InProgress;
        assert!(a.is_same_item(&b));
    }

    #[test]
    fn step_status_parses_its_display_form() {
        for status in [
            StepStatus::Scheduled,
            StepStatus::InProgress,
            StepStatus::Suspended,
            StepStatus::Completed,
            StepStatus::Discontinued,
        ] {
            assert_eq!(status.to_string().parse::<StepStatus>().unwrap(), status);
        }
        assert!("bogus".parse::<StepStatus>().is_err());
    }
}
