//! Webhook event payload shapes.
//!
//! The orchestrator's webhook does not carry a full app definition on every
//! event (that would require REST polling this bridge deliberately avoids),
//! so the two event payloads this bridge understands embed exactly the task
//! and app fields `register`/`deregister_by_task` need. This is documented
//! as an explicit design decision in DESIGN.md.

use serde::{Deserialize, Serialize};

use super::app::App;
use super::task::Task;

/// The event-type literal the decoder looks for inside a `status_update_event`
/// body.
pub const TASK_RUNNING: &str = "TASK_RUNNING";
pub const TASK_KILLED: &str = "TASK_KILLED";
pub const TASK_FAILED: &str = "TASK_FAILED";
pub const TASK_LOST: &str = "TASK_LOST";
pub const TASK_FINISHED: &str = "TASK_FINISHED";

/// The classified, but not yet fully parsed, shape of a webhook body.
/// Carries the raw bytes so full parsing can be deferred to the reconciler —
/// an `Unsupported` event costs no parse work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    StatusUpdate,
    HealthStatusChanged,
    Unsupported,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusUpdate => "status_update_event",
            Self::HealthStatusChanged => "health_status_changed_event",
            Self::Unsupported => "unsupported",
        }
    }
}

/// A parsed `status_update_event`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdateEvent {
    pub task_id: String,
    pub task_status: String,
    /// `true` when the orchestrator reports the task's health checks as
    /// passing, `None` when the task has no health checks defined at all
    /// (both are treated as "OK").
    #[serde(default)]
    pub health_ok: Option<bool>,
    pub task: Task,
    pub app: App,
}

impl StatusUpdateEvent {
    /// Register on `TASK_RUNNING` with health OK (or undefined); deregister
    /// on any terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.task_status.as_str(),
            TASK_KILLED | TASK_FAILED | TASK_LOST | TASK_FINISHED
        )
    }

    pub fn is_running_and_healthy(&self) -> bool {
        self.task_status == TASK_RUNNING && self.health_ok != Some(false)
    }
}

/// A parsed `health_status_changed_event`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatusChangedEvent {
    pub task_id: String,
    pub alive: bool,
    pub task: Task,
    pub app: App,
}
