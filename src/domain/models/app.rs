//! Orchestrator-owned deployment unit and its port/health-check metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::Task;

/// One labelled port an app's tasks expose, as declared by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortDefinition {
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Protocol of an orchestrator health check, prior to translation into a
/// registry [`super::service::Check`]. Unrecognized protocol strings parse
/// into `Unknown` rather than failing the whole event: a health check with
/// an invalid protocol is silently dropped by `translate_check`, but the
/// task it belongs to still registers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthCheckProtocol {
    Http,
    Https,
    Tcp,
    Command,
    #[serde(other)]
    Unknown,
}

/// An orchestrator-declared health check, addressed by `port_index` into the
/// owning task's `ports`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckDefinition {
    pub protocol: HealthCheckProtocol,
    pub port_index: usize,
    #[serde(default)]
    pub path: String,
    /// Only meaningful for `Command` checks.
    #[serde(default)]
    pub command: String,
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
}

/// A deployment unit owned by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub port_definitions: Vec<PortDefinition>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheckDefinition>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl App {
    /// An app is discoverable iff `labels["consul"]` is present and isn't
    /// literally `"false"`.
    pub fn is_discoverable(&self) -> bool {
        match self.labels.get("consul") {
            Some(value) => value != "false",
            None => false,
        }
    }

    /// Per-port mode applies when there's at least one port definition and at
    /// least one of them carries a `consul` label.
    pub fn uses_per_port_mode(&self) -> bool {
        !self.port_definitions.is_empty()
            && self
                .port_definitions
                .iter()
                .any(|pd| pd.labels.contains_key("consul"))
    }
}
