//! The registry-facing entity and its health checks.

use serde::{Deserialize, Serialize};

use super::app::{HealthCheckDefinition, HealthCheckProtocol};

/// A health probe attached to a [`Service`]. Modeled as a tagged
/// variant rather than a trait object — translation from an orchestrator
/// check is a pure, total function over this small closed set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Check {
    #[serde(rename = "http")]
    Http {
        url: String,
        interval_seconds: u64,
        timeout_seconds: u64,
    },
    #[serde(rename = "https")]
    Https {
        url: String,
        interval_seconds: u64,
        timeout_seconds: u64,
    },
    #[serde(rename = "tcp")]
    Tcp {
        address: String,
        interval_seconds: u64,
        timeout_seconds: u64,
    },
    #[serde(rename = "script")]
    Script {
        command: String,
        interval_seconds: u64,
        timeout_seconds: u64,
    },
}

/// Translate one orchestrator health check into a registry [`Check`].
///
/// Returns `None` when the check's `port_index` doesn't exist in `ports`
/// (silently dropped) or the protocol isn't one of the four known variants
/// (also silently dropped — unknown protocols never error).
pub fn translate_check(def: &HealthCheckDefinition, address: &str, ports: &[u32]) -> Option<Check> {
    let port = *ports.get(def.port_index)?;
    let interval_seconds = def.interval_seconds;
    let timeout_seconds = def.timeout_seconds;

    match def.protocol {
        HealthCheckProtocol::Http => Some(Check::Http {
            url: format!("http://{address}:{port}{}", def.path),
            interval_seconds,
            timeout_seconds,
        }),
        HealthCheckProtocol::Https => Some(Check::Https {
            url: format!("https://{address}:{port}{}", def.path),
            interval_seconds,
            timeout_seconds,
        }),
        HealthCheckProtocol::Tcp => Some(Check::Tcp {
            address: format!("{address}:{port}"),
            interval_seconds,
            timeout_seconds,
        }),
        HealthCheckProtocol::Command => Some(Check::Script {
            command: def.command.clone(),
            interval_seconds,
            timeout_seconds,
        }),
        HealthCheckProtocol::Unknown => None,
    }
}

/// The registry-facing entity built from a [`super::task::Task`] by the
/// registry client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    #[serde(rename = "ID")]
    pub service_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Port")]
    pub port: u32,
    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Checks")]
    pub checks: Vec<Check>,
    /// The agent-host the service was written through; deregistration must
    /// target the same agent.
    #[serde(skip)]
    pub registering_agent_address: String,
}

impl Service {
    /// Deterministic function of `(task_id, port_index)` — `register` is idempotent because this never changes
    /// for the same task/port pair.
    pub fn service_id(task_id: &str, port_index: usize) -> String {
        format!("{task_id}.{port_index}")
    }
}
