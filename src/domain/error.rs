//! Domain error types for the bridge.
//!
//! Each error enum models errors from a specific concern.
//! `RegistryError` is the canonical error surfaced by the registry client and the
//! only one whose exact `Display` text operators are expected to alert on.

use thiserror::Error;

/// Errors from the registry client (`services::registry_client`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Malformed input: empty host, invalid service name, bad payload shape.
    #[error("validation error: {0}")]
    Validation(String),

    /// A single agent call failed transiently (timeout, 5xx, connection refused).
    #[error("agent request to {host} failed: {message}")]
    TransientAgent { host: String, message: String },

    /// Every agent in the pool failed across all retry attempts. The exact text
    /// matters: operators alert on this string.
    #[error("An error occurred getting services from Consul. Giving up")]
    RetriesExhausted,

    /// `deregister_by_task` matched no services.
    #[error("no services found for task {0}")]
    NotFound(String),

    /// DNS resolution of a task host failed; registration cannot proceed.
    #[error("failed to resolve host '{host}': {message}")]
    ResolutionFailure { host: String, message: String },
}

impl RegistryError {
    /// True for errors that should never be retried by the caller.
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::ResolutionFailure { .. })
    }

    /// True for errors counted against an agent's failure tolerance.
    pub const fn is_transient_agent(&self) -> bool {
        matches!(self, Self::TransientAgent { .. })
    }
}

/// Errors from the agent pool (`domain::ports::agent_pool`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentPoolError {
    /// `get("")` — an agent pool lookup with an empty host is always rejected.
    #[error("agent host must not be empty")]
    EmptyHost,

    /// The pool has no agent for `host` and none could be created.
    #[error("no agent available for host '{0}'")]
    Unavailable(String),
}

/// Errors from configuration loading (`infrastructure::config`).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid workers: {0}, must be at least 1")]
    InvalidWorkers(usize),

    #[error("invalid queue_capacity: {0}, must be at least 1")]
    InvalidQueueCapacity(usize),

    #[error("invalid request_retries: {0}")]
    InvalidRequestRetries(u32),

    #[error("invalid agent_failures_tolerance: {0}, must be at least 1")]
    InvalidAgentFailuresTolerance(u32),

    #[error("discovery tag must not be empty")]
    EmptyTag,

    #[error("configuration could not be loaded: {0}")]
    LoadFailed(String),
}
