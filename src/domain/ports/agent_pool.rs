//! Port for the agent pool.
//!
//! The registry client depends on this capability set, not on a concrete
//! pool, so tests can substitute a degenerate pool that always fails to
//! drive the retry/eviction paths without real network I/O.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::error::AgentPoolError;

/// A handle to one registry agent. Construction is lazy and cheap — the
/// handle's first network call happens on use, never while the pool's
/// write lock is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHandle {
    pub host: String,
    pub base_url: String,
}

#[async_trait]
pub trait AgentPool: Send + Sync {
    /// `get("")` always fails. Otherwise returns the existing handle
    /// for `host`, creating and caching one if this is the first lookup.
    async fn get(&self, host: &str) -> Result<Arc<AgentHandle>, AgentPoolError>;

    /// Ensure every host in `hosts` has a pool entry, without replacing
    /// hosts that already do (used to warm the pool from the current task
    /// set via `add_agents_from_apps`).
    async fn add_many(&self, hosts: &[String]);

    /// All hosts currently held by the pool, in no particular order.
    async fn hosts(&self) -> Vec<String>;

    /// Evict `host` from the pool.
    async fn remove(&self, host: &str);

    /// Record a failed call against `host`'s consecutive-failure counter,
    /// evicting it once the counter reaches `tolerance`.
    /// Returns `true` if this call caused an eviction.
    async fn record_failure(&self, host: &str, tolerance: u32) -> bool;

    /// Reset `host`'s consecutive-failure counter after a successful call.
    async fn record_success(&self, host: &str);
}
