//! The concrete, reader/writer-locked agent pool.
//!
//! The port trait lives in `domain::ports`; this implementation wraps a
//! shared mutable map behind a single lock and keeps critical sections
//! short, since handle construction never needs the write lock held.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::error::AgentPoolError;
use crate::domain::models::BridgeConfig;
use crate::domain::ports::{AgentHandle, AgentPool};

struct Entry {
    handle: Arc<AgentHandle>,
    consecutive_failures: u32,
}

/// Host→handle map guarded by a single readers-writer lock. Handle
/// construction is pure string formatting — no network I/O ever happens
/// while the write lock is held.
pub struct ConcurrentAgentPool {
    scheme: &'static str,
    port: String,
    agents: RwLock<HashMap<String, Entry>>,
}

impl ConcurrentAgentPool {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            scheme: if config.ssl_enabled { "https" } else { "http" },
            port: config.port.clone(),
            agents: RwLock::new(HashMap::new()),
        }
    }

    fn build_handle(&self, host: &str) -> Arc<AgentHandle> {
        Arc::new(AgentHandle {
            host: host.to_string(),
            base_url: format!("{}://{}:{}", self.scheme, host, self.port),
        })
    }
}

#[async_trait]
impl AgentPool for ConcurrentAgentPool {
    async fn get(&self, host: &str) -> Result<Arc<AgentHandle>, AgentPoolError> {
        if host.is_empty() {
            return Err(AgentPoolError::EmptyHost);
        }

        if let Some(entry) = self.agents.read().await.get(host) {
            return Ok(entry.handle.clone());
        }

        let mut agents = self.agents.write().await;
        // Re-check: another task may have raced us between the read and write lock.
        if let Some(entry) = agents.get(host) {
            return Ok(entry.handle.clone());
        }
        let handle = self.build_handle(host);
        agents.insert(
            host.to_string(),
            Entry {
                handle: handle.clone(),
                consecutive_failures: 0,
            },
        );
        debug!(host, "added agent to pool");
        Ok(handle)
    }

    async fn add_many(&self, hosts: &[String]) {
        let mut agents = self.agents.write().await;
        for host in hosts {
            if host.is_empty() || agents.contains_key(host) {
                continue;
            }
            let handle = self.build_handle(host);
            agents.insert(
                host.clone(),
                Entry {
                    handle,
                    consecutive_failures: 0,
                },
            );
        }
    }

    async fn hosts(&self) -> Vec<String> {
        self.agents.read().await.keys().cloned().collect()
    }

    async fn remove(&self, host: &str) {
        self.agents.write().await.remove(host);
    }

    async fn record_failure(&self, host: &str, tolerance: u32) -> bool {
        let mut agents = self.agents.write().await;
        let Some(entry) = agents.get_mut(host) else {
            return false;
        };
        entry.consecutive_failures += 1;
        if entry.consecutive_failures >= tolerance {
            agents.remove(host);
            warn!(host, tolerance, "evicted agent after consecutive failures");
            true
        } else {
            false
        }
    }

    async fn record_success(&self, host: &str) {
        if let Some(entry) = self.agents.write().await.get_mut(host) {
            entry.consecutive_failures = 0;
        }
    }
}
