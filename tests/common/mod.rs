//! Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge::domain::error::AgentPoolError;
use bridge::domain::models::{App, BridgeConfig, PortDefinition, Task};
use bridge::domain::ports::{AgentHandle, AgentPool};
use tokio::sync::Mutex;

/// A degenerate agent pool whose entries are fixed at construction, each
/// pointing at an arbitrary `base_url` rather than one derived from a shared
/// port (real agent hosts all listen on the same configured port; test
/// agents are separate `mockito` servers on separate ports).
pub struct FixtureAgentPool {
    entries: Mutex<HashMap<String, Arc<AgentHandle>>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl FixtureAgentPool {
    pub fn new(hosts: impl IntoIterator<Item = (String, String)>) -> Self {
        let entries = hosts
            .into_iter()
            .map(|(host, base_url)| {
                let handle = Arc::new(AgentHandle {
                    host: host.clone(),
                    base_url,
                });
                (host, handle)
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
            failures: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AgentPool for FixtureAgentPool {
    async fn get(&self, host: &str) -> Result<Arc<AgentHandle>, AgentPoolError> {
        self.entries
            .lock()
            .await
            .get(host)
            .cloned()
            .ok_or_else(|| AgentPoolError::Unavailable(host.to_string()))
    }

    async fn add_many(&self, _hosts: &[String]) {
        // Fixture pools are seeded up front; tests don't exercise warm-up.
    }

    async fn hosts(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    async fn remove(&self, host: &str) {
        self.entries.lock().await.remove(host);
    }

    async fn record_failure(&self, host: &str, tolerance: u32) -> bool {
        let mut failures = self.failures.lock().await;
        let count = failures.entry(host.to_string()).or_insert(0);
        *count += 1;
        if *count >= tolerance {
            self.entries.lock().await.remove(host);
            true
        } else {
            false
        }
    }

    async fn record_success(&self, host: &str) {
        self.failures.lock().await.remove(host);
    }
}

pub fn config_with_tag(tag: &str) -> BridgeConfig {
    BridgeConfig {
        tag: tag.to_string(),
        request_retries: 3,
        ..Default::default()
    }
}

pub fn discoverable_app(id: &str, extra_labels: &[(&str, &str)]) -> App {
    let mut labels = HashMap::new();
    labels.insert("consul".to_string(), "true".to_string());
    for (k, v) in extra_labels {
        labels.insert(k.to_string(), v.to_string());
    }
    App {
        id: id.to_string(),
        labels,
        ..Default::default()
    }
}

pub fn port_definition(labels: &[(&str, &str)]) -> PortDefinition {
    PortDefinition {
        labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

pub fn task(id: &str, app_id: &str, host: &str, ports: &[u32]) -> Task {
    Task {
        id: id.to_string(),
        app_id: app_id.to_string(),
        host: host.to_string(),
        ports: ports.to_vec(),
    }
}
