//! Dispatches a classified, still-unparsed webhook body to the registry
//! client and is the terminal error sink for the pipeline: decode, call
//! the registry client, log and count failures without propagating them
//! further. The ingress handler has already returned 202 by the time an
//! event reaches here, so nothing here climbs back out. The per-kind
//! `AtomicU64` counters are ambient bookkeeping the reconciler needs to
//! pick `warn` vs `error`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::domain::error::RegistryError;
use crate::domain::models::{EventKind, HealthStatusChangedEvent, StatusUpdateEvent};
use crate::services::registry_client::RegistryClient;

/// Snapshot of the reconciler's error counters, useful for diagnostics and
/// tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    pub validation: u64,
    pub transient_agent: u64,
    pub retries_exhausted: u64,
    pub not_found: u64,
    pub resolution_failure: u64,
    pub decode_failure: u64,
}

/// The terminal error sink and event dispatcher.
pub struct Reconciler {
    registry: Arc<RegistryClient>,
    validation: AtomicU64,
    transient_agent: AtomicU64,
    retries_exhausted: AtomicU64,
    not_found: AtomicU64,
    resolution_failure: AtomicU64,
    decode_failure: AtomicU64,
}

impl Reconciler {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self {
            registry,
            validation: AtomicU64::new(0),
            transient_agent: AtomicU64::new(0),
            retries_exhausted: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            resolution_failure: AtomicU64::new(0),
            decode_failure: AtomicU64::new(0),
        }
    }

    pub fn error_counts(&self) -> ErrorCounts {
        ErrorCounts {
            validation: self.validation.load(Ordering::Relaxed),
            transient_agent: self.transient_agent.load(Ordering::Relaxed),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            resolution_failure: self.resolution_failure.load(Ordering::Relaxed),
            decode_failure: self.decode_failure.load(Ordering::Relaxed),
        }
    }

    /// Dispatch one event body to its handler. `Unsupported` never reaches
    /// here — the worker pool drops it before this is called.
    #[instrument(skip(self, body))]
    pub async fn handle(&self, kind: EventKind, body: &[u8]) {
        match kind {
            EventKind::StatusUpdate => self.handle_status_update(body).await,
            EventKind::HealthStatusChanged => self.handle_health_status_changed(body).await,
            EventKind::Unsupported => {}
        }
    }

    async fn handle_status_update(&self, body: &[u8]) {
        let event: StatusUpdateEvent = match serde_json::from_slice(body) {
            Ok(event) => event,
            Err(err) => {
                self.decode_failure.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "could not decode status_update_event");
                return;
            }
        };

        if event.is_running_and_healthy() {
            match self.registry.register(&event.task, &event.app).await {
                Ok(services) => debug!(task_id = %event.task_id, count = services.len(), "registered"),
                Err(err) => self.record_error(&err),
            }
        } else if event.is_terminal() {
            self.deregister(&event.task_id).await;
        }
        // Running-but-unhealthy, or any other status, requires no action.
    }

    async fn handle_health_status_changed(&self, body: &[u8]) {
        let event: HealthStatusChangedEvent = match serde_json::from_slice(body) {
            Ok(event) => event,
            Err(err) => {
                self.decode_failure.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "could not decode health_status_changed_event");
                return;
            }
        };

        if event.alive {
            match self.registry.register(&event.task, &event.app).await {
                Ok(services) => debug!(task_id = %event.task_id, count = services.len(), "registered"),
                Err(err) => self.record_error(&err),
            }
        } else {
            self.deregister(&event.task_id).await;
        }
    }

    async fn deregister(&self, task_id: &str) {
        match self.registry.deregister_by_task(task_id).await {
            Ok(()) => debug!(task_id, "deregistered"),
            Err(RegistryError::NotFound(_)) => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
                debug!(task_id, "nothing to deregister, already absent");
            }
            Err(err) => self.record_error(&err),
        }
    }

    fn record_error(&self, err: &RegistryError) {
        match err {
            RegistryError::Validation(_) => {
                self.validation.fetch_add(1, Ordering::Relaxed);
            }
            RegistryError::TransientAgent { .. } => {
                self.transient_agent.fetch_add(1, Ordering::Relaxed);
            }
            RegistryError::RetriesExhausted => {
                self.retries_exhausted.fetch_add(1, Ordering::Relaxed);
            }
            RegistryError::NotFound(_) => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            RegistryError::ResolutionFailure { .. } => {
                self.resolution_failure.fetch_add(1, Ordering::Relaxed);
            }
        }

        if err.is_permanent() {
            error!(error = %err, "reconciliation failed permanently");
        } else {
            warn!(error = %err, "reconciliation failed, will retry on next event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{App, BridgeConfig, Task};
    use crate::domain::ports::AgentPool;
    use crate::infrastructure::agent_pool::ConcurrentAgentPool;
    use std::collections::HashMap;

    fn reconciler() -> Reconciler {
        let pool: Arc<dyn AgentPool> = Arc::new(ConcurrentAgentPool::new(&BridgeConfig::default()));
        let registry = Arc::new(RegistryClient::new(pool, BridgeConfig::default()).unwrap());
        Reconciler::new(registry)
    }

    fn app() -> App {
        let mut labels = HashMap::new();
        labels.insert("consul".to_string(), "true".to_string());
        App {
            id: "/serviceA".to_string(),
            labels,
            ..Default::default()
        }
    }

    fn task() -> Task {
        Task {
            id: "serviceA.0".to_string(),
            app_id: "/serviceA".to_string(),
            host: "127.0.0.1".to_string(),
            ports: vec![8080],
        }
    }

    #[tokio::test]
    async fn malformed_body_is_counted_and_does_not_panic() {
        let reconciler = reconciler();
        reconciler.handle(EventKind::StatusUpdate, b"not json").await;
        assert_eq!(reconciler.error_counts().decode_failure, 1);
    }

    #[tokio::test]
    async fn unsupported_event_is_a_no_op() {
        let reconciler = reconciler();
        reconciler.handle(EventKind::Unsupported, b"irrelevant").await;
        assert_eq!(reconciler.error_counts(), ErrorCounts::default());
    }

    #[tokio::test]
    async fn deregistering_an_unknown_task_is_counted_as_not_found_not_an_error_log() {
        let reconciler = reconciler();
        let body = serde_json::to_vec(&StatusUpdateEvent {
            task_id: task().id,
            task_status: "TASK_KILLED".to_string(),
            health_ok: None,
            task: task(),
            app: app(),
        })
        .unwrap();
        reconciler.handle(EventKind::StatusUpdate, &body).await;
        assert_eq!(reconciler.error_counts().not_found, 1);
    }
}
