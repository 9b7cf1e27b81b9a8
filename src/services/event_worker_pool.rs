//! The bounded event queue and its cooperative worker pool: a bounded
//! `mpsc` channel whose receiver is shared behind a `tokio::sync::Mutex`
//! so a configurable number of workers can drain it concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::models::EventKind;
use crate::services::reconciler::Reconciler;

/// One classified webhook body plus the instant it was accepted, so a worker
/// can log how long it waited in the queue.
pub struct EventEnvelope {
    pub kind: EventKind,
    pub body: Vec<u8>,
    pub enqueued_at: Instant,
}

/// The bounded FIFO the HTTP ingress hands events to.
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventQueue {
    /// Create the queue and its paired receiver. The receiver is handed to
    /// [`spawn_workers`] exactly once.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Try to enqueue `body` within `timeout`. Returns `true` if the ingress
    /// handler should answer 202, `false` if it should answer 503. Never called for `EventKind::Unsupported` — the ingress
    /// handler drops those before reaching the queue.
    pub async fn try_enqueue(&self, kind: EventKind, body: Vec<u8>, timeout: Duration) -> bool {
        let envelope = EventEnvelope {
            kind,
            body,
            enqueued_at: Instant::now(),
        };
        matches!(
            tokio::time::timeout(timeout, self.sender.send(envelope)).await,
            Ok(Ok(()))
        )
    }
}

/// Start `workers` cooperative consumers draining `receiver`, each dispatching
/// through `reconciler`. Returns the tasks' join handles so the
/// caller can await a graceful shutdown.
pub fn spawn_workers(
    receiver: mpsc::Receiver<EventEnvelope>,
    workers: usize,
    reconciler: Arc<Reconciler>,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));

    (0..workers.max(1))
        .map(|worker_id| {
            let receiver = receiver.clone();
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                loop {
                    let envelope = {
                        let mut guard = receiver.lock().await;
                        guard.recv().await
                    };
                    let Some(envelope) = envelope else {
                        debug!(worker_id, "event channel closed, worker exiting");
                        break;
                    };
                    debug!(
                        worker_id,
                        queue_wait_ms = envelope.enqueued_at.elapsed().as_millis() as u64,
                        "processing event"
                    );
                    reconciler.handle(envelope.kind, &envelope.body).await;
                }
            })
        })
        .collect()
}
