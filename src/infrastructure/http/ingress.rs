//! The single-endpoint webhook ingress: one `POST /` route bound to
//! application state, nothing else.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use tracing::{info, warn};

use crate::domain::models::EventKind;
use crate::services::{event_decoder, EventQueue};

#[derive(Clone)]
struct IngressState {
    queue: EventQueue,
    enqueue_timeout: Duration,
}

/// Build the ingress router. `enqueue_timeout_ms` bounds how long a request
/// blocks against a full queue before answering 503.
pub fn router(queue: EventQueue, enqueue_timeout_ms: u64) -> Router {
    let state = IngressState {
        queue,
        enqueue_timeout: Duration::from_millis(enqueue_timeout_ms),
    };
    Router::new().route("/", post(handle_webhook)).with_state(state)
}

/// Bind `bind_address` and serve `router` until the process is killed.
pub async fn serve(router: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!(bind_address, "webhook ingress listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Read the body, classify it, and either drop it (200) or enqueue and
/// acknowledge it (202/503). A malformed body that `axum`'s `Bytes`
/// extractor cannot read is rejected with 400 before this handler runs.
async fn handle_webhook(State(state): State<IngressState>, body: Bytes) -> impl IntoResponse {
    let kind = event_decoder::classify(&body);

    if kind == EventKind::Unsupported {
        return (StatusCode::OK, "DROP");
    }

    let accepted = state.queue.try_enqueue(kind, body.to_vec(), state.enqueue_timeout).await;
    if accepted {
        (StatusCode::ACCEPTED, "OK")
    } else {
        warn!("event queue full, rejecting webhook with 503");
        (StatusCode::SERVICE_UNAVAILABLE, "QUEUE FULL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(capacity: usize) -> (Router, EventQueue) {
        let (queue, mut receiver) = EventQueue::new(capacity);
        // Drain in the background so enqueue succeeds in the "accepted" tests.
        tokio::spawn(async move { while receiver.recv().await.is_some() {} });
        (router(queue.clone(), 100), queue)
    }

    #[tokio::test]
    async fn unsupported_event_is_dropped_with_200() {
        let (app, _queue) = app(10);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(r#"{"eventType":"deployment_step_success"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_update_event_is_enqueued_with_202() {
        let (app, _queue) = app(10);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(r#"{"eventType":"status_update_event"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
