//! Cheap classification of a raw webhook body before any JSON parsing: a
//! substring scan decides whether the expensive path — full `serde_json`
//! deserialization in the reconciler — runs at all.

use crate::domain::models::EventKind;

/// Classify a raw webhook body by substring presence of the event-type
/// literal, without parsing it. `Unsupported` bodies never get a `serde_json`
/// pass — the worker drops them immediately.
pub fn classify(body: &[u8]) -> EventKind {
    let text = String::from_utf8_lossy(body);
    if text.contains("status_update_event") {
        EventKind::StatusUpdate
    } else if text.contains("health_status_changed_event") {
        EventKind::HealthStatusChanged
    } else {
        EventKind::Unsupported
    }
}
