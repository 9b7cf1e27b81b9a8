//! Domain models
//!
//! Pure domain entities with business logic and validation rules. These
//! models are framework-agnostic and contain no infrastructure concerns.

pub mod app;
pub mod config;
pub mod event;
pub mod service;
pub mod task;

pub use app::{App, HealthCheckDefinition, HealthCheckProtocol, PortDefinition};
pub use config::{AuthConfig, BridgeConfig};
pub use event::{EventKind, HealthStatusChangedEvent, StatusUpdateEvent};
pub use service::{translate_check, Check, Service};
pub use task::{marathon_task_tag, Task};
