//! Business logic services for the bridge, framework-agnostic apart from
//! `reqwest`/`trust-dns-resolver` at the registry client's network edge.

pub mod event_decoder;
pub mod event_worker_pool;
pub mod reconciler;
pub mod registry_client;

pub use event_worker_pool::{EventEnvelope, EventQueue};
pub use reconciler::{ErrorCounts, Reconciler};
pub use registry_client::RegistryClient;
