//! A one-way sync bridge from orchestrator lifecycle webhooks to a
//! service-discovery registry.
//!
//! The pipeline is unidirectional: HTTP ingress → bounded event queue →
//! worker pool → event decoder → reconciler → registry client → agent pool
//! → registry. See `domain` for the core types and ports, `services` for
//! the pipeline's business logic, and `infrastructure` for the concrete
//! adapters (HTTP, config, logging) around it.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::BridgeConfig;
pub use services::RegistryClient;
