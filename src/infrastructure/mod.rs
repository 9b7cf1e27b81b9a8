//! Concrete adapters implementing the domain's ports and the ambient stack
//! (config, logging, HTTP) around the core pipeline.

pub mod agent_pool;
pub mod config;
pub mod http;
pub mod logging;

pub use agent_pool::ConcurrentAgentPool;
