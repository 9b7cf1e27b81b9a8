//! Domain ports (interfaces) for the bridge.

pub mod agent_pool;

pub use agent_pool::{AgentHandle, AgentPool};
