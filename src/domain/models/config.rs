//! Typed configuration covering every recognized bridge option.

use serde::{Deserialize, Serialize};

/// Transport/credential settings for talking to a registry agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Root bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Discovery tag; default `marathon`.
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Registry agent port.
    #[serde(default = "default_agent_port")]
    pub port: String,

    #[serde(default)]
    pub ssl_enabled: bool,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub token: String,

    /// Per-agent-call timeout, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry count for fleet reads; default 3.
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,

    /// Consecutive failures before an agent is evicted from the pool.
    #[serde(default = "default_agent_failures_tolerance")]
    pub agent_failures_tolerance: u32,

    /// Separator substituted for `/` when deriving a name from a hierarchical
    /// app id.
    #[serde(default = "default_consul_name_separator")]
    pub consul_name_separator: String,

    /// Worker pool size; default 1 so per-task event ordering is preserved by
    /// default.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded event-queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long the ingress handler blocks on a full queue before returning
    /// 503, in milliseconds.
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,

    /// HTTP ingress listen address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Logging output format (json, pretty).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            port: default_agent_port(),
            ssl_enabled: false,
            auth: AuthConfig::default(),
            token: String::new(),
            timeout_ms: default_timeout_ms(),
            request_retries: default_request_retries(),
            agent_failures_tolerance: default_agent_failures_tolerance(),
            consul_name_separator: default_consul_name_separator(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            bind_address: default_bind_address(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_tag() -> String {
    "marathon".to_string()
}
fn default_agent_port() -> String {
    "8500".to_string()
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_request_retries() -> u32 {
    3
}
fn default_agent_failures_tolerance() -> u32 {
    5
}
fn default_consul_name_separator() -> String {
    "-".to_string()
}
fn default_workers() -> usize {
    1
}
fn default_queue_capacity() -> usize {
    1_000
}
fn default_enqueue_timeout_ms() -> u64 {
    500
}
fn default_bind_address() -> String {
    "0.0.0.0:4567".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = BridgeConfig::default();
        assert_eq!(config.tag, "marathon");
        assert_eq!(config.request_retries, 3);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn yaml_parses_with_partial_overrides() {
        let yaml = "tag: marathon-mycluster\nrequest_retries: 100\n";
        let config: BridgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tag, "marathon-mycluster");
        assert_eq!(config.request_retries, 100);
        assert_eq!(config.workers, 1, "unset fields keep their default");
    }
}
