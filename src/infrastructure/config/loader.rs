//! Layered configuration loading: programmatic defaults → YAML file →
//! environment variables, highest precedence last, followed by a
//! post-merge validation pass.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;

use crate::domain::error::ConfigError;
use crate::domain::models::BridgeConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the default file path `bridge.yaml`, env vars prefixed
    /// `BRIDGE_`, then validate. An invalid config is a fatal, reported
    /// error — never silently clamped.
    pub fn load() -> Result<BridgeConfig, ConfigError> {
        Self::load_from_file("bridge.yaml")
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<BridgeConfig, ConfigError> {
        let config: BridgeConfig = Figment::new()
            .merge(Serialized::defaults(BridgeConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("BRIDGE_"))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
        if config.workers == 0 {
            return Err(ConfigError::InvalidWorkers(config.workers));
        }
        if config.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity(config.queue_capacity));
        }
        if config.agent_failures_tolerance == 0 {
            return Err(ConfigError::InvalidAgentFailuresTolerance(
                config.agent_failures_tolerance,
            ));
        }
        if config.tag.trim().is_empty() {
            return Err(ConfigError::EmptyTag);
        }
        Ok(())
    }
}
