//! The fleet-wide registry client — the heart of the bridge. HTTP calls
//! return typed errors, and consecutive per-agent failures are tracked
//! against each agent's host so a persistently failing agent gets evicted.

use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::domain::error::RegistryError;
use crate::domain::models::{translate_check, App, BridgeConfig, Service, Task};
use crate::domain::ports::{AgentHandle, AgentPool};

/// Characters allowed in a derived service name.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Derive a service name from a raw `consul` label value, falling back to the
/// app id when the raw value is empty, whitespace, `"true"`, or contains
/// characters outside `[A-Za-z0-9._-]`.
fn derive_name(raw: Option<&str>, app_id: &str, separator: &str) -> String {
    if let Some(raw) = raw {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed != "true" && is_valid_name(trimmed) {
            return trimmed.to_string();
        }
    }
    app_id.trim_start_matches('/').replace('/', separator)
}

/// Insertion-ordered collection of label keys whose value is exactly `"tag"`,
/// skipping the `consul` label itself.
fn tag_labels(labels: &HashMap<String, String>) -> Vec<String> {
    // HashMap has no stable iteration order; labels are sorted by key so the
    // derived tag order is deterministic for a given label set. The app-vs-
    // port-definition ordering is handled by the caller, which concatenates
    // this function's output for each source in turn.
    let mut keys: Vec<&String> = labels
        .iter()
        .filter(|(k, v)| k.as_str() != "consul" && v.as_str() == "tag")
        .map(|(k, _)| k)
        .collect();
    keys.sort();
    keys.into_iter().cloned().collect()
}

/// One Service-to-be, before DNS resolution has produced an address.
struct ServicePlan {
    service_id: String,
    name: String,
    port_index: usize,
    tags: Vec<String>,
}

/// Build the list of services a task should register, given the app's
/// discovery mode, without touching the network. Returns an empty
/// vec when the app isn't discoverable or there is nothing to register.
///
/// Every service carries the discovery tag first, then any custom tag
/// labels, then the per-task marker tag last.
fn plan_services(task: &Task, app: &App, name_separator: &str, discovery_tag: &str) -> Vec<ServicePlan> {
    if !app.is_discoverable() {
        return Vec::new();
    }

    let task_tag = task.marathon_task_tag();

    if app.uses_per_port_mode() {
        app.port_definitions
            .iter()
            .enumerate()
            .filter(|(port_index, pd)| pd.labels.contains_key("consul") && *port_index < task.ports.len())
            .map(|(port_index, pd)| {
                let name = derive_name(
                    pd.labels.get("consul").map(String::as_str),
                    &app.id,
                    name_separator,
                );
                let mut tags = vec![discovery_tag.to_string()];
                tags.extend(tag_labels(&app.labels));
                tags.extend(tag_labels(&pd.labels));
                tags.push(task_tag.clone());
                ServicePlan {
                    service_id: Service::service_id(&task.id, port_index),
                    name,
                    port_index,
                    tags,
                }
            })
            .collect()
    } else if task.ports.is_empty() {
        // No port to bind port index 0 to — a task with no ports gets no
        // services rather than one fabricated onto port 0.
        Vec::new()
    } else {
        let name = derive_name(app.labels.get("consul").map(String::as_str), &app.id, name_separator);
        let mut tags = vec![discovery_tag.to_string()];
        tags.extend(tag_labels(&app.labels));
        tags.push(task_tag);
        vec![ServicePlan {
            service_id: Service::service_id(&task.id, 0),
            name,
            port_index: 0,
            tags,
        }]
    }
}

/// Consul's catalog entry wire shape for reads — distinct field names from
/// the agent registration body.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "ServiceID")]
    service_id: String,
    #[serde(rename = "ServiceName")]
    service_name: String,
    #[serde(rename = "ServiceAddress")]
    service_address: String,
    #[serde(rename = "ServicePort")]
    service_port: u32,
    #[serde(rename = "ServiceTags", default)]
    service_tags: Vec<String>,
}

impl CatalogEntry {
    fn into_service(self, registering_agent_address: &str) -> Service {
        Service {
            service_id: self.service_id,
            name: self.service_name,
            address: self.service_address,
            port: self.service_port,
            tags: self.service_tags,
            checks: Vec::new(),
            registering_agent_address: registering_agent_address.to_string(),
        }
    }
}

/// The fleet-wide registry client.
pub struct RegistryClient {
    pool: Arc<dyn AgentPool>,
    http: reqwest::Client,
    config: BridgeConfig,
    resolver: TokioAsyncResolver,
}

impl RegistryClient {
    pub fn new(pool: Arc<dyn AgentPool>, config: BridgeConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Ok(Self {
            pool,
            http,
            config,
            resolver,
        })
    }

    fn auth_header(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = if !self.config.token.is_empty() {
            builder.header("X-Consul-Token", &self.config.token)
        } else {
            builder
        };
        if self.config.auth.enabled {
            builder.basic_auth(&self.config.auth.username, Some(&self.config.auth.password))
        } else {
            builder
        }
    }

    async fn resolve_ipv4(&self, host: &str) -> Result<String, RegistryError> {
        if let Ok(addr) = host.parse::<std::net::Ipv4Addr>() {
            return Ok(addr.to_string());
        }
        let response = self
            .resolver
            .ipv4_lookup(host)
            .await
            .map_err(|e| RegistryError::ResolutionFailure {
                host: host.to_string(),
                message: e.to_string(),
            })?;
        response
            .iter()
            .next()
            .map(|ip| ip.to_string())
            .ok_or_else(|| RegistryError::ResolutionFailure {
                host: host.to_string(),
                message: "no A records returned".to_string(),
            })
    }

    /// Build the Service(s) for a task and write each to the agent at its host.
    #[instrument(skip(self, task, app), fields(task_id = %task.id))]
    pub async fn register(&self, task: &Task, app: &App) -> Result<Vec<Service>, RegistryError> {
        let plans = plan_services(task, app, &self.config.consul_name_separator, &self.config.tag);
        if plans.is_empty() {
            return Ok(Vec::new());
        }

        let address = self.resolve_ipv4(&task.host).await?;

        let services: Vec<Service> = plans
            .into_iter()
            .map(|plan| {
                let checks = app
                    .health_checks
                    .iter()
                    .filter(|def| def.port_index == plan.port_index)
                    .filter_map(|def| translate_check(def, &address, &task.ports))
                    .collect();
                // `plan_services` never yields a plan whose `port_index` is out of
                // range for `task.ports`, so this index always resolves.
                let port = task.ports[plan.port_index];
                Service {
                    service_id: plan.service_id,
                    name: plan.name,
                    address: address.clone(),
                    port,
                    tags: plan.tags,
                    checks,
                    registering_agent_address: task.host.clone(),
                }
            })
            .collect();

        let handle = self
            .pool
            .get(&task.host)
            .await
            .map_err(|e| RegistryError::Validation(e.to_string()))?;

        for service in &services {
            self.write_register(&handle, service).await?;
        }

        info!(task_id = %task.id, count = services.len(), "registered services");
        Ok(services)
    }

    async fn write_register(&self, handle: &AgentHandle, service: &Service) -> Result<(), RegistryError> {
        let url = format!("{}/v1/agent/service/register", handle.base_url);
        let response = self
            .auth_header(self.http.put(&url))
            .json(service)
            .send()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: format!("register returned status {}", response.status()),
            });
        }
        Ok(())
    }

    /// Deregister one service from the agent it was registered through.
    #[instrument(skip(self, service), fields(service_id = %service.service_id))]
    pub async fn deregister(&self, service: &Service) -> Result<(), RegistryError> {
        let handle = self
            .pool
            .get(&service.registering_agent_address)
            .await
            .map_err(|e| RegistryError::Validation(e.to_string()))?;

        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            handle.base_url, service.service_id
        );
        let response = self
            .auth_header(self.http.put(&url))
            .send()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: format!("deregister returned status {}", response.status()),
            });
        }
        Ok(())
    }

    /// Deregister every service tagged with this task's id.
    #[instrument(skip(self))]
    pub async fn deregister_by_task(&self, task_id: &str) -> Result<(), RegistryError> {
        let tag = crate::domain::models::marathon_task_tag(task_id);
        let services = self.services_with_tag(&tag).await?;

        if services.is_empty() {
            return Err(RegistryError::NotFound(task_id.to_string()));
        }

        let mut failures = Vec::new();
        for service in &services {
            if let Err(err) = self.deregister(service).await {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            info!(task_id, count = services.len(), "deregistered all services for task");
            Ok(())
        } else {
            Err(failures.into_iter().next().unwrap())
        }
    }

    /// Cluster-wide read for every service carrying `tag` regardless of name
    /// or the configured discovery tag — used internally by
    /// `deregister_by_task` to find a task's own services.
    async fn services_with_tag(&self, tag: &str) -> Result<Vec<Service>, RegistryError> {
        let tag = tag.to_string();
        self.fleet_read(move |handle| {
            let tag = tag.clone();
            async move { self.fetch_all_filtered(&handle, |s: &Service| s.tags.contains(&tag)).await }
        })
        .await
    }

    /// Cluster-wide read for every service with the given name and the discovery tag.
    #[instrument(skip(self))]
    pub async fn get_services(&self, name: &str) -> Result<Vec<Service>, RegistryError> {
        let discovery_tag = self.config.tag.clone();
        let name = name.to_string();
        self.fleet_read(move |handle| {
            let (discovery_tag, name) = (discovery_tag.clone(), name.clone());
            async move {
                self.fetch_by_name(&handle, &name, &discovery_tag).await
            }
        })
        .await
    }

    /// Cluster-wide read for every service carrying the discovery tag.
    #[instrument(skip(self))]
    pub async fn get_all_services(&self) -> Result<Vec<Service>, RegistryError> {
        let discovery_tag = self.config.tag.clone();
        self.fleet_read(move |handle| {
            let discovery_tag = discovery_tag.clone();
            async move {
                self.fetch_all_filtered(&handle, |s: &Service| s.tags.contains(&discovery_tag))
                    .await
            }
        })
        .await
    }

    async fn fetch_by_name(
        &self,
        handle: &AgentHandle,
        name: &str,
        discovery_tag: &str,
    ) -> Result<Vec<Service>, RegistryError> {
        let url = format!(
            "{}/v1/catalog/service/{}?tag={}",
            handle.base_url, name, discovery_tag
        );
        let entries = self.get_catalog_entries(handle, &url).await?;
        Ok(entries
            .into_iter()
            .map(|e| e.into_service(&handle.host))
            .filter(|s| s.tags.contains(&discovery_tag.to_string()))
            .collect())
    }

    async fn fetch_all_filtered(
        &self,
        handle: &AgentHandle,
        keep: impl Fn(&Service) -> bool,
    ) -> Result<Vec<Service>, RegistryError> {
        let names_url = format!("{}/v1/catalog/services", handle.base_url);
        let names: HashMap<String, Vec<String>> = self
            .auth_header(self.http.get(&names_url))
            .send()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })?;

        let mut out = Vec::new();
        for name in names.keys() {
            let url = format!("{}/v1/catalog/service/{}", handle.base_url, name);
            let entries = self.get_catalog_entries(handle, &url).await?;
            out.extend(
                entries
                    .into_iter()
                    .map(|e| e.into_service(&handle.host))
                    .filter(|s| keep(s)),
            );
        }
        Ok(out)
    }

    async fn get_catalog_entries(
        &self,
        handle: &AgentHandle,
        url: &str,
    ) -> Result<Vec<CatalogEntry>, RegistryError> {
        let response = self
            .auth_header(self.http.get(url))
            .send()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: format!("catalog read returned status {}", response.status()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::TransientAgent {
                host: handle.host.clone(),
                message: e.to_string(),
            })
    }

    /// Warm the agent pool with every host of every discoverable app's tasks.
    #[instrument(skip(self, apps))]
    pub async fn add_agents_from_apps(&self, apps: &[App]) {
        let hosts: Vec<String> = apps
            .iter()
            .filter(|app| app.is_discoverable())
            .flat_map(|app| app.tasks.iter().map(|t| t.host.clone()))
            .collect();
        self.pool.add_many(&hosts).await;
    }

    /// The fleet-read algorithm: try every agent in a shuffled order,
    /// once per attempt, up to `request_retries + 1` attempts total.
    async fn fleet_read<F, Fut>(&self, provider: F) -> Result<Vec<Service>, RegistryError>
    where
        F: Fn(Arc<AgentHandle>) -> Fut,
        Fut: Future<Output = Result<Vec<Service>, RegistryError>>,
    {
        for attempt in 0..=self.config.request_retries {
            let mut hosts = self.pool.hosts().await;
            hosts.shuffle(&mut rand::thread_rng());

            for host in hosts {
                let handle = match self.pool.get(&host).await {
                    Ok(handle) => handle,
                    Err(_) => continue,
                };
                match provider(handle).await {
                    Ok(result) => {
                        self.pool.record_success(&host).await;
                        return Ok(result);
                    }
                    Err(err) => {
                        warn!(host = %host, attempt, error = %err, "fleet read failed on agent");
                        self.pool
                            .record_failure(&host, self.config.agent_failures_tolerance)
                            .await;
                    }
                }
            }
        }
        Err(RegistryError::RetriesExhausted)
    }
}
