//! End-to-end fleet-read scenarios against mock registry agents: tag
//! filtering across a cluster, a selective (non-default) discovery tag, and
//! eviction of dead agents under retries.

mod common;

use std::sync::Arc;

use bridge::domain::ports::AgentPool;
use bridge::RegistryClient;
use common::{config_with_tag, FixtureAgentPool};
use serde_json::json;

fn catalog_entry(id: &str, name: &str, address: &str, port: u32, tags: &[&str]) -> serde_json::Value {
    json!({
        "ServiceID": id,
        "ServiceName": name,
        "ServiceAddress": address,
        "ServicePort": port,
        "ServiceTags": tags,
    })
}

/// Mount `GET /v1/catalog/services` (the name index) and a `GET
/// /v1/catalog/service/<name>` response for each name in `by_name`.
async fn mount_catalog(server: &mut mockito::ServerGuard, by_name: &[(&str, Vec<serde_json::Value>)]) {
    let names: serde_json::Value = by_name
        .iter()
        .map(|(name, _)| (name.to_string(), serde_json::Value::Array(vec![])))
        .collect::<serde_json::Map<_, _>>()
        .into();
    server
        .mock("GET", "/v1/catalog/services")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(names.to_string())
        .create_async()
        .await;
    for (name, entries) in by_name {
        let path = format!("/v1/catalog/service/{name}");
        server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::Value::Array(entries.clone()).to_string())
            .create_async()
            .await;
    }
}

#[tokio::test]
async fn two_server_cluster_filters_by_discovery_tag() {
    // Consul agents proxy the same cluster-wide catalog regardless of which
    // one is asked, so both mock agents are seeded with the identical
    // combined view a real two-node cluster would agree on.
    let catalog: &[(&str, Vec<serde_json::Value>)] = &[
        (
            "serviceA",
            vec![
                catalog_entry("serviceA.0", "serviceA", "10.0.0.1", 8080, &["public", "marathon"]),
                catalog_entry("serviceA.1", "serviceA", "10.0.0.2", 8080, &["private", "marathon"]),
            ],
        ),
        (
            "serviceB",
            vec![
                catalog_entry("serviceB.0", "serviceB", "10.0.0.1", 8081, &["marathon"]),
                catalog_entry("serviceB.1", "serviceB", "10.0.0.2", 8081, &["zookeeper"]),
            ],
        ),
        (
            "serviceC",
            vec![catalog_entry("serviceC.0", "serviceC", "10.0.0.1", 8082, &["marathon"])],
        ),
    ];

    let mut agent1 = mockito::Server::new_async().await;
    let mut agent2 = mockito::Server::new_async().await;
    mount_catalog(&mut agent1, catalog).await;
    mount_catalog(&mut agent2, catalog).await;

    let pool = Arc::new(FixtureAgentPool::new([
        ("agent1".to_string(), agent1.url()),
        ("agent2".to_string(), agent2.url()),
    ]));
    let client = RegistryClient::new(pool, config_with_tag("marathon")).unwrap();

    let service_a = client.get_services("serviceA").await.unwrap();
    assert_eq!(service_a.len(), 2);
    assert!(service_a.iter().all(|s| s.name == "serviceA"));
    assert!(service_a.iter().all(|s| s.tags.contains(&"marathon".to_string())));

    // Invariants 3 and 4: every returned entry carries the discovery tag,
    // and the zookeeper-tagged serviceB instance never appears.
    let all = client.get_all_services().await.unwrap();
    assert!(all.iter().all(|s| s.tags.contains(&"marathon".to_string())));
    assert!(!all.iter().any(|s| s.tags.contains(&"zookeeper".to_string())));
    let mut names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names, ["serviceA", "serviceB", "serviceC"]);
}

#[tokio::test]
async fn selective_tag_only_returns_matching_entries() {
    let mut agent1 = mockito::Server::new_async().await;
    mount_catalog(
        &mut agent1,
        &[(
            "serviceA",
            vec![catalog_entry(
                "serviceA.0",
                "serviceA",
                "10.0.0.1",
                8080,
                &["public", "marathon-mycluster"],
            )],
        )],
    )
    .await;

    let pool = Arc::new(FixtureAgentPool::new([("agent1".to_string(), agent1.url())]));
    let client = RegistryClient::new(pool, config_with_tag("marathon-mycluster")).unwrap();

    let services = client.get_services("serviceA").await.unwrap();
    assert_eq!(services.len(), 1);
    assert!(services[0].tags.contains(&"marathon-mycluster".to_string()));
}

#[tokio::test]
async fn fleet_read_survives_dead_agents_and_evicts_them() {
    let mut live = mockito::Server::new_async().await;
    mount_catalog(
        &mut live,
        &[(
            "serviceA",
            vec![catalog_entry("serviceA.0", "serviceA", "10.0.0.1", 8080, &["marathon"])],
        )],
    )
    .await;

    // Dead hosts: nothing listens on these, so every call fails fast with
    // "connection refused" (localhost loopback, no SYN ever answered).
    let dead_hosts: Vec<(String, String)> = (0..8)
        .map(|i| (format!("dead-{i}"), "http://127.0.0.1:1".to_string()))
        .collect();
    let mut hosts = dead_hosts;
    hosts.push(("live".to_string(), live.url()));

    let pool = Arc::new(FixtureAgentPool::new(hosts));
    let mut config = config_with_tag("marathon");
    config.agent_failures_tolerance = 1;
    config.request_retries = 8;
    let client = RegistryClient::new(pool.clone(), config).unwrap();

    // A single fleet read returns on the first success and may not reach
    // every dead host in its shuffled order, so eviction to a single
    // surviving agent is only guaranteed across repeated reads. Cap the loop well above what 8 dead hosts should need.
    for _ in 0..20 {
        let services = client.get_services("serviceA").await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "serviceA");
        if pool.hosts().await == vec!["live".to_string()] {
            break;
        }
    }

    assert_eq!(pool.hosts().await, vec!["live".to_string()]);
}
