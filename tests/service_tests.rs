mod common;

use std::sync::Arc;

use common::{FlakyBackend, StubProbe, service};
use hostpulse::store::MemoryBackend;
use hostpulse::system::MetricGroup;

#[tokio::test]
async fn on_demand_collect_is_stored() {
    let probe = Arc::new(StubProbe::new());
    let service = service(probe, Arc::new(MemoryBackend::new()));
    assert!(service.current().is_none());

    let snapshot = service.collect_and_store().await.unwrap();
    assert_eq!(service.current(), Some(snapshot.clone()));
    assert_eq!(service.history(10), vec![snapshot]);
    assert_eq!(service.stats().total_stored, 1);
}

#[tokio::test]
async fn current_or_collect_prefers_the_stored_snapshot() {
    let probe = Arc::new(StubProbe::new());
    let service = service(probe.clone(), Arc::new(MemoryBackend::new()));

    let first = service.current_or_collect().await.unwrap();
    assert_eq!(probe.cpu_reads(), 1);
    let second = service.current_or_collect().await.unwrap();
    assert_eq!(probe.cpu_reads(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn collect_survives_an_unreachable_backend() {
    let probe = Arc::new(StubProbe::new());
    let service = service(probe, Arc::new(FlakyBackend::offline()));

    let snapshot = service.collect_and_store().await.unwrap();
    assert_eq!(snapshot.cpu.usage_percent, 12.5);
    assert!(service.current().is_none());
    assert!(service.history(10).is_empty());
    assert!(!service.clear());
}

#[tokio::test]
async fn clear_resets_stored_state() {
    let probe = Arc::new(StubProbe::new());
    let service = service(probe, Arc::new(MemoryBackend::new()));
    service.collect_and_store().await.unwrap();
    service.collect_and_store().await.unwrap();

    assert!(service.clear());
    assert!(service.current().is_none());
    assert!(service.history(10).is_empty());
    assert_eq!(service.stats().total_stored, 0);
}

#[tokio::test]
async fn status_reports_store_system_and_poller() {
    let probe = Arc::new(StubProbe::new());
    let service = service(probe.clone(), Arc::new(MemoryBackend::new()));
    service.collect_and_store().await.unwrap();

    let status = service.status().await.unwrap();
    assert!(status.store.connected);
    assert_eq!(status.store.total_stored, 1);
    assert_eq!(status.system.hostname, "stub-host");
    assert!(!status.monitoring_active);
    assert_eq!(status.poller.loops_spawned, 0);

    probe.fail(MetricGroup::System);
    let status = service.status().await.unwrap();
    assert_eq!(status.system.hostname, "Unknown");

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["store"]["connected"], true);
    assert_eq!(json["monitoring_active"], false);
}

#[tokio::test]
async fn health_reflects_backend_reachability() {
    let backend = Arc::new(FlakyBackend::default());
    let service = service(Arc::new(StubProbe::new()), backend.clone());
    assert!(service.health().connected);

    backend.set_offline(true);
    let health = service.health();
    assert!(health.healthy);
    assert!(!health.connected);
}
