//! Integration tests for the adjustment and listing workflows, driven
//! against the in-memory mock client.

use std::sync::Mutex;

use pretty_assertions::assert_eq;

use resv_core::config::AdjustConfig;
use resv_core::error::ResvError;
use resv_core::mock::MockClient;
use resv_core::progress::{NullReporter, ProgressEvent, ProgressReporter};
use resv_core::types::{
    PowerState, ReservationUpdate, TaskFailure, TaskFailureKind, TaskState, VmRecord,
};
use resv_core::workflow::{run_adjustment, run_listing};

fn vm(id: &str, name: &str, cpu_mhz: u64, memory_mb: u64, memory_total_mb: u64) -> VmRecord {
    VmRecord {
        id: id.to_string(),
        name: name.to_string(),
        host_id: "host-1".to_string(),
        power_state: PowerState::PoweredOn,
        cpu_reservation_mhz: cpu_mhz,
        memory_reservation_mb: memory_mb,
        memory_total_mb,
        change_version: "cv-1".to_string(),
        ip_addresses: Vec::new(),
    }
}

fn fast_config(pattern: &str) -> AdjustConfig {
    let mut config = AdjustConfig::new(pattern);
    config.poll_interval = std::time::Duration::from_millis(1);
    config
}

#[derive(Default)]
struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn update_submitted(&self, vm: &VmRecord, update: &ReservationUpdate) {
        self.lines.lock().unwrap().push(format!(
            "submitted {} cpu={} mem={}",
            vm.name, update.cpu_reservation_mhz, update.memory_reservation_mb
        ));
    }

    fn task_progress(&self, event: &ProgressEvent) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("progress {}", event.vm_name));
    }

    fn update_finished(&self, vm_name: &str, error: Option<&ResvError>) {
        self.lines.lock().unwrap().push(format!(
            "finished {} {}",
            vm_name,
            if error.is_some() { "err" } else { "ok" }
        ));
    }
}

#[tokio::test]
async fn doubles_reservations_and_applies_the_zero_memory_floor() {
    // app1: 100 MHz cpu reservation, no memory reservation, 2048 MB
    // configured memory.
    let client = MockClient::new()
        .with_host("host-1", 24_000)
        .with_vm(vm("vm-1", "app1", 100, 0, 2048));

    let summary = run_adjustment(&client, &fast_config("app1"), &NullReporter)
        .await
        .unwrap();
    assert_eq!(summary.succeeded_count(), 1);
    assert_eq!(summary.failed_count(), 0);

    let submissions = client.submissions();
    assert_eq!(submissions.len(), 1);
    let (vm_id, update) = &submissions[0];
    assert_eq!(vm_id, "vm-1");
    assert_eq!(update.cpu_reservation_mhz, 200);
    assert_eq!(update.memory_reservation_mb, 204);
    assert_eq!(update.change_version, "cv-1");
}

#[tokio::test]
async fn a_failed_vm_does_not_abort_the_batch() {
    let client = MockClient::new()
        .with_host("host-1", 24_000)
        .with_vm(vm("vm-1", "web1", 100, 128, 1024))
        .with_vm(vm("vm-2", "web2", 50, 64, 1024))
        .with_task_states(
            "vm-1",
            vec![TaskState::Failed(TaskFailure {
                kind: TaskFailureKind::ConcurrentModification,
                message: "change version mismatch".to_string(),
            })],
        );

    let summary = run_adjustment(&client, &fast_config("web.*"), &NullReporter)
        .await
        .unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert!(matches!(
        summary.outcomes[0].result,
        Err(ResvError::ConcurrentModification { .. })
    ));
    assert!(summary.outcomes[1].result.is_ok());
    // Both updates were submitted; the failure of web1 did not stop web2.
    assert_eq!(client.submissions().len(), 2);
}

#[tokio::test]
async fn zero_matching_vms_completes_successfully() {
    let client = MockClient::new().with_vm(vm("vm-1", "db1", 100, 128, 1024));

    let summary = run_adjustment(&client, &fast_config("web.*"), &NullReporter)
        .await
        .unwrap();
    assert!(summary.outcomes.is_empty());
    assert!(client.submissions().is_empty());
    assert_eq!(client.disconnect_count(), 1);
}

#[tokio::test]
async fn session_is_released_when_the_inventory_read_fails() {
    let client = MockClient::new().with_list_failure("connection reset");

    let err = run_adjustment(&client, &fast_config(".*"), &NullReporter)
        .await
        .unwrap_err();
    assert!(matches!(err, ResvError::Transport { .. }));
    // No update was ever submitted, and the session was still released.
    assert!(client.submissions().is_empty());
    assert_eq!(client.disconnect_count(), 1);
}

#[tokio::test]
async fn session_is_released_on_a_bad_pattern() {
    let client = MockClient::new();

    let err = run_adjustment(&client, &fast_config("web["), &NullReporter)
        .await
        .unwrap_err();
    assert!(matches!(err, ResvError::Pattern { .. }));
    assert_eq!(client.disconnect_count(), 1);
}

#[tokio::test]
async fn reporter_sees_submission_progress_and_outcome_in_order() {
    let client = MockClient::new()
        .with_host("host-1", 24_000)
        .with_vm(vm("vm-1", "app1", 100, 0, 2048))
        .with_task_states(
            "vm-1",
            vec![
                TaskState::Running {
                    percent: Some(40),
                    state_text: None,
                },
                TaskState::Succeeded,
            ],
        );
    let reporter = RecordingReporter::default();

    run_adjustment(&client, &fast_config("app1"), &reporter)
        .await
        .unwrap();

    let lines = reporter.lines.lock().unwrap();
    assert_eq!(
        *lines,
        vec![
            "submitted app1 cpu=200 mem=204".to_string(),
            "progress app1".to_string(),
            "progress app1".to_string(),
            "finished app1 ok".to_string(),
        ]
    );
}

#[tokio::test]
async fn listing_filters_the_snapshot_and_releases_the_session() {
    let client = MockClient::new()
        .with_vm(vm("vm-1", "web1", 0, 0, 1024))
        .with_vm(vm("vm-2", "web2", 0, 0, 1024))
        .with_vm(vm("vm-3", "db1", 0, 0, 1024));

    let vms = run_listing(&client, "web.*").await.unwrap();
    let names: Vec<&str> = vms.iter().map(|vm| vm.name.as_str()).collect();
    assert_eq!(names, vec!["web1", "web2"]);
    assert_eq!(client.disconnect_count(), 1);
}
