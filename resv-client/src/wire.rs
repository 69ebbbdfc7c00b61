//! Wire-level payloads of the management REST API.
//!
//! These types mirror the JSON bodies exchanged with the endpoint and are
//! converted into the domain types of `resv-core` at the client boundary.

use serde::{Deserialize, Serialize};

use resv_core::types::{
    PowerState, TaskFailure, TaskFailureKind, TaskState, VmRecord,
};

/// One entry of the inventory listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VmSummary {
    /// VM identifier.
    pub vm: String,
    pub name: String,
}

/// Detailed VM view from `/api/vcenter/vm/{vm}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VmDetail {
    pub name: String,
    /// Identifier of the host the VM currently runs on.
    pub host: String,
    pub power_state: WirePowerState,
    pub cpu: CpuAllocation,
    pub memory: MemoryAllocation,
    /// Optimistic-concurrency token; echoed back on reconfiguration.
    pub change_version: String,
    /// Guest IP addresses; absent when no tools are reporting.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

impl VmDetail {
    pub fn into_record(self, vm_id: String) -> VmRecord {
        VmRecord {
            id: vm_id,
            name: self.name,
            host_id: self.host,
            power_state: self.power_state.into(),
            cpu_reservation_mhz: self.cpu.reservation_mhz,
            memory_reservation_mb: self.memory.reservation_mb,
            memory_total_mb: self.memory.size_mib,
            change_version: self.change_version,
            ip_addresses: self.ip_addresses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WirePowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl From<WirePowerState> for PowerState {
    fn from(state: WirePowerState) -> Self {
        match state {
            WirePowerState::PoweredOn => PowerState::PoweredOn,
            WirePowerState::PoweredOff => PowerState::PoweredOff,
            WirePowerState::Suspended => PowerState::Suspended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CpuAllocation {
    /// Current CPU reservation in MHz.
    #[serde(default)]
    pub reservation_mhz: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryAllocation {
    /// Current memory reservation in MB.
    #[serde(default)]
    pub reservation_mb: u64,
    /// Configured memory size in MiB.
    pub size_mib: u64,
}

/// Host hardware view from `/api/vcenter/host/{host}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostDetail {
    /// Total CPU clock across all cores, in MHz.
    pub cpu_total_mhz: u64,
}

/// Reconfiguration request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconfigureSpec {
    pub change_version: String,
    pub cpu: ReservationSpec,
    pub memory: ReservationSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReservationSpec {
    pub reservation: u64,
}

/// Task view from `/api/tasks/{task}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskInfo {
    pub status: WireTaskStatus,
    /// Completion percentage, when the service tracks one.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Textual state for services that do not report a percentage.
    #[serde(default)]
    pub state_text: Option<String>,
    #[serde(default)]
    pub error: Option<WireTaskError>,
}

impl TaskInfo {
    pub fn into_state(self) -> TaskState {
        match self.status {
            WireTaskStatus::Pending => TaskState::Submitted,
            WireTaskStatus::Running => TaskState::Running {
                percent: self.progress,
                state_text: self.state_text,
            },
            WireTaskStatus::Succeeded => TaskState::Succeeded,
            WireTaskStatus::Failed => {
                let error = self.error.unwrap_or(WireTaskError {
                    kind: None,
                    message: "task failed without error detail".to_string(),
                });
                TaskState::Failed(TaskFailure {
                    kind: error.failure_kind(),
                    message: error.message,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireTaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireTaskError {
    /// Service fault class, e.g. `CONCURRENT_MODIFICATION`.
    #[serde(default)]
    pub kind: Option<String>,
    pub message: String,
}

impl WireTaskError {
    fn failure_kind(&self) -> TaskFailureKind {
        match self.kind.as_deref() {
            Some("CONCURRENT_MODIFICATION") => TaskFailureKind::ConcurrentModification,
            Some("INVALID_ARGUMENT") | Some("VALIDATION") => TaskFailureKind::Validation,
            Some("TRANSPORT") | Some("UNREACHABLE") => TaskFailureKind::Transport,
            _ => TaskFailureKind::Other,
        }
    }
}
