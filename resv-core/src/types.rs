use serde::{Deserialize, Serialize};

/// Power state of a virtual machine as reported by the management service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    Unknown,
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::PoweredOn => write!(f, "poweredOn"),
            PowerState::PoweredOff => write!(f, "poweredOff"),
            PowerState::Suspended => write!(f, "suspended"),
            PowerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Read view of one virtual machine, taken as a single snapshot.
///
/// The record is not owned by this system; it mirrors a live external
/// object. The reservation fields and `change_version` come from the same
/// fetch, so an update built from them is internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    /// Opaque VM identifier assigned by the service.
    pub id: String,
    /// Display name, the value VM selection patterns are matched against.
    pub name: String,
    /// Identifier of the host the VM currently runs on.
    pub host_id: String,
    pub power_state: PowerState,
    /// Current CPU reservation in MHz.
    pub cpu_reservation_mhz: u64,
    /// Current memory reservation in MB.
    pub memory_reservation_mb: u64,
    /// Configured memory size in MB.
    pub memory_total_mb: u64,
    /// Optimistic-concurrency token; must accompany any reconfiguration.
    pub change_version: String,
    /// Guest IP addresses, empty when no tools are reporting.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

/// Computed reservation values for one VM, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub cpu_reservation_mhz: u64,
    pub memory_reservation_mb: u64,
    /// Copied from the [`VmRecord`] the values were computed from. The
    /// service rejects the update if the VM changed in the meantime.
    pub change_version: String,
}

/// Opaque handle to a reconfiguration task accepted by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: String,
}

/// Observed state of a reconfiguration task.
///
/// `Succeeded` and `Failed` are terminal; no further transitions occur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Request accepted by the service, not started yet.
    Submitted,
    /// In progress. The service reports a percentage when it has one,
    /// otherwise a textual state.
    Running {
        percent: Option<u8>,
        state_text: Option<String>,
    },
    Succeeded,
    Failed(TaskFailure),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed(_))
    }
}

/// Why a reconfiguration task failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: TaskFailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskFailureKind {
    /// The change version was stale at submit time.
    ConcurrentModification,
    /// The service rejected the computed values.
    Validation,
    /// Communication failure while the update was in flight.
    Transport,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskState::Succeeded.is_terminal());
        assert!(TaskState::Failed(TaskFailure {
            kind: TaskFailureKind::Other,
            message: "boom".to_string(),
        })
        .is_terminal());
        assert!(!TaskState::Submitted.is_terminal());
        assert!(!TaskState::Running {
            percent: Some(50),
            state_text: None,
        }
        .is_terminal());
    }

    #[test]
    fn power_state_display_matches_service_spelling() {
        assert_eq!(PowerState::PoweredOn.to_string(), "poweredOn");
        assert_eq!(PowerState::PoweredOff.to_string(), "poweredOff");
    }
}
