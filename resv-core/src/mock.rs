//! In-memory management client for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::ManagementClient;
use crate::error::{ResvError, ResvResult};
use crate::types::{
    ReservationUpdate, TaskFailure, TaskFailureKind, TaskHandle, TaskState, VmRecord,
};

/// Scripted stand-in for a management endpoint.
///
/// Inventory and host capacities are fixed up front. Each submitted
/// reconfiguration is answered with a scripted sequence of task states;
/// without a script, an update with a matching change version succeeds
/// immediately and a stale one fails with a concurrent-modification
/// fault, mirroring the optimistic-concurrency behavior of the real
/// service. Lookup and submission counts are recorded for assertions.
pub struct MockClient {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    vms: Vec<VmRecord>,
    host_mhz: HashMap<String, u64>,
    host_lookups: HashMap<String, usize>,
    scripts: HashMap<String, Vec<TaskState>>,
    tasks: HashMap<String, ScriptedTask>,
    submissions: Vec<(String, ReservationUpdate)>,
    list_failure: Option<String>,
    next_task: usize,
    disconnects: usize,
}

struct ScriptedTask {
    states: Vec<TaskState>,
    cursor: usize,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_vm(self, vm: VmRecord) -> Self {
        self.state.lock().unwrap().vms.push(vm);
        self
    }

    pub fn with_host(self, host_id: &str, total_mhz: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .host_mhz
            .insert(host_id.to_string(), total_mhz);
        self
    }

    /// Script the task states returned for updates of `vm_id`, in order.
    /// The final state is repeated on further polls.
    pub fn with_task_states(self, vm_id: &str, states: Vec<TaskState>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(vm_id.to_string(), states);
        self
    }

    /// Make every inventory enumeration fail with a transport error.
    pub fn with_list_failure(self, details: &str) -> Self {
        self.state.lock().unwrap().list_failure = Some(details.to_string());
        self
    }

    pub fn host_lookup_count(&self, host_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .host_lookups
            .get(host_id)
            .copied()
            .unwrap_or(0)
    }

    /// Every `(vm_id, update)` pair submitted so far, in order.
    pub fn submissions(&self) -> Vec<(String, ReservationUpdate)> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManagementClient for MockClient {
    async fn list_vms(&self) -> ResvResult<Vec<VmRecord>> {
        let state = self.state.lock().unwrap();
        if let Some(details) = &state.list_failure {
            return Err(ResvError::Transport {
                operation: "list VMs".to_string(),
                details: details.clone(),
            });
        }
        Ok(state.vms.clone())
    }

    async fn host_cpu_mhz(&self, host_id: &str) -> ResvResult<u64> {
        let mut state = self.state.lock().unwrap();
        *state.host_lookups.entry(host_id.to_string()).or_insert(0) += 1;
        state
            .host_mhz
            .get(host_id)
            .copied()
            .ok_or_else(|| ResvError::Internal {
                message: format!("unknown host '{}'", host_id),
            })
    }

    async fn submit_reconfigure(
        &self,
        vm_id: &str,
        update: &ReservationUpdate,
    ) -> ResvResult<TaskHandle> {
        let mut state = self.state.lock().unwrap();
        let vm = state
            .vms
            .iter()
            .find(|vm| vm.id == vm_id)
            .ok_or_else(|| ResvError::Internal {
                message: format!("unknown VM '{}'", vm_id),
            })?;

        let states = match state.scripts.get(vm_id) {
            Some(states) => states.clone(),
            None if update.change_version != vm.change_version => {
                vec![TaskState::Failed(TaskFailure {
                    kind: TaskFailureKind::ConcurrentModification,
                    message: "change version mismatch".to_string(),
                })]
            }
            None => vec![TaskState::Succeeded],
        };

        state.next_task += 1;
        let id = format!("task-{}", state.next_task);
        state
            .tasks
            .insert(id.clone(), ScriptedTask { states, cursor: 0 });
        state.submissions.push((vm_id.to_string(), update.clone()));
        Ok(TaskHandle { id })
    }

    async fn task_state(&self, task: &TaskHandle) -> ResvResult<TaskState> {
        let mut state = self.state.lock().unwrap();
        let scripted = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| ResvError::TaskLost {
                task: task.id.clone(),
            })?;
        let current = scripted
            .states
            .get(scripted.cursor)
            .cloned()
            .unwrap_or(TaskState::Succeeded);
        if scripted.cursor + 1 < scripted.states.len() {
            scripted.cursor += 1;
        }
        Ok(current)
    }

    async fn disconnect(&self) -> ResvResult<()> {
        self.state.lock().unwrap().disconnects += 1;
        Ok(())
    }
}
