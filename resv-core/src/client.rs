use async_trait::async_trait;

use crate::error::ResvResult;
use crate::types::{ReservationUpdate, TaskHandle, TaskState, VmRecord};

/// Client-side contract of the management endpoint
///
/// An instance represents an open, authenticated session. The workflow
/// holds at most one per run and calls [`disconnect`](Self::disconnect) on
/// every exit path; dropping an instance without disconnecting leaks the
/// server-side session.
///
/// Implementations: the REST client in `resv-client` and the in-memory
/// [`MockClient`](crate::mock::MockClient) used by the test suites.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Snapshot enumeration of every VM in the inventory.
    ///
    /// Order is whatever the service yields; it is not stable or sorted.
    /// Concurrent changes to the inventory after the snapshot are not
    /// reflected.
    async fn list_vms(&self) -> ResvResult<Vec<VmRecord>>;

    /// Total CPU clock of a host in MHz.
    async fn host_cpu_mhz(&self, host_id: &str) -> ResvResult<u64>;

    /// Submit a reservation reconfiguration for one VM.
    ///
    /// Returns once the service has accepted the request; completion is
    /// observed through [`task_state`](Self::task_state). A stale change
    /// version may be rejected here or surface later as a failed task.
    async fn submit_reconfigure(
        &self,
        vm_id: &str,
        update: &ReservationUpdate,
    ) -> ResvResult<TaskHandle>;

    /// Current state of a previously submitted task.
    async fn task_state(&self, task: &TaskHandle) -> ResvResult<TaskState>;

    /// Release the server-side session.
    async fn disconnect(&self) -> ResvResult<()>;
}
