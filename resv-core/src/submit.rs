use std::time::Duration;

use tracing::debug;

use crate::client::ManagementClient;
use crate::error::{ResvError, ResvResult};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::types::{ReservationUpdate, TaskFailure, TaskFailureKind, TaskHandle, TaskState, VmRecord};

/// One in-flight reconfiguration, tracked from submission to its terminal
/// state.
///
/// Owned by [`UpdateSubmitter::await_completion`], which consumes it once
/// the terminal state has been observed and reported.
#[derive(Debug)]
pub struct UpdateTask {
    handle: TaskHandle,
    vm_name: String,
    last_state: TaskState,
}

impl UpdateTask {
    pub fn vm_name(&self) -> &str {
        &self.vm_name
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }
}

/// Submits reservation updates and waits for the service to finish them.
///
/// Strictly sequential: one task is driven to completion before the next
/// submission. A failed update is surfaced as an error and never retried.
pub struct UpdateSubmitter {
    poll_interval: Duration,
}

impl UpdateSubmitter {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Submit the computed update for `vm`.
    pub async fn submit(
        &self,
        client: &dyn ManagementClient,
        vm: &VmRecord,
        update: &ReservationUpdate,
    ) -> ResvResult<UpdateTask> {
        let handle = client.submit_reconfigure(&vm.id, update).await?;
        debug!(vm = %vm.name, task = %handle.id, "reconfiguration submitted");
        Ok(UpdateTask {
            handle,
            vm_name: vm.name.clone(),
            last_state: TaskState::Submitted,
        })
    }

    /// Poll the task until the service reports a terminal state.
    ///
    /// Every observed state change produces one [`ProgressEvent`] through
    /// the reporter. Task failures come back mapped onto the error
    /// taxonomy; polling errors (e.g. transport) propagate as-is.
    pub async fn await_completion(
        &self,
        client: &dyn ManagementClient,
        mut task: UpdateTask,
        reporter: &dyn ProgressReporter,
    ) -> ResvResult<()> {
        loop {
            let state = client.task_state(&task.handle).await?;
            if state != task.last_state {
                reporter.task_progress(&progress_event(&task.vm_name, &state));
                task.last_state = state.clone();
            }
            match state {
                TaskState::Succeeded => return Ok(()),
                TaskState::Failed(failure) => return Err(failure_error(&task.vm_name, failure)),
                TaskState::Submitted | TaskState::Running { .. } => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

fn progress_event(vm_name: &str, state: &TaskState) -> ProgressEvent {
    let (percent, state_text) = match state {
        TaskState::Submitted => (None, Some("submitted".to_string())),
        TaskState::Running {
            percent,
            state_text,
        } => (*percent, state_text.clone()),
        TaskState::Succeeded => (None, Some("success".to_string())),
        TaskState::Failed(failure) => (None, Some(format!("error: {}", failure.message))),
    };
    ProgressEvent {
        vm_name: vm_name.to_string(),
        percent,
        state_text,
    }
}

fn failure_error(vm_name: &str, failure: TaskFailure) -> ResvError {
    match failure.kind {
        TaskFailureKind::ConcurrentModification => ResvError::ConcurrentModification {
            vm: vm_name.to_string(),
        },
        TaskFailureKind::Validation => ResvError::Validation {
            vm: vm_name.to_string(),
            message: failure.message,
        },
        TaskFailureKind::Transport => ResvError::Transport {
            operation: format!("update of VM '{}'", vm_name),
            details: failure.message,
        },
        TaskFailureKind::Other => ResvError::Internal {
            message: format!("update of VM '{}' failed: {}", vm_name, failure.message),
        },
    }
}
