use crate::error::ResvError;
use crate::types::{ReservationUpdate, VmRecord};

/// One observed change in the state of an in-flight update.
///
/// The service reports either a completion percentage or, when none is
/// available, a textual state. The event carries whichever was observed;
/// presentation (labels, wording) is left to the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub vm_name: String,
    pub percent: Option<u8>,
    pub state_text: Option<String>,
}

/// Receives progress while updates run.
///
/// Invoked synchronously from the sequential update loop; implementations
/// should return quickly.
pub trait ProgressReporter: Send + Sync {
    /// A reconfiguration request was accepted by the service.
    fn update_submitted(&self, vm: &VmRecord, update: &ReservationUpdate);

    /// The in-flight task changed state.
    fn task_progress(&self, event: &ProgressEvent);

    /// The update reached a terminal state; `error` is `None` on success.
    fn update_finished(&self, vm_name: &str, error: Option<&ResvError>);
}

/// Reporter that discards everything.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn update_submitted(&self, _vm: &VmRecord, _update: &ReservationUpdate) {}

    fn task_progress(&self, _event: &ProgressEvent) {}

    fn update_finished(&self, _vm_name: &str, _error: Option<&ResvError>) {}
}
