//! Sequential reservation adjustment and listing runs.
//!
//! One VM is fully processed (read, compute, submit, await) before the
//! next begins. Per-VM failures are isolated: they are recorded in the
//! run summary and reported through the progress channel, and the
//! remaining VMs are still processed.

use tracing::{info, warn};

use crate::client::ManagementClient;
use crate::config::AdjustConfig;
use crate::error::ResvResult;
use crate::inventory::NameFilter;
use crate::policy::{compute_update, HostCpuCache};
use crate::progress::ProgressReporter;
use crate::submit::UpdateSubmitter;
use crate::types::VmRecord;

/// Outcome of one VM's update within a run.
#[derive(Debug)]
pub struct VmOutcome {
    pub vm_name: String,
    pub result: ResvResult<()>,
}

/// Per-VM outcomes of a whole adjustment run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<VmOutcome>,
}

impl RunSummary {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &VmOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// The VMs whose name matches `filter`, from one inventory snapshot.
pub async fn matching_vms(
    client: &dyn ManagementClient,
    filter: &NameFilter,
) -> ResvResult<Vec<VmRecord>> {
    Ok(filter.filter_vms(client.list_vms().await?))
}

/// Listing entry point owning the session lifecycle.
///
/// The client is disconnected on success and on error alike; a failed
/// disconnect is logged, never fatal.
pub async fn run_listing(
    client: &dyn ManagementClient,
    name_pattern: &str,
) -> ResvResult<Vec<VmRecord>> {
    let result = async {
        let filter = NameFilter::new(name_pattern)?;
        matching_vms(client, &filter).await
    }
    .await;
    release_session(client).await;
    result
}

/// Adjustment entry point owning the session lifecycle.
///
/// See [`adjust_reservations`] for the run itself. The client is
/// disconnected on success and on error alike.
pub async fn run_adjustment(
    client: &dyn ManagementClient,
    config: &AdjustConfig,
    reporter: &dyn ProgressReporter,
) -> ResvResult<RunSummary> {
    let result = adjust_reservations(client, config, reporter).await;
    release_session(client).await;
    result
}

/// Double the reservations of every VM matching the configured pattern.
///
/// Strictly sequential. A zero-match run completes successfully with an
/// empty summary. Returns an error only for fatal conditions (bad
/// pattern, failed inventory read); per-VM failures land in the summary.
pub async fn adjust_reservations(
    client: &dyn ManagementClient,
    config: &AdjustConfig,
    reporter: &dyn ProgressReporter,
) -> ResvResult<RunSummary> {
    let filter = NameFilter::new(&config.name_pattern)?;
    let vms = matching_vms(client, &filter).await?;
    info!(
        matched = vms.len(),
        pattern = %config.name_pattern,
        "starting reservation adjustment"
    );

    let mut cache = HostCpuCache::new();
    let submitter = UpdateSubmitter::new(config.poll_interval);
    let mut summary = RunSummary::default();

    for vm in &vms {
        let result = adjust_one(client, &mut cache, &submitter, vm, reporter).await;
        if let Err(error) = &result {
            warn!(vm = %vm.name, %error, "reservation update failed");
        }
        reporter.update_finished(&vm.name, result.as_ref().err());
        summary.outcomes.push(VmOutcome {
            vm_name: vm.name.clone(),
            result,
        });
    }

    info!(
        succeeded = summary.succeeded_count(),
        failed = summary.failed_count(),
        "reservation adjustment finished"
    );
    Ok(summary)
}

async fn adjust_one(
    client: &dyn ManagementClient,
    cache: &mut HostCpuCache,
    submitter: &UpdateSubmitter,
    vm: &VmRecord,
    reporter: &dyn ProgressReporter,
) -> ResvResult<()> {
    let update = compute_update(client, cache, vm).await?;
    let task = submitter.submit(client, vm, &update).await?;
    reporter.update_submitted(vm, &update);
    submitter.await_completion(client, task, reporter).await
}

async fn release_session(client: &dyn ManagementClient) {
    if let Err(error) = client.disconnect().await {
        warn!(%error, "failed to release management session");
    }
}
