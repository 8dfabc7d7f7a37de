//! Cancellation of in-flight lab requests.
//!
//! Direct cancellation is not reliable on its own: an instrument can stay
//! parked waiting for operator input after its run is cancelled. Every run's
//! instrument is therefore also released with "stop waiting", whatever the
//! cancel call returned.

use labsync_id::{InstrumentId, RunId};
use labsync_reconcile::best_effort;
use labsync_remote::{DeviceService, ManagementService};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::HarnessResult;
use crate::Harness;

/// What a cancellation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CancelReport {
    /// Runs found in progress.
    pub runs: usize,
    pub cancelled: usize,
    pub cancel_failures: usize,
    pub released: usize,
    pub release_failures: usize,
}

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    /// Cancel every running lab request's runs and release their instruments.
    ///
    /// Only the initial listing can fail the operation.
    pub async fn cancel_running_lab_requests(&self) -> HarnessResult<CancelReport> {
        let requests = self.management.list_running_lab_requests().await?;
        let runs: Vec<(RunId, InstrumentId)> = requests
            .iter()
            .flat_map(|r| r.instrument_runs.iter().map(|run| (run.id, run.instrument_id)))
            .collect();

        if runs.is_empty() {
            debug!("No running lab requests");
            return Ok(CancelReport::default());
        }

        info!(
            lab_requests = requests.len(),
            runs = runs.len(),
            "Cancelling running lab requests"
        );

        let management = &self.management;
        let cancelled = best_effort(
            "cancel run",
            runs.iter().map(|(run_id, _)| *run_id),
            |id| management.cancel_run(id),
        )
        .await;

        let released = best_effort(
            "stop waiting",
            runs.iter().map(|(_, instrument_id)| *instrument_id),
            |id| management.stop_waiting(id),
        )
        .await;

        let report = CancelReport {
            runs: runs.len(),
            cancelled: cancelled.succeeded.len(),
            cancel_failures: cancelled.failed.len(),
            released: released.succeeded.len(),
            release_failures: released.failed.len(),
        };
        info!(
            cancelled = report.cancelled,
            released = report.released,
            "Cancellation pass complete"
        );
        Ok(report)
    }
}
