//! Environment reset.
//!
//! A reset runs four ordered phases:
//!
//! 1. Stop-waiting sweep: release every connected instrument that is waiting
//!    on operator input
//! 2. Teardown: delete every device-service instrument
//! 3. Convergence wait: poll until the management service reports every
//!    removed serial offline, disconnected or gone
//! 4. Suppression sweep: clear stale indicators for disconnected instruments
//!
//! Phases 1, 2 and 4 are best-effort per item. A failure to list aborts the
//! reset; the next reset finishes the cleanup. Against a clean environment a
//! reset makes its list calls and changes nothing.

use labsync_id::{DeviceId, InstrumentId};
use labsync_model::identity::{external_serial, find_status};
use labsync_model::{ExternalSerial, InstrumentStatus, StatusScope};
use labsync_reconcile::{best_effort, poll_until};
use labsync_remote::{DeviceService, ManagementService, RemoteError};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::HarnessResult;
use crate::Harness;

/// What a reset did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    /// Stop-waiting requests that succeeded.
    pub released: usize,
    pub release_failures: usize,

    /// Device-service instruments deleted.
    pub deleted: usize,
    pub delete_failures: usize,

    /// Suppress requests that succeeded.
    pub suppressed: usize,
    pub suppress_failures: usize,
}

impl ResetReport {
    /// Whether the reset found nothing to do.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Total per-item failures across all phases.
    pub fn failures(&self) -> usize {
        self.release_failures + self.delete_failures + self.suppress_failures
    }
}

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    /// Tear down every simulated instrument and wait for the management
    /// service to agree.
    #[instrument(skip_all)]
    pub async fn reset_environment(&self) -> HarnessResult<ResetReport> {
        let mut report = ResetReport::default();

        info!("Reset phase 1: releasing waiting instruments");
        let statuses = self
            .management
            .list_device_statuses(StatusScope::IncludePassthrough)
            .await?;
        let waiting: Vec<InstrumentId> = statuses
            .iter()
            .filter(|s| s.connected)
            .filter(|s| !self.config.reset_excluded_types.contains(&s.instrument_type()))
            .map(|s| s.instrument_id())
            .collect();

        let management = &self.management;
        let outcome = best_effort("stop waiting", waiting, |id| management.stop_waiting(id)).await;
        report.released = outcome.succeeded.len();
        report.release_failures = outcome.failed.len();

        info!("Reset phase 2: deleting instruments");
        let targets: Vec<(DeviceId, ExternalSerial)> = self
            .devices
            .list_instruments()
            .await?
            .iter()
            .map(|record| (record.id, external_serial(record)))
            .collect();

        let devices = &self.devices;
        let outcome = best_effort("delete instrument", targets, |(id, serial)| async move {
            devices.delete_instrument(id).await.map(|()| serial)
        })
        .await;
        report.deleted = outcome.succeeded.len();
        report.delete_failures = outcome.failed.len();
        let removed = outcome.succeeded;

        if removed.is_empty() {
            debug!("Reset phase 3 skipped: nothing removed");
        } else {
            info!(count = removed.len(), "Reset phase 3: waiting for removals to converge");
            let removed = &removed;
            poll_until(
                &format!("{} removed instruments to go offline", removed.len()),
                self.config.poll,
                || async move {
                    let statuses = management
                        .list_device_statuses(StatusScope::IncludePassthrough)
                        .await?;
                    let lingering = removed
                        .iter()
                        .filter(|serial| {
                            find_status(&statuses, serial).is_some_and(|s| !s.is_gone())
                        })
                        .count();
                    if lingering > 0 {
                        debug!(lingering, "Removed instruments still reported online");
                    }
                    Ok::<_, RemoteError>((lingering == 0).then_some(()))
                },
            )
            .await?;
        }

        info!("Reset phase 4: suppressing stale indicators");
        let statuses = self
            .management
            .list_device_statuses(StatusScope::IncludePassthrough)
            .await?;
        let stale: Vec<InstrumentId> = statuses
            .iter()
            .filter(|s| {
                (!s.connected && s.instrument_status != InstrumentStatus::Ready)
                    || removed.iter().any(|serial| *serial == s.serial())
            })
            .map(|s| s.instrument_id())
            .collect();

        let outcome = best_effort("suppress", stale, |id| management.suppress(id)).await;
        report.suppressed = outcome.succeeded.len();
        report.suppress_failures = outcome.failed.len();

        info!(
            released = report.released,
            deleted = report.deleted,
            suppressed = report.suppressed,
            failures = report.failures(),
            "Reset complete"
        );
        Ok(report)
    }
}
