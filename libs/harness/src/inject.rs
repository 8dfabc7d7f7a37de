//! Result staging.

use labsync_id::DeviceId;
use labsync_model::{ResultSet, StagedResultDocument};
use labsync_remote::{DeviceService, ManagementService};
use tracing::debug;

use crate::error::HarnessResult;
use crate::Harness;

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    /// Stage the results the next simulated run on `device` returns.
    ///
    /// Staging again before a run replaces the earlier document.
    pub async fn stage_results(&self, device: DeviceId, results: &ResultSet) -> HarnessResult<()> {
        let document = StagedResultDocument::from_result_set(results)?;
        self.devices.stage_next_result(device, &document).await?;
        debug!(
            device_id = %device,
            assays = results.results.len(),
            "Staged next result"
        );
        Ok(())
    }
}
