//! Test-harness synchronization engine.
//!
//! End-to-end scenarios drive two services that do not share state or
//! confirm mutations synchronously: the device service simulates
//! instruments, the management service reports what it believes is
//! connected. [`Harness`] brings them to a known, agreed state before a
//! scenario acts and keeps them consistent while it runs:
//!
//! - [`Harness::ensure_instrument_of_type`]: reuse an operable instrument or
//!   create one and wait until the management service reports it Ready,
//!   approving it on the way if its type requires that
//! - [`Harness::reset_environment`]: tear every instrument down and wait for
//!   the management service to notice
//! - [`Harness::cancel_running_lab_requests`]: cancel in-flight runs and
//!   release the instruments they hold
//! - [`Harness::stage_results`]: pre-load the next simulated run's results
//!
//! All convergence waits go through [`labsync_reconcile::poll_until`] and all
//! cross-service correlation through [`labsync_model::identity`].
//!
//! The harness holds no state between calls beyond its configuration; every
//! operation starts from what the services currently report.

mod cancel;
mod config;
mod controls;
mod error;
mod inject;
mod provision;
mod reset;

use labsync_remote::{
    DeviceService, DeviceServiceClient, ManagementService, ManagementServiceClient, RemoteConfig,
};

pub use cancel::CancelReport;
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use provision::ProvisionState;
pub use reset::ResetReport;

/// The synchronization engine over one device service and one management
/// service.
#[derive(Debug, Clone)]
pub struct Harness<D, M> {
    devices: D,
    management: M,
    config: HarnessConfig,
}

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    /// Create a harness over the given services.
    pub fn new(devices: D, management: M, config: HarnessConfig) -> Self {
        Self {
            devices,
            management,
            config,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The device service the harness drives.
    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// The management service the harness observes.
    pub fn management(&self) -> &M {
        &self.management
    }
}

impl Harness<DeviceServiceClient, ManagementServiceClient> {
    /// Create a harness talking HTTP to the configured endpoints.
    pub fn connect(remote: &RemoteConfig, config: HarnessConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            DeviceServiceClient::new(remote)?,
            ManagementServiceClient::new(remote)?,
            config,
        ))
    }
}
