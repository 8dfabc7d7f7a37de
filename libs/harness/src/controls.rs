//! Scenario controls: feature flags, QC barcodes, maintenance and faults.

use labsync_id::DeviceId;
use labsync_model::identity::{device_type_name, external_serial, find_status};
use labsync_model::{
    ConnectedDeviceStatus, DeviceRecord, InstrumentStatus, InstrumentType, QcBarcodeRequest,
    StatusScope,
};
use labsync_reconcile::poll_until;
use labsync_remote::{DeviceService, ManagementService, RemoteError};
use tracing::info;

use crate::error::HarnessResult;
use crate::Harness;

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    pub async fn set_feature_flag(&self, name: &str, enabled: bool) -> HarnessResult<()> {
        self.management.set_feature_flag(name, enabled).await?;
        info!(flag = name, enabled, "Feature flag set");
        Ok(())
    }

    /// Register QC lot barcodes for an instrument type.
    ///
    /// Types without QC support are rejected before any call is made.
    pub async fn save_qc_barcodes(
        &self,
        instrument_type: InstrumentType,
        barcodes: &[String],
    ) -> HarnessResult<QcBarcodeRequest> {
        let request = QcBarcodeRequest::for_type(instrument_type, barcodes)?;
        self.management.save_qc_barcodes(&request).await?;
        info!(
            instrument_type = %instrument_type,
            count = barcodes.len(),
            "QC barcodes saved"
        );
        Ok(request)
    }

    pub async fn run_maintenance(
        &self,
        device: DeviceId,
        payload: &serde_json::Value,
    ) -> HarnessResult<()> {
        self.devices.run_maintenance(device, payload).await?;
        Ok(())
    }

    /// Make the simulated instrument report a fault.
    ///
    /// The management service picks the fault up asynchronously; follow with
    /// [`Harness::wait_for_status`] to observe it.
    pub async fn inject_fault(
        &self,
        device: DeviceId,
        payload: &serde_json::Value,
    ) -> HarnessResult<()> {
        self.devices.inject_fault(device, payload).await?;
        info!(device_id = %device, "Fault injected");
        Ok(())
    }

    /// Wait until the management service reports `status` for the instrument.
    pub async fn wait_for_status(
        &self,
        record: &DeviceRecord,
        status: InstrumentStatus,
    ) -> HarnessResult<ConnectedDeviceStatus> {
        let serial = external_serial(record);
        let serial = &serial;
        let management = &self.management;
        let entry = poll_until(
            &format!("{serial} to report {status}"),
            self.config.poll,
            || async move {
                let statuses = management
                    .list_device_statuses(StatusScope::IncludePassthrough)
                    .await?;
                Ok::<_, RemoteError>(
                    find_status(&statuses, serial)
                        .filter(|s| s.instrument_status == status)
                        .cloned(),
                )
            },
        )
        .await?;
        Ok(entry)
    }

    /// Device-service instruments of one type.
    pub async fn instruments_of_type(
        &self,
        instrument_type: InstrumentType,
    ) -> HarnessResult<Vec<DeviceRecord>> {
        Ok(self
            .devices
            .list_instruments_of_type(device_type_name(instrument_type))
            .await?)
    }
}
