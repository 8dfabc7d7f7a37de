//! Service contracts consumed by the synchronization engine.

use async_trait::async_trait;
use labsync_id::{DeviceId, InstrumentId, RunId};
use labsync_model::{
    ConnectedDeviceStatus, DeviceRecord, PendingApproval, QcBarcodeRequest, RunningLabRequest,
    StagedResultDocument, StatusScope,
};

use crate::error::RemoteError;

/// The device service: simulated instruments and their results.
///
/// Type names passed here are device-service names; map management types
/// through `labsync_model::identity::device_type_name`.
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// Create a simulated instrument. The response may be partially populated.
    async fn create_instrument(&self, device_type_name: &str) -> Result<DeviceRecord, RemoteError>;

    /// List every simulated instrument.
    async fn list_instruments(&self) -> Result<Vec<DeviceRecord>, RemoteError>;

    /// List simulated instruments of one type.
    async fn list_instruments_of_type(
        &self,
        device_type_name: &str,
    ) -> Result<Vec<DeviceRecord>, RemoteError>;

    async fn get_instrument(&self, id: DeviceId) -> Result<DeviceRecord, RemoteError>;

    async fn delete_instrument(&self, id: DeviceId) -> Result<(), RemoteError>;

    /// Stage the result the next simulated run on `id` returns.
    async fn stage_next_result(
        &self,
        id: DeviceId,
        document: &StagedResultDocument,
    ) -> Result<(), RemoteError>;

    async fn run_maintenance(
        &self,
        id: DeviceId,
        payload: &serde_json::Value,
    ) -> Result<(), RemoteError>;

    async fn inject_fault(&self, id: DeviceId, payload: &serde_json::Value)
        -> Result<(), RemoteError>;
}

/// The management service: connected-device status and lab requests.
#[async_trait]
pub trait ManagementService: Send + Sync {
    async fn list_device_statuses(
        &self,
        scope: StatusScope,
    ) -> Result<Vec<ConnectedDeviceStatus>, RemoteError>;

    async fn list_pending_approvals(&self) -> Result<Vec<PendingApproval>, RemoteError>;

    async fn approve_device(&self, id: InstrumentId) -> Result<(), RemoteError>;

    /// Release an instrument that is waiting on operator input.
    async fn stop_waiting(&self, id: InstrumentId) -> Result<(), RemoteError>;

    /// Clear a stale operator-facing indicator for an instrument.
    async fn suppress(&self, id: InstrumentId) -> Result<(), RemoteError>;

    async fn list_running_lab_requests(&self) -> Result<Vec<RunningLabRequest>, RemoteError>;

    async fn cancel_run(&self, id: RunId) -> Result<(), RemoteError>;

    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<(), RemoteError>;

    async fn save_qc_barcodes(&self, request: &QcBarcodeRequest) -> Result<(), RemoteError>;
}
