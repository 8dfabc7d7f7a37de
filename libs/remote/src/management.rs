//! HTTP client for the management service.

use anyhow::Result;
use async_trait::async_trait;
use labsync_id::{InstrumentId, RunId};
use labsync_model::{
    ConnectedDeviceStatus, FeatureFlagUpdate, PendingApproval, QcBarcodeRequest,
    RunningLabRequest, StatusScope,
};

use crate::client::ApiClient;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, ServiceKind};
use crate::service::ManagementService;

/// Management service API client.
#[derive(Debug, Clone)]
pub struct ManagementServiceClient {
    api: ApiClient,
}

impl ManagementServiceClient {
    /// Create a new management service client.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(
                ServiceKind::Management,
                &config.management_service_url,
                config.management_token.as_deref(),
                config.request_timeout,
            )?,
        })
    }

    async fn device_action(&self, id: InstrumentId, action: &str) -> Result<(), RemoteError> {
        self.api
            .post_no_content::<()>(&format!("/api/devices/{}/{action}", id.value()), None)
            .await
    }
}

#[async_trait]
impl ManagementService for ManagementServiceClient {
    async fn list_device_statuses(
        &self,
        scope: StatusScope,
    ) -> Result<Vec<ConnectedDeviceStatus>, RemoteError> {
        match scope {
            StatusScope::Standard => self.api.get("/api/devices/status").await,
            StatusScope::IncludePassthrough => {
                self.api
                    .get_with_query("/api/devices/status", &[("includePassthrough", "true")])
                    .await
            }
        }
    }

    async fn list_pending_approvals(&self) -> Result<Vec<PendingApproval>, RemoteError> {
        self.api.get("/api/devices/pending-approval").await
    }

    async fn approve_device(&self, id: InstrumentId) -> Result<(), RemoteError> {
        self.device_action(id, "approve").await
    }

    async fn stop_waiting(&self, id: InstrumentId) -> Result<(), RemoteError> {
        self.device_action(id, "stop-waiting").await
    }

    async fn suppress(&self, id: InstrumentId) -> Result<(), RemoteError> {
        self.device_action(id, "suppress").await
    }

    async fn list_running_lab_requests(&self) -> Result<Vec<RunningLabRequest>, RemoteError> {
        self.api.get("/api/lab-requests/running").await
    }

    async fn cancel_run(&self, id: RunId) -> Result<(), RemoteError> {
        self.api
            .post_no_content::<()>(&format!("/api/runs/{}/cancel", id.value()), None)
            .await
    }

    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<(), RemoteError> {
        self.api
            .put_no_content(
                &format!("/api/feature-flags/{}", urlencoding::encode(name)),
                &FeatureFlagUpdate { enabled },
            )
            .await
    }

    async fn save_qc_barcodes(&self, request: &QcBarcodeRequest) -> Result<(), RemoteError> {
        self.api
            .post_no_content("/api/qc/barcodes", Some(request))
            .await
    }
}
