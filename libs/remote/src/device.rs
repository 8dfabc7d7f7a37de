//! HTTP client for the device service.

use anyhow::Result;
use async_trait::async_trait;
use labsync_id::DeviceId;
use labsync_model::{CreateInstrumentRequest, DeviceRecord, StagedResultDocument};
use tracing::debug;

use crate::client::ApiClient;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, ServiceKind};
use crate::service::DeviceService;

/// Device service API client.
#[derive(Debug, Clone)]
pub struct DeviceServiceClient {
    api: ApiClient,
}

impl DeviceServiceClient {
    /// Create a new device service client.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(
                ServiceKind::Device,
                &config.device_service_url,
                None,
                config.request_timeout,
            )?,
        })
    }
}

#[async_trait]
impl DeviceService for DeviceServiceClient {
    async fn create_instrument(&self, device_type_name: &str) -> Result<DeviceRecord, RemoteError> {
        let body = CreateInstrumentRequest {
            instrument_type: device_type_name.to_string(),
        };
        let record: DeviceRecord = self.api.post("/api/instruments", &body).await?;
        debug!(device_id = %record.id, device_type = device_type_name, "Created instrument");
        Ok(record)
    }

    async fn list_instruments(&self) -> Result<Vec<DeviceRecord>, RemoteError> {
        self.api.get("/api/instruments").await
    }

    async fn list_instruments_of_type(
        &self,
        device_type_name: &str,
    ) -> Result<Vec<DeviceRecord>, RemoteError> {
        self.api
            .get_with_query("/api/instruments", &[("instrumentType", device_type_name)])
            .await
    }

    async fn get_instrument(&self, id: DeviceId) -> Result<DeviceRecord, RemoteError> {
        self.api
            .get(&format!("/api/instruments/{}", id.value()))
            .await
    }

    async fn delete_instrument(&self, id: DeviceId) -> Result<(), RemoteError> {
        self.api
            .delete(&format!("/api/instruments/{}", id.value()))
            .await
    }

    async fn stage_next_result(
        &self,
        id: DeviceId,
        document: &StagedResultDocument,
    ) -> Result<(), RemoteError> {
        self.api
            .post_no_content(
                &format!("/api/instruments/{}/next-result", id.value()),
                Some(document),
            )
            .await
    }

    async fn run_maintenance(
        &self,
        id: DeviceId,
        payload: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        self.api
            .post_no_content(
                &format!("/api/instruments/{}/maintenance", id.value()),
                Some(payload),
            )
            .await
    }

    async fn inject_fault(
        &self,
        id: DeviceId,
        payload: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        self.api
            .post_no_content(
                &format!("/api/instruments/{}/faults", id.value()),
                Some(payload),
            )
            .await
    }
}
