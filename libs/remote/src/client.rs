//! Shared HTTP plumbing for both service clients.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{RemoteError, ServiceKind};

/// JSON-over-HTTP client bound to one service.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    service: ServiceKind,
}

impl ApiClient {
    /// Create a client for `base_url`, optionally sending a bearer token.
    pub(crate) fn new(
        service: ServiceKind,
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("Invalid token format")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        })
    }

    /// Build a URL for an endpoint.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        debug!(service = %self.service, path, "GET");
        let response = self.client.get(self.url(path)).send().await?;

        self.handle_response(response).await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, RemoteError> {
        debug!(service = %self.service, path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;

        self.handle_response(response).await
    }

    /// Make a POST request and decode the response body.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        debug!(service = %self.service, path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;

        self.handle_response(response).await
    }

    /// Make a POST request whose response body is ignored.
    pub(crate) async fn post_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), RemoteError> {
        debug!(service = %self.service, path, "POST");
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        self.handle_empty(response).await
    }

    /// Make a PUT request whose response body is ignored.
    pub(crate) async fn put_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RemoteError> {
        debug!(service = %self.service, path, "PUT");
        let response = self.client.put(self.url(path)).json(body).send().await?;

        self.handle_empty(response).await
    }

    /// Make a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        debug!(service = %self.service, path, "DELETE");
        let response = self.client.delete(self.url(path)).send().await?;

        self.handle_empty(response).await
    }

    /// Handle a successful or error response.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        if response.status().is_success() {
            response.json().await.map_err(|e| RemoteError::Decode {
                service: self.service,
                message: e.to_string(),
            })
        } else {
            self.handle_error(response).await
        }
    }

    async fn handle_empty(&self, response: reqwest::Response) -> Result<(), RemoteError> {
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error(response).await
        }
    }

    /// Handle an error response.
    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, RemoteError> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            "no response body".to_string()
        } else {
            body
        };

        Err(RemoteError::api(self.service, status, message))
    }
}
