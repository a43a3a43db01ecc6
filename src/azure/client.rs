//! ARM Client
//!
//! Main client for interacting with Azure Resource Manager, combining
//! credentials, HTTP and long-running operation polling.

use super::auth::ArmCredentials;
use super::http::{ArmHttpClient, ArmResponse};
use crate::error::ArmError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Public Azure cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Network resource provider API version
pub const DEFAULT_API_VERSION: &str = "2023-09-01";

/// Delay between polls when the service sends no Retry-After
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Body of an `Azure-AsyncOperation` status document
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    pub credentials: ArmCredentials,
    pub http: ArmHttpClient,
    pub subscription_id: String,
    pub endpoint: String,
    pub api_version: String,
    pub poll_interval: Duration,
}

impl ArmClient {
    /// Create a new ARM client against the public cloud endpoint
    pub fn new(credentials: ArmCredentials, subscription_id: &str) -> Result<Self, ArmError> {
        Ok(Self {
            credentials,
            http: ArmHttpClient::new()?,
            subscription_id: subscription_id.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Point the client at a different management endpoint
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<ArmResponse, ArmError> {
        self.http.get(url, self.credentials.token()).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: &Value) -> Result<ArmResponse, ArmError> {
        self.http.put(url, self.credentials.token(), body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<ArmResponse, ArmError> {
        self.http.delete(url, self.credentials.token()).await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build the URL of a resource group scoped resource
    pub fn resource_url(
        &self,
        resource_group: &str,
        provider: &str,
        resource_type: &str,
        name: &str,
    ) -> Result<String, ArmError> {
        let base = format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.endpoint,
            self.subscription_id,
            urlencoding::encode(resource_group),
            provider,
            resource_type,
            urlencoding::encode(name)
        );
        let url = Url::parse_with_params(&base, &[("api-version", self.api_version.as_str())])?;
        Ok(url.to_string())
    }

    /// Build the URL of a `Microsoft.Network` resource
    pub fn network_url(
        &self,
        resource_group: &str,
        resource_type: &str,
        name: &str,
    ) -> Result<String, ArmError> {
        self.resource_url(resource_group, "Microsoft.Network", resource_type, name)
    }

    // =========================================================================
    // Long-running operations
    // =========================================================================

    /// Wait until the operation started by `initial` has finished
    pub async fn wait_for_completion(&self, initial: &ArmResponse) -> Result<(), ArmError> {
        if let Some(url) = &initial.async_operation {
            return self.poll_async_operation(url, initial.retry_after).await;
        }
        if initial.status == StatusCode::ACCEPTED {
            if let Some(url) = &initial.location {
                return self.poll_location(url, initial.retry_after).await;
            }
        }
        Ok(())
    }

    async fn poll_async_operation(
        &self,
        url: &str,
        mut delay: Option<Duration>,
    ) -> Result<(), ArmError> {
        loop {
            tokio::time::sleep(delay.unwrap_or(self.poll_interval)).await;

            let response = self.get(url).await?;
            let operation: OperationStatus = response.json()?;

            match operation.status.as_str() {
                "Succeeded" => {
                    tracing::debug!("Operation succeeded: {}", url);
                    return Ok(());
                }
                "Failed" | "Canceled" => {
                    let message = operation
                        .error
                        .map(|e| match (e.code, e.message) {
                            (Some(code), Some(message)) => format!("{}: {}", code, message),
                            (Some(code), None) => code,
                            (None, Some(message)) => message,
                            (None, None) => String::new(),
                        })
                        .unwrap_or_default();
                    return Err(ArmError::OperationFailed {
                        status: operation.status,
                        message,
                    });
                }
                other => {
                    tracing::debug!("Operation still {}, polling again", other);
                    delay = response.retry_after;
                }
            }
        }
    }

    async fn poll_location(&self, url: &str, mut delay: Option<Duration>) -> Result<(), ArmError> {
        loop {
            tokio::time::sleep(delay.unwrap_or(self.poll_interval)).await;

            let response = self.get(url).await?;
            if response.status != StatusCode::ACCEPTED {
                tracing::debug!("Operation finished with {}: {}", response.status, url);
                return Ok(());
            }
            delay = response.retry_after;
        }
    }
}
