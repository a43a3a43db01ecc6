//! HTTP utilities for ARM REST API calls

use crate::error::ArmError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Truncate a body on a char boundary, keeping its characters as they are
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_LOG_BODY_LENGTH {
        return body.to_string();
    }
    let cut = (0..=MAX_LOG_BODY_LENGTH)
        .rev()
        .find(|i| body.is_char_boundary(*i))
        .unwrap_or(0);
    format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
}

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    truncate_body(body).replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Pull `code` and `message` out of an ARM error envelope
fn parse_error_body(status: StatusCode, body: &str) -> (String, String) {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);

    let code = parsed
        .as_ref()
        .and_then(|e| e.code.clone())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| truncate_body(body));

    (code, message)
}

/// A successful ARM response with the headers needed for polling
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub async_operation: Option<String>,
    pub location: Option<String>,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ArmResponse {
    fn from_parts(status: StatusCode, headers: &HeaderMap, body: String) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            status,
            async_operation: header_str(AZURE_ASYNC_OPERATION),
            location: header_str(reqwest::header::LOCATION.as_str()),
            retry_after: header_str(RETRY_AFTER.as_str())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
            body,
        }
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ArmError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ArmError> {
        let client = Client::builder()
            .user_agent(concat!("azrm-lngw/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request to an ARM API
    pub async fn get(&self, url: &str, token: &str) -> Result<ArmResponse, ArmError> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url), token).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<ArmResponse, ArmError> {
        tracing::debug!("PUT {}", url);
        self.send(self.client.put(url).json(body), token).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: &str) -> Result<ArmResponse, ArmError> {
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url), token).await
    }

    async fn send(&self, request: RequestBuilder, token: &str) -> Result<ArmResponse, ArmError> {
        let response = request
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID, uuid::Uuid::new_v4().to_string())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            let (_, message) = parse_error_body(status, &body);
            tracing::debug!("Not found: {}", sanitize_for_log(&message));
            return Err(ArmError::NotFound { message });
        }

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let (code, message) = parse_error_body(status, &body);
            return Err(ArmError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(ArmResponse::from_parts(status, &headers, body))
    }
}

/// Format an error chain for display
/// ARM status codes are turned into short hints; everything else is truncated
pub fn format_arm_error(error: &anyhow::Error) -> String {
    let hint = error
        .chain()
        .find_map(|e| e.downcast_ref::<ArmError>())
        .and_then(|arm| match arm.status() {
            Some(401) => Some("Authentication failed. Refresh AZURE_ACCESS_TOKEN with 'az account get-access-token'."),
            Some(403) => Some("Permission denied. Check the role assignments on the subscription."),
            Some(404) => Some("Resource not found."),
            Some(409) => Some("Resource conflict. The resource may already exist or be in use."),
            Some(429) => Some("Rate limit exceeded. Please try again later."),
            Some(400) => Some("Invalid request. Check the declared attributes."),
            Some(s) if s >= 500 => Some("Azure service temporarily unavailable. Please try again."),
            _ => None,
        });

    let headline = error
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(160)
        .collect::<String>();

    match hint {
        Some(hint) => format!("{}: {}", headline, hint),
        None => format!("{:#}", error)
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .take(240)
            .collect(),
    }
}
