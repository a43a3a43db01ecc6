//! Azure credentials and subscription discovery
//!
//! Tokens are supplied from outside (environment or CLI); acquiring them is
//! left to `az account get-access-token` or whatever the caller uses.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable holding the ARM bearer token
pub const TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Environment variable holding the subscription id
pub const SUBSCRIPTION_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// Bearer token for ARM calls
#[derive(Clone)]
pub struct ArmCredentials {
    token: String,
}

impl ArmCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `AZURE_ACCESS_TOKEN`
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).with_context(|| {
            format!(
                "{} is not set. Run 'az account get-access-token' and export the token",
                TOKEN_ENV
            )
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow::anyhow!("{} is empty", TOKEN_ENV));
        }
        Ok(Self::new(token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Never print the token itself.
impl std::fmt::Debug for ArmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Subscription ids are GUIDs
pub fn validate_subscription_id(subscription: &str) -> bool {
    uuid::Uuid::parse_str(subscription).is_ok()
}

#[derive(Debug, Deserialize)]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Pick the default subscription out of an `azureProfile.json` document
pub fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The Azure CLI writes this file with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = serde_json::from_str(content).ok()?;

    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}

/// Read the default subscription from the environment or the Azure CLI profile
pub fn get_default_subscription() -> Option<String> {
    if let Ok(subscription) = std::env::var(SUBSCRIPTION_ENV) {
        if validate_subscription_id(&subscription) {
            return Some(subscription);
        }
        tracing::warn!("Invalid subscription id format in {}", SUBSCRIPTION_ENV);
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(&profile_path).ok()?;
    default_subscription_from_profile(&content)
}
