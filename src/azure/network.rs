//! Local network gateways
//!
//! Wire model for `Microsoft.Network/localNetworkGateways` and the client
//! contract the resource layer talks to.

use super::client::ArmClient;
use crate::error::ArmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// ARM resource type segment
pub const RESOURCE_TYPE: &str = "localNetworkGateways";

/// A local network gateway as ARM sends and receives it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNetworkGateway {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<LocalNetworkGatewayProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNetworkGatewayProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_network_address_space: Option<AddressSpace>,
    /// Read-only, set by the service
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefixes: Option<Vec<String>>,
}

impl LocalNetworkGateway {
    /// Build a create-or-update request body
    pub fn request(name: &str, location: &str, gateway_ip_address: &str, prefixes: &[String]) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
            location: Some(location.to_string()),
            properties: Some(LocalNetworkGatewayProperties {
                gateway_ip_address: Some(gateway_ip_address.to_string()),
                local_network_address_space: Some(AddressSpace {
                    address_prefixes: Some(prefixes.to_vec()),
                }),
                provisioning_state: None,
            }),
        }
    }

    pub fn gateway_ip_address(&self) -> Option<&str> {
        self.properties.as_ref()?.gateway_ip_address.as_deref()
    }

    pub fn address_prefixes(&self) -> Option<&[String]> {
        self.properties
            .as_ref()?
            .local_network_address_space
            .as_ref()?
            .address_prefixes
            .as_deref()
    }
}

/// Operations on local network gateways
#[async_trait]
pub trait LocalNetworkGatewaysApi: Send + Sync {
    /// Create or replace a gateway; resolves once the operation has finished
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        gateway: &LocalNetworkGateway,
    ) -> Result<LocalNetworkGateway, ArmError>;

    /// Fetch a gateway by name
    async fn get(&self, resource_group: &str, name: &str) -> Result<LocalNetworkGateway, ArmError>;

    /// Delete a gateway; resolves once the operation has finished
    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), ArmError>;
}

/// [`LocalNetworkGatewaysApi`] over the ARM REST API
#[derive(Clone)]
pub struct LocalNetworkGatewaysClient {
    arm: ArmClient,
}

impl LocalNetworkGatewaysClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn url(&self, resource_group: &str, name: &str) -> Result<String, ArmError> {
        self.arm.network_url(resource_group, RESOURCE_TYPE, name)
    }
}

#[async_trait]
impl LocalNetworkGatewaysApi for LocalNetworkGatewaysClient {
    async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        gateway: &LocalNetworkGateway,
    ) -> Result<LocalNetworkGateway, ArmError> {
        let url = self.url(resource_group, name)?;
        let body = serde_json::to_value(gateway)?;

        let response = self.arm.put(&url, &body).await?;
        self.arm.wait_for_completion(&response).await?;

        if response.body.trim().is_empty() {
            return Ok(LocalNetworkGateway::default());
        }
        response.json()
    }

    async fn get(&self, resource_group: &str, name: &str) -> Result<LocalNetworkGateway, ArmError> {
        let url = self.url(resource_group, name)?;
        self.arm.get(&url).await?.json()
    }

    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), ArmError> {
        let url = self.url(resource_group, name)?;
        let response = self.arm.delete(&url).await?;
        self.arm.wait_for_completion(&response).await
    }
}
