//! `azurerm_local_network_gateway`
//!
//! The on-premises side of a site-to-site VPN: the public address of the
//! local VPN device and the address prefixes reachable behind it.
//!
//! Update is a full replace through the same PUT as create.

use super::schema::{AttributeSchema, AttributeType, ResourceData, ResourceSchema};
use super::Resource;
use crate::azure::location::normalize_location;
use crate::azure::network::{LocalNetworkGateway, LocalNetworkGatewaysApi, RESOURCE_TYPE};
use crate::azure::resource_id::AzureResourceId;
use crate::error::ResourceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::OnceLock;

pub const TYPE_NAME: &str = "azurerm_local_network_gateway";

/// Attribute schema of the resource
pub fn schema() -> &'static ResourceSchema {
    static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ResourceSchema::new(TYPE_NAME)
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new()
                    .with_description("Name of the local network gateway"),
            )
            .attribute(
                AttributeSchema::new("location", AttributeType::String)
                    .force_new()
                    .with_state_func(normalize_location)
                    .with_description("Azure region, stored lowercase without spaces"),
            )
            .attribute(
                AttributeSchema::new("resource_group_name", AttributeType::String)
                    .force_new()
                    .with_description("Resource group holding the gateway"),
            )
            .attribute(
                AttributeSchema::new("gateway_address", AttributeType::String)
                    .required()
                    .with_description("Public IP address of the local VPN device"),
            )
            .attribute(
                AttributeSchema::new("address_space", AttributeType::List)
                    .required()
                    .with_description("Address prefixes reachable through the gateway"),
            )
    })
}

/// Typed view of the declared attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNetworkGatewayConfig {
    pub name: String,
    pub location: String,
    pub resource_group_name: String,
    pub gateway_address: String,
    pub address_space: Vec<String>,
}

impl TryFrom<&ResourceData> for LocalNetworkGatewayConfig {
    type Error = ResourceError;

    fn try_from(data: &ResourceData) -> Result<Self, Self::Error> {
        schema().validate(data)?;

        let string = |name: &str| data.get_str(name).unwrap_or_default().to_string();
        Ok(Self {
            name: string("name"),
            location: string("location"),
            resource_group_name: string("resource_group_name"),
            gateway_address: string("gateway_address"),
            address_space: data.get_list("address_space").unwrap_or_default().to_vec(),
        })
    }
}

/// Resource group and name addressed by a stored identifier
fn locate(data: &ResourceData) -> Result<(String, String)> {
    let id: AzureResourceId = data.id().parse()?;
    let name = id.segment(RESOURCE_TYPE)?.to_string();
    Ok((id.resource_group, name))
}

pub struct LocalNetworkGatewayResource<C> {
    client: C,
}

impl<C: LocalNetworkGatewaysApi> LocalNetworkGatewayResource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LocalNetworkGatewaysApi> Resource for LocalNetworkGatewayResource<C> {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> &ResourceSchema {
        schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let config = LocalNetworkGatewayConfig::try_from(&*data)?;
        let resource_group = config.resource_group_name.as_str();
        let name = config.name.as_str();

        tracing::info!(
            "Creating local network gateway {} in resource group {}",
            name,
            resource_group
        );

        let request = LocalNetworkGateway::request(
            name,
            &config.location,
            &config.gateway_address,
            &config.address_space,
        );
        self.client
            .create_or_update(resource_group, name, &request)
            .await
            .with_context(|| format!("Error creating Azure ARM Local Network Gateway '{}'", name))?;

        let created = self.client.get(resource_group, name).await?;
        let Some(id) = created.id.filter(|id| !id.is_empty()) else {
            return Err(ResourceError::MissingId {
                name: name.to_string(),
                resource_group: resource_group.to_string(),
            }
            .into());
        };

        data.set_id(id);
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let (resource_group, name) = locate(data)?;
        tracing::debug!("Reading local network gateway {}", data.id());

        let gateway = match self.client.get(&resource_group, &name).await {
            Ok(gateway) => gateway,
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "Local network gateway {} no longer exists, removing from state",
                    data.id()
                );
                data.clear_id();
                return Ok(());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "Error reading the state of Azure ARM local network gateway '{}'",
                    name
                )));
            }
        };

        data.set_str("name", gateway.name.clone().unwrap_or(name));
        data.set_str("location", gateway.location.clone().unwrap_or_default());
        data.set_str("resource_group_name", resource_group);
        data.set_str(
            "gateway_address",
            gateway.gateway_ip_address().unwrap_or_default(),
        );
        data.set_list(
            "address_space",
            gateway.address_prefixes().unwrap_or_default().to_vec(),
        );

        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        self.create(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let (resource_group, name) = locate(data)?;
        tracing::info!("Deleting local network gateway {}", data.id());

        self.client
            .delete(&resource_group, &name)
            .await
            .with_context(|| {
                format!(
                    "Error issuing Azure ARM delete request of local network gateway '{}'",
                    name
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::resource_id::ResourceIdError;
    use crate::error::ArmError;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

    /// In-memory stand-in for the ARM API
    #[derive(Default)]
    struct FakeGateways {
        gateways: Mutex<BTreeMap<(String, String), LocalNetworkGateway>>,
        fail_create: Option<u16>,
        fail_get: Option<u16>,
        fail_delete: Option<u16>,
        omit_id: bool,
        reverse_prefixes: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    fn api_error(status: u16) -> ArmError {
        ArmError::Api {
            status,
            code: "InternalServerError".into(),
            message: "boom".into(),
        }
    }

    fn gateway_id(resource_group: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/localNetworkGateways/{}",
            SUBSCRIPTION, resource_group, name
        )
    }

    impl FakeGateways {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn stored(&self, resource_group: &str, name: &str) -> Option<LocalNetworkGateway> {
            self.gateways
                .lock()
                .unwrap()
                .get(&(resource_group.to_string(), name.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl LocalNetworkGatewaysApi for FakeGateways {
        async fn create_or_update(
            &self,
            resource_group: &str,
            name: &str,
            gateway: &LocalNetworkGateway,
        ) -> Result<LocalNetworkGateway, ArmError> {
            self.calls.lock().unwrap().push("create_or_update");
            if let Some(status) = self.fail_create {
                return Err(api_error(status));
            }

            let mut stored = gateway.clone();
            stored.id = Some(gateway_id(resource_group, name));
            if self.reverse_prefixes {
                if let Some(space) = stored
                    .properties
                    .as_mut()
                    .and_then(|p| p.local_network_address_space.as_mut())
                    .and_then(|s| s.address_prefixes.as_mut())
                {
                    space.reverse();
                }
            }
            self.gateways
                .lock()
                .unwrap()
                .insert((resource_group.to_string(), name.to_string()), stored.clone());
            Ok(stored)
        }

        async fn get(&self, resource_group: &str, name: &str) -> Result<LocalNetworkGateway, ArmError> {
            self.calls.lock().unwrap().push("get");
            if let Some(status) = self.fail_get {
                return Err(api_error(status));
            }

            let mut gateway = self.stored(resource_group, name).ok_or_else(|| ArmError::NotFound {
                message: format!("{} not found", name),
            })?;
            if self.omit_id {
                gateway.id = None;
            }
            Ok(gateway)
        }

        async fn delete(&self, resource_group: &str, name: &str) -> Result<(), ArmError> {
            self.calls.lock().unwrap().push("delete");
            if let Some(status) = self.fail_delete {
                return Err(api_error(status));
            }

            self.gateways
                .lock()
                .unwrap()
                .remove(&(resource_group.to_string(), name.to_string()));
            Ok(())
        }
    }

    fn declared(value: Value) -> ResourceData {
        schema().decode(value.as_object().unwrap()).unwrap()
    }

    fn example() -> ResourceData {
        declared(json!({
            "name": "gw1",
            "location": "West Europe",
            "resource_group_name": "rg1",
            "gateway_address": "203.0.113.1",
            "address_space": ["10.0.0.0/24", "10.0.1.0/24"]
        }))
    }

    #[tokio::test]
    async fn test_create_then_read_round_trip() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();

        resource.create(&mut data).await.unwrap();

        assert_eq!(data.id(), gateway_id("rg1", "gw1"));
        assert_eq!(data.get_str("name"), Some("gw1"));
        assert_eq!(data.get_str("location"), Some("westeurope"));
        assert_eq!(data.get_str("resource_group_name"), Some("rg1"));
        assert_eq!(data.get_str("gateway_address"), Some("203.0.113.1"));
        assert_eq!(
            data.get_list("address_space").unwrap(),
            &["10.0.0.0/24".to_string(), "10.0.1.0/24".to_string()]
        );
        assert_eq!(resource.client.calls(), vec!["create_or_update", "get", "get"]);
    }

    #[tokio::test]
    async fn test_create_sends_normalized_location() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();

        resource.create(&mut data).await.unwrap();

        let stored = resource.client.stored("rg1", "gw1").unwrap();
        assert_eq!(stored.location.as_deref(), Some("westeurope"));
        assert_eq!(stored.gateway_ip_address(), Some("203.0.113.1"));
    }

    #[tokio::test]
    async fn test_read_keeps_remote_prefix_order() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            reverse_prefixes: true,
            ..Default::default()
        });
        let mut data = example();

        resource.create(&mut data).await.unwrap();

        assert_eq!(
            data.get_list("address_space").unwrap(),
            &["10.0.1.0/24".to_string(), "10.0.0.0/24".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config_without_calling_api() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();
        data.set_str("gateway_address", "");

        let err = resource.create(&mut data).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::EmptyAttribute(attr)) if attr == "gateway_address"
        ));
        assert!(resource.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_wraps_api_error() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            fail_create: Some(409),
            ..Default::default()
        });
        let mut data = example();

        let err = resource.create(&mut data).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error creating Azure ARM Local Network Gateway 'gw1'"
        );
        assert_eq!(err.downcast_ref::<ArmError>().and_then(ArmError::status), Some(409));
        assert!(data.is_absent());
    }

    #[tokio::test]
    async fn test_create_propagates_post_create_get_error() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            fail_get: Some(500),
            ..Default::default()
        });
        let mut data = example();

        let err = resource.create(&mut data).await.unwrap_err();

        // The fetch after a successful PUT is not wrapped in creation context
        assert_eq!(err.to_string(), "API request failed: 500 InternalServerError: boom");
        assert_eq!(err.chain().count(), 1);
        assert!(data.is_absent());
        assert_eq!(resource.client.calls(), vec!["create_or_update", "get"]);
    }

    #[tokio::test]
    async fn test_create_without_remote_id_fails() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            omit_id: true,
            ..Default::default()
        });
        let mut data = example();

        let err = resource.create(&mut data).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::MissingId { name, resource_group }) if name == "gw1" && resource_group == "rg1"
        ));
        assert!(data.is_absent());
    }

    #[tokio::test]
    async fn test_update_matches_create() {
        let created = LocalNetworkGatewayResource::new(FakeGateways::default());
        let updated = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut a = example();
        let mut b = example();

        created.create(&mut a).await.unwrap();
        updated.update(&mut b).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(created.client.calls(), updated.client.calls());
    }

    #[tokio::test]
    async fn test_update_replaces_mutable_fields() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();
        resource.create(&mut data).await.unwrap();

        data.set_str("gateway_address", "198.51.100.7");
        data.set_list("address_space", vec!["192.168.0.0/16".into()]);
        resource.update(&mut data).await.unwrap();

        assert_eq!(data.get_str("gateway_address"), Some("198.51.100.7"));
        assert_eq!(data.get_list("address_space").unwrap(), &["192.168.0.0/16".to_string()]);
    }

    #[tokio::test]
    async fn test_read_not_found_clears_id() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = ResourceData::with_id(&gateway_id("rg1", "gone"));

        resource.read(&mut data).await.unwrap();

        assert!(data.is_absent());
    }

    #[tokio::test]
    async fn test_read_error_keeps_id() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            fail_get: Some(500),
            ..Default::default()
        });
        let id = gateway_id("rg1", "gw1");
        let mut data = ResourceData::with_id(&id);

        let err = resource.read(&mut data).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error reading the state of Azure ARM local network gateway 'gw1'"
        );
        assert_eq!(data.id(), id);
    }

    #[tokio::test]
    async fn test_read_propagates_id_parse_error() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = ResourceData::with_id("not/a/valid/id/at/all/x");

        let err = resource.read(&mut data).await.unwrap_err();

        assert!(err.downcast_ref::<ResourceIdError>().is_some());
        assert!(resource.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_remote_and_leaves_state() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();
        resource.create(&mut data).await.unwrap();
        let before = data.clone();

        resource.delete(&mut data).await.unwrap();

        assert_eq!(data, before);
        assert!(resource.client.stored("rg1", "gw1").is_none());
        assert_eq!(resource.client.calls().last(), Some(&"delete"));
    }

    #[tokio::test]
    async fn test_delete_wraps_api_error() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways {
            fail_delete: Some(500),
            ..Default::default()
        });
        let mut data = ResourceData::with_id(&gateway_id("rg1", "gw1"));

        let err = resource.delete(&mut data).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error issuing Azure ARM delete request of local network gateway 'gw1'"
        );
        assert_eq!(data.id(), gateway_id("rg1", "gw1"));
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
        let mut data = example();
        resource.create(&mut data).await.unwrap();

        let mut imported = resource.import(data.id()).unwrap();
        assert!(imported.attributes().is_empty());
        resource.read(&mut imported).await.unwrap();

        assert_eq!(imported, data);
    }

    #[test]
    fn test_config_from_data() {
        let config = LocalNetworkGatewayConfig::try_from(&example()).unwrap();
        assert_eq!(config.name, "gw1");
        assert_eq!(config.location, "westeurope");
        assert_eq!(config.address_space.len(), 2);

        let missing = ResourceData::new();
        assert!(matches!(
            LocalNetworkGatewayConfig::try_from(&missing),
            Err(ResourceError::MissingAttribute(attr)) if attr == "name"
        ));
    }

    #[test]
    fn test_identity_fields_force_replacement() {
        let prior = example();
        let mut desired = example();
        desired.set_str("gateway_address", "198.51.100.7");
        assert!(schema().replacement_fields(&prior, &desired).is_empty());

        desired.set_str("location", "North Europe");
        desired.set_str("resource_group_name", "rg2");
        assert_eq!(
            schema().replacement_fields(&prior, &desired),
            vec!["location", "resource_group_name"]
        );
    }

    proptest! {
        #[test]
        fn create_then_read_returns_declared_values(
            name in "[a-z][a-z0-9-]{0,20}",
            octets in prop::array::uniform4(0u8..=255),
            space in prop::collection::vec("10\\.[0-9]{1,3}\\.[0-9]{1,3}\\.0/24", 0..8),
        ) {
            let address = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
            let resource = LocalNetworkGatewayResource::new(FakeGateways::default());
            let mut data = declared(json!({
                "name": name,
                "location": "westeurope",
                "resource_group_name": "rg",
                "gateway_address": address,
                "address_space": space,
            }));

            tokio_test::block_on(resource.create(&mut data)).unwrap();

            prop_assert!(!data.is_absent());
            prop_assert_eq!(data.get_str("name"), Some(name.as_str()));
            prop_assert_eq!(data.get_str("gateway_address"), Some(address.as_str()));
            prop_assert_eq!(data.get_list("address_space").unwrap(), space.as_slice());
        }
    }
}
