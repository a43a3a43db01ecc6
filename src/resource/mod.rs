//! Resource abstraction layer
//!
//! A resource maps a declaration block onto a remote object through four
//! operations. Each operation receives the resource's [`ResourceData`],
//! talks to the remote API and writes the observed state back into it.
//!
//! # Architecture
//!
//! - [`schema`] - Attribute schemas and the per-resource state holder
//! - [`local_network_gateway`] - `azurerm_local_network_gateway`
//!
//! # Example
//!
//! ```ignore
//! use azrm_lngw::resource::{local_network_gateway, Resource};
//!
//! async fn apply(resource: &impl Resource, declaration: &serde_json::Map<String, serde_json::Value>) -> anyhow::Result<()> {
//!     let mut data = resource.schema().decode(declaration)?;
//!     resource.create(&mut data).await?;
//!     println!("created {}", data.id());
//!     Ok(())
//! }
//! ```

pub mod local_network_gateway;
pub mod schema;

use anyhow::Result;
use async_trait::async_trait;

pub use local_network_gateway::{LocalNetworkGatewayConfig, LocalNetworkGatewayResource};
pub use schema::{AttributeSchema, AttributeType, AttributeValue, ResourceData, ResourceSchema};

/// CRUD operations for one resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name, e.g. `azurerm_local_network_gateway`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> &ResourceSchema;

    /// Create the remote object and record its identifier
    async fn create(&self, data: &mut ResourceData) -> Result<()>;

    /// Refresh `data` from the remote object. Clears the identifier if the
    /// object no longer exists.
    async fn read(&self, data: &mut ResourceData) -> Result<()>;

    /// Bring the remote object in line with `data`
    async fn update(&self, data: &mut ResourceData) -> Result<()>;

    /// Delete the remote object
    async fn delete(&self, data: &mut ResourceData) -> Result<()>;

    /// Start tracking an existing object. The identifier is taken as-is;
    /// a following [`Resource::read`] fills in the attributes.
    fn import(&self, id: &str) -> Result<ResourceData> {
        Ok(ResourceData::with_id(id))
    }
}
