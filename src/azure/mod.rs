//! Azure Resource Manager interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer token and subscription discovery
//! - [`client`] - ARM client, URL building and long-running operation polling
//! - [`http`] - HTTP utilities for REST API calls
//! - [`location`] - Region name normalization
//! - [`network`] - Local network gateway model and API
//! - [`resource_id`] - Parsing of ARM resource identifiers
//!
//! # Example
//!
//! ```ignore
//! use azrm_lngw::azure::auth::ArmCredentials;
//! use azrm_lngw::azure::client::ArmClient;
//! use azrm_lngw::azure::network::{LocalNetworkGatewaysApi, LocalNetworkGatewaysClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let arm = ArmClient::new(ArmCredentials::from_env()?, "00000000-0000-0000-0000-000000000000")?;
//!     let gateways = LocalNetworkGatewaysClient::new(arm);
//!     let gateway = gateways.get("my-rg", "gw1").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod location;
pub mod network;
pub mod resource_id;
