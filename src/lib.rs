//! Declarative management of Azure local network gateways.
//!
//! - [`azure`] - ARM client and the local network gateway API
//! - [`resource`] - Resource schema, state holder and CRUD operations
//! - [`config`] - Persistent user configuration
//! - [`state`] - On-disk resource state
//! - [`error`] - Error types

pub mod azure;
pub mod config;
pub mod error;
pub mod resource;
pub mod state;

/// Version injected at compile time via AZRM_LNGW_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AZRM_LNGW_VERSION") {
    Some(v) => v,
    None => "dev",
};
