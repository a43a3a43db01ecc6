//! ARM resource identifiers
//!
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`
//! is split into key/value pairs. `subscriptions`, `resourceGroups` and
//! `providers` are lifted into fields; every other pair lands in `path`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceIdError {
    #[error("cannot parse an empty Azure resource ID")]
    Empty,

    #[error("the number of path segments is not divisible by 2 in {0:?}")]
    OddSegments(String),

    #[error("key {key:?} has no value in {id:?}")]
    EmptyValue { key: String, id: String },

    #[error("value {value:?} has an empty key in {id:?}")]
    EmptyKey { value: String, id: String },

    #[error("no subscription ID found in {0:?}")]
    MissingSubscription(String),

    #[error("no resource path found in {0:?}")]
    MissingPath(String),

    #[error("no {segment:?} segment found in {id:?}")]
    MissingSegment { segment: String, id: String },
}

/// A parsed ARM resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub path: BTreeMap<String, String>,
    // Keys of `path` in the order they appeared, for formatting
    order: Vec<String>,
}

impl AzureResourceId {
    pub fn new(
        subscription_id: &str,
        resource_group: &str,
        provider: &str,
        path: &[(&str, &str)],
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            provider: provider.to_string(),
            path: path
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            order: path.iter().fold(Vec::new(), |mut order, (k, _)| {
                if !order.iter().any(|o| o == k) {
                    order.push(k.to_string());
                }
                order
            }),
        }
    }

    /// Look up a named segment such as `localNetworkGateways`
    pub fn segment(&self, key: &str) -> Result<&str, ResourceIdError> {
        self.path
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ResourceIdError::MissingSegment {
                segment: key.to_string(),
                id: self.to_string(),
            })
    }
}

impl FromStr for AzureResourceId {
    type Err = ResourceIdError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let trimmed = id.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(ResourceIdError::Empty);
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(ResourceIdError::OddSegments(id.to_string()));
        }

        let mut subscription_id = None;
        let mut resource_group = String::new();
        let mut provider = String::new();
        let mut path = BTreeMap::new();
        let mut order = Vec::new();

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if value.is_empty() {
                return Err(ResourceIdError::EmptyValue {
                    key: key.to_string(),
                    id: id.to_string(),
                });
            }
            if key.is_empty() {
                return Err(ResourceIdError::EmptyKey {
                    value: value.to_string(),
                    id: id.to_string(),
                });
            }

            // ARM treats these keys case-insensitively
            if key.eq_ignore_ascii_case("subscriptions") {
                subscription_id = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("resourceGroups") {
                resource_group = value.to_string();
            } else if key.eq_ignore_ascii_case("providers") {
                provider = value.to_string();
            } else {
                // A repeated key keeps its first position and its last value
                if path.insert(key.to_string(), value.to_string()).is_none() {
                    order.push(key.to_string());
                }
            }
        }

        let Some(subscription_id) = subscription_id else {
            return Err(ResourceIdError::MissingSubscription(id.to_string()));
        };
        if provider.is_empty() || path.is_empty() {
            return Err(ResourceIdError::MissingPath(id.to_string()));
        }

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
            order,
        })
    }
}

impl fmt::Display for AzureResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if !self.resource_group.is_empty() {
            write!(f, "/resourceGroups/{}", self.resource_group)?;
        }
        write!(f, "/providers/{}", self.provider)?;
        for key in &self.order {
            if let Some(value) = self.path.get(key) {
                write!(f, "/{}/{}", key, value)?;
            }
        }
        Ok(())
    }
}
