//! Resource schema and state
//!
//! A [`ResourceSchema`] describes the attributes a resource type accepts. A
//! [`ResourceData`] holds one resource's identifier and attribute values and
//! is what the CRUD operations read from and write back to.

use crate::error::ResourceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    List,
}

impl AttributeType {
    fn describe(self) -> &'static str {
        match self {
            AttributeType::String => "a string",
            AttributeType::List => "a list of strings",
        }
    }
}

/// Normalizes a configured string before it is stored
pub type StateFunc = fn(&str) -> String;

/// Schema for a single attribute
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Changing the value requires replacing the remote object
    pub force_new: bool,
    pub state_func: Option<StateFunc>,
    pub description: Option<&'static str>,
}

impl AttributeSchema {
    /// New optional attribute
    pub fn new(name: &'static str, attr_type: AttributeType) -> Self {
        Self {
            name,
            attr_type,
            required: false,
            force_new: false,
            state_func: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_state_func(mut self, f: StateFunc) -> Self {
        self.state_func = Some(f);
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn normalize(&self, value: &str) -> String {
        match self.state_func {
            Some(f) => f(value),
            None => value.to_string(),
        }
    }
}

/// Schema for a resource type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    attributes: Vec<AttributeSchema>,
}

impl ResourceSchema {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter()
    }

    /// Build resource data from a declaration block
    ///
    /// Unknown attributes, wrong types and missing required attributes are
    /// rejected; `null` counts as unset. State functions are applied.
    pub fn decode(&self, declaration: &Map<String, Value>) -> Result<ResourceData, ResourceError> {
        let mut data = ResourceData::new();

        for (key, value) in declaration {
            let attribute = self
                .get(key)
                .ok_or_else(|| ResourceError::UnknownAttribute(key.clone()))?;
            let mismatch = || ResourceError::TypeMismatch {
                attribute: key.clone(),
                expected: attribute.attr_type.describe(),
            };

            match (attribute.attr_type, value) {
                (_, Value::Null) => {}
                (AttributeType::String, Value::String(s)) => {
                    data.set_str(attribute.name, attribute.normalize(s));
                }
                (AttributeType::List, Value::Array(items)) => {
                    let list = items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                        .collect::<Result<Vec<_>, _>>()?;
                    data.set_list(attribute.name, list);
                }
                _ => return Err(mismatch()),
            }
        }

        self.validate(&data)?;
        Ok(data)
    }

    /// Check required attributes are present, and required strings non-empty
    pub fn validate(&self, data: &ResourceData) -> Result<(), ResourceError> {
        for attribute in self.attributes.iter().filter(|a| a.required) {
            match attribute.attr_type {
                AttributeType::String => match data.get_str(attribute.name) {
                    None => return Err(ResourceError::MissingAttribute(attribute.name.to_string())),
                    Some(s) if s.trim().is_empty() => {
                        return Err(ResourceError::EmptyAttribute(attribute.name.to_string()))
                    }
                    Some(_) => {}
                },
                AttributeType::List => {
                    if data.get_list(attribute.name).is_none() {
                        return Err(ResourceError::MissingAttribute(attribute.name.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Force-new attributes whose values differ between `prior` and `desired`
    pub fn replacement_fields(&self, prior: &ResourceData, desired: &ResourceData) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .filter(|a| match a.attr_type {
                AttributeType::String => {
                    let old = a.normalize(prior.get_str(a.name).unwrap_or_default());
                    let new = a.normalize(desired.get_str(a.name).unwrap_or_default());
                    old != new
                }
                AttributeType::List => {
                    prior.get_list(a.name).unwrap_or_default()
                        != desired.get_list(a.name).unwrap_or_default()
                }
            })
            .map(|a| a.name)
            .collect()
    }
}

/// A stored attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    List(Vec<String>),
}

/// Identifier and attribute values of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(AttributeValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        match self.attributes.get(name) {
            Some(AttributeValue::List(l)) => Some(l),
            _ => None,
        }
    }

    pub fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.attributes
            .insert(name.to_string(), AttributeValue::String(value.into()));
    }

    pub fn set_list(&mut self, name: &str, value: Vec<String>) {
        self.attributes
            .insert(name.to_string(), AttributeValue::List(value));
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }
}
