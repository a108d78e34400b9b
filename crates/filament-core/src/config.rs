//! Component configuration documents
//!
//! A `ComponentConfig` names one resource, the model that implements it, and
//! a free-form attribute map the model's validator checks before use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ResourceError;
use crate::resource::{Api, Model, ResourceName};
use crate::rgb::rgb_api;

/// A single typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Attribute name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<AttributeValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Numeric value of `key`, `None` if absent or not a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttributeValue::as_number)
    }

    /// Numeric value of `key`, or a configuration error naming the field
    pub fn require_number(&self, key: &str) -> Result<f64, ResourceError> {
        match self.get(key) {
            None => Err(ResourceError::configuration(key, "must be defined")),
            Some(AttributeValue::Number(n)) => Ok(*n),
            Some(_) => Err(ResourceError::configuration(key, "must be a number")),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration for one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Short instance name, unique within its API
    pub name: String,
    /// API the instance implements
    #[serde(default = "rgb_api")]
    pub api: Api,
    /// Driver model that builds the instance
    pub model: Model,
    /// Model-specific attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl ComponentConfig {
    pub fn new(name: &str, api: Api, model: Model, attributes: Attributes) -> Self {
        Self {
            name: name.to_string(),
            api,
            model,
            attributes,
        }
    }

    pub fn resource_name(&self) -> ResourceName {
        ResourceName::new(self.api.clone(), &self.name)
    }
}
