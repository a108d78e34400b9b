//! Resource naming: APIs, instance names, and driver models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid API `{0}`, expected namespace:type:subtype")]
    InvalidApi(String),
    #[error("Unknown resource type `{0}`, expected component or service")]
    UnknownResourceType(String),
    #[error("Invalid resource name `{0}`, expected namespace:type:subtype/name")]
    InvalidResourceName(String),
    #[error("Invalid model `{0}`, expected namespace:family:name")]
    InvalidModel(String),
}

/// Whether a resource is a device component or a software service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Component,
    Service,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "component" => Ok(Self::Component),
            "service" => Ok(Self::Service),
            other => Err(NameError::UnknownResourceType(other.to_string())),
        }
    }
}

/// A resource category: the operation set a class of resources shares
///
/// Rendered as `namespace:type:subtype`, e.g. `hipsterbrown:component:rgb`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Api {
    pub namespace: String,
    pub resource_type: ResourceType,
    pub subtype: String,
}

impl Api {
    pub fn new(namespace: &str, resource_type: ResourceType, subtype: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            resource_type,
            subtype: subtype.to_string(),
        }
    }

    /// Shorthand for a device component API
    pub fn component(namespace: &str, subtype: &str) -> Self {
        Self::new(namespace, ResourceType::Component, subtype)
    }

    /// Dotted form used in RPC paths, e.g. `hipsterbrown.component.rgb`
    pub fn service_path(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.resource_type, self.subtype)
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.resource_type, self.subtype)
    }
}

impl FromStr for Api {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [namespace, resource_type, subtype]
                if !namespace.is_empty() && !subtype.is_empty() =>
            {
                Ok(Self::new(namespace, resource_type.parse()?, subtype))
            }
            _ => Err(NameError::InvalidApi(s.to_string())),
        }
    }
}

impl TryFrom<String> for Api {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Api> for String {
    fn from(api: Api) -> Self {
        api.to_string()
    }
}

/// Globally unique name of a live resource; the dispatch key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName {
    pub api: Api,
    pub name: String,
}

impl ResourceName {
    pub fn new(api: Api, name: &str) -> Self {
        Self {
            api,
            name: name.to_string(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api, self.name)
    }
}

impl FromStr for ResourceName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (api, name) = s
            .split_once('/')
            .ok_or_else(|| NameError::InvalidResourceName(s.to_string()))?;
        if name.is_empty() {
            return Err(NameError::InvalidResourceName(s.to_string()));
        }
        Ok(Self::new(api.parse()?, name))
    }
}

impl TryFrom<String> for ResourceName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.to_string()
    }
}

/// The namespace and family a set of driver models belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelFamily {
    pub namespace: String,
    pub family: String,
}

impl ModelFamily {
    pub fn new(namespace: &str, family: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            family: family.to_string(),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.family)
    }
}

/// Identifies which driver implementation satisfies an API
///
/// Only used when constructing instances, never when dispatching calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Model {
    pub family: ModelFamily,
    pub name: String,
}

impl Model {
    pub fn new(family: ModelFamily, name: &str) -> Self {
        Self {
            family,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.name)
    }
}

impl FromStr for Model {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [namespace, family, name] if parts.iter().all(|p| !p.is_empty()) => {
                Ok(Self::new(ModelFamily::new(namespace, family), name))
            }
            _ => Err(NameError::InvalidModel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Model {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.to_string()
    }
}
