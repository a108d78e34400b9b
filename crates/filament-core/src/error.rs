//! Errors shared by drivers, registries, and RPC proxies
//!
//! `ResourceError` is serializable so a dispatcher can ship it across a
//! channel and a client proxy can rebuild the exact same value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::{Api, Model, ResourceName};

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },
    #[error("Resource not found: {name}")]
    NotFound { name: ResourceName },
    #[error("No model {model} registered for {api}")]
    UnknownModel { api: Api, model: Model },
    #[error("LED bus failure: {message}")]
    Bus { message: String },
    #[error("Malformed request: {message}")]
    Malformed { message: String },
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl ResourceError {
    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// The attribute a configuration error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Configuration { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_field() {
        let err = ResourceError::configuration("clock_pin", "must be defined");
        assert_eq!(err.field(), Some("clock_pin"));
        assert!(err.to_string().contains("clock_pin"));
    }

    #[test]
    fn test_tagged_serialization() {
        let err = ResourceError::NotFound {
            name: "hipsterbrown:component:rgb/missing".parse().unwrap(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["name"], "hipsterbrown:component:rgb/missing");

        let back: ResourceError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}
