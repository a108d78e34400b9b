//! Filament Core - Resource naming, configuration, and registries
//!
//! This crate provides the foundational types for the Filament system:
//! - Resource and model naming (`namespace:type:subtype/name`)
//! - Component configuration documents and attribute access
//! - The `Rgb` capability contract shared by drivers and remote proxies
//! - The `Reconfigurable` lifecycle interface
//! - The `LedBus` abstraction over addressable LED strips
//! - Model and instance registries used by hosts and dispatchers

pub mod bus;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resource;
pub mod rgb;

pub use bus::{BusSettings, Color, LedBus, MemoryStrip};
pub use config::{AttributeValue, Attributes, ComponentConfig};
pub use error::ResourceError;
pub use lifecycle::Reconfigurable;
pub use registry::{
    Constructed, Dependencies, Factory, InstanceRegistry, ModelRegistry, Registration, Validator,
};
pub use resource::{Api, Model, ModelFamily, NameError, ResourceName, ResourceType};
pub use rgb::{rgb_api, Rgb, STATUS_OK};
