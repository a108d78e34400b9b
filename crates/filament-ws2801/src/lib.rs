//! Filament WS2801 - Driver for WS2801 addressable LED strips
//!
//! Implements the `Rgb` capability for a strip behind any `LedBus`.
//! Call [`register`] at startup to make the model available to a host.

pub mod config;
pub mod driver;
pub mod palette;

use filament_core::{
    rgb_api, ComponentConfig, Constructed, Dependencies, LedBus, Model, ModelFamily,
    ModelRegistry, Reconfigurable, Registration, Rgb,
};
use std::sync::Arc;

pub use config::{settings_from, validate, MAX_LED_COUNT};
pub use driver::{Ws2801, FRAME_INTERVAL};

/// `hipsterbrown:led:ws2801`
pub fn model() -> Model {
    Model::new(ModelFamily::new("hipsterbrown", "led"), "ws2801")
}

/// Install the ws2801 model, backed by bus type `B`, into `registry`
pub fn register<B: LedBus>(registry: &mut ModelRegistry<dyn Rgb>) {
    registry.register(
        rgb_api(),
        model(),
        Registration::new(
            |config: &ComponentConfig, dependencies: &Dependencies| {
                let driver = Arc::new(Ws2801::<B>::new(config, dependencies)?);
                Ok(Constructed {
                    resource: driver.clone() as Arc<dyn Rgb>,
                    lifecycle: driver as Arc<dyn Reconfigurable>,
                })
            },
            validate,
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_core::{Attributes, InstanceRegistry, MemoryStrip};

    #[tokio::test]
    async fn test_register_and_construct() {
        let mut registry: ModelRegistry<dyn Rgb> = ModelRegistry::new();
        register::<MemoryStrip>(&mut registry);
        assert!(registry.lookup(&rgb_api(), &model()).is_ok());

        let config = ComponentConfig::new(
            "strip",
            rgb_api(),
            model(),
            Attributes::new()
                .with("clock_pin", 11)
                .with("data_pin", 10)
                .with("led_count", 16),
        );
        let built = registry.construct(&config, &Dependencies::new()).unwrap();

        let instances: InstanceRegistry<dyn Rgb> = InstanceRegistry::new();
        instances
            .register_instance(config.resource_name(), built.resource)
            .await;
        let strip = instances.lookup(&config.resource_name()).await.unwrap();
        assert_eq!(strip.fill(1, 2, 3).await.unwrap(), "Ok");
    }

    #[test]
    fn test_construct_rejects_invalid_config() {
        let mut registry: ModelRegistry<dyn Rgb> = ModelRegistry::new();
        register::<MemoryStrip>(&mut registry);

        let config = ComponentConfig::new(
            "strip",
            rgb_api(),
            model(),
            Attributes::new().with("clock_pin", 11).with("led_count", 16),
        );
        let err = registry
            .construct(&config, &Dependencies::new())
            .err()
            .unwrap();
        assert_eq!(err.field(), Some("data_pin"));
    }
}
