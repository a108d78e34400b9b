//! Attribute validation for the ws2801 model

use filament_core::{BusSettings, ComponentConfig, ResourceError};

pub const CLOCK_PIN: &str = "clock_pin";
pub const DATA_PIN: &str = "data_pin";
pub const LED_COUNT: &str = "led_count";
pub const DEFAULT_BRIGHTNESS: &str = "default_brightness";

/// Brightness used when `default_brightness` is absent
pub const DEFAULT_BRIGHTNESS_VALUE: f64 = 1.0;

/// Longest strip a single driver will open
pub const MAX_LED_COUNT: usize = u16::MAX as usize;

/// Check a candidate configuration without touching any driver
pub fn validate(config: &ComponentConfig) -> Result<(), ResourceError> {
    let limits = [
        (CLOCK_PIN, f64::from(u32::MAX)),
        (DATA_PIN, f64::from(u32::MAX)),
        (LED_COUNT, MAX_LED_COUNT as f64),
    ];
    for (field, max) in limits {
        let value = config.attributes.require_number(field)?;
        if !value.is_finite() || value < 0.0 {
            return Err(ResourceError::configuration(
                field,
                "must be a non-negative number",
            ));
        }
        if value > max {
            return Err(ResourceError::configuration(
                field,
                format!("must be at most {}", max),
            ));
        }
    }

    if let Some(value) = config.attributes.get(DEFAULT_BRIGHTNESS) {
        let brightness = value
            .as_number()
            .ok_or_else(|| ResourceError::configuration(DEFAULT_BRIGHTNESS, "must be a number"))?;
        if !(0.0..=1.0).contains(&brightness) {
            return Err(ResourceError::configuration(
                DEFAULT_BRIGHTNESS,
                "must be between 0.0 and 1.0",
            ));
        }
    }

    Ok(())
}

/// Validate `config` and resolve the bus parameters it describes.
///
/// Pins and the pixel count are truncated toward zero.
pub fn settings_from(config: &ComponentConfig) -> Result<BusSettings, ResourceError> {
    validate(config)?;
    let attributes = &config.attributes;
    Ok(BusSettings {
        clock_pin: attributes.require_number(CLOCK_PIN)? as u32,
        data_pin: attributes.require_number(DATA_PIN)? as u32,
        led_count: attributes.require_number(LED_COUNT)? as usize,
        brightness: attributes
            .number(DEFAULT_BRIGHTNESS)
            .unwrap_or(DEFAULT_BRIGHTNESS_VALUE),
    })
}
