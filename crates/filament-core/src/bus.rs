//! Addressable LED bus abstraction
//!
//! Drivers own exactly one bus handle each. Writes are buffered by
//! `set_pixel`/`fill` and only reach the strip on `show`.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ResourceError;

/// An 8-bit RGB triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Scale every channel by `brightness` in [0.0, 1.0]
    pub fn scaled(self, brightness: f64) -> Self {
        let scale = |c: u8| (f64::from(c) * brightness.clamp(0.0, 1.0)).round() as u8;
        Self::new(scale(self.red), scale(self.green), scale(self.blue))
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

/// Parameters a bus is opened with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusSettings {
    pub clock_pin: u32,
    pub data_pin: u32,
    pub led_count: usize,
    pub brightness: f64,
}

pub trait LedBus: Send + Sized + 'static {
    /// Acquire a bus handle for the given pins and strip length
    fn open(settings: &BusSettings) -> Result<Self, ResourceError>;

    /// Number of pixels on the strip
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer one pixel. Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Color);

    /// Read back a buffered pixel
    fn pixel(&self, index: usize) -> Option<Color>;

    /// Buffer the same color for every pixel
    fn fill(&mut self, color: Color);

    /// Flush the buffer to the strip
    fn show(&mut self) -> Result<(), ResourceError>;
}

/// In-memory strip for hosts without LED hardware
#[derive(Debug, Clone)]
pub struct MemoryStrip {
    settings: BusSettings,
    pixels: Vec<Color>,
    frame: Vec<Color>,
    flushes: u64,
}

impl MemoryStrip {
    pub fn settings(&self) -> &BusSettings {
        &self.settings
    }

    /// Buffered pixels, before brightness scaling
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// The last frame flushed by `show`, brightness applied
    pub fn frame(&self) -> &[Color] {
        &self.frame
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

impl LedBus for MemoryStrip {
    fn open(settings: &BusSettings) -> Result<Self, ResourceError> {
        Ok(Self {
            settings: *settings,
            pixels: vec![Color::BLACK; settings.led_count],
            frame: vec![Color::BLACK; settings.led_count],
            flushes: 0,
        })
    }

    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn pixel(&self, index: usize) -> Option<Color> {
        self.pixels.get(index).copied()
    }

    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn show(&mut self) -> Result<(), ResourceError> {
        let brightness = self.settings.brightness;
        self.frame = self.pixels.iter().map(|p| p.scaled(brightness)).collect();
        self.flushes += 1;
        trace!(
            clock_pin = self.settings.clock_pin,
            data_pin = self.settings.data_pin,
            pixels = self.frame.len(),
            "Flushed frame"
        );
        Ok(())
    }
}
