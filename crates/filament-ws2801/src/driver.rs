//! The ws2801 driver
//!
//! Two states: idle and animating. `animate` holds its caller for as long as
//! the animation runs; `stop` and `reconfigure` end it cooperatively by
//! clearing the animating bit, which the loop checks once per frame.
//!
//! The animating bit and the epoch of the current loop share one atomic word
//! (`epoch << 1 | animating`), so a loop can only ever clear its own run.

use async_trait::async_trait;
use filament_core::{
    BusSettings, Color, ComponentConfig, Dependencies, LedBus, Reconfigurable, ResourceError,
    ResourceName, Rgb, STATUS_OK,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::settings_from;
use crate::palette::random_frame;

/// Pause between animation frames; also the worst-case stop latency
pub const FRAME_INTERVAL: Duration = Duration::from_millis(150);

const ANIMATING: u64 = 1;

/// Clears the animating bit on drop, unless a newer run has taken over
struct RunGuard<'a> {
    run: &'a AtomicU64,
    token: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let _ = self.run.compare_exchange(
            self.token,
            self.token & !ANIMATING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Current parameters and the bus opened with them
struct Device<B> {
    settings: BusSettings,
    bus: B,
}

pub struct Ws2801<B: LedBus> {
    name: ResourceName,
    /// `epoch << 1 | animating`; every `animate` call bumps the epoch
    run: AtomicU64,
    device: Mutex<Device<B>>,
}

impl<B: LedBus> Ws2801<B> {
    /// Build a driver and configure it from `config`
    pub fn new(
        config: &ComponentConfig,
        _dependencies: &Dependencies,
    ) -> Result<Self, ResourceError> {
        let (settings, bus) = Self::open(config)?;
        let name = config.resource_name();
        info!(
            resource = %name,
            clock_pin = settings.clock_pin,
            data_pin = settings.data_pin,
            led_count = settings.led_count,
            brightness = settings.brightness,
            "Created ws2801 strip"
        );
        Ok(Self {
            name,
            run: AtomicU64::new(0),
            device: Mutex::new(Device { settings, bus }),
        })
    }

    fn open(config: &ComponentConfig) -> Result<(BusSettings, B), ResourceError> {
        let settings = settings_from(config)?;
        let bus = B::open(&settings)?;
        Ok((settings, bus))
    }

    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    pub fn is_animating(&self) -> bool {
        self.run.load(Ordering::SeqCst) & ANIMATING != 0
    }

    /// Number of pixels on the current bus
    pub fn len(&self) -> usize {
        self.device().bus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings(&self) -> BusSettings {
        self.device().settings
    }

    /// Snapshot of every buffered pixel
    pub fn pixels(&self) -> Vec<Color> {
        let device = self.device();
        (0..device.bus.len())
            .filter_map(|index| device.bus.pixel(index))
            .collect()
    }

    /// Run `f` against the bus while holding the device lock
    pub fn with_bus<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.device().bus)
    }

    fn device(&self) -> MutexGuard<'_, Device<B>> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new run, superseding any older one. Returns the run's token.
    fn begin_run(&self) -> u64 {
        let next = |run: u64| ((run >> 1) + 1) << 1 | ANIMATING;
        let previous = self
            .run
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |run| Some(next(run)))
            .unwrap_or_else(|run| run);
        next(previous)
    }

    fn is_current(&self, token: u64) -> bool {
        self.run.load(Ordering::SeqCst) == token
    }

    /// Clear the animating bit whatever run holds it
    fn halt(&self) {
        self.run.fetch_and(!ANIMATING, Ordering::SeqCst);
    }

    fn write_random_frame(&self) -> Result<(), ResourceError> {
        let mut device = self.device();
        let frame = random_frame(device.bus.len())?;
        for (index, color) in frame.into_iter().enumerate() {
            device.bus.set_pixel(index, color);
        }
        device.bus.show()
    }

    fn write_solid(&self, color: Color) -> Result<(), ResourceError> {
        let mut device = self.device();
        device.bus.fill(color);
        device.bus.show()
    }
}

impl<B: LedBus> Reconfigurable for Ws2801<B> {
    /// Replace pins, length, and brightness, reopening the bus.
    ///
    /// Clears `animating` so a running loop exits at its next frame boundary,
    /// but does not wait for it. A rejected config leaves the driver untouched.
    fn reconfigure(
        &self,
        config: &ComponentConfig,
        _dependencies: &Dependencies,
    ) -> Result<(), ResourceError> {
        let (settings, bus) = Self::open(config)?;
        self.halt();
        *self.device() = Device { settings, bus };
        info!(
            resource = %self.name,
            clock_pin = settings.clock_pin,
            data_pin = settings.data_pin,
            led_count = settings.led_count,
            brightness = settings.brightness,
            "Reconfigured ws2801 strip"
        );
        Ok(())
    }

    fn close(&self) {
        self.halt();
        debug!(resource = %self.name, "Closed ws2801 strip");
    }
}

#[async_trait]
impl<B: LedBus> Rgb for Ws2801<B> {
    async fn animate(&self) -> Result<String, ResourceError> {
        let token = self.begin_run();
        // Ends this run on every exit path, including the caller dropping us
        let _run = RunGuard {
            run: &self.run,
            token,
        };
        info!(resource = %self.name, "Animation started");

        let mut frames: u64 = 0;
        while self.is_current(token) {
            if let Err(e) = self.write_random_frame() {
                warn!(resource = %self.name, error = %e, "Animation aborted");
                return Err(e);
            }
            frames += 1;
            trace!(resource = %self.name, frame = frames, "Animation frame");
            tokio::time::sleep(FRAME_INTERVAL).await;
        }

        info!(resource = %self.name, frames = frames, "Animation stopped");
        Ok(STATUS_OK.to_string())
    }

    async fn fill(&self, red: u8, green: u8, blue: u8) -> Result<String, ResourceError> {
        self.write_solid(Color::new(red, green, blue))?;
        debug!(resource = %self.name, red, green, blue, "Filled strip");
        Ok(STATUS_OK.to_string())
    }

    async fn clear(&self) -> Result<String, ResourceError> {
        self.fill(0, 0, 0).await
    }

    async fn stop(&self) -> Result<String, ResourceError> {
        self.halt();
        debug!(resource = %self.name, "Stop requested");
        Ok(STATUS_OK.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_core::{rgb_api, Attributes, MemoryStrip};
    use std::sync::Arc;
    use tokio::time::{sleep, timeout, Instant};

    fn config(led_count: i32, brightness: Option<f64>) -> ComponentConfig {
        let mut attributes = Attributes::new()
            .with("clock_pin", 11)
            .with("data_pin", 10)
            .with("led_count", led_count);
        if let Some(b) = brightness {
            attributes.insert("default_brightness", b);
        }
        ComponentConfig::new("strip", rgb_api(), crate::model(), attributes)
    }

    fn strip(led_count: i32) -> Arc<Ws2801<MemoryStrip>> {
        Arc::new(Ws2801::new(&config(led_count, None), &Dependencies::new()).unwrap())
    }

    /// Bus whose flushes always fail
    struct BrokenBus {
        pixels: Vec<Color>,
    }

    impl LedBus for BrokenBus {
        fn open(settings: &BusSettings) -> Result<Self, ResourceError> {
            Ok(Self {
                pixels: vec![Color::BLACK; settings.led_count],
            })
        }
        fn len(&self) -> usize {
            self.pixels.len()
        }
        fn set_pixel(&mut self, index: usize, color: Color) {
            if let Some(p) = self.pixels.get_mut(index) {
                *p = color;
            }
        }
        fn pixel(&self, index: usize) -> Option<Color> {
            self.pixels.get(index).copied()
        }
        fn fill(&mut self, color: Color) {
            self.pixels.fill(color);
        }
        fn show(&mut self) -> Result<(), ResourceError> {
            Err(ResourceError::bus("clock line stuck"))
        }
    }

    #[tokio::test]
    async fn test_fill_then_clear_scenario() {
        let driver =
            Ws2801::<MemoryStrip>::new(&config(16, Some(0.5)), &Dependencies::new()).unwrap();
        assert_eq!(driver.len(), 16);
        assert_eq!(driver.settings().brightness, 0.5);

        assert_eq!(driver.fill(255, 0, 0).await.unwrap(), STATUS_OK);
        assert!(driver.pixels().iter().all(|p| *p == Color::new(255, 0, 0)));

        assert_eq!(driver.clear().await.unwrap(), STATUS_OK);
        assert!(driver.pixels().iter().all(|p| *p == Color::BLACK));
        assert_eq!(driver.with_bus(|bus| bus.flush_count()), 2);
    }

    #[tokio::test]
    async fn test_clear_any_length() {
        for count in [0, 1, 7, 300] {
            let driver = strip(count);
            driver.fill(9, 9, 9).await.unwrap();
            driver.clear().await.unwrap();
            let pixels = driver.pixels();
            assert_eq!(pixels.len(), count as usize);
            assert!(pixels.iter().all(|p| *p == Color::BLACK));
        }
    }

    #[tokio::test]
    async fn test_fill_is_idempotent() {
        let once = strip(8);
        once.fill(12, 34, 56).await.unwrap();

        let twice = strip(8);
        twice.fill(12, 34, 56).await.unwrap();
        twice.fill(12, 34, 56).await.unwrap();

        assert_eq!(once.pixels(), twice.pixels());
    }

    #[tokio::test]
    async fn test_stop_when_idle() {
        let driver = strip(4);
        assert_eq!(driver.stop().await.unwrap(), STATUS_OK);
        assert!(!driver.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_until_stopped() {
        let driver = strip(16);
        let animation = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });

        sleep(Duration::from_millis(400)).await;
        assert!(driver.is_animating());
        let flushed = driver.with_bus(|bus| bus.flush_count());
        assert!(flushed >= 2, "only {} frames", flushed);
        for color in driver.pixels() {
            for channel in [color.red, color.green, color.blue] {
                assert_eq!(channel % 32, 0);
            }
        }

        let stopped_at = Instant::now();
        assert_eq!(driver.stop().await.unwrap(), STATUS_OK);
        let status = timeout(FRAME_INTERVAL + Duration::from_millis(1), animation)
            .await
            .expect("animation outlived one frame after stop")
            .unwrap()
            .unwrap();
        assert_eq!(status, STATUS_OK);
        assert!(stopped_at.elapsed() <= FRAME_INTERVAL);
        assert!(!driver.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_ends_animation_without_waiting() {
        let driver = strip(16);
        let animation = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        sleep(Duration::from_millis(200)).await;

        driver
            .reconfigure(&config(4, Some(0.25)), &Dependencies::new())
            .unwrap();
        assert!(!driver.is_animating());
        assert_eq!(driver.len(), 4);
        assert_eq!(driver.settings().brightness, 0.25);

        let status = timeout(FRAME_INTERVAL * 2, animation).await.unwrap().unwrap();
        assert_eq!(status.unwrap(), STATUS_OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_reconfigure_leaves_driver_untouched() {
        let driver = strip(16);
        let animation = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        sleep(Duration::from_millis(200)).await;

        let mut bad = config(4, None);
        bad.attributes.remove("clock_pin");
        let err = driver.reconfigure(&bad, &Dependencies::new()).unwrap_err();
        assert_eq!(err.field(), Some("clock_pin"));
        assert!(driver.is_animating());
        assert_eq!(driver.len(), 16);

        driver.stop().await.unwrap();
        animation.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_animate_supersedes_first() {
        let driver = strip(8);
        let first = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        sleep(Duration::from_millis(200)).await;

        let second = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        let first_status = timeout(FRAME_INTERVAL * 2, first).await.unwrap().unwrap();
        assert_eq!(first_status.unwrap(), STATUS_OK);
        assert!(driver.is_animating());
        assert!(!second.is_finished());

        driver.stop().await.unwrap();
        let second_status = timeout(FRAME_INTERVAL * 2, second).await.unwrap().unwrap();
        assert_eq!(second_status.unwrap(), STATUS_OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_during_animation_keeps_animating() {
        let driver = strip(8);
        let animation = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        sleep(Duration::from_millis(10)).await;

        driver.fill(1, 2, 3).await.unwrap();
        assert!(driver.is_animating());

        driver.stop().await.unwrap();
        animation.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bus_failure_is_fatal_to_the_call() {
        let driver =
            Ws2801::<BrokenBus>::new(&config(4, None), &Dependencies::new()).unwrap();

        assert!(matches!(
            driver.fill(1, 1, 1).await,
            Err(ResourceError::Bus { .. })
        ));
        assert!(matches!(
            driver.animate().await,
            Err(ResourceError::Bus { .. })
        ));
        assert!(!driver.is_animating());
    }

    #[test]
    fn test_close_clears_flag() {
        let driver = strip(2);
        driver.begin_run();
        driver.close();
        assert!(!driver.is_animating());
    }

    #[test]
    fn test_ending_old_run_keeps_newer_run() {
        let driver = strip(2);
        let older = driver.begin_run();
        let newer = driver.begin_run();
        assert!(!driver.is_current(older));

        drop(RunGuard {
            run: &driver.run,
            token: older,
        });
        assert!(driver.is_animating());
        assert!(driver.is_current(newer));

        drop(RunGuard {
            run: &driver.run,
            token: newer,
        });
        assert!(!driver.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_animate_clears_flag() {
        let driver = strip(4);
        let animation = tokio::spawn({
            let driver = driver.clone();
            async move { driver.animate().await }
        });
        sleep(FRAME_INTERVAL * 2).await;
        assert!(driver.is_animating());

        animation.abort();
        assert!(animation.await.unwrap_err().is_cancelled());
        assert!(!driver.is_animating());
    }

    #[test]
    fn test_oversized_strip_rejected_before_open() {
        let err = Ws2801::<MemoryStrip>::new(&config_with_count(1e19), &Dependencies::new())
            .err()
            .unwrap();
        assert_eq!(err.field(), Some("led_count"));
    }

    fn config_with_count(led_count: f64) -> ComponentConfig {
        let mut config = config(1, None);
        config.attributes.insert("led_count", led_count);
        config
    }
}
