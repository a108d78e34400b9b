//! The capability contract for addressable RGB lights
//!
//! Local drivers and remote client proxies both implement `Rgb`, so code
//! written against `Arc<dyn Rgb>` does not care which one it holds.

use async_trait::async_trait;

use crate::error::ResourceError;
use crate::resource::Api;

/// Status string returned by every successful operation
pub const STATUS_OK: &str = "Ok";

/// API of the rgb component category
pub fn rgb_api() -> Api {
    Api::component("hipsterbrown", "rgb")
}

#[async_trait]
pub trait Rgb: Send + Sync {
    /// Animate random colors until stopped.
    ///
    /// Resolves only after the animation loop exits, so the caller stays
    /// suspended until a concurrent `stop` (or a reconfiguration) clears the
    /// animating flag.
    async fn animate(&self) -> Result<String, ResourceError>;

    /// Set every pixel to one color and flush once
    async fn fill(&self, red: u8, green: u8, blue: u8) -> Result<String, ResourceError>;

    /// Same as `fill(0, 0, 0)`
    async fn clear(&self) -> Result<String, ResourceError>;

    /// Ask a running animation to exit at its next frame boundary.
    ///
    /// Returns immediately without waiting for the loop.
    async fn stop(&self) -> Result<String, ResourceError>;
}
