//! Lifecycle interface composed by drivers next to their capability contract

use crate::config::ComponentConfig;
use crate::error::ResourceError;
use crate::registry::Dependencies;

pub trait Reconfigurable: Send + Sync {
    /// Replace the instance's device parameters with those in `config`.
    ///
    /// Must be safe to call while other operations are in flight.
    fn reconfigure(
        &self,
        config: &ComponentConfig,
        dependencies: &Dependencies,
    ) -> Result<(), ResourceError>;

    /// Release the instance before the host drops it
    fn close(&self) {}
}
