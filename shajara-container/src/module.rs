//! Container modules, reusable groups of bindings.
//!
//! # Examples
//! ```rust
//! use shajara_container::prelude::*;
//!
//! struct Clock;
//! impl Injectable for Clock {
//!     fn inject(_: &Container) -> Result<Self> { Ok(Clock) }
//! }
//!
//! struct TimeModule;
//!
//! impl ContainerModule for TimeModule {
//!     fn load(&self, container: &Container) {
//!         container.bind_self::<Clock>().in_singleton_scope();
//!     }
//! }
//!
//! let container = Container::new();
//! container.load(&TimeModule);
//! assert!(container.is_bound(ServiceId::of::<Clock>()));
//! ```

use crate::container::Container;

/// A group of related bindings applied to a container in one call.
///
/// Split bindings by concern and load each module into the container
/// that should own them.
pub trait ContainerModule: Send + Sync {
    /// Registers this module's bindings.
    fn load(&self, container: &Container);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
