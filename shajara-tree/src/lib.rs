//! Binds a component tree to a hierarchy of service containers.
//!
//! Providers install containers for their subtrees; components resolve
//! services from the nearest container, lazily and once per binding site.

pub mod class;
pub mod context;
pub mod error;
pub mod facade;
pub mod instance;
pub mod provider;
pub mod resolver;
pub mod tree;

#[doc(hidden)]
pub use inventory;

pub use class::{BindingDescriptor, ClassAdministration, ClassId, ClassRegistry};
pub use context::Ambient;
pub use error::{BindingError, ConfigurationError, MissingProviderError, Result};
pub use facade::Site;
pub use instance::{BindingSite, InstanceAdministration};
pub use provider::{ProviderNode, ProviderProps};
pub use resolver::resolve_container_for;
pub use tree::{Component, ComponentTree, FnComponent, NodeId, RenderContext};

pub mod prelude {
    pub use crate::class::{ClassId, ClassRegistry};
    pub use crate::context::Ambient;
    pub use crate::error::{BindingError, ConfigurationError};
    pub use crate::provider::ProviderProps;
    pub use crate::tree::{Component, ComponentTree, NodeId, RenderContext};
}

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
