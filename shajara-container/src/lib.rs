//! Hierarchical service container for Shajara.

pub mod container;
pub mod error;
pub mod key;
pub mod module;
pub mod registry;
pub mod scope;

pub use container::{
    BindingSyntax, BindingTo, Container, ContainerId, ContainerOptions, Injectable, prelude,
    self_factory,
};
pub use error::{CircularDependencyError, ContainerError, NotBoundError, Result};
pub use key::{Constraint, ServiceId, TagValue};
pub use module::ContainerModule;
pub use registry::{FactoryFn, Instance};
pub use scope::Scope;
