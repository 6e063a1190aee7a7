//! Error types for the binding layer.
//!
//! Every failure is surfaced to the caller of the render pass that hit it.
//! Nothing here is retried or swallowed.

use std::fmt;

use shajara_container::{ContainerError, ContainerId};

use crate::class::ClassId;
use crate::tree::NodeId;

/// Main error type for the binding layer.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A consuming component resolved with no container above it.
    #[error("{}", .0)]
    MissingProvider(MissingProviderError),

    /// A component type with no declarations used an attribute site under
    /// a provider. Undeclared types never receive the ambient container.
    #[error(
        "{component} is not declared as a consumer, so it cannot see the container provided above it\n  Hint: Declare it with `registry.declare::<{component}>().consumes()`"
    )]
    UndeclaredComponent { component: ClassId },

    /// A provider node was misconfigured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The container could not answer a request.
    #[error(transparent)]
    Resolution(#[from] ContainerError),

    /// A binding site was asked for a different type than it cached.
    #[error("Binding site {site} already holds a value of another type, expected {expected}")]
    SiteTypeMismatch { site: String, expected: &'static str },

    /// A node id that does not belong to this tree, or has the wrong kind.
    #[error("Node {node} is not a {expected} in this tree")]
    InvalidNode { node: NodeId, expected: &'static str },
}

impl From<MissingProviderError> for BindingError {
    fn from(err: MissingProviderError) -> Self {
        BindingError::MissingProvider(err)
    }
}

/// Error when no container is visible to a consuming component.
#[derive(Debug, Clone)]
pub struct MissingProviderError {
    /// The component that tried to resolve
    pub component: ClassId,
}

impl fmt::Display for MissingProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot resolve services for {} without a provider in the component tree",
            self.component
        )?;
        write!(
            f,
            "\n  Hint: Mount a provider node above it, or declare services it provides itself"
        )
    }
}

/// Misconfiguration of a provider node. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "Swapping container is not supported ({current} → {requested})\n  Hint: Mount a separate provider node for the other container"
    )]
    ContainerSwapped {
        current: ContainerId,
        requested: ContainerId,
    },

    #[error("Changing `standalone` is not supported (was {was})")]
    StandaloneChanged { was: bool },

    #[error(
        "Parent container from the ambient context is the same as the provided container ({container})\n  Hint: Did you mean to configure the provider as standalone?"
    )]
    SelfParent { container: ContainerId },

    #[error(
        "Ambiguous containers hierarchy: {container} already has parent {existing_parent}, but {ambient} was found in the ambient context\n  Hint: Configure the provider as standalone, or clear the container's parent first"
    )]
    AmbiguousHierarchy {
        container: ContainerId,
        existing_parent: ContainerId,
        ambient: ContainerId,
    },

    #[error("Cyclic containers hierarchy: {chain}")]
    CyclicHierarchy { chain: String },
}

impl ConfigurationError {
    /// Name of the provider prop at fault.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigurationError::StandaloneChanged { .. } => "standalone",
            ConfigurationError::ContainerSwapped { .. }
            | ConfigurationError::SelfParent { .. }
            | ConfigurationError::AmbiguousHierarchy { .. }
            | ConfigurationError::CyclicHierarchy { .. } => "container",
        }
    }
}

/// Convenient Result type for binding-layer operations.
pub type Result<T> = std::result::Result<T, BindingError>;
