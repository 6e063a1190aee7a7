//! The ambient context channel.
//!
//! Carries "the nearest ancestor container, if any" down the component tree.
//! The traversal passes it by value; a provider hands its subtree an
//! overridden copy and leaves its own copy untouched.

use shajara_container::Container;

use crate::class::ClassId;
use crate::error::MissingProviderError;

/// The container visible at one point of the tree.
#[derive(Debug, Clone, Default)]
pub struct Ambient {
    container: Option<Container>,
}

impl Ambient {
    /// Top-level value: no container.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.container.is_none()
    }

    /// The value a subtree sees below a node that installs `container`.
    #[must_use]
    pub fn overridden(&self, container: Container) -> Ambient {
        Ambient {
            container: Some(container),
        }
    }

    /// The visible container, or [`MissingProviderError`] naming `component`.
    pub fn require(&self, component: &ClassId) -> Result<Container, MissingProviderError> {
        self.container.clone().ok_or_else(|| MissingProviderError {
            component: component.clone(),
        })
    }
}

impl From<Container> for Ambient {
    fn from(container: Container) -> Self {
        Ambient::none().overridden(container)
    }
}
