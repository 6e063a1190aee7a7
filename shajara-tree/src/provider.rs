//! Provider node. Installs a container for a subtree.
//!
//! Before its subtree is first visited, a provider wires its container
//! under the ambient one (unless standalone). After that it only hands its
//! container down. The container and the standalone flag are fixed for the
//! node's lifetime.

use shajara_container::{Container, ContainerError};
use tracing::{debug, trace, warn};

use crate::context::Ambient;
use crate::error::ConfigurationError;

/// Props of a provider node.
#[derive(Debug, Clone)]
pub struct ProviderProps {
    pub container: Container,
    pub standalone: bool,
}

impl ProviderProps {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            standalone: false,
        }
    }

    /// A standalone provider never parents its container.
    pub fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }
}

/// Tree boundary that makes its container ambient for its subtree.
#[derive(Debug)]
pub struct ProviderNode {
    container: Container,
    standalone: bool,
    initialized: bool,
}

impl ProviderNode {
    pub fn new(props: ProviderProps) -> Self {
        Self {
            container: props.container,
            standalone: props.standalone,
            initialized: false,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Checks new props against the ones the node was built with.
    ///
    /// # Errors
    /// [`ConfigurationError::ContainerSwapped`] or
    /// [`ConfigurationError::StandaloneChanged`]; the node is left as it was.
    pub fn update(&mut self, props: &ProviderProps) -> Result<(), ConfigurationError> {
        if !Container::ptr_eq(&props.container, &self.container) {
            let err = ConfigurationError::ContainerSwapped {
                current: self.container.id(),
                requested: props.container.id(),
            };
            warn!(field = err.field(), "{err}");
            return Err(err);
        }
        if props.standalone != self.standalone {
            let err = ConfigurationError::StandaloneChanged {
                was: self.standalone,
            };
            warn!(field = err.field(), "{err}");
            return Err(err);
        }
        Ok(())
    }

    /// Wires the container hierarchy on the first call only.
    ///
    /// A failed call leaves the container untouched and the node
    /// uninitialized, so the next pass checks again.
    pub fn initialize_once(&mut self, ambient: &Ambient) -> Result<(), ConfigurationError> {
        if self.initialized {
            trace!(container = %self.container.id(), "Provider already initialized");
            return Ok(());
        }
        self.wire(ambient)?;
        self.initialized = true;
        Ok(())
    }

    /// The value the subtree sees.
    pub fn install(&self, ambient: &Ambient) -> Ambient {
        ambient.overridden(self.container.clone())
    }

    fn wire(&self, ambient: &Ambient) -> Result<(), ConfigurationError> {
        let parent = match ambient.container() {
            Some(parent) if !self.standalone => parent,
            _ => {
                debug!(
                    container = %self.container.id(),
                    standalone = self.standalone,
                    "Provider installs container without parent wiring"
                );
                return Ok(());
            }
        };

        if Container::ptr_eq(parent, &self.container) {
            let err = ConfigurationError::SelfParent {
                container: self.container.id(),
            };
            warn!("{err}");
            return Err(err);
        }

        if let Some(existing) = self.container.parent() {
            let err = ConfigurationError::AmbiguousHierarchy {
                container: self.container.id(),
                existing_parent: existing.id(),
                ambient: parent.id(),
            };
            warn!("{err}");
            return Err(err);
        }

        self.container
            .set_parent(Some(parent.clone()))
            .map_err(|err| match err {
                ContainerError::CyclicHierarchy { chain } => {
                    ConfigurationError::CyclicHierarchy { chain }
                }
                other => ConfigurationError::CyclicHierarchy {
                    chain: other.to_string(),
                },
            })?;

        debug!(container = %self.container.id(), parent = %parent.id(), "Wired provider container");
        Ok(())
    }
}
