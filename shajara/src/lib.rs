//! # Shajara: dependency injection for component trees
//!
//! Providers hand a container to their subtree; components declare what
//! they provide or consume and resolve services lazily, once per site.
//!
//! ```
//! use std::sync::Arc;
//! use shajara::prelude::*;
//!
//! let container = Container::new();
//! container.bind("greeting").to_constant(String::from("hello"));
//!
//! let mut tree = ComponentTree::new(Arc::new(ClassRegistry::new()));
//! let root = tree.mount_provider(None, ProviderProps::new(container)).unwrap();
//! tree.mount_fn(Some(root), |cx| {
//!     let greeting: Arc<String> = cx.use_injection("greeting")?;
//!     assert_eq!(greeting.as_str(), "hello");
//!     Ok(())
//! })
//! .unwrap();
//! tree.render().unwrap();
//! ```

pub use shajara_container as container;
pub use shajara_support as support;
pub use shajara_tree as tree;

pub use shajara_container::{
    Container, ContainerError, ContainerModule, ContainerOptions, Injectable, Scope, ServiceId,
    TagValue,
};
pub use shajara_tree::{
    BindingError, ClassRegistry, Component, ComponentTree, ConfigurationError, ProviderProps,
    RenderContext, declare_component,
};

pub mod prelude {
    pub use shajara_container::prelude::*;
    pub use shajara_tree::prelude::*;
    pub use shajara_tree::declare_component;
}
