//! # The Container
//!
//! A registry of bindings with an optional parent. Lookups that find nothing
//! in a container fall back to its parent, so a chain of containers behaves
//! like nested scopes.
//!
//! # Architecture
//! ```text
//! Container ──bind(id)──> BindingTo ──to / to_constant / to_dynamic_value──> BindingSyntax
//!     │                                                                     │
//!     │ parent                                       in_*_scope / when_target_*
//!     ▼
//! Container (ancestor, consulted when nothing matches locally)
//! ```
//!
//! # Examples
//! ```rust
//! use shajara_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Clock;
//! impl Injectable for Clock {
//!     fn inject(_: &Container) -> Result<Self> { Ok(Clock) }
//! }
//!
//! let root = Container::new();
//! root.bind_self::<Clock>().in_singleton_scope();
//!
//! let child = Container::new();
//! child.set_parent(Some(root.clone())).unwrap();
//!
//! let a: Arc<Clock> = child.resolve().unwrap();
//! let b: Arc<Clock> = root.resolve().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shajara_support::rendering::{render_chain, suggest_similar};
use tracing::{debug, trace};

use crate::error::{ContainerError, NotBoundError, Result};
use crate::key::{Constraint, ServiceId, TagValue, Target};
use crate::module::ContainerModule;
use crate::registry::{Binding, FactoryFn, Instance, Registry};
use crate::scope::Scope;

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

/// Process-unique container number, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Container#{}", self.0)
    }
}

/// Container-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Scope of bindings that never call `in_*_scope`.
    pub default_scope: Scope,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            default_scope: Scope::Transient,
        }
    }
}

/// A type that can build itself from a container.
///
/// This is what binding "to self" means: the container asks the type to
/// construct itself, resolving whatever it needs from the same container.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(container: &Container) -> Result<Self>;
}

/// Factory that constructs `T` through [`Injectable::inject`].
pub fn self_factory<T: Injectable>() -> FactoryFn {
    Arc::new(|container: &Container| -> Result<Instance> {
        Ok(Arc::new(T::inject(container)?))
    })
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Shared handle to a container.
///
/// Cloning is cheap and yields the same container; use
/// [`Container::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    id: ContainerId,
    options: ContainerOptions,
    registry: RwLock<Registry>,
    parent: RwLock<Option<Container>>,
}

impl Container {
    /// Creates an empty root container with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty root container.
    pub fn with_options(options: ContainerOptions) -> Self {
        let id = ContainerId(NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed));
        debug!(container = %id, default_scope = %options.default_scope, "Created container");
        Self {
            inner: Arc::new(Inner {
                id,
                options,
                registry: RwLock::new(Registry::new()),
                parent: RwLock::new(None),
            }),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.inner.id
    }

    pub fn options(&self) -> ContainerOptions {
        self.inner.options
    }

    /// Returns `true` if both handles point at the same container.
    pub fn ptr_eq(a: &Container, b: &Container) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // ── Hierarchy ──

    pub fn parent(&self) -> Option<Container> {
        self.inner.parent.read().clone()
    }

    /// Replaces the parent link.
    ///
    /// # Errors
    /// [`ContainerError::CyclicHierarchy`] if `self` is already an ancestor
    /// of (or identical to) the new parent.
    pub fn set_parent(&self, parent: Option<Container>) -> Result<()> {
        if let Some(candidate) = &parent {
            let ancestry = candidate.ancestry();
            if ancestry.iter().any(|c| Container::ptr_eq(c, self)) {
                let mut chain = vec![self.id().to_string()];
                chain.extend(ancestry.iter().map(|c| c.id().to_string()));
                return Err(ContainerError::CyclicHierarchy {
                    chain: render_chain(&chain),
                });
            }
        }

        debug!(
            container = %self.id(),
            parent = ?parent.as_ref().map(Container::id),
            "Set parent"
        );
        *self.inner.parent.write() = parent;
        Ok(())
    }

    /// This container followed by its ancestors, nearest first.
    pub fn ancestry(&self) -> Vec<Container> {
        let mut chain = vec![self.clone()];
        let mut next = self.parent();
        while let Some(container) = next {
            next = container.parent();
            chain.push(container);
        }
        chain
    }

    // ── Binding ──

    /// Starts a binding for `id`.
    pub fn bind(&self, id: impl Into<ServiceId>) -> BindingTo<'_> {
        BindingTo {
            container: self,
            id: id.into(),
        }
    }

    /// Binds `T` to itself under [`ServiceId::of::<T>()`](ServiceId::of).
    pub fn bind_self<T: Injectable>(&self) -> BindingSyntax {
        self.bind(ServiceId::of::<T>()).to::<T>()
    }

    /// Removes every local binding for `id`. Ancestors are untouched.
    pub fn unbind(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        let removed = self.inner.registry.write().remove(&id);
        debug!(container = %self.id(), id = %id, removed, "Unbound");
        removed > 0
    }

    /// Applies a group of bindings.
    pub fn load(&self, module: &dyn ContainerModule) {
        debug!(container = %self.id(), module = module.name(), "Loading module");
        module.load(self);
    }

    /// Number of local bindings.
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Queries ──

    /// Returns `true` if any binding for `id` exists here or in an ancestor,
    /// whatever its constraint.
    pub fn is_bound(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        self.ancestry()
            .iter()
            .any(|c| c.inner.registry.read().contains(&id))
    }

    pub fn is_bound_named(&self, id: impl Into<ServiceId>, name: &str) -> bool {
        self.answers_anywhere(&id.into(), Target::Named(name))
    }

    pub fn is_bound_tagged(
        &self,
        id: impl Into<ServiceId>,
        key: &str,
        value: impl Into<TagValue>,
    ) -> bool {
        let value = value.into();
        self.answers_anywhere(&id.into(), Target::Tagged(key, &value))
    }

    // ── Resolution ──

    /// Resolves `id` without naming the Rust type.
    pub fn get_instance(&self, id: impl Into<ServiceId>) -> Result<Instance> {
        let id = id.into();
        self.lookup(&id, Target::Plain)?.activate(self)
    }

    /// Resolves the single unconstrained binding for `id`.
    ///
    /// ```rust,ignore
    /// let clock: Arc<Clock> = container.get(ServiceId::of::<Clock>())?;
    /// ```
    pub fn get<T: Send + Sync + 'static>(&self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        let id = id.into();
        let instance = self.lookup(&id, Target::Plain)?.activate(self)?;
        downcast(&id, instance)
    }

    /// Resolves the binding for `id` constrained to `name`.
    pub fn get_named<T: Send + Sync + 'static>(
        &self,
        id: impl Into<ServiceId>,
        name: &str,
    ) -> Result<Arc<T>> {
        let id = id.into();
        let instance = self.lookup(&id, Target::Named(name))?.activate(self)?;
        downcast(&id, instance)
    }

    /// Resolves the binding for `id` tagged with `key = value`.
    pub fn get_tagged<T: Send + Sync + 'static>(
        &self,
        id: impl Into<ServiceId>,
        key: &str,
        value: impl Into<TagValue>,
    ) -> Result<Arc<T>> {
        let id = id.into();
        let value = value.into();
        let instance = self.lookup(&id, Target::Tagged(key, &value))?.activate(self)?;
        downcast(&id, instance)
    }

    /// Resolves every unconstrained binding for `id` in the nearest
    /// container that has any, in registration order.
    pub fn get_all<T: Send + Sync + 'static>(&self, id: impl Into<ServiceId>) -> Result<Vec<Arc<T>>> {
        let id = id.into();
        for container in self.ancestry() {
            let found = container.inner.registry.read().matching(&id, &Target::Plain);
            if found.is_empty() {
                continue;
            }
            trace!(container = %container.id(), id = %id, count = found.len(), "Resolving all");
            return found
                .iter()
                .map(|binding| binding.activate(self).and_then(|i| downcast(&id, i)))
                .collect();
        }
        Err(self.not_bound(&id, Target::Plain))
    }

    /// Resolves `T` bound to itself.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get(ServiceId::of::<T>())
    }

    // ── Internal ──

    fn lookup(&self, id: &ServiceId, target: Target<'_>) -> Result<Arc<Binding>> {
        for container in self.ancestry() {
            let mut found = container.inner.registry.read().matching(id, &target);
            match found.len() {
                0 => continue,
                1 => {
                    trace!(container = %container.id(), id = %id, "Resolved binding");
                    return Ok(found.remove(0));
                }
                count => {
                    return Err(ContainerError::AmbiguousMatch {
                        id: id.clone(),
                        target: target.to_string(),
                        count,
                    });
                }
            }
        }
        Err(self.not_bound(id, target))
    }

    fn answers_anywhere(&self, id: &ServiceId, target: Target<'_>) -> bool {
        self.ancestry()
            .iter()
            .any(|c| !c.inner.registry.read().matching(id, &target).is_empty())
    }

    fn not_bound(&self, id: &ServiceId, target: Target<'_>) -> ContainerError {
        let labels: Vec<String> = self
            .ancestry()
            .iter()
            .flat_map(|c| c.inner.registry.read().labels())
            .collect();

        ContainerError::NotBound(NotBoundError {
            requested: id.clone(),
            target: target.to_string(),
            suggestions: suggest_similar(&id.label(), &labels, 3),
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id())
            .field("bindings", &self.len())
            .field("parent", &self.parent().map(|p| p.id()))
            .finish()
    }
}

fn downcast<T: Send + Sync + 'static>(id: &ServiceId, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            id: id.clone(),
            expected: type_name::<T>(),
        })
}

// ═══════════════════════════════════════════
// Binding syntax
// ═══════════════════════════════════════════

/// First step of a binding: choose what the identifier resolves to.
pub struct BindingTo<'c> {
    container: &'c Container,
    id: ServiceId,
}

impl BindingTo<'_> {
    /// Resolve to a `T` built by [`Injectable::inject`].
    pub fn to<T: Injectable>(self) -> BindingSyntax {
        self.to_factory(self_factory::<T>())
    }

    /// Resolve to one pre-built value. Always singleton.
    pub fn to_constant<T: Send + Sync + 'static>(self, value: T) -> BindingSyntax {
        let instance: Instance = Arc::new(value);
        self.to_factory(Arc::new(move |_: &Container| -> Result<Instance> {
            Ok(Arc::clone(&instance))
        }))
            .in_singleton_scope()
    }

    /// Resolve by calling `factory` with the requesting container.
    pub fn to_dynamic_value<T, F>(self, factory: F) -> BindingSyntax
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.to_factory(Arc::new(move |container: &Container| -> Result<Instance> {
            Ok(Arc::new(factory(container)?))
        }))
    }

    /// Resolve through a raw type-erased factory.
    pub fn to_factory(self, factory: FactoryFn) -> BindingSyntax {
        let scope = self.container.inner.options.default_scope;
        let binding = Arc::new(Binding::new(self.id, factory, scope));
        debug!(container = %self.container.id(), id = %binding.id, scope = %scope, "Registered binding");
        self.container.inner.registry.write().insert(Arc::clone(&binding));
        BindingSyntax { binding }
    }
}

/// Second step of a binding: scope and constraints.
///
/// The binding is already registered; these calls adjust it in place.
pub struct BindingSyntax {
    binding: Arc<Binding>,
}

impl BindingSyntax {
    pub fn in_singleton_scope(self) -> Self {
        self.in_scope(Scope::Singleton)
    }

    pub fn in_transient_scope(self) -> Self {
        self.in_scope(Scope::Transient)
    }

    pub fn in_scope(self, scope: Scope) -> Self {
        self.binding.set_scope(scope);
        self
    }

    /// Only answer requests for this name.
    pub fn when_target_named(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.binding.set_constraint(Constraint::Named(name.into()));
        self
    }

    /// Only answer requests tagged `key = value`.
    pub fn when_target_tagged(
        self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<TagValue>,
    ) -> Self {
        self.binding.set_constraint(Constraint::Tagged {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

impl fmt::Debug for BindingSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.binding.fmt(f)
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{
        BindingSyntax, BindingTo, Container, ContainerId, ContainerOptions, Injectable,
    };
    pub use crate::error::{ContainerError, Result};
    pub use crate::key::{ServiceId, TagValue};
    pub use crate::module::ContainerModule;
    pub use crate::registry::{FactoryFn, Instance};
    pub use crate::scope::Scope;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
