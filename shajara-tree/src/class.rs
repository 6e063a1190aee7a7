//! Declarative binding registry.
//!
//! Each component type ("class") owns one [`ClassAdministration`]: whether
//! it receives the ambient container, whether it builds a container of its
//! own, and which services that container binds to themselves. Records are
//! written at declaration time and shared read-only by every instance.
//!
//! # Examples
//! ```rust
//! use shajara_container::prelude::*;
//! use shajara_tree::class::{ClassId, ClassRegistry};
//!
//! struct Clock;
//! impl Injectable for Clock {
//!     fn inject(_: &Container) -> Result<Self> { Ok(Clock) }
//! }
//!
//! struct Toolbar;
//!
//! let registry = ClassRegistry::new();
//! registry.declare::<Toolbar>().provides::<Clock>();
//!
//! let admin = registry.administration(&ClassId::of::<Toolbar>());
//! assert!(admin.provides_own_container());
//! assert_eq!(admin.bindings().len(), 1);
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use shajara_container::{FactoryFn, Injectable, Scope, ServiceId, self_factory};
use shajara_support::rendering::shorten_type_name;
use tracing::debug;

/// Identity of a component type.
#[derive(Clone)]
pub struct ClassId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ClassId {
    #[inline]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.type_name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shorten_type_name(self.type_name))
    }
}

/// A service a class's own container binds to itself.
#[derive(Clone)]
pub struct BindingDescriptor {
    pub service: ServiceId,
    pub scope: Scope,
    pub factory: FactoryFn,
}

impl fmt::Debug for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("service", &self.service)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Per-class record.
#[derive(Debug, Clone, Default)]
pub struct ClassAdministration {
    accepts_ambient: bool,
    provides_own_container: bool,
    bindings: Vec<BindingDescriptor>,
}

impl ClassAdministration {
    pub fn accepts_ambient(&self) -> bool {
        self.accepts_ambient
    }

    pub fn provides_own_container(&self) -> bool {
        self.provides_own_container
    }

    /// Provided services in declaration order.
    pub fn bindings(&self) -> &[BindingDescriptor] {
        &self.bindings
    }

    pub fn binding_for(&self, service: &ServiceId) -> Option<&BindingDescriptor> {
        self.bindings.iter().find(|d| &d.service == service)
    }

    /// Adds `descriptor` unless its service is already declared.
    /// Returns `false` when the declaration was ignored.
    fn provide(&mut self, descriptor: BindingDescriptor) -> bool {
        self.accepts_ambient = true;
        self.provides_own_container = true;

        if self.binding_for(&descriptor.service).is_some() {
            return false;
        }
        self.bindings.push(descriptor);
        true
    }
}

// ═══════════════════════════════════════════
// ClassRegistry
// ═══════════════════════════════════════════

/// Maps component types to their administration records.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: DashMap<ClassId, Arc<ClassAdministration>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every [`ComponentDeclaration`] submitted with
    /// [`declare_component!`](crate::declare_component).
    pub fn from_declarations() -> Self {
        let registry = Self::new();
        for declaration in inventory::iter::<ComponentDeclaration> {
            (declaration.declare)(&registry);
        }
        debug!(classes = registry.len(), "Collected component declarations");
        registry
    }

    /// Starts declarations for component type `C`.
    pub fn declare<C: ?Sized + 'static>(&self) -> ClassDeclaration<'_> {
        ClassDeclaration {
            registry: self,
            class: ClassId::of::<C>(),
        }
    }

    /// Declares that instances of `class` build a container binding
    /// `service` to itself. Re-declaring a service is ignored; the first
    /// declaration wins.
    pub fn register_provided_service(
        &self,
        class: ClassId,
        service: ServiceId,
        scope: Scope,
        factory: FactoryFn,
    ) -> bool {
        let mut entry = self.classes.entry(class.clone()).or_default();
        let administration = Arc::make_mut(entry.value_mut());
        let added = administration.provide(BindingDescriptor {
            service: service.clone(),
            scope,
            factory,
        });

        if added {
            debug!(class = %class, service = %service, scope = %scope, "Declared provided service");
        } else {
            debug!(class = %class, service = %service, "Service already declared, ignoring");
        }
        added
    }

    /// Declares that instances of `class` receive the ambient container.
    pub fn register_consumer(&self, class: ClassId) {
        let mut entry = self.classes.entry(class.clone()).or_default();
        if !entry.accepts_ambient {
            Arc::make_mut(entry.value_mut()).accepts_ambient = true;
            debug!(class = %class, "Declared consumer");
        }
    }

    /// Returns the record for `class`, creating an empty one on first use.
    pub fn administration(&self, class: &ClassId) -> Arc<ClassAdministration> {
        if let Some(existing) = self.classes.get(class) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.classes.entry(class.clone()).or_default().value())
    }

    /// Returns the record for `class` if anything was declared for it.
    pub fn get(&self, class: &ClassId) -> Option<Arc<ClassAdministration>> {
        self.classes.get(class).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Fluent declarations for one component type.
pub struct ClassDeclaration<'r> {
    registry: &'r ClassRegistry,
    class: ClassId,
}

impl ClassDeclaration<'_> {
    /// Provide `S` as a singleton of this component's container.
    pub fn provides<S: Injectable>(self) -> Self {
        self.provides_in::<S>(Scope::Singleton)
    }

    /// Provide `S` as transient: a new `S` per resolution.
    pub fn provides_transient<S: Injectable>(self) -> Self {
        self.provides_in::<S>(Scope::Transient)
    }

    pub fn provides_in<S: Injectable>(self, scope: Scope) -> Self {
        self.provides_id(ServiceId::of::<S>(), scope, self_factory::<S>())
    }

    /// Provide an arbitrary identifier built by `factory`.
    pub fn provides_id(self, service: impl Into<ServiceId>, scope: Scope, factory: FactoryFn) -> Self {
        self.registry
            .register_provided_service(self.class.clone(), service.into(), scope, factory);
        self
    }

    /// Receive the ambient container without providing anything.
    pub fn consumes(self) -> Self {
        self.registry.register_consumer(self.class.clone());
        self
    }
}

// ═══════════════════════════════════════════
// Link-time declarations
// ═══════════════════════════════════════════

/// A declaration function collected at link time.
pub struct ComponentDeclaration {
    declare: fn(&ClassRegistry),
}

impl ComponentDeclaration {
    pub const fn new(declare: fn(&ClassRegistry)) -> Self {
        Self { declare }
    }
}

inventory::collect!(ComponentDeclaration);

/// Submits a declaration function for [`ClassRegistry::from_declarations`].
///
/// ```rust,ignore
/// fn declare_toolbar(registry: &ClassRegistry) {
///     registry.declare::<Toolbar>().provides::<Clock>();
/// }
///
/// declare_component!(declare_toolbar);
/// ```
#[macro_export]
macro_rules! declare_component {
    ($declare:path) => {
        $crate::inventory::submit! {
            $crate::class::ComponentDeclaration::new($declare)
        }
    };
}
