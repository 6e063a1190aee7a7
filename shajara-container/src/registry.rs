//! Binding registry: the bindings owned by one container.
//!
//! Several bindings may share an identifier; they are kept in registration
//! order and told apart by their [`Constraint`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::container::Container;
use crate::error::{CircularDependencyError, ContainerError, Result};
use crate::key::{Constraint, ServiceId, Target};
use crate::scope::Scope;

/// A type-erased activated service.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds an instance. Receives the container the request started from,
/// so dependencies resolve from the requester's point of view.
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

#[derive(Debug, Clone)]
pub(crate) struct BindingSettings {
    pub scope: Scope,
    pub constraint: Constraint,
}

/// One registered binding.
pub(crate) struct Binding {
    pub id: ServiceId,
    factory: FactoryFn,
    settings: RwLock<BindingSettings>,
    cache: OnceCell<Instance>,
}

impl Binding {
    pub fn new(id: ServiceId, factory: FactoryFn, scope: Scope) -> Self {
        Self {
            id,
            factory,
            settings: RwLock::new(BindingSettings {
                scope,
                constraint: Constraint::Any,
            }),
            cache: OnceCell::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.settings.read().scope
    }

    pub fn set_scope(&self, scope: Scope) {
        self.settings.write().scope = scope;
    }

    pub fn set_constraint(&self, constraint: Constraint) {
        self.settings.write().constraint = constraint;
    }

    pub fn answers(&self, target: &Target<'_>) -> bool {
        self.settings.read().constraint.matches(target)
    }

    /// Produces an instance according to the binding's scope.
    ///
    /// # Errors
    /// [`ContainerError::CircularDependency`] if this binding is already
    /// being constructed further up the current thread's call stack.
    pub fn activate(&self, origin: &Container) -> Result<Instance> {
        let scope = self.scope();
        if let (true, Some(instance)) = (scope.is_cached(), self.cache.get()) {
            return Ok(Arc::clone(instance));
        }
        // Entered before the singleton cell: re-entering a cell that is
        // still initializing blocks forever.
        let _activation = Activation::enter(self)?;

        match scope {
            Scope::Singleton => {
                let instance = self.cache.get_or_try_init(|| {
                    trace!(id = %self.id, "Constructing singleton");
                    (self.factory)(origin)
                })?;
                Ok(Arc::clone(instance))
            }
            Scope::Transient => {
                trace!(id = %self.id, "Constructing transient");
                (self.factory)(origin)
            }
        }
    }
}

// ═══════════════════════════════════════════
// Cycle detection
// ═══════════════════════════════════════════

thread_local! {
    /// Bindings under construction on this thread, outermost first.
    static ACTIVATING: RefCell<Vec<(*const Binding, ServiceId)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a binding as under construction until dropped.
struct Activation;

impl Activation {
    fn enter(binding: &Binding) -> Result<Self> {
        let key: *const Binding = binding;
        ACTIVATING.with_borrow_mut(|path| {
            if let Some(start) = path.iter().position(|(entry, _)| *entry == key) {
                let mut chain: Vec<ServiceId> = path[start..].iter().map(|(_, id)| id.clone()).collect();
                chain.push(binding.id.clone());
                warn!(id = %binding.id, depth = path.len(), "Circular dependency detected");
                return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
            }
            path.push((key, binding.id.clone()));
            Ok(Activation)
        })
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        ACTIVATING.with_borrow_mut(|path| {
            path.pop();
        });
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let settings = self.settings.read();
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("scope", &settings.scope)
            .field("constraint", &settings.constraint)
            .field("activated", &self.cache.get().is_some())
            .finish()
    }
}

/// All bindings of one container.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: HashMap<ServiceId, Vec<Arc<Binding>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: Arc<Binding>) {
        self.bindings
            .entry(binding.id.clone())
            .or_default()
            .push(binding);
    }

    /// Removes every binding for `id`. Returns how many were removed.
    pub fn remove(&mut self, id: &ServiceId) -> usize {
        self.bindings.remove(id).map_or(0, |removed| removed.len())
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.bindings.get(id).is_some_and(|list| !list.is_empty())
    }

    /// Bindings for `id` that answer `target`, in registration order.
    pub fn matching(&self, id: &ServiceId, target: &Target<'_>) -> Vec<Arc<Binding>> {
        self.bindings
            .get(id)
            .map(|list| list.iter().filter(|b| b.answers(target)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bindings.keys().map(ServiceId::label).collect()
    }
}
