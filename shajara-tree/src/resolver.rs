//! Container resolver.
//!
//! Decides, once per instance, which container the instance uses:
//! - a class that provides services gets a fresh container binding those
//!   services to themselves, parented to the ambient container if any;
//! - any other class uses the ambient container itself.
//!
//! The decision is memoized on the instance. Later calls return the same
//! container even if the ambient value has changed since.

use shajara_container::Container;
use tracing::{debug, instrument, trace};

use crate::class::{ClassAdministration, ClassId};
use crate::context::Ambient;
use crate::error::{BindingError, MissingProviderError, Result};
use crate::instance::InstanceAdministration;

/// Returns the container for one instance, computing it at most once.
///
/// The ambient value only counts for classes that accept it; a class that
/// never declared anything sees no ambient container.
///
/// # Errors
/// - [`BindingError::MissingProvider`] if the class provides nothing and no
///   container is visible.
/// - [`BindingError::UndeclaredComponent`] if a container is visible but the
///   class never declared that it consumes one.
pub fn resolve_container_for(
    class: &ClassId,
    administration: &ClassAdministration,
    instance: &InstanceAdministration,
    ambient: &Ambient,
) -> Result<Container> {
    if let Some(container) = instance.resolved_container() {
        trace!(class = %class, container = %container.id(), "Reusing resolved container");
        return Ok(container.clone());
    }

    let visible = if administration.accepts_ambient() {
        ambient.container()
    } else if ambient.is_none() {
        None
    } else {
        debug!(class = %class, "Ambient container ignored by undeclared component");
        return Err(BindingError::UndeclaredComponent {
            component: class.clone(),
        });
    };

    let container = instance
        .container_cell()
        .get_or_try_init(|| build_container(class, administration, visible))?;
    Ok(container.clone())
}

#[instrument(skip_all, fields(class = %class))]
fn build_container(
    class: &ClassId,
    administration: &ClassAdministration,
    ambient: Option<&Container>,
) -> Result<Container> {
    if !administration.provides_own_container() {
        return ambient.cloned().ok_or_else(|| {
            MissingProviderError {
                component: class.clone(),
            }
            .into()
        });
    }

    let container = Container::new();
    for descriptor in administration.bindings() {
        container
            .bind(descriptor.service.clone())
            .to_factory(descriptor.factory.clone())
            .in_scope(descriptor.scope);
    }

    if let Some(parent) = ambient {
        container.set_parent(Some(parent.clone()))?;
    }

    debug!(
        container = %container.id(),
        parent = ?ambient.map(Container::id),
        bindings = administration.bindings().len(),
        "Created container for providing component"
    );
    Ok(container)
}
