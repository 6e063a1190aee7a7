//! Resolution facade.
//!
//! A [`Site`] is one binding site of one instance: a named attribute or a
//! hook slot. Each accessor resolves the site's container, projects a value
//! out of it, and caches that value on the instance. The same site never
//! computes twice; different sites never share a cache.

use std::any::type_name;
use std::sync::Arc;

use shajara_container::{Container, ServiceId, TagValue};
use tracing::trace;

use crate::class::{ClassAdministration, ClassId};
use crate::context::Ambient;
use crate::error::{BindingError, Result};
use crate::instance::{BindingSite, InstanceAdministration};
use crate::resolver::resolve_container_for;

/// Where a site gets its container from.
#[derive(Clone, Copy)]
pub(crate) enum ContainerSource<'a> {
    /// The instance's own resolved container.
    Instance {
        class: &'a ClassId,
        administration: &'a ClassAdministration,
        ambient: &'a Ambient,
    },
    /// The ambient container, read directly.
    Ambient { class: &'a ClassId, ambient: &'a Ambient },
}

impl ContainerSource<'_> {
    fn container(&self, instance: &InstanceAdministration) -> Result<Container> {
        match *self {
            ContainerSource::Instance {
                class,
                administration,
                ambient,
            } => resolve_container_for(class, administration, instance, ambient),
            ContainerSource::Ambient { class, ambient } => Ok(ambient.require(class)?),
        }
    }
}

/// One lazily resolved, memoized binding site.
pub struct Site<'a> {
    instance: &'a mut InstanceAdministration,
    site: BindingSite,
    source: ContainerSource<'a>,
}

impl<'a> Site<'a> {
    pub(crate) fn new(
        instance: &'a mut InstanceAdministration,
        site: BindingSite,
        source: ContainerSource<'a>,
    ) -> Self {
        Self {
            instance,
            site,
            source,
        }
    }

    /// The container this site resolves from. Not cached per site.
    pub fn container(self) -> Result<Container> {
        self.source.container(self.instance)
    }

    /// Resolves once with `project`, then returns the cached value.
    pub fn resolve_with<V, F>(self, project: F) -> Result<V>
    where
        V: Clone + 'static,
        F: FnOnce(&Container) -> Result<V>,
    {
        match self.instance.cached::<V>(&self.site) {
            Some(Some(value)) => {
                trace!(site = %self.site, "Using cached value");
                return Ok(value);
            }
            Some(None) => {
                return Err(BindingError::SiteTypeMismatch {
                    site: self.site.to_string(),
                    expected: type_name::<V>(),
                });
            }
            None => {}
        }

        let container = self.source.container(self.instance)?;
        let value = project(&container)?;
        trace!(site = %self.site, container = %container.id(), "Resolved site");
        self.instance.remember(self.site, value.clone());
        Ok(value)
    }

    /// Required lookup. An unbound identifier is an error.
    pub fn get<T: Send + Sync + 'static>(self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        let id = id.into();
        self.resolve_with(move |container| Ok(container.get::<T>(id)?))
    }

    /// Optional lookup; `None` when nothing is bound.
    pub fn get_optional<T: Send + Sync + 'static>(
        self,
        id: impl Into<ServiceId>,
    ) -> Result<Option<Arc<T>>> {
        let id = id.into();
        self.resolve_with(move |container| {
            if container.is_bound(&id) {
                Ok(Some(container.get::<T>(id)?))
            } else {
                Ok(None)
            }
        })
    }

    /// Optional lookup with a fallback. `default` runs only when nothing
    /// is bound, and at most once for this site.
    pub fn get_optional_or_else<T, D>(self, id: impl Into<ServiceId>, default: D) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        D: FnOnce() -> Arc<T>,
    {
        let id = id.into();
        self.resolve_with(move |container| {
            if container.is_bound(&id) {
                Ok(container.get::<T>(id)?)
            } else {
                Ok(default())
            }
        })
    }

    pub fn get_named<T: Send + Sync + 'static>(
        self,
        id: impl Into<ServiceId>,
        name: &str,
    ) -> Result<Arc<T>> {
        let id = id.into();
        self.resolve_with(move |container| Ok(container.get_named::<T>(id, name)?))
    }

    pub fn get_tagged<T: Send + Sync + 'static>(
        self,
        id: impl Into<ServiceId>,
        key: &str,
        value: impl Into<TagValue>,
    ) -> Result<Arc<T>> {
        let id = id.into();
        let value = value.into();
        self.resolve_with(move |container| Ok(container.get_tagged::<T>(id, key, value)?))
    }

    /// Every unconstrained binding for `id`, in the container's order.
    pub fn get_all<T: Send + Sync + 'static>(self, id: impl Into<ServiceId>) -> Result<Vec<Arc<T>>> {
        let id = id.into();
        self.resolve_with(move |container| Ok(container.get_all::<T>(id)?))
    }
}
