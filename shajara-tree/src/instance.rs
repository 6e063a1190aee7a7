//! Per-instance state: the memoized container and one cache slot per
//! binding site.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use once_cell::unsync::OnceCell;
use shajara_container::Container;

/// Where a resolution happens inside one component instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingSite {
    /// A named attribute accessor.
    Attribute(&'static str),
    /// The n-th hook call of a render.
    Hook(usize),
}

impl fmt::Display for BindingSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSite::Attribute(name) => write!(f, "attribute `{name}`"),
            BindingSite::Hook(index) => write!(f, "hook #{index}"),
        }
    }
}

/// Owned exclusively by one component instance and dropped with it.
#[derive(Default)]
pub struct InstanceAdministration {
    container: OnceCell<Container>,
    sites: HashMap<BindingSite, Box<dyn Any>>,
}

impl InstanceAdministration {
    pub fn new() -> Self {
        Self::default()
    }

    /// The container resolved for this instance, if resolution already ran.
    pub fn resolved_container(&self) -> Option<&Container> {
        self.container.get()
    }

    pub(crate) fn container_cell(&self) -> &OnceCell<Container> {
        &self.container
    }

    pub fn is_cached(&self, site: &BindingSite) -> bool {
        self.sites.contains_key(site)
    }

    /// `None` if nothing is cached; `Some(None)` if the cached value has
    /// another type.
    pub(crate) fn cached<V: Clone + 'static>(&self, site: &BindingSite) -> Option<Option<V>> {
        self.sites
            .get(site)
            .map(|value| value.downcast_ref::<V>().cloned())
    }

    pub(crate) fn remember<V: 'static>(&mut self, site: BindingSite, value: V) {
        self.sites.insert(site, Box::new(value));
    }
}

impl fmt::Debug for InstanceAdministration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceAdministration")
            .field("container", &self.container.get().map(Container::id))
            .field("sites", &self.sites.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sites_cache_independently() {
        let mut admin = InstanceAdministration::new();
        admin.remember(BindingSite::Attribute("clock"), 1u8);
        admin.remember(BindingSite::Hook(0), String::from("x"));

        assert_eq!(admin.cached::<u8>(&BindingSite::Attribute("clock")), Some(Some(1)));
        assert_eq!(
            admin.cached::<String>(&BindingSite::Hook(0)),
            Some(Some(String::from("x")))
        );
        assert_eq!(admin.cached::<u8>(&BindingSite::Hook(1)), None);
    }

    #[test]
    fn cached_type_mismatch_is_visible() {
        let mut admin = InstanceAdministration::new();
        admin.remember(BindingSite::Hook(0), 1u8);
        assert_eq!(admin.cached::<u16>(&BindingSite::Hook(0)), Some(None));
    }

    #[test]
    fn site_display() {
        assert_eq!(BindingSite::Attribute("clock").to_string(), "attribute `clock`");
        assert_eq!(BindingSite::Hook(2).to_string(), "hook #2");
    }
}
