//! The host component tree the binding layer runs in.
//!
//! The tree is an arena of provider nodes and component nodes. A render
//! pass visits parents before children, depth first, and passes the
//! ambient container down by value. Components persist across passes, so
//! calling [`ComponentTree::render`] again is a re-render.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use shajara_container::prelude::*;
//! use shajara_tree::prelude::*;
//!
//! struct Clock;
//! impl Injectable for Clock {
//!     fn inject(_: &Container) -> shajara_container::Result<Self> { Ok(Clock) }
//! }
//!
//! let container = Container::new();
//! container.bind_self::<Clock>().in_singleton_scope();
//!
//! let mut tree = ComponentTree::new(Arc::new(ClassRegistry::new()));
//! let root = tree.mount_provider(None, ProviderProps::new(container)).unwrap();
//! tree.mount_fn(Some(root), |cx| {
//!     let _clock: Arc<Clock> = cx.use_injection(ServiceId::of::<Clock>())?;
//!     Ok(())
//! }).unwrap();
//!
//! tree.render().unwrap();
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use shajara_container::{Container, ServiceId, TagValue};
use tracing::{debug, info, instrument};

use crate::class::{ClassAdministration, ClassId, ClassRegistry};
use crate::context::Ambient;
use crate::error::{BindingError, Result};
use crate::facade::{ContainerSource, Site};
use crate::instance::{BindingSite, InstanceAdministration};
use crate::provider::{ProviderNode, ProviderProps};
use crate::resolver::resolve_container_for;

/// Index of a node in its [`ComponentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A component instance.
pub trait Component: 'static {
    fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()>;
}

/// A closure rendered as a component. Its class is the closure type.
pub struct FnComponent<F> {
    render: F,
}

impl<F> Component for FnComponent<F>
where
    F: FnMut(&mut RenderContext<'_>) -> Result<()> + 'static,
{
    fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
        (self.render)(cx)
    }
}

trait MountedComponent {
    fn render_into(&mut self, cx: &mut RenderContext<'_>) -> Result<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> MountedComponent for C {
    fn render_into(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
        self.render(cx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Mounted {
    class: ClassId,
    component: Box<dyn MountedComponent>,
    administration: InstanceAdministration,
    /// Ambient value seen at the last render.
    ambient: Ambient,
}

impl Mounted {
    /// Renders the component and returns what its subtree sees.
    fn render(&mut self, classes: &ClassRegistry, ambient: &Ambient) -> Result<Ambient> {
        self.ambient = ambient.clone();
        let administration = classes.administration(&self.class);

        let mut cx = RenderContext::new(&self.class, &administration, &mut self.administration, ambient);
        self.component.render_into(&mut cx)?;

        if !administration.provides_own_container() {
            return Ok(ambient.clone());
        }
        let own = resolve_container_for(&self.class, &administration, &self.administration, ambient)?;
        Ok(ambient.overridden(own))
    }
}

enum NodeKind {
    Provider(ProviderNode),
    Component(Mounted),
}

struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
}

// ═══════════════════════════════════════════
// ComponentTree
// ═══════════════════════════════════════════

/// Arena of mounted nodes plus the class registry they are declared in.
pub struct ComponentTree {
    classes: Arc<ClassRegistry>,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    passes: u64,
}

impl ComponentTree {
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self {
            classes,
            nodes: Vec::new(),
            roots: Vec::new(),
            passes: 0,
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Mounts a provider node under `parent`, or as a root.
    pub fn mount_provider(&mut self, parent: Option<NodeId>, props: ProviderProps) -> Result<NodeId> {
        self.insert(parent, NodeKind::Provider(ProviderNode::new(props)))
    }

    /// Mounts a component instance under `parent`, or as a root.
    pub fn mount<C: Component>(&mut self, parent: Option<NodeId>, component: C) -> Result<NodeId> {
        self.insert(
            parent,
            NodeKind::Component(Mounted {
                class: ClassId::of::<C>(),
                component: Box::new(component),
                administration: InstanceAdministration::new(),
                ambient: Ambient::none(),
            }),
        )
    }

    /// Mounts a closure as a component.
    pub fn mount_fn<F>(&mut self, parent: Option<NodeId>, render: F) -> Result<NodeId>
    where
        F: FnMut(&mut RenderContext<'_>) -> Result<()> + 'static,
    {
        self.mount(parent, FnComponent { render })
    }

    /// Passes new props to a provider node. Its container and standalone
    /// flag must stay the same.
    pub fn update_provider(&mut self, node: NodeId, props: ProviderProps) -> Result<()> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Provider(provider)) => Ok(provider.update(&props)?),
            _ => Err(BindingError::InvalidNode {
                node,
                expected: "provider",
            }),
        }
    }

    pub fn provider(&self, node: NodeId) -> Option<&ProviderNode> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Provider(provider) => Some(provider),
            NodeKind::Component(_) => None,
        }
    }

    pub fn component<C: Component>(&self, node: NodeId) -> Option<&C> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Component(mounted) => mounted.component.as_any().downcast_ref::<C>(),
            NodeKind::Provider(_) => None,
        }
    }

    pub fn component_mut<C: Component>(&mut self, node: NodeId) -> Option<&mut C> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Component(mounted) => mounted.component.as_any_mut().downcast_mut::<C>(),
            NodeKind::Provider(_) => None,
        }
    }

    pub fn instance(&self, node: NodeId) -> Option<&InstanceAdministration> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Component(mounted) => Some(&mounted.administration),
            NodeKind::Provider(_) => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of completed render passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Runs `access` against a component outside of a render pass, with
    /// the ambient value the component saw when it last rendered.
    ///
    /// Attribute sites share their caches with the ones used in `render`.
    pub fn access<V>(
        &mut self,
        node: NodeId,
        access: impl FnOnce(&mut RenderContext<'_>) -> Result<V>,
    ) -> Result<V> {
        let classes = &self.classes;
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Component(mounted)) => {
                let administration = classes.administration(&mounted.class);
                let mut cx = RenderContext::new(
                    &mounted.class,
                    &administration,
                    &mut mounted.administration,
                    &mounted.ambient,
                );
                access(&mut cx)
            }
            _ => Err(BindingError::InvalidNode {
                node,
                expected: "component",
            }),
        }
    }

    /// One full top-down pass. Stops at the first error.
    #[instrument(skip(self), name = "render_pass", fields(pass = self.passes + 1))]
    pub fn render(&mut self) -> Result<()> {
        let roots = self.roots.clone();
        for root in roots {
            self.visit(root, Ambient::none())?;
        }
        self.passes += 1;
        info!(nodes = self.nodes.len(), "Render pass complete");
        Ok(())
    }

    fn visit(&mut self, id: NodeId, ambient: Ambient) -> Result<()> {
        let classes = &self.classes;
        let node = self.nodes.get_mut(id.0).ok_or(BindingError::InvalidNode {
            node: id,
            expected: "node",
        })?;

        let below = match &mut node.kind {
            NodeKind::Provider(provider) => {
                provider.initialize_once(&ambient)?;
                debug!(node = %id, container = %provider.container().id(), "Provider installs container");
                provider.install(&ambient)
            }
            NodeKind::Component(mounted) => mounted.render(classes, &ambient)?,
        };

        let children = node.children.clone();
        for child in children {
            self.visit(child, below.clone())?;
        }
        Ok(())
    }

    fn insert(&mut self, parent: Option<NodeId>, kind: NodeKind) -> Result<NodeId> {
        let id = NodeId(self.nodes.len());
        match parent {
            Some(parent) => {
                let node = self
                    .nodes
                    .get_mut(parent.0)
                    .ok_or(BindingError::InvalidNode {
                        node: parent,
                        expected: "node",
                    })?;
                node.children.push(id);
            }
            None => self.roots.push(id),
        }
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        Ok(id)
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("passes", &self.passes)
            .finish()
    }
}

// ═══════════════════════════════════════════
// RenderContext
// ═══════════════════════════════════════════

/// What a component sees while rendering.
///
/// Attribute sites (`attr`) resolve through the instance's own container.
/// Hooks (`use_*`) read the ambient container directly and take one slot
/// each, by call order, so call them in the same order on every render.
pub struct RenderContext<'a> {
    class: &'a ClassId,
    administration: &'a ClassAdministration,
    instance: &'a mut InstanceAdministration,
    ambient: &'a Ambient,
    next_hook: usize,
}

impl<'a> RenderContext<'a> {
    fn new(
        class: &'a ClassId,
        administration: &'a ClassAdministration,
        instance: &'a mut InstanceAdministration,
        ambient: &'a Ambient,
    ) -> Self {
        Self {
            class,
            administration,
            instance,
            ambient,
            next_hook: 0,
        }
    }

    pub fn class(&self) -> &ClassId {
        self.class
    }

    pub fn ambient(&self) -> &Ambient {
        self.ambient
    }

    /// The instance's own container, resolved once per instance.
    pub fn container(&mut self) -> Result<Container> {
        resolve_container_for(self.class, self.administration, self.instance, self.ambient)
    }

    /// The binding site of attribute `name`.
    pub fn attr(&mut self, name: &'static str) -> Site<'_> {
        Site::new(
            self.instance,
            BindingSite::Attribute(name),
            ContainerSource::Instance {
                class: self.class,
                administration: self.administration,
                ambient: self.ambient,
            },
        )
    }

    /// The next hook slot.
    pub fn hook(&mut self) -> Site<'_> {
        let index = self.next_hook;
        self.next_hook += 1;
        Site::new(
            self.instance,
            BindingSite::Hook(index),
            ContainerSource::Ambient {
                class: self.class,
                ambient: self.ambient,
            },
        )
    }

    // ── Hooks ──

    /// The nearest provided container.
    pub fn use_container(&self) -> Result<Container> {
        Ok(self.ambient.require(self.class)?)
    }

    /// Projects a value out of the nearest container, once.
    pub fn use_resolved<V, F>(&mut self, project: F) -> Result<V>
    where
        V: Clone + 'static,
        F: FnOnce(&Container) -> Result<V>,
    {
        self.hook().resolve_with(project)
    }

    pub fn use_injection<T: Send + Sync + 'static>(&mut self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        self.hook().get(id)
    }

    pub fn use_optional_injection<T: Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
    ) -> Result<Option<Arc<T>>> {
        self.hook().get_optional(id)
    }

    pub fn use_optional_injection_or_else<T, D>(
        &mut self,
        id: impl Into<ServiceId>,
        default: D,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        D: FnOnce() -> Arc<T>,
    {
        self.hook().get_optional_or_else(id, default)
    }

    pub fn use_named_injection<T: Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
        name: &str,
    ) -> Result<Arc<T>> {
        self.hook().get_named(id, name)
    }

    pub fn use_tagged_injection<T: Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
        key: &str,
        value: impl Into<TagValue>,
    ) -> Result<Arc<T>> {
        self.hook().get_tagged(id, key, value)
    }

    pub fn use_all_injections<T: Send + Sync + 'static>(
        &mut self,
        id: impl Into<ServiceId>,
    ) -> Result<Vec<Arc<T>>> {
        self.hook().get_all(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use shajara_container::{ContainerError, Injectable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SERIAL: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Foo {
        label: &'static str,
        serial: usize,
    }

    impl Foo {
        fn name(&self) -> String {
            format!("{}-{}", self.label, self.serial)
        }
    }

    impl Injectable for Foo {
        fn inject(_: &Container) -> shajara_container::Result<Self> {
            Ok(Foo {
                label: "foo",
                serial: SERIAL.fetch_add(1, Ordering::SeqCst),
            })
        }
    }

    /// Resolves `Foo` through a hook.
    #[derive(Default)]
    struct HookProbe {
        seen: Vec<Arc<Foo>>,
    }

    impl Component for HookProbe {
        fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
            let foo = cx.use_injection::<Foo>(ServiceId::of::<Foo>())?;
            self.seen.push(foo);
            Ok(())
        }
    }

    /// Resolves `Foo` through attribute `foo`.
    #[derive(Default)]
    struct AttrProbe {
        seen: Vec<Arc<Foo>>,
    }

    impl Component for AttrProbe {
        fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
            let foo = cx.attr("foo").get::<Foo>(ServiceId::of::<Foo>())?;
            self.seen.push(foo);
            Ok(())
        }
    }

    /// Resolves `Foo` at two sites in one render.
    #[derive(Default)]
    struct TwoSites {
        first: Option<Arc<Foo>>,
        second: Option<Arc<Foo>>,
    }

    impl Component for TwoSites {
        fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
            self.first = Some(cx.use_injection(ServiceId::of::<Foo>())?);
            self.second = Some(cx.use_injection(ServiceId::of::<Foo>())?);
            Ok(())
        }
    }

    struct Holder;

    impl Component for Holder {
        fn render(&mut self, _: &mut RenderContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    struct TransientHolder;

    impl Component for TransientHolder {
        fn render(&mut self, _: &mut RenderContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn registry() -> ClassRegistry {
        let registry = ClassRegistry::new();
        registry.declare::<AttrProbe>().consumes();
        registry.declare::<Holder>().provides::<Foo>();
        registry.declare::<TransientHolder>().provides_transient::<Foo>();
        registry
    }

    fn tree() -> ComponentTree {
        crate::init_test_tracing();
        ComponentTree::new(Arc::new(registry()))
    }

    fn foo_container() -> Container {
        let container = Container::new();
        container.bind_self::<Foo>();
        container
    }

    #[test]
    fn provider_reaches_deep_children() {
        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(foo_container())).unwrap();
        let middle = tree.mount_fn(Some(root), |_| Ok(())).unwrap();
        let probe = tree.mount(Some(middle), HookProbe::default()).unwrap();

        tree.render().unwrap();

        let seen = &tree.component::<HookProbe>(probe).unwrap().seen;
        assert!(seen[0].name().starts_with("foo-"));
    }

    #[test]
    fn two_sites_agree_in_one_pass() {
        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(foo_container())).unwrap();
        let node = tree.mount(Some(root), TwoSites::default()).unwrap();

        tree.render().unwrap();

        let sites = tree.component::<TwoSites>(node).unwrap();
        let (first, second) = (sites.first.as_ref().unwrap(), sites.second.as_ref().unwrap());
        assert_eq!(first.label, second.label);
        // transient binding: each site activated its own instance
        assert_ne!(first.serial, second.serial);
        assert!(!Arc::ptr_eq(first, second));
    }

    #[test]
    fn two_sites_share_a_singleton() {
        let container = Container::new();
        container.bind_self::<Foo>().in_singleton_scope();

        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(container)).unwrap();
        let node = tree.mount(Some(root), TwoSites::default()).unwrap();
        tree.render().unwrap();

        let sites = tree.component::<TwoSites>(node).unwrap();
        assert!(Arc::ptr_eq(
            sites.first.as_ref().unwrap(),
            sites.second.as_ref().unwrap()
        ));
    }

    #[test]
    fn hook_value_survives_re_render() {
        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(foo_container())).unwrap();
        let probe = tree.mount(Some(root), HookProbe::default()).unwrap();

        tree.render().unwrap();
        tree.render().unwrap();

        let seen = &tree.component::<HookProbe>(probe).unwrap().seen;
        assert_eq!(seen.len(), 2);
        // transient binding, but the site resolved only once
        assert!(Arc::ptr_eq(&seen[0], &seen[1]));
        assert_eq!(tree.passes(), 2);
    }

    #[test]
    fn provided_singleton_shared_by_siblings() {
        let mut tree = tree();
        let holder = tree.mount(None, Holder).unwrap();
        let left = tree.mount(Some(holder), AttrProbe::default()).unwrap();
        let right = tree.mount(Some(holder), HookProbe::default()).unwrap();
        let outsider = tree.mount(None, HookProbe::default()).unwrap();

        let err = tree.render().unwrap_err();
        assert!(matches!(err, BindingError::MissingProvider(_)));

        let left = &tree.component::<AttrProbe>(left).unwrap().seen;
        let right = &tree.component::<HookProbe>(right).unwrap().seen;
        assert!(Arc::ptr_eq(&left[0], &right[0]));
        assert!(tree.component::<HookProbe>(outsider).unwrap().seen.is_empty());
    }

    #[test]
    fn provided_transient_differs_per_consumer() {
        let mut tree = tree();
        let holder = tree.mount(None, TransientHolder).unwrap();
        let left = tree.mount(Some(holder), HookProbe::default()).unwrap();
        let right = tree.mount(Some(holder), HookProbe::default()).unwrap();

        tree.render().unwrap();

        let left = &tree.component::<HookProbe>(left).unwrap().seen;
        let right = &tree.component::<HookProbe>(right).unwrap().seen;
        assert!(!Arc::ptr_eq(&left[0], &right[0]));
    }

    #[test]
    fn providing_component_keeps_its_container() {
        let mut tree = tree();
        let holder = tree.mount(None, Holder).unwrap();
        tree.render().unwrap();
        let first = tree.instance(holder).unwrap().resolved_container().unwrap().clone();
        tree.render().unwrap();
        let second = tree.instance(holder).unwrap().resolved_container().unwrap().clone();

        assert!(Container::ptr_eq(&first, &second));
    }

    #[test]
    fn providing_component_parents_to_provider() {
        let outer = Container::new();
        outer.bind("label").to_constant(String::from("outer"));

        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(outer.clone())).unwrap();
        let holder = tree.mount(Some(root), Holder).unwrap();
        let reader = tree
            .mount_fn(Some(holder), |cx| {
                let label: Arc<String> = cx.use_injection("label")?;
                assert_eq!(label.as_str(), "outer");
                let _: Arc<Foo> = cx.use_injection(ServiceId::of::<Foo>())?;
                Ok(())
            })
            .unwrap();

        tree.render().unwrap();

        let own = tree.instance(holder).unwrap().resolved_container().unwrap();
        assert!(Container::ptr_eq(&own.parent().unwrap(), &outer));
        assert!(tree.instance(reader).unwrap().is_cached(&BindingSite::Hook(1)));
    }

    #[test]
    fn attributes_readable_outside_render() {
        let mut tree = tree();
        let holder = tree.mount(None, Holder).unwrap();
        tree.render().unwrap();

        let a = tree
            .access(holder, |cx| cx.attr("foo").get::<Foo>(ServiceId::of::<Foo>()))
            .unwrap();
        let b = tree
            .access(holder, |cx| cx.attr("foo").get::<Foo>(ServiceId::of::<Foo>()))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn consumer_without_provider_fails() {
        let mut tree = tree();
        tree.mount(None, AttrProbe::default()).unwrap();
        assert!(matches!(tree.render(), Err(BindingError::MissingProvider(_))));
    }

    #[test]
    fn hook_without_provider_fails() {
        let mut tree = tree();
        tree.mount_fn(None, |cx| cx.use_container().map(|_| ())).unwrap();
        assert!(matches!(tree.render(), Err(BindingError::MissingProvider(_))));
    }

    #[test]
    fn use_container_returns_provided_container() {
        let container = Container::new();
        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(container.clone())).unwrap();
        tree.mount_fn(Some(root), move |cx| {
            assert!(Container::ptr_eq(&cx.use_container()?, &container));
            Ok(())
        })
        .unwrap();
        tree.render().unwrap();
    }

    #[test]
    fn undeclared_class_sees_no_ambient_through_attributes() {
        struct Plain;
        impl Component for Plain {
            fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
                cx.attr("foo").get::<Foo>(ServiceId::of::<Foo>()).map(|_| ())
            }
        }

        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(foo_container())).unwrap();
        tree.mount(Some(root), Plain).unwrap();
        match tree.render() {
            Err(err @ BindingError::UndeclaredComponent { .. }) => {
                assert!(err.to_string().contains(".consumes()"));
            }
            other => panic!("Expected undeclared component error, got: {other:?}"),
        }
    }

    #[test]
    fn nested_providers_chain_containers() {
        let outer = Container::new();
        outer.bind("label").to_constant(String::from("outer"));
        let inner = Container::new();

        let mut tree = tree();
        let a = tree.mount_provider(None, ProviderProps::new(outer.clone())).unwrap();
        let b = tree.mount_provider(Some(a), ProviderProps::new(inner.clone())).unwrap();
        tree.mount_fn(Some(b), |cx| {
            let label: Arc<String> = cx.use_injection("label")?;
            assert_eq!(label.as_str(), "outer");
            Ok(())
        })
        .unwrap();

        tree.render().unwrap();
        assert!(Container::ptr_eq(&inner.parent().unwrap(), &outer));

        tree.render().unwrap();
        assert!(Container::ptr_eq(&inner.parent().unwrap(), &outer));
    }

    #[test]
    fn standalone_provider_isolates() {
        let outer = Container::new();
        outer.bind("label").to_constant(String::from("outer"));
        let inner = Container::new();

        let mut tree = tree();
        let a = tree.mount_provider(None, ProviderProps::new(outer)).unwrap();
        let b = tree
            .mount_provider(Some(a), ProviderProps::new(inner.clone()).standalone(true))
            .unwrap();
        tree.mount_fn(Some(b), |cx| cx.use_injection::<String>("label").map(|_| ()))
            .unwrap();

        let err = tree.render().unwrap_err();
        assert!(matches!(err, BindingError::Resolution(ContainerError::NotBound(_))));
        assert!(inner.parent().is_none());
    }

    #[test]
    fn self_parent_fails_render() {
        let container = Container::new();
        let mut tree = tree();
        let a = tree.mount_provider(None, ProviderProps::new(container.clone())).unwrap();
        tree.mount_provider(Some(a), ProviderProps::new(container.clone())).unwrap();

        let err = tree.render().unwrap_err();
        assert!(matches!(
            err,
            BindingError::Configuration(ConfigurationError::SelfParent { .. })
        ));
        assert!(container.parent().is_none());
    }

    #[test]
    fn already_parented_fails_render() {
        let previous = Container::new();
        let inner = Container::new();
        inner.set_parent(Some(previous.clone())).unwrap();

        let mut tree = tree();
        let a = tree.mount_provider(None, ProviderProps::new(Container::new())).unwrap();
        tree.mount_provider(Some(a), ProviderProps::new(inner.clone())).unwrap();

        let err = tree.render().unwrap_err();
        assert!(matches!(
            err,
            BindingError::Configuration(ConfigurationError::AmbiguousHierarchy { .. })
        ));
        assert!(Container::ptr_eq(&inner.parent().unwrap(), &previous));
    }

    #[test]
    fn provider_props_are_fixed() {
        let container = Container::new();
        let mut tree = tree();
        let node = tree.mount_provider(None, ProviderProps::new(container.clone())).unwrap();
        let leaf = tree.mount_fn(Some(node), |_| Ok(())).unwrap();
        tree.render().unwrap();

        tree.update_provider(node, ProviderProps::new(container.clone())).unwrap();

        match tree.update_provider(node, ProviderProps::new(Container::new())) {
            Err(BindingError::Configuration(err)) => assert_eq!(err.field(), "container"),
            other => panic!("Expected configuration error, got: {other:?}"),
        }
        match tree.update_provider(node, ProviderProps::new(container.clone()).standalone(true)) {
            Err(BindingError::Configuration(err)) => assert_eq!(err.field(), "standalone"),
            other => panic!("Expected configuration error, got: {other:?}"),
        }
        assert!(matches!(
            tree.update_provider(leaf, ProviderProps::new(container.clone())),
            Err(BindingError::InvalidNode { .. })
        ));
        assert!(Container::ptr_eq(tree.provider(node).unwrap().container(), &container));
    }

    #[test]
    fn optional_default_runs_once_and_only_when_unbound() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bound = Container::new();
        bound.bind("label").to_constant(String::from("bound"));

        let mut tree = tree();
        let with = tree.mount_provider(None, ProviderProps::new(bound)).unwrap();
        let without = tree.mount_provider(None, ProviderProps::new(Container::new())).unwrap();

        for (root, expected) in [(with, "bound"), (without, "default")] {
            let calls = calls.clone();
            tree.mount_fn(Some(root), move |cx| {
                let value = cx.use_optional_injection_or_else::<String, _>("label", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Arc::new(String::from("default"))
                })?;
                assert_eq!(value.as_str(), expected);
                let missing = cx.use_optional_injection::<String>("missing")?;
                assert!(missing.is_none());
                Ok(())
            })
            .unwrap();
        }

        tree.render().unwrap();
        tree.render().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct Armory {
        katana: Option<Arc<&'static str>>,
        shuriken: Option<Arc<&'static str>>,
        baz_a: Option<Arc<String>>,
        plugins: Vec<Arc<u8>>,
    }

    impl Component for Armory {
        fn render(&mut self, cx: &mut RenderContext<'_>) -> Result<()> {
            self.katana = Some(cx.use_tagged_injection("weapon", "canThrow", false)?);
            self.shuriken = Some(cx.use_tagged_injection("weapon", "canThrow", true)?);
            self.baz_a = Some(cx.use_named_injection("baz", "a")?);
            self.plugins = cx.use_all_injections("plugin")?;
            Ok(())
        }
    }

    #[test]
    fn named_tagged_and_all_hooks() {
        let container = Container::new();
        container.bind("weapon").to_constant("katana").when_target_tagged("canThrow", false);
        container.bind("weapon").to_constant("shuriken").when_target_tagged("canThrow", true);
        container
            .bind("baz")
            .to_dynamic_value(|_| Ok(String::from("baz-a")))
            .when_target_named("a");
        container
            .bind("baz")
            .to_dynamic_value(|_| Ok(String::from("baz-b")))
            .when_target_named("b");
        container.bind("plugin").to_constant(1u8);
        container.bind("plugin").to_constant(2u8);

        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(container)).unwrap();
        let node = tree.mount(Some(root), Armory::default()).unwrap();
        tree.render().unwrap();

        let armory = tree.component::<Armory>(node).unwrap();
        assert_eq!(**armory.katana.as_ref().unwrap(), "katana");
        assert_eq!(**armory.shuriken.as_ref().unwrap(), "shuriken");
        assert_eq!(armory.baz_a.as_ref().unwrap().as_str(), "baz-a");
        let plugins: Vec<u8> = armory.plugins.iter().map(|p| **p).collect();
        assert_eq!(plugins, vec![1, 2]);
    }

    #[test]
    fn use_resolved_projects_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tree = tree();
        let root = tree.mount_provider(None, ProviderProps::new(Container::new())).unwrap();
        let counter = calls.clone();
        tree.mount_fn(Some(root), move |cx| {
            let id = cx.use_resolved(|container| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(container.id())
            })?;
            assert_eq!(id, cx.use_container()?.id());
            Ok(())
        })
        .unwrap();

        tree.render().unwrap();
        tree.render().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn foreign_parent_rejected() {
        let mut tree = tree();
        let mut other = ComponentTree::new(Arc::new(ClassRegistry::new()));
        let a = other.mount_fn(None, |_| Ok(())).unwrap();
        let b = other.mount_fn(Some(a), |_| Ok(())).unwrap();
        assert!(matches!(
            tree.mount_fn(Some(b), |_| Ok(())),
            Err(BindingError::InvalidNode { .. })
        ));
    }
}
