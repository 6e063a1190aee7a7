//! Service identifiers and lookup constraints.
//!
//! A [`ServiceId`] is the opaque key a binding is registered under. It can be
//! a Rust type, a string, or a symbol. Symbols are unique per construction,
//! so two symbols with the same description never collide.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use shajara_support::rendering::shorten_type_name;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Identifies a service inside a container.
///
/// # Examples
/// ```
/// use shajara_container::key::ServiceId;
///
/// struct Clock;
///
/// assert_eq!(ServiceId::of::<Clock>(), ServiceId::of::<Clock>());
/// assert_eq!(ServiceId::name("clock"), ServiceId::from("clock"));
/// assert_ne!(ServiceId::symbol("clock"), ServiceId::symbol("clock"));
/// ```
#[derive(Clone)]
pub struct ServiceId {
    kind: IdKind,
}

#[derive(Clone)]
enum IdKind {
    Type {
        type_id: TypeId,
        type_name: &'static str,
    },
    Name(Cow<'static, str>),
    Symbol {
        serial: u64,
        description: Cow<'static, str>,
    },
}

impl ServiceId {
    /// Identifier for the Rust type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            kind: IdKind::Type {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
        }
    }

    /// String identifier. Equal strings are the same identifier.
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: IdKind::Name(name.into()),
        }
    }

    /// Fresh symbol identifier. The description is only used for display.
    pub fn symbol(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: IdKind::Symbol {
                serial: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
                description: description.into(),
            },
        }
    }

    /// Returns the [`TypeId`] if this identifier is a type reference.
    pub fn type_id(&self) -> Option<TypeId> {
        match self.kind {
            IdKind::Type { type_id, .. } => Some(type_id),
            _ => None,
        }
    }

    /// Full, unshortened label. Used for suggestions.
    pub fn label(&self) -> String {
        match &self.kind {
            IdKind::Type { type_name, .. } => (*type_name).to_string(),
            IdKind::Name(name) => name.to_string(),
            IdKind::Symbol { description, .. } => format!("Symbol({description})"),
        }
    }
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (IdKind::Type { type_id: a, .. }, IdKind::Type { type_id: b, .. }) => a == b,
            (IdKind::Name(a), IdKind::Name(b)) => a == b,
            (IdKind::Symbol { serial: a, .. }, IdKind::Symbol { serial: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            IdKind::Type { type_id, .. } => {
                0u8.hash(state);
                type_id.hash(state);
            }
            IdKind::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            IdKind::Symbol { serial, .. } => {
                2u8.hash(state);
                serial.hash(state);
            }
        }
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        Self::name(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self::name(name)
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdKind::Type { type_name, .. } => write!(f, "ServiceId({type_name})"),
            IdKind::Name(name) => write!(f, "ServiceId({name:?})"),
            IdKind::Symbol { serial, description } => {
                write!(f, "ServiceId(Symbol({description})#{serial})")
            }
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdKind::Type { type_name, .. } => write!(f, "{}", shorten_type_name(type_name)),
            IdKind::Name(name) => write!(f, "{name:?}"),
            IdKind::Symbol { description, .. } => write!(f, "Symbol({description})"),
        }
    }
}

/// Value half of a tag constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(value.into())
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{v}"),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// Condition a binding places on the requests it answers.
///
/// An unconstrained binding only answers plain requests; a named or tagged
/// binding only answers requests carrying the same name or tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Constraint {
    #[default]
    Any,
    Named(Cow<'static, str>),
    Tagged {
        key: Cow<'static, str>,
        value: TagValue,
    },
}

impl Constraint {
    pub(crate) fn matches(&self, target: &Target<'_>) -> bool {
        match (self, target) {
            (Constraint::Any, Target::Plain) => true,
            (Constraint::Named(name), Target::Named(wanted)) => name == wanted,
            (Constraint::Tagged { key, value }, Target::Tagged(wanted_key, wanted_value)) => {
                key == wanted_key && value == *wanted_value
            }
            _ => false,
        }
    }
}

/// What a single request asks for beyond the identifier.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'a> {
    Plain,
    Named(&'a str),
    Tagged(&'a str, &'a TagValue),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Plain => Ok(()),
            Target::Named(name) => write!(f, " (named {name:?})"),
            Target::Tagged(key, value) => write!(f, " (tagged {key:?}={value})"),
        }
    }
}
