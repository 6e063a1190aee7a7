//! Binding lifecycle scopes.
//!
//! - [`Scope::Singleton`]: one instance per owning container
//! - [`Scope::Transient`]: new instance on every request

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines how long an activated binding lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Constructed on first request, then shared until the owning
    /// container is dropped.
    Singleton,

    /// Constructed on every request. Never cached.
    Transient,
}

impl Scope {
    /// Returns `true` if activations are cached on the binding.
    #[inline]
    pub fn is_cached(&self) -> bool {
        match self {
            Scope::Singleton => true,
            Scope::Transient => false,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Transient => write!(f, "Transient"),
        }
    }
}
