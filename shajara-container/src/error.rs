//! Error types for container operations.
//!
//! Every lookup failure names the identifier, the constraint that was asked
//! for, and, where possible, what you might have meant instead.

use crate::key::ServiceId;
use shajara_support::rendering::render_chain;
use std::fmt;

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Nothing answers the request in the container or any ancestor.
    #[error("{}", .0)]
    NotBound(NotBoundError),

    /// More than one binding answers the same request in one container.
    #[error(
        "Ambiguous match for {id}{target}: {count} bindings found\n  Hint: Add a name or tag constraint to tell them apart"
    )]
    AmbiguousMatch {
        id: ServiceId,
        target: String,
        count: usize,
    },

    /// The activated value is not of the requested Rust type.
    #[error("Type mismatch for {id}: expected {expected}")]
    TypeMismatch { id: ServiceId, expected: &'static str },

    /// A binding's factory asked, directly or through other bindings, for
    /// the binding it is constructing.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A factory returned an error during activation.
    #[error("Failed to construct {id}: {source}")]
    ConstructionFailed {
        id: ServiceId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Setting the parent would make a container its own ancestor.
    #[error("Cyclic container hierarchy: {chain}")]
    CyclicHierarchy { chain: String },
}

/// Error when no binding answers a request.
#[derive(Debug)]
pub struct NotBoundError {
    /// The identifier that was requested
    pub requested: ServiceId,
    /// Rendered name/tag constraint of the request, empty for plain requests
    pub target: String,
    /// Bound identifiers that look similar
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No matching bindings found for {}{}", self.requested, self.target)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Bind it with .bind({}) on this container or one of its ancestors",
            self.requested
        )
    }
}

/// Error when an activation re-enters a binding that is still being
/// constructed.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Identifiers from the re-entered binding to itself.
    /// Example: `[A, B, A]`
    pub chain: Vec<ServiceId>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links: Vec<String> = self.chain.iter().map(ServiceId::to_string).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&links))?;
        write!(
            f,
            "\n  Hint: Resolve one side lazily, or move the shared part into its own binding"
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_bound_display() {
        let err = ContainerError::NotBound(NotBoundError {
            requested: ServiceId::name("FooFoo"),
            target: " (named \"a\")".to_string(),
            suggestions: vec!["Foo".to_string()],
        });

        let msg = err.to_string();
        assert!(msg.contains("No matching bindings found for \"FooFoo\" (named \"a\")"));
        assert!(msg.contains("- Foo"));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn ambiguous_display() {
        let err = ContainerError::AmbiguousMatch {
            id: ServiceId::name("Weapon"),
            target: String::new(),
            count: 2,
        };
        assert!(err.to_string().contains("2 bindings found"));
    }

    #[test]
    fn circular_dependency_display() {
        let err = ContainerError::CircularDependency(CircularDependencyError {
            chain: vec![
                ServiceId::name("a"),
                ServiceId::name("b"),
                ServiceId::name("a"),
            ],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular dependency detected"));
        assert!(msg.contains("\"a\" → \"b\" → \"a\""));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn construction_failed_keeps_source() {
        use std::error::Error;

        let err = ContainerError::ConstructionFailed {
            id: ServiceId::name("db"),
            source: "connection refused".into(),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("connection refused"));
    }
}
