//! # Shajara Support
//!
//! Shared text helpers for the Shajara crates.
//!
//! This crate provides:
//! - Rendering of container ancestry chains for error messages
//! - Short type names for service identifiers and component classes
//! - "Did you mean?" suggestions for unbound identifiers

pub mod rendering;
