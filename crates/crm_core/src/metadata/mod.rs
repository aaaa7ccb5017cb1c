//! Metadata registry and field classification.
//!
//! # Responsibility
//! - Hold server-declared object metadata keyed by singular name.
//! - Partition an object's fields into identifier, inline and relation groups.
//!
//! # Invariants
//! - Classification is a pure function of object name and field list.

pub mod classify;
pub mod registry;
