//! Domain model shared by metadata, record, auth and import layers.
//!
//! # Responsibility
//! - Define server-declared metadata shapes (objects and their fields).
//! - Define record snapshots and patches exchanged with the update boundary.
//! - Define tenant entities (workspaces, users, workspace members).
//!
//! # Invariants
//! - Metadata items are immutable for the duration of one render pass.
//! - Records are identified by a stable `RecordId` within one object type.

pub mod field_metadata;
pub mod record;
pub mod workspace;
