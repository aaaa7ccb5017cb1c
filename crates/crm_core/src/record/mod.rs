//! Record rendering and editing pipeline.
//!
//! # Responsibility
//! - Build per-field contexts for one record (`field_context`).
//! - Render and edit single values through a closed set of cells (`field_cell`, `inline_cell`).
//! - Keep client-side record snapshots (`store`) and funnel edits to the backend (`update`).
//! - Compose show-page layouts from metadata classification (`show`).
//!
//! # Invariants
//! - At most one edit session is open per `(record id, field id)` scope.
//! - Every confirmed edit produces exactly one single-field patch.

pub mod field_cell;
pub mod field_context;
pub mod identifier;
pub mod inline_cell;
pub mod show;
pub mod store;
pub mod update;
