//! Core domain logic for the CRM record engine.
//! Metadata-driven record rendering, inline editing, tenancy/auth and
//! spreadsheet import live here; UI shells only consume these APIs.

pub mod auth;
pub mod config;
pub mod db;
pub mod file;
pub mod import;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod record;
pub mod repo;

pub use auth::{
    AuthError, AuthException, AuthExceptionCode, AuthResult, SignInUpInput, SignInUpService,
};
pub use config::{ConfigError, EnvironmentConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use file::{FileError, FileFolder, FileStorage, FileUploadService, LocalFileStorage};
pub use import::{ImportWizard, SpreadsheetImportOptions, StepError, Workbook};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use metadata::classify::{classify_fields, classify_object_fields, FieldClassification};
pub use metadata::registry::{MetadataError, MetadataRegistry};
pub use model::field_metadata::{
    FieldMetadataItem, FieldMetadataType, ObjectMetadataItem, RelationMetadata, RelationType,
};
pub use model::record::{Record, RecordId, RecordPatch};
pub use model::workspace::{User, Workspace, WorkspaceActivationStatus, WorkspaceMember};
pub use record::field_context::{
    FieldContext, FieldContextResolver, RecordUpdateHook, RecordUpdateHookParams,
};
pub use record::show::{RecordShowComposer, RecordShowLayout};
pub use record::store::RecordStore;
pub use record::update::{RecordBackendError, RecordMutationBackend, UpdateDispatcher};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
