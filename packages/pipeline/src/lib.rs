//! SFS Tracker Pipeline - Version archive and amendment tracking.
//!
//! Persists snapshots of Swedish statutes in Postgres, records a change event
//! for every substantive change and builds one amendment record per amending
//! law. All writes for a document happen in [`sync::sync_document`], inside a
//! single transaction that holds the document row lock.

pub mod amendments;
pub mod change_detection;
pub mod cli;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod history;
pub mod models;
pub mod sync;
pub mod version_archive;
pub mod version_diff;

pub use config::{PipelineConfig, SyncConfig};
pub use db::{create_pool, run_migrations};
pub use error::{PipelineError, Result};
pub use models::{
    AmendmentRecord, ChangeEvent, ChangeType, DocumentStatus, DocumentVersion, LegalDocument,
};
pub use sync::{sync_document, SyncInput, SyncOutcome};
