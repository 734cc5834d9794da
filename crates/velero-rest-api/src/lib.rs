//! Velero REST facade
//!
//! A small HTTP service that lets callers drive Velero without the CLI.
//!
//! # Architecture
//!
//! ```text
//! caller ──HTTP──► router ──► backup / restore translators ──► K8s API (velero.io/v1)
//! ```
//!
//! # Endpoints
//!
//! - `GET /k8s/backup/` - List backups
//! - `GET /k8s/backup/{name}` - Backup plus its pod volume backups
//! - `POST /k8s/backup/{name}` - Annotate pod volumes and create a backup
//! - `DELETE /k8s/backup/{name}` - Request backup deletion
//! - `GET /k8s/restore/{name}` - Get a restore
//! - `POST /k8s/restore/{name}` - Restore from backup `name`
//! - `GET /healthz` - Health check

#![deny(missing_docs)]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ServerError};
pub use server::{build_router, start_server, AppConfig, AppState, ServerConfig};
