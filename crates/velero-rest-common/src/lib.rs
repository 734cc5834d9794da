//! Common types for velero-rest: errors, configuration, and utilities

#![deny(missing_docs)]

pub mod collections;
pub mod config;
pub mod error;
pub mod kube_utils;
pub mod retry;
pub mod telemetry;

pub use collections::{contains_in_mapping, contains_in_sequence};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default port for the REST server
pub const DEFAULT_LISTEN_PORT: u16 = 2020;

/// Namespace Velero is installed into when nothing else is configured
pub const DEFAULT_VELERO_NAMESPACE: &str = "velero";

/// Label Velero puts on objects that belong to a backup
pub const LABEL_BACKUP_NAME: &str = "velero.io/backup-name";

/// Label carrying the UID of the backup an object belongs to
pub const LABEL_BACKUP_UID: &str = "velero.io/backup-uid";

/// Label naming the BackupStorageLocation of a backup
pub const LABEL_STORAGE_LOCATION: &str = "velero.io/storage-location";
