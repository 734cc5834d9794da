//! Velero backup and restore operations
//!
//! Translates facade requests into Velero custom resources:
//!
//! - [`backup`]: list, inspect, create and delete backups
//! - [`restore`]: create and inspect restores
//! - [`annotate`]: mark pod volumes for file-system backup before a backup runs
//!
//! All cluster access goes through the [`client::ClusterClient`] trait.

pub mod annotate;
pub mod backup;
pub mod client;
pub mod restore;
pub mod validation;
pub mod velero;

pub use annotate::{annotate_pod_volumes, AnnotationReport, VolumeExclusions};
pub use backup::{
    create_backup, delete_backup, get_backup, list_backups, BackupDetail, CreateBackupRequest,
    DeleteBackupCommand,
};
pub use client::{ClientProvider, ClusterClient, KubeClientProvider, StaticClientProvider};
pub use restore::{create_restore, get_restore, CreateRestoreRequest};
