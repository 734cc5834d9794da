//! Velero resource types
//!
//! Typed views of the `velero.io/v1` resources the facade reads and creates.
//! The CRDs belong to Velero, so no schema is generated here and every field the
//! engine may omit is optional. Fields we never touch are dropped on read.

use std::collections::BTreeMap;

use kube::CustomResource;
use serde::{Deserialize, Serialize};

use velero_rest_common::kube_utils::HasApiResource;

/// API version shared by every Velero resource
pub const VELERO_API_VERSION: &str = "velero.io/v1";

/// Resource name used in Backup not-found messages
pub const BACKUP_RESOURCE: &str = "backups.velero.io";

/// Resource name used in Restore not-found messages
pub const RESTORE_RESOURCE: &str = "restores.velero.io";

// =============================================================================
// Backup
// =============================================================================

/// Phase of a Velero Backup, owned by the backup engine
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum BackupPhase {
    /// Not yet processed
    #[default]
    New,
    /// Rejected by the engine's validation
    FailedValidation,
    /// Running
    InProgress,
    /// Items backed up, waiting on async plugin operations
    WaitingForPluginOperations,
    /// Waiting on plugin operations after a partial failure
    WaitingForPluginOperationsPartiallyFailed,
    /// Uploading final metadata
    Finalizing,
    /// Uploading final metadata after a partial failure
    FinalizingPartiallyFailed,
    /// Finished without errors
    Completed,
    /// Finished with some errors
    PartiallyFailed,
    /// Finished unsuccessfully
    Failed,
    /// Being deleted
    Deleting,
    /// A phase this build does not know about
    #[serde(other)]
    Unknown,
}

/// Velero Backup spec
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "velero.io",
    version = "v1",
    kind = "Backup",
    plural = "backups",
    namespaced,
    status = "BackupStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    /// Namespaces to include (empty means all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_namespaces: Vec<String>,
    /// Namespaces to exclude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_namespaces: Vec<String>,
    /// Resources to include (empty means all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_resources: Vec<String>,
    /// Resources to exclude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_resources: Vec<String>,
    /// Whether to take volume snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_volumes: Option<bool>,
    /// Retention as a Go duration (e.g. "720h0m0s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    /// Whether cluster-scoped resources are included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_cluster_resources: Option<bool>,
    /// BackupStorageLocation to write to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    /// VolumeSnapshotLocations to use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_snapshot_locations: Vec<String>,
    /// Back up every pod volume with the file-system uploader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_volumes_to_fs_backup: Option<bool>,
    /// Pre-1.10 name of `default_volumes_to_fs_backup`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_volumes_to_restic: Option<bool>,
}

/// Item counters of a running or finished backup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupProgress {
    /// Items the engine expects to back up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<i64>,
    /// Items backed up so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_backed_up: Option<i64>,
}

/// Velero Backup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    /// Current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<BackupPhase>,
    /// Backup tarball format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    /// When the backup becomes eligible for garbage collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    /// Validation failures reported by the engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    /// Start time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,
    /// Completion time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_timestamp: Option<String>,
    /// Volume snapshots attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshots_attempted: Option<i32>,
    /// Volume snapshots completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshots_completed: Option<i32>,
    /// Warning count
    #[serde(default)]
    pub warnings: i32,
    /// Error count
    #[serde(default)]
    pub errors: i32,
    /// Item counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<BackupProgress>,
}

// =============================================================================
// PodVolumeBackup
// =============================================================================

/// Reference to the Pod a volume was backed up from
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodReference {
    /// Kind (always "Pod")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Pod namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Pod name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pod UID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Velero PodVolumeBackup spec: one per backed-up pod volume
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "velero.io",
    version = "v1",
    kind = "PodVolumeBackup",
    plural = "podvolumebackups",
    namespaced,
    status = "PodVolumeBackupStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PodVolumeBackupSpec {
    /// Node the pod ran on
    #[serde(default)]
    pub node: String,
    /// Pod the volume belongs to
    #[serde(default)]
    pub pod: PodReference,
    /// Volume name within the pod
    #[serde(default)]
    pub volume: String,
    /// BackupStorageLocation the data went to
    #[serde(default)]
    pub backup_storage_location: String,
    /// Repository identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_identifier: Option<String>,
    /// Uploader (restic or kopia)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader_type: Option<String>,
    /// Tags attached to the snapshot
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Byte counters of a pod volume backup
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodVolumeProgress {
    /// Bytes to transfer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<i64>,
    /// Bytes transferred so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_done: Option<i64>,
}

/// Velero PodVolumeBackup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodVolumeBackupStatus {
    /// Current phase (New, InProgress, Completed, Failed, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Path inside the pod that was backed up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Snapshot identifier in the repository
    #[serde(default, rename = "snapshotID", skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Start time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,
    /// Completion time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_timestamp: Option<String>,
    /// Byte counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<PodVolumeProgress>,
}

// =============================================================================
// Restore
// =============================================================================

/// Phase of a Velero Restore
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum RestorePhase {
    /// Not yet processed
    #[default]
    New,
    /// Rejected by the engine's validation
    FailedValidation,
    /// Running
    InProgress,
    /// Items restored, waiting on async plugin operations
    WaitingForPluginOperations,
    /// Waiting on plugin operations after a partial failure
    WaitingForPluginOperationsPartiallyFailed,
    /// Finishing up
    Finalizing,
    /// Finishing up after a partial failure
    FinalizingPartiallyFailed,
    /// Finished without errors
    Completed,
    /// Finished with some errors
    PartiallyFailed,
    /// Finished unsuccessfully
    Failed,
    /// A phase this build does not know about
    #[serde(other)]
    Unknown,
}

/// Velero Restore spec
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "velero.io",
    version = "v1",
    kind = "Restore",
    plural = "restores",
    namespaced,
    status = "RestoreStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSpec {
    /// Name of the Velero Backup to restore from
    #[serde(default)]
    pub backup_name: String,
    /// Included namespaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_namespaces: Vec<String>,
    /// Excluded namespaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_namespaces: Vec<String>,
    /// Included resources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_resources: Vec<String>,
    /// Excluded resources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_resources: Vec<String>,
    /// Source namespace → target namespace
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace_mapping: BTreeMap<String, String>,
    /// Restore PVs
    #[serde(default, rename = "restorePVs", skip_serializing_if = "Option::is_none")]
    pub restore_pvs: Option<bool>,
}

/// Item counters of a running or finished restore
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreProgress {
    /// Items the engine expects to restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<i64>,
    /// Items restored so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_restored: Option<i64>,
}

/// Velero Restore status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStatus {
    /// Current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<RestorePhase>,
    /// Validation failures reported by the engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    /// Warning count
    #[serde(default)]
    pub warnings: i32,
    /// Error count
    #[serde(default)]
    pub errors: i32,
    /// Why the restore failed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Start time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,
    /// Completion time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_timestamp: Option<String>,
    /// Item counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<RestoreProgress>,
}

// =============================================================================
// DeleteBackupRequest
// =============================================================================

/// Velero DeleteBackupRequest spec
///
/// Creating one asks the engine to remove a backup together with its data in
/// object storage and any snapshots.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "velero.io",
    version = "v1",
    kind = "DeleteBackupRequest",
    plural = "deletebackuprequests",
    namespaced,
    status = "DeleteBackupRequestStatus",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBackupRequestSpec {
    /// Backup to delete
    pub backup_name: String,
}

/// Velero DeleteBackupRequest status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBackupRequestStatus {
    /// New, InProgress, or Processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Errors hit while deleting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

// =============================================================================
// BackupStorageLocation
// =============================================================================

/// Velero BackupStorageLocation, only ever checked for existence
pub struct BackupStorageLocation;

impl HasApiResource for BackupStorageLocation {
    const API_VERSION: &'static str = VELERO_API_VERSION;
    const KIND: &'static str = "BackupStorageLocation";
}

// =============================================================================
// List rendering
// =============================================================================

/// Render items as a Kubernetes list object (`{apiVersion, kind, metadata, items}`)
pub fn list_object<T: Serialize>(kind: &str, items: &[T]) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": VELERO_API_VERSION,
        "kind": kind,
        "metadata": {},
        "items": items,
    })
}
