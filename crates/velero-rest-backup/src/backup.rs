//! Backup requests
//!
//! Each write goes through the same typed pipeline: an immutable request is
//! validated into a command, and only a validated command can be executed.
//!
//! ```text
//! CreateBackupRequest ──validate──► ValidatedBackup ──execute──► Backup
//! DeleteBackupCommand ──validate──► ValidatedDelete ──execute──► DeleteBackupRequest
//! ```

use std::collections::BTreeMap;

use kube::api::ObjectMeta;
use kube::ResourceExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use velero_rest_common::kube_utils::label_safe_name;
use velero_rest_common::retry::RetryConfig;
use velero_rest_common::{Error, LABEL_BACKUP_NAME, LABEL_BACKUP_UID, LABEL_STORAGE_LOCATION};

use crate::annotate::{annotate_pod_volumes, VolumeExclusions};
use crate::client::ClusterClient;
use crate::validation::{validate_namespace, validate_object_name, validate_ttl};
use crate::velero::{
    list_object, Backup, BackupSpec, DeleteBackupRequest, DeleteBackupRequestSpec,
    PodVolumeBackup, BACKUP_RESOURCE,
};

/// Reply sent once a backup has been accepted
pub const CREATE_BACKUP_MESSAGE: &str = "create backup done, query for progress.";

/// Reply sent once a backup deletion has been requested
pub const DELETE_BACKUP_MESSAGE: &str = "delete backup done, query for progress.";

// =============================================================================
// Reads
// =============================================================================

/// List backups, rendering a single result as the object itself.
pub async fn list_backups(client: &dyn ClusterClient, namespace: &str) -> Result<Value, Error> {
    let backups = client.list_backups(namespace).await?;
    debug!(namespace = %namespace, count = backups.len(), "Listed backups");
    render_backup_list(backups)
}

/// Render a backup list; one item is unwrapped to that item.
pub fn render_backup_list(mut backups: Vec<Backup>) -> Result<Value, Error> {
    if backups.len() == 1 {
        if let Some(only) = backups.pop() {
            return Ok(serde_json::to_value(only)?);
        }
    }
    Ok(list_object("BackupList", &backups))
}

/// A backup together with its pod volume backups
#[derive(Clone, Debug)]
pub struct BackupDetail {
    /// The backup object
    pub backup: Backup,
    /// Pod volume backups, `None` when they could not be listed
    pub pod_volume_backups: Option<Vec<PodVolumeBackup>>,
}

impl BackupDetail {
    /// Pod volume backups as a list object, or `null` when unavailable
    pub fn pod_volume_json(&self) -> Value {
        match &self.pod_volume_backups {
            Some(items) => list_object("PodVolumeBackupList", items),
            None => Value::Null,
        }
    }
}

/// Fetch a backup and its pod volume backups.
///
/// A missing backup is [`Error::NotFound`]. Failing to list pod volume backups
/// is logged and does not fail the lookup.
pub async fn get_backup(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<BackupDetail, Error> {
    let backup = client
        .get_backup(namespace, name)
        .await?
        .ok_or_else(|| Error::not_found(BACKUP_RESOURCE, name))?;

    let pod_volume_backups = match client.list_pod_volume_backups(namespace, name).await {
        Ok(items) => Some(items),
        Err(e) => {
            warn!(backup = %name, error = %e, "error getting PodVolumeBackups for backup");
            None
        }
    };

    Ok(BackupDetail {
        backup,
        pod_volume_backups,
    })
}

// =============================================================================
// Create
// =============================================================================

/// A request to back up one namespace
#[derive(Clone, Debug, PartialEq)]
pub struct CreateBackupRequest {
    name: String,
    namespace: String,
    storage_location: Option<String>,
    ttl: Option<String>,
}

impl CreateBackupRequest {
    /// Build a request for `name` covering `namespace`
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            storage_location: None,
            ttl: None,
        }
    }

    /// Write the backup to a specific BackupStorageLocation
    pub fn with_storage_location(mut self, location: impl Into<String>) -> Self {
        self.storage_location = Some(location.into());
        self
    }

    /// Keep the backup for `ttl` (Go duration)
    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Parse a JSON body of string values: `namespace` (required),
    /// `storageLocation` and `ttl` (optional). Other keys are ignored.
    pub fn from_body(name: impl Into<String>, body: &[u8]) -> Result<Self, Error> {
        let fields: BTreeMap<String, String> = serde_json::from_slice(body)
            .map_err(|e| Error::malformed(format!("convert json to map failed: {}", e)))?;

        let namespace = fields
            .get("namespace")
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| Error::malformed("request body must include a \"namespace\" value"))?;

        let mut request = Self::new(name, namespace.as_str());
        if let Some(location) = fields.get("storageLocation").filter(|l| !l.is_empty()) {
            request = request.with_storage_location(location.as_str());
        }
        if let Some(ttl) = fields.get("ttl").filter(|t| !t.is_empty()) {
            request = request.with_ttl(ttl.as_str());
        }
        Ok(request)
    }

    /// Backup name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace to back up
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Check the request locally and against the cluster.
    pub async fn validate(
        self,
        client: &dyn ClusterClient,
        velero_namespace: &str,
    ) -> Result<ValidatedBackup, Error> {
        validate_object_name("backup", &self.name)?;
        validate_namespace(&self.namespace)?;
        if let Some(ttl) = &self.ttl {
            validate_ttl(ttl)?;
        }
        if let Some(location) = &self.storage_location {
            if !client
                .backup_storage_location_exists(velero_namespace, location)
                .await?
            {
                return Err(Error::validation(format!(
                    "error getting storage location: backupstoragelocations.velero.io \"{}\" not found",
                    location
                )));
            }
        }

        Ok(ValidatedBackup {
            request: self,
            velero_namespace: velero_namespace.to_string(),
        })
    }
}

/// A backup request that passed validation
#[derive(Clone, Debug)]
pub struct ValidatedBackup {
    request: CreateBackupRequest,
    velero_namespace: String,
}

impl ValidatedBackup {
    /// Namespace the backup covers
    pub fn namespace(&self) -> &str {
        self.request.namespace()
    }

    /// The Backup object this command will create
    pub fn build(&self) -> Backup {
        let request = &self.request;
        let mut backup = Backup::new(
            &request.name,
            BackupSpec {
                included_namespaces: vec![request.namespace.clone()],
                storage_location: request.storage_location.clone(),
                ttl: request.ttl.clone(),
                default_volumes_to_fs_backup: Some(true),
                ..Default::default()
            },
        );
        backup.metadata.namespace = Some(self.velero_namespace.clone());
        if let Some(location) = &request.storage_location {
            backup
                .labels_mut()
                .insert(LABEL_STORAGE_LOCATION.to_string(), label_safe_name(location));
        }
        backup
    }

    /// Create the Backup
    pub async fn execute(self, client: &dyn ClusterClient) -> Result<Backup, Error> {
        let backup = self.build();
        client.create_backup(&self.velero_namespace, &backup).await
    }
}

/// Validate the request, annotate the target namespace's pod volumes, then
/// create the backup.
///
/// Every step short-circuits on error, so a rejected request leaves the Pods
/// untouched.
pub async fn create_backup(
    client: &dyn ClusterClient,
    velero_namespace: &str,
    request: CreateBackupRequest,
    retry: &RetryConfig,
) -> Result<Backup, Error> {
    info!(backup = %request.name(), namespace = %request.namespace(), "Creating backup");

    let validated = request.validate(client, velero_namespace).await?;

    annotate_pod_volumes(
        client,
        validated.namespace(),
        &VolumeExclusions::default(),
        retry,
    )
    .await?;

    validated.execute(client).await
}

// =============================================================================
// Delete
// =============================================================================

/// A request to delete a backup. Confirmation is implied.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteBackupCommand {
    name: String,
}

impl DeleteBackupCommand {
    /// Delete the backup called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Resolve the backup; fails with the API's not-found text if it is missing.
    pub async fn validate(
        self,
        client: &dyn ClusterClient,
        velero_namespace: &str,
    ) -> Result<ValidatedDelete, Error> {
        let backup = client
            .get_backup(velero_namespace, &self.name)
            .await?
            .ok_or_else(|| Error::not_found(BACKUP_RESOURCE, &self.name))?;

        Ok(ValidatedDelete {
            backup,
            velero_namespace: velero_namespace.to_string(),
        })
    }
}

/// A delete that resolved to an existing backup
#[derive(Clone, Debug)]
pub struct ValidatedDelete {
    backup: Backup,
    velero_namespace: String,
}

impl ValidatedDelete {
    /// The DeleteBackupRequest this command will create
    pub fn build(&self) -> DeleteBackupRequest {
        let name = self.backup.name_any();
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_BACKUP_NAME.to_string(), label_safe_name(&name));
        if let Some(uid) = self.backup.uid() {
            labels.insert(LABEL_BACKUP_UID.to_string(), uid);
        }

        DeleteBackupRequest {
            metadata: ObjectMeta {
                generate_name: Some(format!("{}-", name)),
                namespace: Some(self.velero_namespace.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: DeleteBackupRequestSpec { backup_name: name },
            status: None,
        }
    }

    /// Ask the engine to delete the backup
    pub async fn execute(self, client: &dyn ClusterClient) -> Result<DeleteBackupRequest, Error> {
        let request = self.build();
        client
            .create_delete_backup_request(&self.velero_namespace, &request)
            .await
    }
}

/// Validate and submit a backup deletion
pub async fn delete_backup(
    client: &dyn ClusterClient,
    velero_namespace: &str,
    command: DeleteBackupCommand,
) -> Result<DeleteBackupRequest, Error> {
    command
        .validate(client, velero_namespace)
        .await?
        .execute(client)
        .await
}
