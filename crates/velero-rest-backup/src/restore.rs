//! Restore requests
//!
//! A restore is named after its backup plus the UTC time it was requested,
//! so repeated restores of one backup do not collide.

use chrono::{DateTime, Utc};
use tracing::info;

use velero_rest_common::Error;

use crate::client::ClusterClient;
use crate::validation::validate_object_name;
use crate::velero::{Restore, RestoreSpec, BACKUP_RESOURCE, RESTORE_RESOURCE};

/// Timestamp suffix appended to restore names
pub const RESTORE_NAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Restore name for `backup_name` requested at `at`
pub fn restore_name(backup_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", backup_name, at.format(RESTORE_NAME_TIME_FORMAT))
}

/// Get a Restore by name. A missing restore is [`Error::NotFound`].
pub async fn get_restore(
    client: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<Restore, Error> {
    client
        .get_restore(namespace, name)
        .await?
        .ok_or_else(|| Error::not_found(RESTORE_RESOURCE, name))
}

/// A request to restore everything in a backup
#[derive(Clone, Debug, PartialEq)]
pub struct CreateRestoreRequest {
    backup_name: String,
    restore_name: String,
}

impl CreateRestoreRequest {
    /// Restore `backup_name`, naming the restore after the current time
    pub fn new(backup_name: impl Into<String>) -> Self {
        Self::at(backup_name, Utc::now())
    }

    /// Restore `backup_name`, naming the restore after `at`
    pub fn at(backup_name: impl Into<String>, at: DateTime<Utc>) -> Self {
        let backup_name = backup_name.into();
        let restore_name = restore_name(&backup_name, at);
        Self {
            backup_name,
            restore_name,
        }
    }

    /// Name the restore will be created under
    pub fn restore_name(&self) -> &str {
        &self.restore_name
    }

    /// Check the derived name and that the backup exists.
    pub async fn validate(
        self,
        client: &dyn ClusterClient,
        velero_namespace: &str,
    ) -> Result<ValidatedRestore, Error> {
        validate_object_name("restore", &self.restore_name)?;
        if client
            .get_backup(velero_namespace, &self.backup_name)
            .await?
            .is_none()
        {
            return Err(Error::validation(format!(
                "error getting backup: {}",
                Error::not_found(BACKUP_RESOURCE, &self.backup_name)
            )));
        }

        Ok(ValidatedRestore {
            request: self,
            velero_namespace: velero_namespace.to_string(),
        })
    }
}

/// A restore request that passed validation
#[derive(Clone, Debug)]
pub struct ValidatedRestore {
    request: CreateRestoreRequest,
    velero_namespace: String,
}

impl ValidatedRestore {
    /// The Restore object this command will create
    pub fn build(&self) -> Restore {
        let mut restore = Restore::new(
            &self.request.restore_name,
            RestoreSpec {
                backup_name: self.request.backup_name.clone(),
                ..Default::default()
            },
        );
        restore.metadata.namespace = Some(self.velero_namespace.clone());
        restore
    }

    /// Create the Restore
    pub async fn execute(self, client: &dyn ClusterClient) -> Result<Restore, Error> {
        let restore = self.build();
        client.create_restore(&self.velero_namespace, &restore).await
    }
}

/// Validate and submit a restore
pub async fn create_restore(
    client: &dyn ClusterClient,
    velero_namespace: &str,
    request: CreateRestoreRequest,
) -> Result<Restore, Error> {
    info!(
        backup = %request.backup_name,
        restore = %request.restore_name,
        "Creating restore"
    );
    request
        .validate(client, velero_namespace)
        .await?
        .execute(client)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kube::ResourceExt;

    use crate::client::MockClusterClient;
    use crate::velero::{Backup, BackupSpec};

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 4, 5, 6).unwrap()
    }

    #[test]
    fn restore_name_uses_utc_timestamp() {
        assert_eq!(restore_name("nightly", fixed_time()), "nightly-20240309040506");

        let request = CreateRestoreRequest::at("nightly", fixed_time());
        assert_eq!(request.restore_name(), "nightly-20240309040506");
    }

    #[tokio::test]
    async fn missing_backup_fails_validation() {
        let mut mock = MockClusterClient::new();
        mock.expect_get_backup().returning(|_, _| Ok(None));
        mock.expect_create_restore().never();

        let err = create_restore(&mock, "velero", CreateRestoreRequest::at("nightly", fixed_time()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("backups.velero.io \"nightly\" not found"));
    }

    #[tokio::test]
    async fn creates_restore_for_existing_backup() {
        let mut mock = MockClusterClient::new();
        mock.expect_get_backup()
            .withf(|ns, name| ns == "velero" && name == "nightly")
            .returning(|_, name| Ok(Some(Backup::new(name, BackupSpec::default()))));
        mock.expect_create_restore()
            .times(1)
            .withf(|ns, r| {
                ns == "velero"
                    && r.name_any() == "nightly-20240309040506"
                    && r.spec.backup_name == "nightly"
            })
            .returning(|_, r| Ok(r.clone()));

        let restore =
            create_restore(&mock, "velero", CreateRestoreRequest::at("nightly", fixed_time()))
                .await
                .unwrap();
        assert_eq!(restore.namespace().as_deref(), Some("velero"));
    }

    #[tokio::test]
    async fn get_missing_restore_is_not_found() {
        let mut mock = MockClusterClient::new();
        mock.expect_get_restore().returning(|_, _| Ok(None));

        let err = get_restore(&mock, "velero", "nightly-1").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "restores.velero.io \"nightly-1\" not found");
    }
}
