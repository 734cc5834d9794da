//! Cluster client adapter
//!
//! Trait-based access to the Velero API group and to Pods, so the translators
//! and the annotation step can be tested without a cluster.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DynamicObject, ListParams, PostParams};
use kube::{Client, ResourceExt};
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use velero_rest_common::kube_utils::{create_client, label_safe_name, HasApiResource};
use velero_rest_common::{Error, LABEL_BACKUP_NAME};

use crate::velero::{Backup, BackupStorageLocation, DeleteBackupRequest, PodVolumeBackup, Restore};

/// Operations the facade performs against the cluster.
///
/// Lookups return `Ok(None)` for missing objects; every other API failure is
/// returned as an error carrying the server's message.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List Backups in a namespace
    async fn list_backups(&self, namespace: &str) -> Result<Vec<Backup>, Error>;

    /// Get a Backup by name
    async fn get_backup(&self, namespace: &str, name: &str) -> Result<Option<Backup>, Error>;

    /// Create a Backup
    async fn create_backup(&self, namespace: &str, backup: &Backup) -> Result<Backup, Error>;

    /// List the PodVolumeBackups that belong to a backup
    async fn list_pod_volume_backups(
        &self,
        namespace: &str,
        backup_name: &str,
    ) -> Result<Vec<PodVolumeBackup>, Error>;

    /// Create a DeleteBackupRequest
    async fn create_delete_backup_request(
        &self,
        namespace: &str,
        request: &DeleteBackupRequest,
    ) -> Result<DeleteBackupRequest, Error>;

    /// Get a Restore by name
    async fn get_restore(&self, namespace: &str, name: &str) -> Result<Option<Restore>, Error>;

    /// Create a Restore
    async fn create_restore(&self, namespace: &str, restore: &Restore) -> Result<Restore, Error>;

    /// Check whether a BackupStorageLocation exists
    async fn backup_storage_location_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, Error>;

    /// List Pods in a namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, Error>;

    /// Get a Pod by name
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, Error>;

    /// Replace a Pod. The Pod's resourceVersion makes this a conditional
    /// write; a stale version fails with [`Error::Conflict`].
    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error>;
}

/// Real cluster client backed by kube-rs
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Create a new KubeClusterClient
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn backups(&self, namespace: &str) -> Api<Backup> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_backups(&self, namespace: &str) -> Result<Vec<Backup>, Error> {
        let list = self
            .backups(namespace)
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube)?;
        Ok(list.items)
    }

    async fn get_backup(&self, namespace: &str, name: &str) -> Result<Option<Backup>, Error> {
        self.backups(namespace)
            .get_opt(name)
            .await
            .map_err(Error::from_kube)
    }

    async fn create_backup(&self, namespace: &str, backup: &Backup) -> Result<Backup, Error> {
        let created = self
            .backups(namespace)
            .create(&PostParams::default(), backup)
            .await
            .map_err(Error::from_kube)?;
        info!(backup = %created.name_any(), namespace = %namespace, "Created Velero Backup");
        Ok(created)
    }

    async fn list_pod_volume_backups(
        &self,
        namespace: &str,
        backup_name: &str,
    ) -> Result<Vec<PodVolumeBackup>, Error> {
        let api: Api<PodVolumeBackup> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("{}={}", LABEL_BACKUP_NAME, label_safe_name(backup_name));
        let list = api
            .list(&ListParams::default().labels(&selector))
            .await
            .map_err(Error::from_kube)?;
        Ok(list.items)
    }

    async fn create_delete_backup_request(
        &self,
        namespace: &str,
        request: &DeleteBackupRequest,
    ) -> Result<DeleteBackupRequest, Error> {
        let api: Api<DeleteBackupRequest> = Api::namespaced(self.client.clone(), namespace);
        let created = api
            .create(&PostParams::default(), request)
            .await
            .map_err(Error::from_kube)?;
        info!(
            request = %created.name_any(),
            backup = %created.spec.backup_name,
            "Created DeleteBackupRequest"
        );
        Ok(created)
    }

    async fn get_restore(&self, namespace: &str, name: &str) -> Result<Option<Restore>, Error> {
        let api: Api<Restore> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(Error::from_kube)
    }

    async fn create_restore(&self, namespace: &str, restore: &Restore) -> Result<Restore, Error> {
        let api: Api<Restore> = Api::namespaced(self.client.clone(), namespace);
        let created = api
            .create(&PostParams::default(), restore)
            .await
            .map_err(Error::from_kube)?;
        info!(restore = %created.name_any(), backup = %created.spec.backup_name, "Created Velero Restore");
        Ok(created)
    }

    async fn backup_storage_location_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<bool, Error> {
        let ar = BackupStorageLocation::api_resource();
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);
        let found = api.get_opt(name).await.map_err(Error::from_kube)?;
        Ok(found.is_some())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, Error> {
        let list = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube)?;
        Ok(list.items)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, Error> {
        self.pods(namespace)
            .get_opt(name)
            .await
            .map_err(Error::from_kube)
    }

    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error> {
        let name = pod.name_any();
        debug!(pod = %name, namespace = %namespace, "Replacing Pod");
        self.pods(namespace)
            .replace(&name, &PostParams::default(), pod)
            .await
            .map_err(Error::from_kube)
    }
}

// =============================================================================
// Client provider
// =============================================================================

/// Hands out a cluster client to request handlers.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Get a ready client, or [`Error::ClientUnavailable`]
    async fn client(&self) -> Result<Arc<dyn ClusterClient>, Error>;
}

/// Builds the kube client on first use and reuses it afterwards.
///
/// A failed build is not remembered, so the next request tries again.
pub struct KubeClientProvider {
    kubeconfig: Option<PathBuf>,
    client: OnceCell<Arc<KubeClusterClient>>,
}

impl KubeClientProvider {
    /// Create a provider for the given kubeconfig (`None` infers the config)
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubeconfig,
            client: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ClientProvider for KubeClientProvider {
    async fn client(&self) -> Result<Arc<dyn ClusterClient>, Error> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client = create_client(self.kubeconfig.as_deref()).await?;
                debug!(kubeconfig = ?self.kubeconfig, "Kubernetes client ready");
                Ok::<_, Error>(Arc::new(KubeClusterClient::new(client)))
            })
            .await?;
        Ok(client.clone())
    }
}

/// Provider that always returns the same client
pub struct StaticClientProvider {
    client: Arc<dyn ClusterClient>,
}

impl StaticClientProvider {
    /// Wrap an existing client
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClientProvider for StaticClientProvider {
    async fn client(&self) -> Result<Arc<dyn ClusterClient>, Error> {
        Ok(self.client.clone())
    }
}
