//! In-memory cluster used by the router tests

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use k8s_openapi::api::core::v1::{Pod, PodSpec, Volume};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;
use tower::ServiceExt;

use velero_rest_api::{build_router, AppConfig, AppState};
use velero_rest_backup::velero::{
    Backup, BackupSpec, DeleteBackupRequest, PodVolumeBackup, Restore,
};
use velero_rest_backup::{ClientProvider, ClusterClient, StaticClientProvider};
use velero_rest_common::retry::RetryConfig;
use velero_rest_common::Error;

#[derive(Default)]
struct FakeState {
    backups: BTreeMap<String, Backup>,
    restores: BTreeMap<String, Restore>,
    pod_volume_backups: Vec<PodVolumeBackup>,
    delete_requests: Vec<DeleteBackupRequest>,
    storage_locations: BTreeSet<String>,
    pods: BTreeMap<(String, String), Pod>,
    fail_pod_volume_listing: bool,
    next_uid: u64,
}

/// Velero objects and Pods held in memory
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

impl FakeCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_backup(&self, name: &str, namespace: &str) {
        let mut backup = Backup::new(
            name,
            BackupSpec {
                included_namespaces: vec![namespace.to_string()],
                ..Default::default()
            },
        );
        let mut state = self.state.lock().unwrap();
        state.next_uid += 1;
        backup.metadata.namespace = Some("velero".to_string());
        backup.metadata.uid = Some(format!("uid-{}", state.next_uid));
        state.backups.insert(name.to_string(), backup);
    }

    pub fn add_storage_location(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .storage_locations
            .insert(name.to_string());
    }

    pub fn add_pod(&self, namespace: &str, name: &str, volumes: &[&str]) {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: Some("1".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                volumes: Some(
                    volumes
                        .iter()
                        .map(|v| Volume {
                            name: v.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .pods
            .insert((namespace.to_string(), name.to_string()), pod);
    }

    pub fn fail_pod_volume_listing(&self) {
        self.state.lock().unwrap().fail_pod_volume_listing = true;
    }

    pub fn pod_annotation(&self, namespace: &str, name: &str, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .and_then(|p| p.metadata.annotations.as_ref())
            .and_then(|a| a.get(key).cloned())
    }

    pub fn backup(&self, name: &str) -> Option<Backup> {
        self.state.lock().unwrap().backups.get(name).cloned()
    }

    pub fn restores(&self) -> Vec<Restore> {
        self.state.lock().unwrap().restores.values().cloned().collect()
    }

    pub fn delete_requests(&self) -> Vec<DeleteBackupRequest> {
        self.state.lock().unwrap().delete_requests.clone()
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_backups(&self, _namespace: &str) -> Result<Vec<Backup>, Error> {
        Ok(self.state.lock().unwrap().backups.values().cloned().collect())
    }

    async fn get_backup(&self, _namespace: &str, name: &str) -> Result<Option<Backup>, Error> {
        Ok(self.backup(name))
    }

    async fn create_backup(&self, namespace: &str, backup: &Backup) -> Result<Backup, Error> {
        let name = name_of(&backup.metadata);
        let mut state = self.state.lock().unwrap();
        if state.backups.contains_key(&name) {
            return Err(Error::conflict(format!(
                "backups.velero.io \"{}\" already exists",
                name
            )));
        }
        state.next_uid += 1;
        let mut created = backup.clone();
        created.metadata.namespace = Some(namespace.to_string());
        created.metadata.uid = Some(format!("uid-{}", state.next_uid));
        state.backups.insert(name, created.clone());
        Ok(created)
    }

    async fn list_pod_volume_backups(
        &self,
        _namespace: &str,
        _backup_name: &str,
    ) -> Result<Vec<PodVolumeBackup>, Error> {
        let state = self.state.lock().unwrap();
        if state.fail_pod_volume_listing {
            return Err(Error::internal_with_context(
                "list_pod_volume_backups",
                "the server is currently unable to handle the request",
            ));
        }
        Ok(state.pod_volume_backups.clone())
    }

    async fn create_delete_backup_request(
        &self,
        _namespace: &str,
        request: &DeleteBackupRequest,
    ) -> Result<DeleteBackupRequest, Error> {
        let mut state = self.state.lock().unwrap();
        state.delete_requests.push(request.clone());
        Ok(request.clone())
    }

    async fn get_restore(&self, _namespace: &str, name: &str) -> Result<Option<Restore>, Error> {
        Ok(self.state.lock().unwrap().restores.get(name).cloned())
    }

    async fn create_restore(&self, _namespace: &str, restore: &Restore) -> Result<Restore, Error> {
        let mut state = self.state.lock().unwrap();
        state
            .restores
            .insert(name_of(&restore.metadata), restore.clone());
        Ok(restore.clone())
    }

    async fn backup_storage_location_exists(
        &self,
        _namespace: &str,
        name: &str,
    ) -> Result<bool, Error> {
        Ok(self.state.lock().unwrap().storage_locations.contains(name))
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error> {
        let key = (namespace.to_string(), name_of(&pod.metadata));
        let mut state = self.state.lock().unwrap();
        let stored = state
            .pods
            .get_mut(&key)
            .ok_or_else(|| Error::not_found("pods", &key.1))?;
        if stored.metadata.resource_version != pod.metadata.resource_version {
            return Err(Error::conflict("the object has been modified"));
        }

        let version: u64 = stored
            .metadata
            .resource_version
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let mut updated = pod.clone();
        updated.metadata.resource_version = Some((version + 1).to_string());
        *stored = updated.clone();
        Ok(updated)
    }
}

/// Provider that can never build a client
pub struct UnavailableProvider;

#[async_trait]
impl ClientProvider for UnavailableProvider {
    async fn client(&self) -> Result<Arc<dyn ClusterClient>, Error> {
        Err(Error::client_unavailable(
            "failed to load kubeconfig: no such file",
        ))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        retry: RetryConfig::with_max_attempts(2),
        ..Default::default()
    }
}

pub fn router_for(cluster: Arc<FakeCluster>) -> Router {
    router_with(cluster, test_config())
}

pub fn router_with(cluster: Arc<FakeCluster>, config: AppConfig) -> Router {
    let provider = StaticClientProvider::new(cluster);
    build_router(AppState::new(config, Arc::new(provider)))
}

pub fn router_with_provider(provider: Arc<dyn ClientProvider>) -> Router {
    build_router(AppState::new(test_config(), provider))
}

/// Send a request and decode the JSON reply
pub async fn send(
    router: Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    send_with_headers(router, method, uri, body, &[]).await
}

pub async fn send_with_headers(
    router: Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
