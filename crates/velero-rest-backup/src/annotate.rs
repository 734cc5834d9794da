//! Pod volume annotation
//!
//! Velero only backs up pod volumes with the file-system uploader when they are
//! listed in the `backup.velero.io/backup-volumes` annotation of their Pod. Before
//! a backup is created every Pod in the target namespace is annotated with its
//! eligible volumes.
//!
//! Writes are conditional on the listed resourceVersion. When another writer got
//! there first the Pod is re-read and the annotation recomputed.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use velero_rest_common::retry::{retry_with_backoff, RetryConfig};
use velero_rest_common::{contains_in_mapping, contains_in_sequence, Error};

use crate::client::ClusterClient;

/// Annotation Velero reads to select pod volumes for file-system backup
pub const BACKUP_VOLUMES_ANNOTATION: &str = "backup.velero.io/backup-volumes";

/// Prefix of the legacy service account token volumes, never backed up
pub const SERVICE_ACCOUNT_TOKEN_PREFIX: &str = "default-token";

/// Volumes and Pods to leave out of the annotation
#[derive(Clone, Debug, Default)]
pub struct VolumeExclusions {
    /// Volume names never listed
    pub volumes: Vec<String>,
    /// Pods left untouched
    pub pods: Vec<String>,
}

/// Outcome of one annotation pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationReport {
    /// Pod name → annotation value now on the Pod
    pub annotated: BTreeMap<String, String>,
    /// Pods that were excluded or disappeared mid-pass
    pub skipped: Vec<String>,
}

/// Volume names of `pod` eligible for backup, in spec order
pub fn eligible_volumes(pod: &Pod, excluded_volumes: &[String]) -> Vec<String> {
    pod.spec
        .iter()
        .flat_map(|spec| spec.volumes.iter().flatten())
        .map(|volume| volume.name.as_str())
        .filter(|name| !name.starts_with(SERVICE_ACCOUNT_TOKEN_PREFIX))
        .filter(|name| !contains_in_sequence(*name, excluded_volumes))
        .map(str::to_string)
        .collect()
}

/// Annotation value for `pod`: eligible volumes joined with commas
pub fn backup_volumes_value(pod: &Pod, excluded_volumes: &[String]) -> String {
    eligible_volumes(pod, excluded_volumes).join(",")
}

/// Annotate every Pod in `namespace` with the volumes to back up.
///
/// Existing annotations are preserved. A Pod with no eligible volume gets an
/// empty value. Running this again with the same exclusions writes nothing new.
pub async fn annotate_pod_volumes(
    client: &dyn ClusterClient,
    namespace: &str,
    exclusions: &VolumeExclusions,
    retry: &RetryConfig,
) -> Result<AnnotationReport, Error> {
    let pods = client.list_pods(namespace).await?;
    info!(namespace = %namespace, pods = pods.len(), "Annotating pod volumes for backup");

    let mut report = AnnotationReport::default();
    for pod in pods {
        let name = pod.name_any();
        if contains_in_sequence(name.as_str(), &exclusions.pods) {
            debug!(pod = %name, "Pod excluded from volume annotation");
            report.skipped.push(name);
            continue;
        }

        match annotate_pod(client, namespace, pod, &exclusions.volumes, retry).await? {
            Some(value) => {
                report.annotated.insert(name, value);
            }
            None => {
                warn!(pod = %name, namespace = %namespace, "Pod disappeared before it could be annotated");
                report.skipped.push(name);
            }
        }
    }

    Ok(report)
}

/// Annotate one Pod, re-reading it on conflict. `None` means the Pod is gone.
async fn annotate_pod(
    client: &dyn ClusterClient,
    namespace: &str,
    pod: Pod,
    excluded_volumes: &[String],
    retry: &RetryConfig,
) -> Result<Option<String>, Error> {
    let name = pod.name_any();

    match write_annotation(client, namespace, pod, excluded_volumes).await {
        Err(e) if e.is_conflict() => {
            debug!(pod = %name, error = %e, "Pod changed since listing, re-reading");
            let name = name.as_str();
            retry_with_backoff(retry, "annotate_pod", Error::is_conflict, move || async move {
                match client.get_pod(namespace, name).await? {
                    Some(fresh) => write_annotation(client, namespace, fresh, excluded_volumes)
                        .await
                        .map(Some),
                    None => Ok(None),
                }
            })
            .await
        }
        other => other.map(Some),
    }
}

/// Write the annotation unless the Pod already carries the same value
async fn write_annotation(
    client: &dyn ClusterClient,
    namespace: &str,
    mut pod: Pod,
    excluded_volumes: &[String],
) -> Result<String, Error> {
    let value = backup_volumes_value(&pod, excluded_volumes);

    let current = pod.annotations().get(BACKUP_VOLUMES_ANNOTATION);
    if current == Some(&value) {
        debug!(pod = %pod.name_any(), volumes = %value, "Annotation already up to date");
        return Ok(value);
    }

    let replaced = contains_in_mapping(BACKUP_VOLUMES_ANNOTATION, pod.annotations());
    pod.annotations_mut()
        .insert(BACKUP_VOLUMES_ANNOTATION.to_string(), value.clone());
    client.replace_pod(namespace, &pod).await?;
    debug!(pod = %pod.name_any(), volumes = %value, replaced, "Annotated pod volumes");
    Ok(value)
}
