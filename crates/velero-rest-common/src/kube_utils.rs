//! Kubernetes client helpers

use std::path::Path;
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Client, Config};
use sha2::{Digest, Sha256};

use crate::Error;

// =============================================================================
// HasApiResource Trait
// =============================================================================

/// Trait for types that have a known API group, version, and kind.
///
/// Used for Velero resources we only touch as `DynamicObject`s.
///
/// # Example
/// ```ignore
/// impl HasApiResource for BackupStorageLocation {
///     const API_VERSION: &'static str = "velero.io/v1";
///     const KIND: &'static str = "BackupStorageLocation";
/// }
///
/// let ar = BackupStorageLocation::api_resource();
/// ```
pub trait HasApiResource {
    /// Full API version (e.g., "velero.io/v1", "v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "BackupStorageLocation")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants.
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from an apiVersion string and kind
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    let gvk = GroupVersionKind::gvk(&group, &version, kind);
    ApiResource::from_gvk(&gvk)
}

/// Split "group/version" into its parts; core resources have an empty group
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

// =============================================================================
// Client construction
// =============================================================================

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a kube client from optional kubeconfig path with default timeouts
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client, Error> {
    create_client_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Create a kube client from optional kubeconfig path with custom timeouts
///
/// Without a path the configuration is inferred (`KUBECONFIG`, then in-cluster).
/// Any failure is reported as [`Error::ClientUnavailable`].
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::client_unavailable(format!(
                    "failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::client_unavailable(format!("failed to load kubeconfig: {}", e))
                })?
        }
        None => Config::infer()
            .await
            .map_err(|e| Error::client_unavailable(format!("failed to infer config: {}", e)))?,
    };

    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Client::try_from(config)
        .map_err(|e| Error::client_unavailable(format!("failed to create client: {}", e)))
}

// =============================================================================
// Labels
// =============================================================================

/// Longest value Kubernetes accepts for a label
pub const MAX_LABEL_VALUE_LEN: usize = 63;

const LABEL_HASH_LEN: usize = 6;

/// Turn an object name into a valid label value.
///
/// Names that fit are returned unchanged. Longer names are cut short and
/// suffixed with the start of their SHA-256 so distinct names stay distinct.
/// This matches how Velero labels objects with their owning backup name.
pub fn label_safe_name(name: &str) -> String {
    if name.len() <= MAX_LABEL_VALUE_LEN {
        return name.to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let hex = digest.iter().fold(String::with_capacity(64), |mut s, b| {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
        s
    });

    let keep = MAX_LABEL_VALUE_LEN - LABEL_HASH_LEN;
    // Object names are DNS subdomains, so byte slicing stays on char boundaries.
    format!("{}{}", &name[..keep], &hex[..LABEL_HASH_LEN])
}
