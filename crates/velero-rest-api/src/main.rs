//! velero-rest - HTTP facade over Velero backup and restore

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use velero_rest_api::{start_server, AppConfig, AppState, ServerConfig};
use velero_rest_backup::KubeClientProvider;
use velero_rest_common::config::{load_velero_config, resolve_namespace};
use velero_rest_common::retry::RetryConfig;
use velero_rest_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};

/// velero-rest - drive Velero backups and restores over HTTP
#[derive(Parser, Debug)]
#[command(name = "velero-rest", version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "VELERO_REST_LISTEN", default_value = "0.0.0.0:2020")]
    listen: SocketAddr,

    /// Path to a single kubeconfig file. Without it the config is inferred from
    /// `KUBECONFIG`, `~/.kube/config`, then the in-cluster service account.
    #[arg(long, env = "VELERO_REST_KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Path to the Velero client config (defaults to ~/.config/velero/config.json)
    #[arg(long, env = "VELERO_CONFIG")]
    velero_config: Option<PathBuf>,

    /// Namespace Velero runs in (overrides the Velero client config)
    #[arg(long, env = "VELERO_NAMESPACE")]
    namespace: Option<String>,

    /// Bearer token required on /k8s routes
    #[arg(long, env = "VELERO_REST_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Log format: text or json
    #[arg(long, env = "VELERO_REST_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig {
        format: cli.log_format,
        ..Default::default()
    };
    init_telemetry(&telemetry)?;

    let velero_config = load_velero_config(cli.velero_config.as_deref());
    let velero_namespace = resolve_namespace(cli.namespace.as_deref(), &velero_config);

    let kubeconfig = cli.kubeconfig;

    info!(
        service = %telemetry.service_name,
        namespace = %velero_namespace,
        kubeconfig = ?kubeconfig,
        features = ?velero_config.features(),
        auth = cli.auth_token.is_some(),
        "Starting"
    );

    let config = AppConfig {
        velero_namespace,
        auth_token: cli.auth_token.filter(|t| !t.is_empty()),
        retry: RetryConfig::default(),
    };
    let state = AppState::new(config, Arc::new(KubeClientProvider::new(kubeconfig)));

    start_server(ServerConfig { addr: cli.listen }, state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn kubeconfig_env_leaves_kube_search_path_alone() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id().as_str() == "kubeconfig")
            .unwrap();
        assert_eq!(arg.get_env(), Some(OsStr::new("VELERO_REST_KUBECONFIG")));
    }

    #[test]
    fn kubeconfig_flag_is_a_single_path() {
        let cli =
            Cli::try_parse_from(["velero-rest", "--kubeconfig", "/etc/kube/a.yaml"]).unwrap();
        assert_eq!(cli.kubeconfig, Some(PathBuf::from("/etc/kube/a.yaml")));
    }
}
