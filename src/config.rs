use std::{fs, net::SocketAddr, path::Path, path::PathBuf};

use clap::{Parser, ValueEnum};

pub static SERVICE_ACCOUNT_NAMESPACE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";
pub static DEFAULT_NAMESPACE: &str = "default";

/// What to do with a provisioner secret that carries no `kubeconfig` entry
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingKubeconfigPolicy {
    /// Register the cluster with an empty name
    #[default]
    Proceed,
    /// Drop the event
    Abort,
}

/// Command line and environment arguments
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Registers provisioned cluster credentials with Argo CD")]
pub struct Args {
    /// Path to the kubeconfig used to reach the cluster API
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace this process runs in, inferred when unset
    #[arg(long, env = "POD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Namespace receiving the cluster registration secrets
    #[arg(long, env = "TARGET_NAMESPACE", default_value = "argocd")]
    pub target_namespace: String,

    /// Owner kind marking secrets produced by the cluster provisioner
    #[arg(long, env = "PROVISIONER_KIND", default_value = "GKECluster")]
    pub provisioner_kind: String,

    #[arg(long, env = "MISSING_KUBECONFIG", value_enum, default_value_t)]
    pub missing_kubeconfig: MissingKubeconfigPolicy,

    /// Create registration secrets instead of only logging them
    #[arg(long, env = "WRITE_RECORDS")]
    pub write_records: bool,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,
}

/// Settings resolved once at startup and shared by the watcher and handler
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub kubeconfig: Option<PathBuf>,
    pub namespace: String,
    pub target_namespace: String,
    pub provisioner_kind: String,
    pub missing_kubeconfig: MissingKubeconfigPolicy,
    pub write_records: bool,
    pub bind: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: DEFAULT_NAMESPACE.into(),
            target_namespace: "argocd".into(),
            provisioner_kind: "GKECluster".into(),
            missing_kubeconfig: Default::default(),
            write_records: false,
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            namespace: resolve_namespace(args.namespace, Path::new(SERVICE_ACCOUNT_NAMESPACE)),
            kubeconfig: args.kubeconfig.filter(|p| !p.as_os_str().is_empty()),
            target_namespace: args.target_namespace,
            provisioner_kind: args.provisioner_kind,
            missing_kubeconfig: args.missing_kubeconfig,
            write_records: args.write_records,
            bind: args.bind,
        }
    }
}

/// Local namespace: explicit override, then the mounted service account
/// namespace, then `default`.
pub fn resolve_namespace(namespace: Option<String>, service_account: &Path) -> String {
    if let Some(ns) = namespace {
        return ns;
    }

    fs::read_to_string(service_account)
        .ok()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}
