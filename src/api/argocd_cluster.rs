use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label Argo CD uses to discover cluster registration secrets
pub static SECRET_TYPE_LABEL: &str = "argocd.argoproj.io/secret-type";
pub static SECRET_TYPE_CLUSTER: &str = "cluster";

pub static MANAGED_BY_ANNOTATION: &str = "managed-by";
pub static MANAGED_BY_ARGOCD: &str = "argocd.argoproj.io";

/// Data keys of a cluster registration secret
pub static CONFIG_KEY: &str = "config";
pub static NAME_KEY: &str = "name";
pub static SERVER_KEY: &str = "server";

/// Cluster connection settings stored under the `config` key of an Argo CD
/// cluster secret.
///
/// Field order is the serialized order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub bearer_token: String,
    pub tls_client_config: TlsClientConfig,
    #[serde(rename = "AuthConfig")]
    pub auth_config: AuthConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsClientConfig {
    pub insecure: bool,
    pub ca_data: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub cluster_name: String,
}

pub fn labels() -> BTreeMap<String, String> {
    [(SECRET_TYPE_LABEL.to_string(), SECRET_TYPE_CLUSTER.to_string())].into()
}

pub fn annotations() -> BTreeMap<String, String> {
    [(MANAGED_BY_ANNOTATION.to_string(), MANAGED_BY_ARGOCD.to_string())].into()
}
