use k8s_openapi::{api::core::v1::Secret, ByteString};
use kube::api::ObjectMeta;

use crate::api::argocd_cluster::{
    self, AuthConfig, ClusterConfig, TlsClientConfig, CONFIG_KEY, NAME_KEY, SERVER_KEY,
};
use crate::config::Config;

use super::extract::ExtractedCredentials;
use super::RecordResult;

/// Prefix of the cluster name shown by Argo CD.
///
/// Provisioner contexts are plain cluster names; whether Argo CD expects the
/// `gke_<project>_<region>_<name>` form instead is unconfirmed, so the literal
/// prefix is kept.
pub static EXTERNAL_NAME_PREFIX: &str = "gke-";

impl From<&ExtractedCredentials> for ClusterConfig {
    fn from(creds: &ExtractedCredentials) -> Self {
        Self {
            bearer_token: Default::default(),
            tls_client_config: TlsClientConfig {
                insecure: creds.insecure,
                ca_data: creds.ca_data.clone(),
            },
            auth_config: AuthConfig {
                cluster_name: creds.cluster_name.clone(),
            },
        }
    }
}

/// Cluster identifier registered with Argo CD. No naming validation is applied.
pub fn external_name(cluster_name: &str) -> String {
    format!("{EXTERNAL_NAME_PREFIX}{cluster_name}")
}

/// Name of the registration secret: `<local namespace>-<cluster name>`
pub fn record_name(config: &Config, cluster_name: &str) -> String {
    format!("{}-{cluster_name}", config.namespace)
}

/// Assemble the Argo CD cluster secret for the extracted credentials
pub fn build(creds: &ExtractedCredentials, config: &Config) -> RecordResult<Secret> {
    let cluster_config = serde_json::to_vec(&ClusterConfig::from(creds))?;

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(record_name(config, &creds.cluster_name)),
            namespace: Some(config.target_namespace.clone()),
            labels: Some(argocd_cluster::labels()),
            annotations: Some(argocd_cluster::annotations()),
            ..Default::default()
        },
        data: Some(
            [
                (CONFIG_KEY.to_string(), ByteString(cluster_config)),
                (
                    NAME_KEY.to_string(),
                    ByteString(external_name(&creds.cluster_name).into_bytes()),
                ),
                (
                    SERVER_KEY.to_string(),
                    ByteString(creds.server.clone()),
                ),
            ]
            .into(),
        ),
        type_: Some("Opaque".into()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data<'a>(secret: &'a Secret, key: &str) -> &'a [u8] {
        &secret.data.as_ref().unwrap()[key].0
    }

    #[test]
    fn external_name_is_prefixed() {
        assert_eq!(external_name("my-cluster"), "gke-my-cluster");
        assert_eq!(external_name(""), "gke-");
    }

    #[test]
    fn builds_registration_secret() {
        let config = Config {
            namespace: "team-a".into(),
            ..Default::default()
        };
        let creds = ExtractedCredentials {
            cluster_name: "prod".into(),
            ca_data: "qrs=".into(),
            insecure: false,
            server: b"https://10.0.0.1".to_vec(),
        };

        let secret = build(&creds, &config).unwrap();

        assert_eq!(secret.metadata.name.as_deref(), Some("team-a-prod"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("argocd"));
        assert_eq!(
            secret.metadata.labels.as_ref().unwrap()["argocd.argoproj.io/secret-type"],
            "cluster"
        );
        assert_eq!(
            secret.metadata.annotations.as_ref().unwrap()["managed-by"],
            "argocd.argoproj.io"
        );
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        assert_eq!(data(&secret, "name"), b"gke-prod");
        assert_eq!(data(&secret, "server"), b"https://10.0.0.1");

        let cluster_config: ClusterConfig =
            serde_json::from_slice(data(&secret, "config")).unwrap();
        assert_eq!(cluster_config, ClusterConfig::from(&creds));
    }

    #[test]
    fn server_is_stored_raw() {
        let creds = ExtractedCredentials {
            server: vec![0xFF, 0xFE],
            ..Default::default()
        };

        let secret = build(&creds, &Config::default()).unwrap();

        assert_eq!(data(&secret, "server"), [0xFF, 0xFE]);
    }

    #[test]
    fn empty_cluster_name_propagates() {
        let secret = build(&ExtractedCredentials::default(), &Config::default()).unwrap();

        assert_eq!(secret.metadata.name.as_deref(), Some("default-"));
        assert_eq!(data(&secret, "name"), b"gke-");
        assert_eq!(data(&secret, "server"), b"");
    }
}
