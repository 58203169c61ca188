use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::{telemetry, Result};

use super::extract::extract;
use super::record::build;
use super::writer::{RecordWriter, Written};

/// Result of handling one created secret
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not owned by the provisioner
    Ignored,
    /// Registration secret stored under the given name
    Registered(String),
    /// Registration secret assembled but not stored
    Assembled(String),
}

impl Outcome {
    pub fn metric_label(&self) -> &'static str {
        match self {
            Outcome::Ignored => "ignored",
            Outcome::Registered(_) => "registered",
            Outcome::Assembled(_) => "assembled",
        }
    }
}

/// First owner reference of the expected provisioner kind
pub fn matching_owner<'a>(secret: &'a Secret, kind: &str) -> Option<&'a OwnerReference> {
    secret.owner_references().iter().find(|o| o.kind == kind)
}

/// Turns provisioner secrets into Argo CD cluster registrations
pub struct SecretHandler {
    config: Arc<Config>,
    writer: Box<dyn RecordWriter>,
}

impl SecretHandler {
    pub fn new(config: Arc<Config>, writer: Box<dyn RecordWriter>) -> Self {
        Self { config, writer }
    }

    #[instrument(skip_all, fields(trace_id = display(telemetry::get_trace_id()), name = secret.name_any(), namespace = secret.namespace()))]
    pub async fn handle(&self, secret: &Secret) -> Result<Outcome> {
        let Some(owner) = matching_owner(secret, &self.config.provisioner_kind) else {
            debug!("Not owned by a provisioner");
            return Ok(Outcome::Ignored);
        };
        info!("Found secret for cluster: {}", owner.name);

        let empty = BTreeMap::new();
        let payload = secret.data.as_ref().unwrap_or(&empty);
        let creds = extract(payload, self.config.missing_kubeconfig)?;
        let record = build(&creds, &self.config)?;
        Ok(match self.writer.create(&record).await? {
            Written::Created(name) => Outcome::Registered(name),
            Written::DryRun(name) => Outcome::Assembled(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::ByteString;
    use kube::api::ObjectMeta;

    use super::*;
    use crate::api::argocd_cluster::ClusterConfig;
    use crate::config::MissingKubeconfigPolicy;
    use crate::controllers::writer::MockRecordWriter;
    use crate::controllers::{ExtractError, WriteError};
    use crate::Error;

    const KUBECONFIG: &[u8] = b"apiVersion: v1\nkind: Config\ncurrent-context: prod\n";

    fn secret(owner_kind: &str, data: &[(&str, &[u8])]) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("cluster-a-conn".into()),
                namespace: Some("crossplane-system".into()),
                owner_references: Some(vec![OwnerReference {
                    api_version: "container.gcp.crossplane.io/v1beta1".into(),
                    kind: owner_kind.into(),
                    name: "cluster-a".into(),
                    uid: "7f9c3c1e-0000-0000-0000-000000000001".into(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            data: Some(
                data.iter()
                    .map(|(k, v)| (k.to_string(), ByteString(v.to_vec())))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    fn handler(config: Config, writer: MockRecordWriter) -> SecretHandler {
        SecretHandler::new(Arc::new(config), Box::new(writer))
    }

    fn string(record: &Secret, key: &str) -> String {
        String::from_utf8(record.data.as_ref().unwrap()[key].0.clone()).unwrap()
    }

    #[tokio::test]
    async fn registers_provisioner_secret() {
        let mut writer = MockRecordWriter::new();
        writer
            .expect_create()
            .withf(|record| {
                let config: ClusterConfig = serde_json::from_slice(
                    &record.data.as_ref().unwrap()["config"].0,
                )
                .unwrap();

                record.metadata.name.as_deref() == Some("ops-prod")
                    && record.metadata.namespace.as_deref() == Some("argocd")
                    && config.auth_config.cluster_name == "prod"
                    && config.tls_client_config.ca_data == "qrs="
                    && !config.tls_client_config.insecure
                    && string(record, "name") == "gke-prod"
                    && string(record, "server") == "https://10.0.0.1"
            })
            .times(1)
            .returning(|record| Ok(Written::Created(record.name_any())));

        let config = Config {
            namespace: "ops".into(),
            ..Default::default()
        };
        let outcome = handler(config, writer)
            .handle(&secret(
                "GKECluster",
                &[
                    ("kubeconfig", KUBECONFIG),
                    ("clusterCA", [0xAA_u8, 0xBB].as_slice()),
                    ("endpoint", b"https://10.0.0.1".as_slice()),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Registered("ops-prod".into()));
    }

    #[tokio::test]
    async fn dry_run_is_not_registered() {
        let mut writer = MockRecordWriter::new();
        writer
            .expect_create()
            .times(1)
            .returning(|record| Ok(Written::DryRun(record.name_any())));

        let outcome = handler(Config::default(), writer)
            .handle(&secret("GKECluster", &[("kubeconfig", KUBECONFIG)]))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Assembled("default-prod".into()));
        assert_eq!(outcome.metric_label(), "assembled");
    }

    #[tokio::test]
    async fn ignores_other_owners() {
        let mut writer = MockRecordWriter::new();
        writer.expect_create().never();

        let outcome = handler(Config::default(), writer)
            .handle(&secret("OtherKind", &[("kubeconfig", KUBECONFIG)]))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Ignored);
    }

    #[tokio::test]
    async fn ignores_unowned_secrets() {
        let mut writer = MockRecordWriter::new();
        writer.expect_create().never();

        let mut unowned = secret("GKECluster", &[("kubeconfig", KUBECONFIG)]);
        unowned.metadata.owner_references = None;

        let outcome = handler(Config::default(), writer)
            .handle(&unowned)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Ignored);
    }

    #[tokio::test]
    async fn malformed_kubeconfig_skips_write() {
        let mut writer = MockRecordWriter::new();
        writer.expect_create().never();

        let result = handler(Config::default(), writer)
            .handle(&secret(
                "GKECluster",
                &[
                    ("kubeconfig", b"current-context: [".as_slice()),
                    ("clusterCA", [0xAA_u8].as_slice()),
                    ("endpoint", b"https://10.0.0.1".as_slice()),
                ],
            ))
            .await;

        assert!(matches!(
            result,
            Err(Error::Extract(ExtractError::ConnectionConfig(_)))
        ));
    }

    #[tokio::test]
    async fn missing_kubeconfig_follows_policy() {
        let mut writer = MockRecordWriter::new();
        writer
            .expect_create()
            .withf(|record| string(record, "name") == "gke-")
            .times(1)
            .returning(|record| Ok(Written::Created(record.name_any())));

        let payload = [("endpoint", b"https://10.0.0.1".as_slice())];
        let outcome = handler(Config::default(), writer)
            .handle(&secret("GKECluster", &payload))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Registered("default-".into()));

        let mut writer = MockRecordWriter::new();
        writer.expect_create().never();
        let config = Config {
            missing_kubeconfig: MissingKubeconfigPolicy::Abort,
            ..Default::default()
        };
        let result = handler(config, writer)
            .handle(&secret("GKECluster", &payload))
            .await;
        assert!(matches!(
            result,
            Err(Error::Extract(ExtractError::MissingConnectionConfig))
        ));
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let mut writer = MockRecordWriter::new();
        writer.expect_create().times(1).returning(|_| {
            Err(WriteError::Create(kube::Error::Api(
                kube::core::ErrorResponse {
                    status: "Failure".into(),
                    message: "secrets \"default-prod\" already exists".into(),
                    reason: "AlreadyExists".into(),
                    code: 409,
                }
                .into(),
            )))
        });

        let result = handler(Config::default(), writer)
            .handle(&secret("GKECluster", &[("kubeconfig", KUBECONFIG)]))
            .await;

        assert!(matches!(result, Err(Error::Write(WriteError::Create(_)))));
    }
}
