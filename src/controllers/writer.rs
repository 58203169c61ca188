use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::runtime::events::{Event, EventType};
use kube::{Client, Resource, ResourceExt};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[cfg(test)]
use mockall::automock;

use crate::controller::Diagnostics;

use super::{WriteError, WriteResult};

/// What a writer did with a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Written {
    /// Stored under the given name
    Created(String),
    /// Only logged, store writes are disabled
    DryRun(String),
}

/// Destination for assembled cluster registration secrets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn create(&self, record: &Secret) -> WriteResult<Written>;
}

/// Creates registration secrets through the cluster API.
///
/// Every record is a plain create: an existing secret with the same name
/// fails the write. Once the secret exists, a failure to publish the
/// creation event is only logged.
pub struct KubeRecordWriter {
    client: Client,
    diagnostics: Arc<RwLock<Diagnostics>>,
}

impl KubeRecordWriter {
    pub fn new(client: Client, diagnostics: Arc<RwLock<Diagnostics>>) -> Self {
        Self {
            client,
            diagnostics,
        }
    }
}

#[async_trait]
impl RecordWriter for KubeRecordWriter {
    async fn create(&self, record: &Secret) -> WriteResult<Written> {
        let ns = record.namespace().unwrap_or_default();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &ns);

        let created = api
            .create(&PostParams::default(), record)
            .await
            .map_err(WriteError::Create)?;

        info!("Added cluster {}", created.name_any());
        let published = self
            .diagnostics
            .read()
            .await
            .recorder(self.client.clone())
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: "Created".into(),
                    note: Some(format!(
                        "Created cluster secret `{}` in `{}`",
                        created.name_any(),
                        ns
                    )),
                    action: "Creating".into(),
                    secondary: None,
                },
                &created.object_ref(&()),
            )
            .await;
        if let Err(e) = published {
            warn!("Failed to publish creation event for {}: {e}", created.name_any());
        }

        Ok(Written::Created(created.name_any()))
    }
}

/// Logs registration secrets without writing them
#[derive(Default)]
pub struct DryRunWriter;

#[async_trait]
impl RecordWriter for DryRunWriter {
    async fn create(&self, record: &Secret) -> WriteResult<Written> {
        info!(?record, "Cluster secret assembled, store writes disabled");
        Ok(Written::DryRun(record.name_any()))
    }
}
