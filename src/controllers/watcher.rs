use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Client, ResourceExt};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::controller::State;
use crate::{Error, Result};

use super::handler::SecretHandler;
use super::writer::{DryRunWriter, KubeRecordWriter, RecordWriter};

/// Derives creation events from a list-watch stream.
///
/// An object counts as created the first time its UID is observed, which
/// includes everything delivered by the initial list.
#[derive(Default)]
pub struct CreationFilter {
    seen: HashSet<String>,
    relist: Option<HashSet<String>>,
}

impl CreationFilter {
    pub fn observe(&mut self, event: watcher::Event<Secret>) -> Option<Secret> {
        match event {
            watcher::Event::Init => {
                self.relist = Some(HashSet::new());
                None
            }
            watcher::Event::InitApply(obj) => {
                let uid = obj.uid()?;
                if let Some(relist) = self.relist.as_mut() {
                    relist.insert(uid.clone());
                }
                self.seen.insert(uid).then_some(obj)
            }
            watcher::Event::InitDone => {
                if let Some(relist) = self.relist.take() {
                    self.seen.retain(|uid| relist.contains(uid));
                }
                None
            }
            watcher::Event::Apply(obj) => {
                let uid = obj.uid()?;
                self.seen.insert(uid).then_some(obj)
            }
            watcher::Event::Delete(obj) => {
                if let Some(uid) = obj.uid() {
                    self.seen.remove(&uid);
                }
                None
            }
        }
    }
}

/// Build the API client, from an explicit kubeconfig when one is configured
pub async fn connect(config: &Config) -> Result<Client> {
    let Some(path) = config.kubeconfig.as_ref() else {
        return Ok(Client::try_default().await?);
    };

    let kubeconfig = Kubeconfig::read_from(path)?;
    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(Client::try_from(client_config)?)
}

/// Watch secrets in all namespaces and register the ones created by the
/// provisioner, until interrupted.
pub async fn run(state: State, config: Arc<Config>) -> Result<()> {
    let client = connect(&config).await?;
    let secrets = Api::<Secret>::all(client.clone());
    if let Err(e) = secrets.list(&ListParams::default().limit(1)).await {
        error!("Secrets are not queryable; {e:?}");
        return Err(Error::StoreUnreachable(e));
    }

    let ctx = state.to_context(client.clone());
    let writer: Box<dyn RecordWriter> = match config.write_records {
        true => Box::new(KubeRecordWriter::new(client, ctx.diagnostics.clone())),
        false => Box::new(DryRunWriter),
    };
    let handler = SecretHandler::new(config.clone(), writer);

    info!(
        kind = %config.provisioner_kind,
        target = %config.target_namespace,
        "Starting monitoring..."
    );

    let mut filter = CreationFilter::default();
    let mut events = watcher(secrets, watcher::Config::default())
        .default_backoff()
        .boxed();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, detaching watcher");
                break;
            }
            event = events.try_next() => event,
        };

        let secret = match event {
            Ok(Some(event)) => match filter.observe(event) {
                Some(secret) => secret,
                None => continue,
            },
            Ok(None) => break,
            Err(e) => {
                warn!("watch failed: {e}");
                continue;
            }
        };

        ctx.diagnostics.write().await.last_event = Utc::now();
        let start = Instant::now();
        match handler.handle(&secret).await {
            Ok(outcome) => ctx.metrics.handled(&outcome, start.elapsed()),
            Err(e) => {
                warn!("handling {} failed: {e}", secret.name_any());
                ctx.metrics.handle_failure(&e, start.elapsed());
            }
        }
    }

    Ok(())
}
