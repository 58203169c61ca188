use std::collections::BTreeMap;

use base64::prelude::*;
use k8s_openapi::ByteString;
use tracing::debug;

use crate::api::connection_config::ConnectionConfig;
use crate::config::MissingKubeconfigPolicy;

use super::{ExtractError, ExtractResult};

pub const KUBECONFIG_KEY: &str = "kubeconfig";
pub const CLUSTER_CA_KEY: &str = "clusterCA";
pub const ENDPOINT_KEY: &str = "endpoint";

/// Connection material pulled out of a provisioner secret
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedCredentials {
    /// Current context of the embedded kubeconfig
    pub cluster_name: String,
    /// Base64 encoded cluster CA
    pub ca_data: String,
    pub insecure: bool,
    /// API server address, as stored in the payload
    pub server: Vec<u8>,
}

type KeyHandler = fn(&mut ExtractedCredentials, &[u8]) -> ExtractResult<()>;

/// Recognized payload keys, applied in this order
const HANDLERS: [(&str, KeyHandler); 3] = [
    (KUBECONFIG_KEY, connection_config),
    (CLUSTER_CA_KEY, cluster_ca),
    (ENDPOINT_KEY, endpoint),
];

fn connection_config(creds: &mut ExtractedCredentials, raw: &[u8]) -> ExtractResult<()> {
    let config = ConnectionConfig::from_slice(raw)?;
    // The provisioner names the context after the cluster
    creds.cluster_name = config.current_context;
    Ok(())
}

fn cluster_ca(creds: &mut ExtractedCredentials, raw: &[u8]) -> ExtractResult<()> {
    creds.ca_data = BASE64_STANDARD.encode(raw);
    creds.insecure = false;
    Ok(())
}

fn endpoint(creds: &mut ExtractedCredentials, raw: &[u8]) -> ExtractResult<()> {
    creds.server = raw.to_vec();
    Ok(())
}

/// Extract connection material from a secret payload.
///
/// Unknown keys are ignored. A `kubeconfig` entry that fails to decode
/// abandons the whole payload.
pub fn extract(
    payload: &BTreeMap<String, ByteString>,
    policy: MissingKubeconfigPolicy,
) -> ExtractResult<ExtractedCredentials> {
    if policy == MissingKubeconfigPolicy::Abort && !payload.contains_key(KUBECONFIG_KEY) {
        return Err(ExtractError::MissingConnectionConfig);
    }

    let mut creds = ExtractedCredentials::default();
    for (key, handler) in HANDLERS.iter().copied() {
        if let Some(ByteString(raw)) = payload.get(key) {
            debug!(key, "Extracting");
            handler(&mut creds, raw)?;
        }
    }

    Ok(creds)
}
