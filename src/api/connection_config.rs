use serde::{Deserialize, Deserializer, Serialize};

/// Decode an explicit `null` the same way as an absent key
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Connection-config document embedded under the `kubeconfig` key of a
/// provisioner secret.
///
/// Only `current-context` feeds the registration record. The remaining
/// entries are kept so the document can be inspected and logged as a whole.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(rename = "apiVersion", deserialize_with = "null_default")]
    pub api_version: String,
    #[serde(deserialize_with = "null_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_default")]
    pub clusters: Vec<NamedCluster>,
    #[serde(deserialize_with = "null_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(deserialize_with = "null_default")]
    pub users: Vec<NamedUser>,
    #[serde(deserialize_with = "null_default")]
    pub preferences: serde_yaml::Value,
    #[serde(rename = "current-context", deserialize_with = "null_default")]
    pub current_context: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NamedCluster {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub cluster: ClusterEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority-data", deserialize_with = "null_default")]
    pub certificate_authority_data: String,
    #[serde(deserialize_with = "null_default")]
    pub server: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NamedContext {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub context: ContextEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ContextEntry {
    #[serde(deserialize_with = "null_default")]
    pub cluster: String,
    #[serde(deserialize_with = "null_default")]
    pub user: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NamedUser {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub user: UserEntry,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct UserEntry {
    #[serde(deserialize_with = "null_default")]
    pub token: String,
}

impl ConnectionConfig {
    /// Decode the raw `kubeconfig` payload.
    ///
    /// A blank or `null` payload decodes to the empty document, anything else
    /// must be a YAML mapping.
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_yaml::Error> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_slice::<Option<Self>>(raw)?.unwrap_or_default())
    }

    fn current(&self) -> Option<&ContextEntry> {
        self.contexts
            .iter()
            .find(|c| c.name == self.current_context)
            .map(|c| &c.context)
    }

    /// Cluster entry bound to the current context
    pub fn current_cluster(&self) -> Option<&ClusterEntry> {
        let context = self.current()?;
        self.clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
    }

    /// User entry bound to the current context
    pub fn current_user(&self) -> Option<&UserEntry> {
        let context = self.current()?;
        self.users
            .iter()
            .find(|u| u.name == context.user)
            .map(|u| &u.user)
    }
}
