use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Environment;
use crate::core::ClusterError;

/// Where the service-account file for an environment lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Relative paths are resolved against the working directory.
    #[serde(default = "CredentialsConfig::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "CredentialsConfig::default_prefix")]
    pub prefix: String,
}

impl CredentialsConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("credentials")
    }

    fn default_prefix() -> String {
        String::from("clustering-service-account")
    }

    /// `<dir>/<prefix>.<env>.json`, anchored at `cwd` when `dir` is relative.
    pub fn path_for(&self, cwd: &Path, env: Environment) -> PathBuf {
        cwd.join(&self.dir)
            .join(format!("{}.{}.json", self.prefix, env))
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            prefix: Self::default_prefix(),
        }
    }
}

/// Google service-account key document.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

impl ServiceAccountCredentials {
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let bytes = std::fs::read(path).map_err(|e| {
            ClusterError::ConfigParsingError(format!(
                "reading credentials {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClusterError::ConfigParsingError(format!(
                "parsing credentials {}: {e}",
                path.display()
            ))
        })
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}
