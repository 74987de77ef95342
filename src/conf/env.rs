use std::fmt;
use std::str::FromStr;

use crate::core::ClusterError;

pub const CLUSTER_ENV: &str = "CLUSTERENV";

/// Deployment environment; selects the credential file and log file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Staging,
}

impl Environment {
    /// Resolve from an explicit value, falling back to `staging` when unset or empty.
    pub fn resolve(value: Option<&str>) -> Result<Self, ClusterError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Environment::default()),
            Some(name) => name.parse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
        }
    }
}

impl FromStr for Environment {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            other => Err(ClusterError::ConfigParsingError(format!(
                "unknown {CLUSTER_ENV} '{other}', expected 'production' or 'staging'"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
