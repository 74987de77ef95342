use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Write the severity log files; console only when false.
    #[serde(default = "LoggingConfig::default_files")]
    pub files: bool,
    #[serde(default = "LoggingConfig::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "LoggingConfig::default_base_name")]
    pub base_name: String,
}

impl LoggingConfig {
    fn default_files() -> bool {
        true
    }

    fn default_dir() -> PathBuf {
        PathBuf::from("/var/log/bigquery-cluster")
    }

    fn default_base_name() -> String {
        String::from("bigquery-cluster")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            files: Self::default_files(),
            dir: Self::default_dir(),
            base_name: Self::default_base_name(),
        }
    }
}
