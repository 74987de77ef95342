use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BigQueryConfig {
    /// Upper bound on simultaneously open per-project clients.
    #[serde(default = "BigQueryConfig::default_max_clients")]
    pub max_clients: usize,
    /// Attempts per table when the conditional update loses an etag race.
    #[serde(default = "BigQueryConfig::default_max_update_attempts")]
    pub max_update_attempts: u32,
    #[serde(
        with = "humantime_serde",
        default = "BigQueryConfig::default_retry_backoff"
    )]
    pub retry_backoff: Duration,
    #[serde(
        with = "humantime_serde",
        default = "BigQueryConfig::default_request_timeout"
    )]
    pub request_timeout: Duration,
    #[serde(default = "BigQueryConfig::default_base_url")]
    pub base_url: String,
}

impl BigQueryConfig {
    fn default_max_clients() -> usize {
        5
    }

    fn default_max_update_attempts() -> u32 {
        3
    }

    fn default_retry_backoff() -> Duration {
        Duration::from_millis(500)
    }

    fn default_request_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_base_url() -> String {
        String::from("https://bigquery.googleapis.com")
    }
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            max_clients: Self::default_max_clients(),
            max_update_attempts: Self::default_max_update_attempts(),
            retry_backoff: Self::default_retry_backoff(),
            request_timeout: Self::default_request_timeout(),
            base_url: Self::default_base_url(),
        }
    }
}
