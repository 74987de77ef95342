mod bigquery;
mod config;
mod credentials;
mod env;
mod logging;
mod sheet;

pub use bigquery::BigQueryConfig;
pub use config::Config;
pub use credentials::{CredentialsConfig, ServiceAccountCredentials};
pub use env::{CLUSTER_ENV, Environment};
pub use logging::LoggingConfig;
pub use sheet::SheetConfig;
