use crate::{
    conf::{BigQueryConfig, CredentialsConfig, LoggingConfig, SheetConfig},
    core::ClusterError::{self, ConfigParsingError},
    sheet::A1Range,
};
use config::Config as CConfig;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "BQCLUSTER";

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub bigquery: BigQueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, ClusterError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Optional TOML file, then `BQCLUSTER_<SECTION>__<KEY>` overrides.
    pub fn load(path: Option<&str>) -> Result<Config, ClusterError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::with_name(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.bigquery.max_clients == 0 {
            return Err(ConfigParsingError(
                "bigquery.max_clients must be at least 1".to_string(),
            ));
        }
        if self.bigquery.max_update_attempts == 0 {
            return Err(ConfigParsingError(
                "bigquery.max_update_attempts must be at least 1".to_string(),
            ));
        }
        if self.sheet.spreadsheet_id.trim().is_empty() {
            return Err(ConfigParsingError(
                "sheet.spreadsheet_id must not be empty".to_string(),
            ));
        }
        if !is_column(&self.sheet.status_column) {
            return Err(ConfigParsingError(format!(
                "sheet.status_column '{}' is not a column letter",
                self.sheet.status_column
            )));
        }
        self.sheet
            .range
            .parse::<A1Range>()
            .map_err(|e| ConfigParsingError(format!("sheet.range: {e}")))?;
        Ok(())
    }
}

fn is_column(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase())
}
