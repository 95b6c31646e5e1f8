use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;
use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;

/// Environment variable naming the config file; `./config.yaml` when unset.
pub const CONFIG_PATH_ENV: &str = "NIGHTLY_EXPORTER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
/// Prefix for environment overrides, e.g. `NIGHTLY_EXPORTER_BIND_ADDRESS`.
/// Nested keys are separated by `__`: `NIGHTLY_EXPORTER_LOGGING__LEVEL=debug`.
const ENV_PREFIX: &str = "NIGHTLY_EXPORTER_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0, containing backend, logging and listener settings.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// The figment used by [`load_config`]: the YAML file, then environment overrides.
pub fn config_figment(path: &str) -> Figment {
    Figment::new().merge(Yaml::file(path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config"])
            .split("__"),
    )
}

/// Extracts a v1 config from any figment, so tests can feed YAML strings directly.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from the file named by `NIGHTLY_EXPORTER_CONFIG` (default "config.yaml").
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match extract_config(&config_figment(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
