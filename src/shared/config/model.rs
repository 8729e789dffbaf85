use serde::Deserialize;

use crate::engine::fetch::config::AggregateFetchConfig;

/// Top-level settings loaded from the configuration file. The engine itself
/// never reads this; callers build a validated [`AggregateFetchConfig`] and
/// pass it to the coordinator at construction time.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub fetch: AggregateFetchConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("CHANFETCH_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
