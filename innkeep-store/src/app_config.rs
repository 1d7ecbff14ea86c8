use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Guests may cancel only while check-in is at least this far away.
    #[serde(default = "default_cancellation_cutoff_hours")]
    pub cancellation_cutoff_hours: i64,
    /// Window applied to report endpoints when the caller omits dates.
    #[serde(default = "default_report_days")]
    pub default_report_days: i64,
}

fn default_cancellation_cutoff_hours() -> i64 {
    24
}

fn default_report_days() -> i64 {
    30
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            cancellation_cutoff_hours: default_cancellation_cutoff_hours(),
            default_report_days: default_report_days(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `INNKEEP__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("INNKEEP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
