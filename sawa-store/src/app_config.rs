use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Horizon for host-initiated first offers
    #[serde(default = "default_host_offer_ttl_days")]
    pub host_offer_ttl_days: i64,
    /// Horizon for traveler-solicited service/rental offers
    #[serde(default = "default_solicited_offer_ttl_days")]
    pub solicited_offer_ttl_days: i64,
    /// Interval between expiry sweep passes
    #[serde(default = "default_expiry_sweep_seconds")]
    pub expiry_sweep_seconds: u64,
}

fn default_host_offer_ttl_days() -> i64 {
    3
}
fn default_solicited_offer_ttl_days() -> i64 {
    7
}
fn default_expiry_sweep_seconds() -> u64 {
    300
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            host_offer_ttl_days: default_host_offer_ttl_days(),
            solicited_offer_ttl_days: default_solicited_offer_ttl_days(),
            expiry_sweep_seconds: default_expiry_sweep_seconds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default").required(false))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of SAWA)
            // Eg.. `SAWA_DEBUG=1` would set the `debug` key
            .add_source(config::Environment::with_prefix("SAWA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
