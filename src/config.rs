//! Server configuration.

use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use offdays_core::remote::OauthSettings;

const DEFAULT_PORT: u16 = 4280;

/// Settings loaded from `offdays.toml` (optional) with `OFFDAYS_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the JSON ledger document.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Google OAuth client. Calendar mirroring stays disabled without it.
    #[serde(default)]
    pub google: Option<OauthSettings>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offdays")
        .join("ledger.json")
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("offdays").required(false))
            .add_source(Environment::with_prefix("OFFDAYS").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
