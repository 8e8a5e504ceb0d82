use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct ProofStorageConfig {
    /// Directory payment proofs are written into.
    pub root: String,
    /// Prefix prepended to stored object paths to form the reference
    /// handed back to clients.
    pub public_base_url: String,
}

#[derive(Deserialize, Clone)]
pub struct NotificationConfig {
    /// Channels a rendered notification is addressed to, e.g. "email", "sms".
    pub channels: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channels: vec!["email".to_owned()],
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub proofs: ProofStorageConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Toml::file("itw.toml"))
        .merge(Env::prefixed("ITW_").split("__"))
        .extract()?)
}
