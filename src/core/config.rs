use std::collections::HashMap;

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

pub const ENV_PREFIX: &str = "DUET";
pub const ENV_SEPARATOR: &str = "__";

/// One provisioned user, keyed in [`Config::users`] by its bearer token.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct UserCfg {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    pub username: String,
    #[serde_as(as = "DisplayFromStr")]
    pub room_id: u64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Provisioned user table, token -> user. Tokens are pre-issued; there
    /// is no registration path.
    pub users: HashMap<String, UserCfg>,

    /// Capacity of the broker transport channel.
    #[serde(default = "default_broker_capacity")]
    #[serde_as(as = "DisplayFromStr")]
    pub broker_capacity: usize,

    /// Depth of each connection's outbound delivery channel. A peer that
    /// stops reading loses messages past this depth instead of growing
    /// memory without bound.
    #[serde(default = "default_outbound_capacity")]
    #[serde_as(as = "DisplayFromStr")]
    pub outbound_capacity: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_broker_capacity() -> usize {
    1024
}

fn default_outbound_capacity() -> usize {
    32
}

pub fn load_from_env() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok(); // Load from .env file first
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("duet").required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()?;
    Ok(cfg.try_deserialize()?)
}
