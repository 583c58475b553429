use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub confirm: Confirm,
    pub log: Log,
    pub notification: Notification,
    pub session: Session,
    pub store: Store,
}

/// Read-back confirmation after an accept.
#[derive(Debug, Deserialize)]
pub struct Confirm {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub final_grace_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Notification {
    pub publisher: String, // "none" or "redis"
    pub redis_dsn: Option<String>,
    pub channel_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "fake" or "jwt"
    pub jwt_secret: Option<String>,
    pub audience: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub dsn: Option<String>,
    /// Usernames given a profile in the memory store at startup.
    #[serde(default)]
    pub seed_users: Vec<String>,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the TOML file, then lets `RAPPORT__SECTION__KEY` variables override it.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("RAPPORT").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
