use crate::application_impl::{AuthConfig, JwtConfig};
use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default)]
    pub mode: String, // "development" or "production"
}

#[derive(Deserialize)]
pub struct Auth {
    pub secret: String,
    pub cost: u32,
    pub access_ttl: String,
    pub refresh_ttl: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("secret", &"<redacted>")
            .field("cost", &self.cost)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
    pub dir: Option<String>, // JSON log files go here when set
}

#[derive(Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_store_timeout")]
    pub timeout: String,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .field("dsn", &self.dsn.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn default_issuer() -> String {
    "exampleIssuer".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_store_timeout() -> String {
    "5s".to_string()
}

impl Settings {
    /// Secure cookies are only sent in production mode.
    pub fn tokens_secure(&self) -> bool {
        self.app.mode == "production"
    }

    pub fn auth_config(&self) -> Result<AuthConfig> {
        if self.auth.cost == 0 {
            bail!("auth.cost must be at least 1");
        }

        Ok(AuthConfig {
            cost: self.auth.cost,
            access_ttl: parse_ttl("auth.access_ttl", &self.auth.access_ttl)?,
            refresh_ttl: parse_ttl("auth.refresh_ttl", &self.auth.refresh_ttl)?,
            store_timeout: parse_ttl("store.timeout", &self.store.timeout)?,
        })
    }

    pub fn jwt_config(&self) -> Result<JwtConfig> {
        if self.auth.secret.is_empty() {
            bail!("auth.secret must not be empty");
        }

        Ok(JwtConfig {
            issuer: self.auth.issuer.clone(),
            signing_key: self.auth.secret.clone().into_bytes(),
        })
    }

    pub fn store_timeout(&self) -> Result<Duration> {
        parse_ttl("store.timeout", &self.store.timeout)
    }
}

fn parse_ttl(key: &str, value: &str) -> Result<Duration> {
    let ttl = humantime::parse_duration(value.trim())
        .map_err(|e| anyhow!("{key}: cannot parse {value:?}: {e}"))?;
    if ttl.is_zero() {
        bail!("{key} must be greater than zero");
    }
    Ok(ttl)
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "AUTHGATE";

/// Load settings from the TOML file, then let `AUTHGATE_<SECTION>__<KEY>`
/// environment variables override individual values.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
