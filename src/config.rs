//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Evaluation service base URL (without trailing slash)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for every upstream request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Subtracted from the token lifetime reported by the auth endpoint
    #[serde(default = "default_expiry_buffer_secs")]
    pub token_expiry_buffer_secs: u64,
}

/// Client credentials posted to the auth endpoint.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub name: String,
    #[serde(rename(serialize = "rollNo"))]
    pub roll_no: String,
    #[serde(rename(serialize = "accessCode"))]
    pub access_code: String,
    #[serde(rename(serialize = "clientID"))]
    pub client_id: String,
    #[serde(rename(serialize = "clientSecret"))]
    pub client_secret: String,
}

// Keep the secrets out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("roll_no", &self.roll_no)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Look-back window used when a request omits `minutes`
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_expiry_buffer_secs() -> u64 {
    5 * 60
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_minutes() -> u32 {
    50
}

impl Config {
    /// Load configuration from file, then `STOCKAGG__*` environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let Some(path) = path.to_str() else {
            anyhow::bail!("config path is not valid UTF-8: {}", path.display());
        };

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("STOCKAGG").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "~/.config/stock-aggregator/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        // Environment alone may be enough.
        Self::load("config.toml")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.credentials.client_id.trim().is_empty() {
            anyhow::bail!("credentials.client_id must not be empty");
        }
        if self.credentials.client_secret.trim().is_empty() {
            anyhow::bail!("credentials.client_secret must not be empty");
        }
        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be positive");
        }
        if self.query.default_minutes == 0 {
            anyhow::bail!("query.default_minutes must be positive");
        }
        Ok(())
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn expiry_buffer(&self) -> Duration {
        Duration::from_secs(self.token_expiry_buffer_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_expiry_buffer_secs: default_expiry_buffer_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
        }
    }
}
