use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_PROFILE: &str = "local";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: Server,
    pub upstream: Upstream,
    pub log: Log,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Upstream {
    /// Spreadsheet macro endpoint, both reads and writes go here.
    pub url: String,
    pub schema: SheetSchema,
    pub timeout_ms: u64,
    /// Extra attempts after the first one, transient failures only.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Upstream {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Response shape the deployed sheet script speaks.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SheetSchema {
    /// GET returns `[{city, shop, price}, ..]`, aggregated and merged with the cache.
    #[default]
    Rows,
    /// GET and POST responses are passed through untouched.
    Object,
    /// GET is passed through, POST gets a fixed acknowledgement.
    Ack,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Log {
    pub level: String,
}

impl Settings {
    /// Defaults, then `config/default.toml`, then `config/<RUN_ENV>.toml`, then
    /// `APP__SECTION__KEY` environment variables. `RUN_CONFIG_DIR` moves the
    /// config directory.
    pub fn load() -> Result<Self, ConfigError> {
        let dir = std::env::var("RUN_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        let profile = std::env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

        defaults()?
            .add_source(File::with_name(&format!("{dir}/default")).required(false))
            .add_source(File::with_name(&format!("{dir}/{profile}")).required(false))
            .add_source(Environment::with_prefix("app").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000_i64)?
        .set_default("upstream.schema", "rows")?
        .set_default("upstream.timeout_ms", 10_000_i64)?
        .set_default("upstream.max_retries", 2_i64)?
        .set_default("upstream.initial_backoff_ms", 100_i64)?
        .set_default("log.level", "info")
}
