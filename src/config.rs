use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Public origin Telegram can reach, e.g. `https://your-service.onrender.com`
    pub webhook_base_url: Option<String>,
    /// Shared secret Telegram sends back with every update
    pub webhook_secret: Option<String>,
}

// Keep the token out of logs.
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("webhook_base_url", &self.webhook_base_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
}

/// Shape of the optional TOML file. Every field may be overridden from the environment.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    telegram: FileTelegram,
    #[serde(default)]
    server: FileServer,
}

#[derive(Debug, Deserialize, Default)]
struct FileTelegram {
    bot_token: Option<String>,
    webhook_base_url: Option<String>,
    webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileServer {
    host: Option<String>,
    port: Option<u16>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

/// Blank values count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load from an optional TOML file, then apply `BOT_TOKEN`,
    /// `WEBHOOK_BASE_URL`, `WEBHOOK_SECRET`, `HOST` and `PORT` from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            ),
            None => None,
        };

        Self::from_sources(content.as_deref(), |key| std::env::var(key).ok())
    }

    fn from_sources(content: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file: FileConfig = match content {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => FileConfig::default(),
        };

        let bot_token = match non_empty(env("BOT_TOKEN")).or(non_empty(file.telegram.bot_token)) {
            Some(token) => token,
            None => bail!("BOT_TOKEN is not set"),
        };

        let port = match non_empty(env("PORT")) {
            Some(port) => port
                .parse()
                .with_context(|| format!("Invalid PORT value: {port}"))?,
            None => file.server.port.unwrap_or_else(default_port),
        };

        Ok(Config {
            telegram: TelegramConfig {
                bot_token,
                webhook_base_url: non_empty(env("WEBHOOK_BASE_URL"))
                    .or(non_empty(file.telegram.webhook_base_url)),
                webhook_secret: non_empty(env("WEBHOOK_SECRET"))
                    .or(non_empty(file.telegram.webhook_secret)),
            },
            server: ServerConfig {
                host: non_empty(env("HOST"))
                    .or(non_empty(file.server.host))
                    .unwrap_or_else(default_host),
                port,
            },
        })
    }
}
