use std::time::Duration;

use anyhow::{Context, bail};
use tracing::warn;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SECRET_KEY: &str = "ultra-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub admin_password: String,
    pub secret_key: String,
    pub token_ttl: chrono::Duration,
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub broadcast_interval: Duration,
    /// Messages per second; switches pacing to a token bucket when set.
    pub broadcast_rate: Option<u32>,
    pub exclusive_broadcasts: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Empty values count as unset, matching how .env files are usually written.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(telegram_token) = get("TELEGRAM_TOKEN") else {
            bail!("TELEGRAM_TOKEN must be set");
        };

        let admin_password = get("ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("ADMIN_PASSWORD not set, using the built-in default");
            DEFAULT_ADMIN_PASSWORD.into()
        });
        let secret_key = get("SECRET_KEY").unwrap_or_else(|| {
            warn!("SECRET_KEY not set, using the built-in default");
            DEFAULT_SECRET_KEY.into()
        });

        let port = match get("PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid PORT: {}", v))?,
            None => 8080,
        };
        let interval_ms: u64 = match get("HERALD_BROADCAST_INTERVAL_MS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid HERALD_BROADCAST_INTERVAL_MS: {}", v))?,
            None => 50,
        };
        let broadcast_rate = match get("HERALD_BROADCAST_RATE") {
            Some(v) => {
                let rate: u32 = v
                    .parse()
                    .with_context(|| format!("invalid HERALD_BROADCAST_RATE: {}", v))?;
                if rate == 0 {
                    bail!("HERALD_BROADCAST_RATE must be positive");
                }
                Some(rate)
            }
            None => None,
        };
        let exclusive_broadcasts = match get("HERALD_EXCLUSIVE_BROADCASTS") {
            Some(v) => parse_flag(&v)
                .with_context(|| format!("invalid HERALD_EXCLUSIVE_BROADCASTS: {}", v))?,
            None => false,
        };

        Ok(Self {
            telegram_token,
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| herald_telegram::client::DEFAULT_API_URL.into()),
            webhook_url: get("WEBHOOK_URL"),
            webhook_secret: get("WEBHOOK_SECRET"),
            admin_password,
            secret_key,
            token_ttl: chrono::Duration::hours(24),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("HERALD_DB_PATH").unwrap_or_else(|| "bot.db".into()),
            broadcast_interval: Duration::from_millis(interval_ms),
            broadcast_rate,
            exclusive_broadcasts,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected a boolean"),
    }
}
