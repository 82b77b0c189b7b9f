use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Token lifetimes are capped at ten years.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("SHOWBUFF_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SHOWBUFF_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("SHOWBUFF_DB_PATH")
            .unwrap_or_else(|| "showbuff.db".into())
            .into();
        let host = lookup("SHOWBUFF_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("SHOWBUFF_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SHOWBUFF_PORT must be a port number")?;
        let token_ttl_days: i64 = lookup("SHOWBUFF_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("SHOWBUFF_TOKEN_TTL_DAYS must be an integer")?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("SHOWBUFF_TOKEN_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            token_ttl_days,
        })
    }

    pub fn token_ttl(&self) -> Result<TimeDelta> {
        TimeDelta::try_days(self.token_ttl_days)
            .with_context(|| format!("token lifetime of {} days is out of range", self.token_ttl_days))
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
