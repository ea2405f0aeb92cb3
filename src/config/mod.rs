//! Configuration module for the portfolio backend.
//!
//! All configuration is loaded from environment variables. Only the content store
//! URL is mandatory; everything else has a default.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL of the content store (required)
    pub database_url: String,
    /// SQLite URL of a shared read cache; in-process cache when unset
    pub cache_url: Option<String>,
    /// Shared secret for the internal routes; internal routes reject everything when unset
    pub internal_secret: Option<String>,
    pub production_origin: Option<String>,
    pub development_origin: Option<String>,
    pub platform_origin: Option<String>,
    /// Contact submissions allowed per window and caller
    pub contact_rate_limit: u32,
    pub contact_rate_window: Duration,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("PORTFOLIO_DATABASE_URL").ok_or_else(|| {
            AppError::Configuration("PORTFOLIO_DATABASE_URL must be set".to_string())
        })?;

        let development_origin = Some(
            non_empty("PORTFOLIO_DEVELOPMENT_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        );

        let window_secs: u64 = parse_or(
            "PORTFOLIO_CONTACT_RATE_WINDOW_SECS",
            non_empty("PORTFOLIO_CONTACT_RATE_WINDOW_SECS"),
            60,
        )?;

        Ok(Self {
            database_url,
            cache_url: non_empty("PORTFOLIO_CACHE_URL"),
            internal_secret: non_empty("PORTFOLIO_INTERNAL_SECRET"),
            production_origin: non_empty("PORTFOLIO_PRODUCTION_ORIGIN"),
            development_origin,
            platform_origin: non_empty("PORTFOLIO_PLATFORM_ORIGIN"),
            contact_rate_limit: parse_or(
                "PORTFOLIO_CONTACT_RATE_LIMIT",
                non_empty("PORTFOLIO_CONTACT_RATE_LIMIT"),
                5,
            )?,
            contact_rate_window: Duration::from_secs(window_secs),
            bind_addr: parse_or(
                "PORTFOLIO_BIND_ADDR",
                non_empty("PORTFOLIO_BIND_ADDR"),
                SocketAddr::from(([127, 0, 0, 1], 8080)),
            )?,
            log_level: non_empty("PORTFOLIO_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Origins allowed to read published content from a browser.
    pub fn allowed_origins(&self) -> Vec<String> {
        [
            &self.production_origin,
            &self.development_origin,
            &self.platform_origin,
        ]
        .into_iter()
        .flatten()
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .collect()
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::Configuration(format!("Invalid {}: {}", key, e))),
    }
}
