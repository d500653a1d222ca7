use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_PAYMENT_URL: &str = "https://rzp.io/rzp/taskmindai-payment";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: f64,
    pub free_limit_per_day: u32,
    pub request_timeout: Duration,
    pub payment_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_mb: 2.0,
            free_limit_per_day: 3,
            request_timeout: Duration::from_secs(180),
            payment_url: DEFAULT_PAYMENT_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_upload_mb: f64 = parse_or(&lookup, "DEMO_MAX_MB", defaults.max_upload_mb)?;
        if !(max_upload_mb.is_finite() && max_upload_mb > 0.0) {
            bail!("DEMO_MAX_MB must be a positive number, got {max_upload_mb}");
        }

        let timeout_secs: u64 = parse_or(
            &lookup,
            "REQUEST_TIMEOUT",
            defaults.request_timeout.as_secs(),
        )?;

        Ok(Self {
            host: lookup("TIDYSHEET_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            max_upload_mb,
            free_limit_per_day: parse_or(
                &lookup,
                "FREE_LIMIT_PER_DAY",
                defaults.free_limit_per_day,
            )?,
            request_timeout: Duration::from_secs(timeout_secs),
            payment_url: lookup("PAYMENT_URL").unwrap_or(defaults.payment_url),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb * BYTES_PER_MB) as usize
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        _ => Ok(default),
    }
}
