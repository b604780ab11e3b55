use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Record store
    pub supabase_url: String,
    pub supabase_key: String,
    pub loans_table: String,
    pub logs_table: String,
    pub store_timeout: Duration,

    // Event logger
    pub log_retry_delay: Duration,
    pub log_fallback_capacity: usize,
    pub log_escalation_cap: u32,

    // Batch
    pub batch_concurrency: usize,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = required(&lookup, "SUPABASE_URL")?;
        check_store_url(&supabase_url)?;
        let supabase_key = required(&lookup, "SUPABASE_ANON_KEY")?;

        let batch_concurrency: usize = parse_or(&lookup, "BATCH_CONCURRENCY", 1)?;
        if batch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "BATCH_CONCURRENCY",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            supabase_url,
            supabase_key,
            loans_table: lookup("LOANS_TABLE").unwrap_or_else(|| "loans".to_string()),
            logs_table: lookup("LOGS_TABLE").unwrap_or_else(|| "logs".to_string()),
            store_timeout: Duration::from_secs(parse_or(&lookup, "STORE_TIMEOUT_SECS", 10)?),
            log_retry_delay: Duration::from_millis(parse_or(&lookup, "LOG_RETRY_DELAY_MS", 1000)?),
            log_fallback_capacity: parse_or(&lookup, "LOG_FALLBACK_CAPACITY", 256)?,
            log_escalation_cap: parse_or(&lookup, "LOG_ESCALATION_CAP", 3)?,
            batch_concurrency,
            api_host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&lookup, "API_PORT", 8000)?,
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SUPABASE_URL: {}", self.supabase_url);
        tracing::info!("  SUPABASE_ANON_KEY: {}", preview(&self.supabase_key));
        tracing::info!(
            "  tables: loans={} logs={}",
            self.loans_table,
            self.logs_table
        );
        tracing::info!(
            "  store timeout: {:?}, log retry delay: {:?}, batch concurrency: {}",
            self.store_timeout,
            self.log_retry_delay,
            self.batch_concurrency
        );
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("{raw:?}: {e}"),
        }),
    }
}

/// The store is reached over the public internet with a bearer key; only
/// `https` is accepted.
fn check_store_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key: "SUPABASE_URL",
        message: e.to_string(),
    })?;
    if parsed.scheme() != "https" {
        return Err(ConfigError::Invalid {
            key: "SUPABASE_URL",
            message: format!("must start with 'https://', got: {raw}"),
        });
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::Invalid {
            key: "SUPABASE_URL",
            message: "missing host".to_string(),
        });
    }
    Ok(())
}
