//! Configuration module

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

use crate::aggregation::DEFAULT_PARALLEL_THRESHOLD;
use crate::error::ConfigError;
use crate::generation::DEFAULT_CHUNK_SIZE;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address
    pub bind_addr: SocketAddr,

    /// Records per generation chunk
    pub chunk_size: usize,

    /// Idle seconds before the producer context is terminated; 0 keeps it alive
    pub producer_idle_secs: u64,

    /// Largest record count accepted per request
    pub max_records: usize,

    /// Timeline for heatmap cells and severity labels
    pub heatmap_offset: FixedOffset,

    pub parallel_threshold: usize,

    /// Deterministic seed for the synthetic generator
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            chunk_size: DEFAULT_CHUNK_SIZE,
            producer_idle_secs: 30,
            max_records: 100_000,
            heatmap_offset: utc(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment, after an optional `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let chunk_size = parse(&lookup, "OCSF_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size);
        if chunk_size == 0 {
            return Err(invalid("OCSF_CHUNK_SIZE", "0", "must be greater than zero"));
        }

        let max_records = parse(&lookup, "OCSF_MAX_RECORDS")?.unwrap_or(defaults.max_records);
        if max_records == 0 {
            return Err(invalid("OCSF_MAX_RECORDS", "0", "must be greater than zero"));
        }

        let heatmap_offset = match parse::<i32, _>(&lookup, "OCSF_HEATMAP_UTC_OFFSET_MINUTES")? {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    invalid(
                        "OCSF_HEATMAP_UTC_OFFSET_MINUTES",
                        &minutes.to_string(),
                        "offset must be within +/- 24 hours",
                    )
                })?,
            None => defaults.heatmap_offset,
        };

        Ok(Self {
            bind_addr: parse(&lookup, "OCSF_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            chunk_size,
            producer_idle_secs: parse(&lookup, "OCSF_PRODUCER_IDLE_SECS")?
                .unwrap_or(defaults.producer_idle_secs),
            max_records,
            heatmap_offset,
            parallel_threshold: parse(&lookup, "OCSF_PARALLEL_THRESHOLD")?
                .unwrap_or(defaults.parallel_threshold),
            seed: parse(&lookup, "OCSF_SEED")?,
        })
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3030");
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.producer_idle_secs, 30);
        assert_eq!(config.max_records, 100_000);
        assert_eq!(config.heatmap_offset.local_minus_utc(), 0);
        assert_eq!(config.parallel_threshold, 10_000);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("OCSF_BIND_ADDR", "0.0.0.0:8080"),
            ("OCSF_CHUNK_SIZE", "250"),
            ("OCSF_PRODUCER_IDLE_SECS", "0"),
            ("OCSF_HEATMAP_UTC_OFFSET_MINUTES", "-300"),
            ("OCSF_SEED", " 42 "),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.producer_idle_secs, 0);
        assert_eq!(config.heatmap_offset.local_minus_utc(), -300 * 60);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("OCSF_CHUNK_SIZE", "lots")]),
            Err(ConfigError::InvalidValue { key: "OCSF_CHUNK_SIZE", .. })
        ));
        assert!(config(&[("OCSF_CHUNK_SIZE", "0")]).is_err());
        assert!(config(&[("OCSF_HEATMAP_UTC_OFFSET_MINUTES", "2000")]).is_err());
        assert!(config(&[("OCSF_BIND_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = config(&[("OCSF_MAX_RECORDS", "")]).unwrap();
        assert_eq!(config.max_records, 100_000);
    }
}
