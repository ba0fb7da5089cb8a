//! Service configuration, read from the environment (and `.env` when present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AnalysisError, Result};

/// Which sentiment/phrase detector backs the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorBackend {
    /// AWS Comprehend
    Comprehend,
    /// Local ML sidecar over HTTP
    Sidecar,
    /// Built-in keyword lexicon, no network
    Lexicon,
}

impl FromStr for DetectorBackend {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "comprehend" => Ok(DetectorBackend::Comprehend),
            "sidecar" => Ok(DetectorBackend::Sidecar),
            "lexicon" => Ok(DetectorBackend::Lexicon),
            other => Err(AnalysisError::config(format!(
                "Unknown DETECTOR_BACKEND '{}' (expected comprehend, sidecar or lexicon)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub detector_backend: DetectorBackend,
    pub sidecar_url: String,
    pub detector_timeout: Duration,
    pub detector_max_retries: u32,
    pub detector_retry_base: Duration,
    pub classify_concurrency: usize,
    pub aspect_table_limit: Option<usize>,
    /// JSON file of `{"product_id": ["review", ...]}` loaded into the
    /// in-memory store. Ignored when `database_url` is set.
    pub reviews_seed_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: "0.0.0.0:3000".to_string(),
            detector_backend: DetectorBackend::Lexicon,
            sidecar_url: "http://localhost:8000".to_string(),
            detector_timeout: Duration::from_secs(10),
            detector_max_retries: 2,
            detector_retry_base: Duration::from_millis(200),
            classify_concurrency: 4,
            aspect_table_limit: None,
            reviews_seed_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let detector_backend = match lookup("DETECTOR_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.detector_backend,
        };
        let sidecar_url = lookup("SIDECAR_URL").unwrap_or(defaults.sidecar_url);

        let detector_timeout = parse_or(&lookup, "DETECTOR_TIMEOUT_SECS", 10u64)?;
        let detector_max_retries = parse_or(&lookup, "DETECTOR_MAX_RETRIES", defaults.detector_max_retries)?;
        let detector_retry_base = parse_or(&lookup, "DETECTOR_RETRY_BASE_MS", 200u64)?;
        let classify_concurrency: usize =
            parse_or(&lookup, "CLASSIFY_CONCURRENCY", defaults.classify_concurrency)?;
        if classify_concurrency == 0 {
            return Err(AnalysisError::config("CLASSIFY_CONCURRENCY must be at least 1"));
        }

        let aspect_table_limit = match lookup("ASPECT_TABLE_LIMIT") {
            Some(value) => Some(value.trim().parse().map_err(|_| {
                AnalysisError::config(format!("Invalid ASPECT_TABLE_LIMIT: {}", value))
            })?),
            None => None,
        };

        let reviews_seed_file = lookup("REVIEWS_SEED_FILE").filter(|path| !path.trim().is_empty());

        Ok(Self {
            database_url,
            bind_addr,
            detector_backend,
            sidecar_url,
            detector_timeout: Duration::from_secs(detector_timeout),
            detector_max_retries,
            detector_retry_base: Duration::from_millis(detector_retry_base),
            classify_concurrency,
            aspect_table_limit,
            reviews_seed_file,
        })
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AnalysisError::config(format!("Invalid {}: {}", key, value))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.detector_backend, DetectorBackend::Lexicon);
        assert_eq!(config.detector_timeout, Duration::from_secs(10));
        assert_eq!(config.classify_concurrency, 4);
        assert_eq!(config.aspect_table_limit, None);
        assert_eq!(config.reviews_seed_file, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/reviews"),
            ("DETECTOR_BACKEND", "Comprehend"),
            ("DETECTOR_RETRY_BASE_MS", "50"),
            ("CLASSIFY_CONCURRENCY", "16"),
            ("ASPECT_TABLE_LIMIT", "1000"),
            ("REVIEWS_SEED_FILE", "fixtures/reviews.json"),
        ]))
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/reviews"));
        assert_eq!(config.detector_backend, DetectorBackend::Comprehend);
        assert_eq!(config.detector_retry_base, Duration::from_millis(50));
        assert_eq!(config.classify_concurrency, 16);
        assert_eq!(config.aspect_table_limit, Some(1000));
        assert_eq!(config.reviews_seed_file.as_deref(), Some("fixtures/reviews.json"));
    }

    #[test]
    fn test_blank_seed_file_is_unset() {
        let config = Config::from_lookup(lookup_from(&[("REVIEWS_SEED_FILE", "  ")])).unwrap();
        assert_eq!(config.reviews_seed_file, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("DETECTOR_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DETECTOR_BACKEND", "oracle")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CLASSIFY_CONCURRENCY", "0")])).is_err());
    }
}
