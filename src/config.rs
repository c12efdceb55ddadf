//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted model artifact
    pub model_path: PathBuf,

    /// Directory holding an optional `iris.json` dataset override
    pub data_path: PathBuf,

    /// Seed for the train/test split and forest fitting
    pub random_state: u64,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Number of trees in the forest
    pub n_estimators: usize,

    /// Maximum tree depth (None = grow until pure)
    pub max_depth: Option<usize>,

    pub api_host: String,
    pub api_port: u16,
    pub api_title: String,
    pub api_version: String,

    /// Label attached to trained artifacts
    pub model_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/iris_model.json"),
            data_path: PathBuf::from("data"),
            random_state: 42,
            test_size: 0.2,
            n_estimators: 100,
            max_depth: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            api_title: "Iris Classifier API".to_string(),
            api_version: "0.1.0".to_string(),
            model_version: "v1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_depth = match lookup("MAX_DEPTH").map(|v| v.trim().to_string()) {
            None => defaults.max_depth,
            Some(v) if v.is_empty() || v.eq_ignore_ascii_case("none") => None,
            Some(v) => Some(parse_value::<usize>("MAX_DEPTH", &v)?),
        };

        // Port is parsed wide so out-of-range values get a range error, not a parse error
        let api_port = parse_or("API_PORT", &lookup, u32::from(defaults.api_port))?;
        if !(1..=65535).contains(&api_port) {
            return Err(invalid("API_PORT", format!("{} is outside 1..=65535", api_port)));
        }

        let config = Self {
            model_path: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            data_path: lookup("DATA_PATH").map(PathBuf::from).unwrap_or(defaults.data_path),
            random_state: parse_or("RANDOM_STATE", &lookup, defaults.random_state)?,
            test_size: parse_or("TEST_SIZE", &lookup, defaults.test_size)?,
            n_estimators: parse_or("N_ESTIMATORS", &lookup, defaults.n_estimators)?,
            max_depth,
            api_host: lookup("API_HOST").unwrap_or(defaults.api_host),
            api_port: api_port as u16,
            api_title: lookup("API_TITLE").unwrap_or(defaults.api_title),
            api_version: lookup("API_VERSION").unwrap_or(defaults.api_version),
            model_version: lookup("MODEL_VERSION").unwrap_or(defaults.model_version),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.test_size) {
            return Err(invalid("TEST_SIZE", format!("{} is outside [0, 1]", self.test_size)));
        }
        if self.n_estimators < 1 {
            return Err(invalid("N_ESTIMATORS", "must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(invalid("MAX_DEPTH", "must be at least 1 when set".to_string()));
        }
        if self.api_port == 0 {
            return Err(invalid("API_PORT", "0 is outside 1..=65535".to_string()));
        }
        Ok(())
    }

    /// Metrics file written next to the model artifact
    pub fn metrics_path(&self) -> PathBuf {
        self.model_path
            .parent()
            .map(|dir| dir.join("metrics.json"))
            .unwrap_or_else(|| PathBuf::from("metrics.json"))
    }

    /// Optional dataset override file
    pub fn data_file(&self) -> PathBuf {
        self.data_path.join("iris.json")
    }

    /// `host:port` string accepted by `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn invalid(var: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { var, reason }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(var, format!("'{}' ({})", raw, e)))
}

fn parse_or<T, F>(var: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw),
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model_path, PathBuf::from("models/iris_model.json"));
        assert_eq!(config.random_state, 42);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.metrics_path(), PathBuf::from("models/metrics.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MODEL_PATH", "/tmp/out/model.json"),
            ("N_ESTIMATORS", "10"),
            ("MAX_DEPTH", "4"),
            ("API_PORT", "9000"),
            ("TEST_SIZE", "0.3"),
        ]))
        .unwrap();

        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.metrics_path(), PathBuf::from("/tmp/out/metrics.json"));
    }

    #[test]
    fn test_max_depth_none() {
        let config = Config::from_lookup(lookup_from(&[("MAX_DEPTH", "None")])).unwrap();
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Config::from_lookup(lookup_from(&[("TEST_SIZE", "1.5")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("TEST_SIZE", "-0.1")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("API_PORT", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("API_PORT", "70000")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("N_ESTIMATORS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("MAX_DEPTH", "0")])).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = Config::from_lookup(lookup_from(&[("RANDOM_STATE", "abc")])).unwrap_err();
        assert!(err.to_string().contains("RANDOM_STATE"));
    }
}
