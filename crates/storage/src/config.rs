//! Sampler tuning knobs, loadable from TOML.
//! Worker fan-out is a tuning constant, not part of the sampling contract.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    /// Number of fetch-and-transform workers in the sampling pipeline.
    pub workers: usize,

    /// Capacity of the inter-stage channels. One is enough; larger values
    /// only buy memory.
    pub channel_capacity: usize,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        ReserveConfig {
            workers: 6,
            channel_capacity: 1,
        }
    }
}

/// Load a config from a TOML file. Missing keys fall back to defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ReserveConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = ReserveConfig::default();
        assert_eq!(cfg.workers, 6);
        assert_eq!(cfg.channel_capacity, 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(tmp, "workers = 2").expect("write");
        let cfg = load_from_file(tmp.path()).expect("load");
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.channel_capacity, 1); // defaulted
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(tmp, "workers = \"six\"").expect("write");
        assert!(matches!(
            load_from_file(tmp.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
