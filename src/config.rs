//! Configuration management.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for healthpack.
#[derive(Debug, Clone)]
pub struct HealthpackConfig {
    /// Directory where exported profiles are written and discovered.
    pub profiles_dir: PathBuf,
    /// Days of history the generator seeds.
    pub generator_days: u32,
    /// Seed for the generator's random source.
    pub generator_seed: u64,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Profiles directory.
    pub profiles_dir: Option<String>,
    /// Generator days of history.
    pub generator_days: Option<u32>,
    /// Generator seed.
    pub generator_seed: Option<u64>,
}

impl Default for HealthpackConfig {
    fn default() -> Self {
        Self {
            profiles_dir: PathBuf::from("."),
            generator_days: 14,
            generator_seed: 42,
        }
    }
}

impl HealthpackConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", e))?;
        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location, falling back to
    /// defaults when no file exists, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be parsed.
    pub fn load() -> Result<Self> {
        let path = PathBuf::from("healthpack.toml");
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Builds a configuration from a parsed file, with defaults for
    /// absent fields.
    #[must_use]
    pub fn from_config_file(file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            profiles_dir: file
                .profiles_dir
                .map_or(defaults.profiles_dir, PathBuf::from),
            generator_days: file.generator_days.unwrap_or(defaults.generator_days),
            generator_seed: file.generator_seed.unwrap_or(defaults.generator_seed),
        }
    }

    /// Applies `HEALTHPACK_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("HEALTHPACK_PROFILES_DIR") {
            self.profiles_dir = PathBuf::from(dir);
        }
        if let Ok(days) = std::env::var("HEALTHPACK_GENERATOR_DAYS") {
            if let Ok(days) = days.parse() {
                self.generator_days = days;
            }
        }
        if let Ok(seed) = std::env::var("HEALTHPACK_GENERATOR_SEED") {
            if let Ok(seed) = seed.parse() {
                self.generator_seed = seed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HealthpackConfig::new();
        assert_eq!(config.profiles_dir, PathBuf::from("."));
        assert_eq!(config.generator_days, 14);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("healthpack.toml");
        std::fs::write(&path, "profiles_dir = \"/var/profiles\"\ngenerator_days = 7\n").unwrap();

        let config = HealthpackConfig::load_from_file(&path).unwrap();
        assert_eq!(config.profiles_dir, PathBuf::from("/var/profiles"));
        assert_eq!(config.generator_days, 7);
        // Unset fields keep their defaults.
        assert_eq!(config.generator_seed, 42);
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("healthpack.toml");
        std::fs::write(&path, "profiles_dir = [nonsense").unwrap();
        assert!(HealthpackConfig::load_from_file(&path).is_err());
    }
}
