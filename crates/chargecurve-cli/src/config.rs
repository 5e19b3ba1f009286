// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChargeCurve.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result, bail};
use chargecurve_core::{EstimatorConfig, MaintenanceConfig};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "chargecurve.toml";

/// A century of retention is the most the sweep accepts
const MAX_ABANDONED_SESSION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurveConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "./data/chargecurve.db".to_owned()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl CurveConfig {
    /// Load an explicitly given file, or fall back to `chargecurve.toml`
    /// and finally to built-in defaults when that does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            bail!("database.path must not be empty");
        }
        let default_secs = self.estimator.default_seconds_per_percent;
        if !default_secs.is_finite() || default_secs <= 0.0 {
            bail!("estimator.default_seconds_per_percent must be a positive number");
        }
        if self.maintenance.interval_secs == 0 {
            bail!("maintenance.interval_secs must be at least 1");
        }
        if !(1..=MAX_ABANDONED_SESSION_DAYS).contains(&self.maintenance.abandoned_session_days) {
            bail!(
                "maintenance.abandoned_session_days must be between 1 and {MAX_ABANDONED_SESSION_DAYS}"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CurveConfig::from_toml("").unwrap();
        assert_eq!(config.database.path, "./data/chargecurve.db");
        assert_eq!(config.estimator.default_seconds_per_percent, 1200.0);
        assert_eq!(config.maintenance.interval_secs, 3600);
        assert_eq!(config.maintenance.abandoned_session_days, 14);
    }

    #[test]
    fn test_partial_sections() {
        let config = CurveConfig::from_toml(
            r#"
            [database]
            path = "/var/lib/chargecurve/curves.db"

            [estimator]
            default_seconds_per_percent = 900.0
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, "/var/lib/chargecurve/curves.db");
        assert_eq!(config.estimator.default_seconds_per_percent, 900.0);
        assert_eq!(config.maintenance.interval_secs, 3600);
    }

    #[test]
    fn test_rejects_non_positive_default() {
        let err = CurveConfig::from_toml("[estimator]\ndefault_seconds_per_percent = 0.0")
            .unwrap_err();
        assert!(err.to_string().contains("default_seconds_per_percent"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(CurveConfig::from_toml("[maintenance]\ninterval_secs = 0").is_err());
        assert!(CurveConfig::from_toml("[maintenance]\nabandoned_session_days = 0").is_err());
    }

    #[test]
    fn test_rejects_retention_beyond_a_century() {
        let err = CurveConfig::from_toml("[maintenance]\nabandoned_session_days = 4000000000")
            .unwrap_err();
        assert!(err.to_string().contains("abandoned_session_days"));

        assert!(CurveConfig::from_toml("[maintenance]\nabandoned_session_days = 36501").is_err());
        let config = CurveConfig::from_toml("[maintenance]\nabandoned_session_days = 36500").unwrap();
        assert_eq!(config.maintenance.abandoned_session_days, 36_500);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chargecurve.toml");
        std::fs::write(&path, "[maintenance]\ninterval_secs = 60\n").unwrap();

        let config = CurveConfig::load(Some(&path)).unwrap();
        assert_eq!(config.maintenance.interval_secs, 60);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CurveConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
