//! Conversion configuration.
//!
//! Loaded from, highest precedence first:
//! 1. Environment variables (`QBRIDGE_` prefix)
//! 2. A YAML file
//! 3. Defaults
//!
//! ```yaml
//! export:
//!   snap_well_known_angles: true
//!   pad_idle_qubits: true
//! verify:
//!   enabled: true
//!   atol: 1.0e-7
//!   strict_global_phase: false
//!   max_qubits: 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use qbridge_convert::ExportOptions;
use qbridge_unitary::{DEFAULT_ATOL, MAX_ORACLE_QUBITS};

/// Complete conversion configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Exporter rendering options.
    #[serde(default)]
    pub export: ExportOptions,

    /// Post-conversion verification.
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// Post-conversion unitary check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Run the check after every conversion.
    #[serde(default)]
    pub enabled: bool,

    /// Element-wise tolerance.
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Require equality without a global phase factor.
    #[serde(default)]
    pub strict_global_phase: bool,

    /// Programs wider than this are converted without the check.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,
}

fn default_atol() -> f64 {
    DEFAULT_ATOL
}

fn default_max_qubits() -> usize {
    10
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            enabled: false,
            atol: default_atol(),
            strict_global_phase: false,
            max_qubits: default_max_qubits(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn set<T>(field: &mut T, key: &str, value: Option<String>, parse: impl Fn(&str) -> Option<T>) {
    if let Some(raw) = value {
        match parse(&raw) {
            Some(v) => *field = v,
            None => warn!("ignoring {}={:?}: not a valid value", key, raw),
        }
    }
}

impl ConversionConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: ConversionConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        ConversionConfig::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Environment variable overrides
    /// 2. The file, if provided
    /// 3. Defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => ConversionConfig::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override; unparsable values are
    /// logged and ignored.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// [`Self::merge_env`] over an arbitrary variable source.
    #[must_use]
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        for (key, field) in [
            ("QBRIDGE_SNAP_ANGLES", &mut self.export.snap_well_known_angles),
            ("QBRIDGE_PAD_IDLE", &mut self.export.pad_idle_qubits),
            ("QBRIDGE_VERIFY", &mut self.verify.enabled),
            ("QBRIDGE_STRICT_PHASE", &mut self.verify.strict_global_phase),
        ] {
            set(field, key, var(key), parse_bool);
        }
        set(
            &mut self.verify.atol,
            "QBRIDGE_VERIFY_ATOL",
            var("QBRIDGE_VERIFY_ATOL"),
            |v| v.trim().parse().ok(),
        );
        set(
            &mut self.verify.max_qubits,
            "QBRIDGE_VERIFY_MAX_QUBITS",
            var("QBRIDGE_VERIFY_MAX_QUBITS"),
            |v| v.trim().parse().ok(),
        );
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.verify.atol.is_finite() || self.verify.atol <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "verify.atol must be a positive number, got {}",
                self.verify.atol
            )));
        }
        if self.verify.max_qubits == 0 || self.verify.max_qubits > MAX_ORACLE_QUBITS {
            return Err(ConfigError::ValidationError(format!(
                "verify.max_qubits must be between 1 and {MAX_ORACLE_QUBITS}, got {}",
                self.verify.max_qubits
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_default_config() {
        let config = ConversionConfig::default();
        assert!(config.export.snap_well_known_angles);
        assert!(config.export.pad_idle_qubits);
        assert!(!config.verify.enabled);
        assert_eq!(config.verify.atol, 1e-7);
        assert_eq!(config.verify.max_qubits, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config: ConversionConfig =
            serde_yaml_ng::from_str("verify:\n  enabled: true\n  atol: 1.0e-9\n").unwrap();
        assert!(config.verify.enabled);
        assert_eq!(config.verify.atol, 1e-9);
        assert_eq!(config.verify.max_qubits, 10);
        assert!(config.export.pad_idle_qubits);
    }

    #[test]
    fn test_env_overrides() {
        let config = ConversionConfig::default().merge_vars(vars(&[
            ("QBRIDGE_SNAP_ANGLES", "off"),
            ("QBRIDGE_VERIFY", "1"),
            ("QBRIDGE_VERIFY_ATOL", "1e-6"),
            ("QBRIDGE_VERIFY_MAX_QUBITS", "many"),
        ]));
        assert!(!config.export.snap_well_known_angles);
        assert!(config.verify.enabled);
        assert_eq!(config.verify.atol, 1e-6);
        assert_eq!(config.verify.max_qubits, 10);
    }

    #[test]
    fn test_validation() {
        let mut config = ConversionConfig::default();
        config.verify.atol = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ConversionConfig::default();
        config.verify.max_qubits = MAX_ORACLE_QUBITS + 1;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("qbridge-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "export:\n  pad_idle_qubits: false\nverify:\n  max_qubits: 0\n").unwrap();
        assert!(matches!(
            ConversionConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
        std::fs::write(&path, "export:\n  pad_idle_qubits: false\n").unwrap();
        let config = ConversionConfig::from_file(&path).unwrap();
        assert!(!config.export.pad_idle_qubits);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            ConversionConfig::from_file("/nonexistent/qbridge.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
