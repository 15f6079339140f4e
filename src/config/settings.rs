//! Application settings configuration
//!
//! Defines where the certificate bundle comes from and how health is reported.

use crate::cert_ops::source::{BundleSource, DEFAULT_MIN_BASE64_LEN};
use crate::models::DEFAULT_EXPIRING_SOON_DAYS;
use crate::utils::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_CERT_PATH: &str = "NFSE_CERT_PATH";
pub const ENV_CERT_BASE64: &str = "NFSE_CERT_BASE64";
pub const ENV_CERT_PASSWORD: &str = "NFSE_CERT_PASSWORD";
pub const ENV_EXPIRING_SOON_DAYS: &str = "NFSE_CERT_EXPIRING_SOON_DAYS";

/// Certificate bundle settings
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateSettings {
    /// Path to a .pfx/.p12 file
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Base64-encoded bundle, takes precedence over `path`
    #[serde(default)]
    pub base64: Option<String>,
    /// Bundle passphrase; `Some("")` is an empty passphrase, `None` is none supplied
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_min_base64_len")]
    pub min_base64_len: usize,
}

fn default_min_base64_len() -> usize {
    DEFAULT_MIN_BASE64_LEN
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            path: None,
            base64: None,
            password: None,
            min_base64_len: DEFAULT_MIN_BASE64_LEN,
        }
    }
}

impl CertificateSettings {
    /// The configured bundle source, if any
    pub fn source(&self) -> Option<BundleSource> {
        if let Some(text) = self.base64.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(BundleSource::Base64(text.to_string()));
        }
        self.path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| BundleSource::File(p.clone()))
    }
}

/// Health reporting settings
#[derive(Debug, Clone, Deserialize)]
pub struct HealthSettings {
    #[serde(default = "default_expiring_soon_days")]
    pub expiring_soon_days: i64,
}

fn default_expiring_soon_days() -> i64 {
    DEFAULT_EXPIRING_SOON_DAYS
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub certificate: CertificateSettings,
    #[serde(default)]
    pub health: HealthSettings,
}

impl Settings {
    /// Load settings from the default config file
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_path = Path::new("config/default.toml");
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `NFSE_CERT_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// An empty `NFSE_CERT_PASSWORD` sets an empty passphrase; the other
    /// variables are ignored when empty.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CERT_PATH).filter(|v| !v.is_empty()) {
            self.certificate.path = Some(PathBuf::from(path));
        }
        if let Some(text) = lookup(ENV_CERT_BASE64).filter(|v| !v.trim().is_empty()) {
            self.certificate.base64 = Some(text);
        }
        if let Some(password) = lookup(ENV_CERT_PASSWORD) {
            self.certificate.password = Some(password);
        }
        if let Some(days) = lookup(ENV_EXPIRING_SOON_DAYS).filter(|v| !v.is_empty()) {
            self.health.expiring_soon_days =
                days.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_EXPIRING_SOON_DAYS.to_string(),
                        message: format!("'{}' is not a whole number of days", days),
                    })?;
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.health.expiring_soon_days < 0 {
            return Err(ConfigError::InvalidValue {
                key: "health.expiring_soon_days".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}
