//! Configuration module for nfse-cert
//!
//! Handles loading settings from TOML files and the environment.

pub mod settings;

pub use settings::{CertificateSettings, HealthSettings, Settings};

use crate::utils::ConfigError;
use std::path::Path;

/// Load settings from `path` (or the default location) and apply environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match path {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load_default()?,
    };
    settings.apply_env_overrides()?;
    Ok(settings)
}
