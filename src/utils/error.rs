//! Custom error types for nfse-cert
//!
//! This module defines domain-specific error types using `thiserror` for
//! the failure modes of certificate loading, bundle sources and configuration.

use thiserror::Error;

/// Classified failure of a PKCS#12 load.
///
/// Every failure of the loader maps to exactly one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Malformed PKCS#12 bundle: {message}")]
    MalformedBundle { message: String },

    #[error("Failed to decrypt PKCS#12 bundle: {message}")]
    DecryptionFailed { message: String },

    #[error("Invalid PKCS#12 bundle contents: {message}")]
    InvalidBundleContents { message: String },
}

impl LoadError {
    pub fn malformed(message: impl Into<String>) -> Self {
        LoadError::MalformedBundle {
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        LoadError::DecryptionFailed {
            message: message.into(),
        }
    }

    pub fn invalid_contents(message: impl Into<String>) -> Self {
        LoadError::InvalidBundleContents {
            message: message.into(),
        }
    }

    /// The classification of this error
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::MalformedBundle { .. } => LoadErrorKind::MalformedBundle,
            LoadError::DecryptionFailed { .. } => LoadErrorKind::DecryptionFailed,
            LoadError::InvalidBundleContents { .. } => LoadErrorKind::InvalidBundleContents,
        }
    }
}

/// Error classification without the detail message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    MalformedBundle,
    DecryptionFailed,
    InvalidBundleContents,
}

impl LoadErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadErrorKind::MalformedBundle => "MALFORMED_BUNDLE",
            LoadErrorKind::DecryptionFailed => "DECRYPTION_FAILED",
            LoadErrorKind::InvalidBundleContents => "INVALID_BUNDLE_CONTENTS",
        }
    }

    /// Only a decryption failure can succeed with the same bytes (and another passphrase)
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadErrorKind::DecryptionFailed)
    }
}

impl std::fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors producing bundle bytes from a configured source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Failed to read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("Invalid base64 certificate data: {message}")]
    InvalidBase64 { message: String },

    #[error("Certificate source misconfigured: {message}")]
    Misconfigured { message: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
