//! Bundle sources
//!
//! Produces raw PKCS#12 bytes from a file path or from base64 text
//! (typically an environment variable).

use crate::utils::SourceError;
use base64::Engine;
use std::path::PathBuf;

/// Base64 text shorter than this cannot hold a key and a certificate
pub const DEFAULT_MIN_BASE64_LEN: usize = 100;

/// Where the PKCS#12 bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleSource {
    /// A .pfx/.p12 file on disk
    File(PathBuf),
    /// Base64-encoded bundle bytes
    Base64(String),
}

impl BundleSource {
    /// Read the bundle bytes, using the default base64 plausibility floor
    pub fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        self.read_bytes_with_min_len(DEFAULT_MIN_BASE64_LEN)
    }

    /// Read the bundle bytes.
    ///
    /// Base64 text is stripped of all whitespace before decoding, so wrapped
    /// values copied from env files decode as-is.
    pub fn read_bytes_with_min_len(&self, min_base64_len: usize) -> Result<Vec<u8>, SourceError> {
        match self {
            BundleSource::File(path) => std::fs::read(path).map_err(|e| SourceError::FileRead {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
            BundleSource::Base64(text) => {
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

                if compact.len() < min_base64_len {
                    return Err(SourceError::Misconfigured {
                        message: format!(
                            "base64 certificate is implausibly short ({} characters, expected at least {})",
                            compact.len(),
                            min_base64_len
                        ),
                    });
                }

                base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| SourceError::InvalidBase64 {
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Short description for logs and reports, never the secret itself
    pub fn describe(&self) -> String {
        match self {
            BundleSource::File(path) => format!("file {}", path.display()),
            BundleSource::Base64(text) => format!("base64 ({} characters)", text.trim().len()),
        }
    }
}

impl std::fmt::Display for BundleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
