//! Certificate availability for long-running callers
//!
//! Combines a bundle source, an optional passphrase, the loader and a
//! caller-owned cache into a single [`CertificateState`].

use crate::cert_ops::cache::CertificateCache;
use crate::cert_ops::loader::load_certificate_at;
use crate::cert_ops::source::{BundleSource, DEFAULT_MIN_BASE64_LEN};
use crate::config::CertificateSettings;
use crate::models::{CertificateFailure, CertificateState};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Resolves the configured certificate into a [`CertificateState`]
#[derive(Debug)]
pub struct CertificateProvider {
    source: Option<BundleSource>,
    passphrase: Option<String>,
    min_base64_len: usize,
    cache: Arc<CertificateCache>,
}

impl CertificateProvider {
    pub fn new(source: Option<BundleSource>, passphrase: Option<String>) -> Self {
        Self {
            source,
            passphrase,
            min_base64_len: DEFAULT_MIN_BASE64_LEN,
            cache: Arc::new(CertificateCache::new()),
        }
    }

    pub fn from_settings(settings: &CertificateSettings) -> Self {
        Self::new(settings.source(), settings.password.clone())
            .with_min_base64_len(settings.min_base64_len)
    }

    /// Use a cache shared with other owners
    pub fn with_cache(mut self, cache: Arc<CertificateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_min_base64_len(mut self, min_base64_len: usize) -> Self {
        self.min_base64_len = min_base64_len;
        self
    }

    pub fn cache(&self) -> &Arc<CertificateCache> {
        &self.cache
    }

    pub fn source(&self) -> Option<&BundleSource> {
        self.source.as_ref()
    }

    /// Replace the passphrase; a changed passphrase drops any cached material
    pub fn set_passphrase(&mut self, passphrase: Option<String>) {
        if self.passphrase != passphrase {
            self.passphrase = passphrase;
            self.cache.invalidate();
        }
    }

    /// Replace the bundle source; a changed source drops any cached material
    pub fn set_source(&mut self, source: Option<BundleSource>) {
        if self.source != source {
            self.source = source;
            self.cache.invalidate();
        }
    }

    pub fn state(&self) -> CertificateState {
        self.state_at(Utc::now())
    }

    /// Current state, loading the bundle only when nothing is cached
    pub fn state_at(&self, now: DateTime<Utc>) -> CertificateState {
        let Some(source) = &self.source else {
            return CertificateState::NotConfigured;
        };

        let Some(passphrase) = &self.passphrase else {
            return CertificateState::AwaitingPassword;
        };

        if let Some(material) = self.cache.get() {
            return CertificateState::Loaded(material);
        }

        let loaded = source
            .read_bytes_with_min_len(self.min_base64_len)
            .map_err(CertificateFailure::from)
            .and_then(|bytes| {
                load_certificate_at(&bytes, passphrase, now).map_err(CertificateFailure::from)
            });

        match loaded {
            Ok(material) => {
                tracing::info!(
                    source = %source,
                    thumbprint = %material.thumbprint,
                    "Certificate loaded"
                );
                CertificateState::Loaded(self.cache.set(material))
            }
            Err(failure) => {
                tracing::warn!(
                    source = %source,
                    kind = failure.kind_label(),
                    "Certificate unavailable: {}",
                    failure
                );
                CertificateState::Failed(failure)
            }
        }
    }

    /// Drop cached material and load again
    pub fn reload_at(&self, now: DateTime<Utc>) -> CertificateState {
        self.cache.invalidate();
        self.state_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_configured() {
        let provider = CertificateProvider::new(None, Some("secret".to_string()));
        assert_eq!(provider.state(), CertificateState::NotConfigured);
    }

    #[test]
    fn test_awaiting_password() {
        let provider =
            CertificateProvider::new(Some(BundleSource::File(PathBuf::from("x.pfx"))), None);
        assert_eq!(provider.state(), CertificateState::AwaitingPassword);
    }

    #[test]
    fn test_short_base64_fails_as_source_error() {
        let provider = CertificateProvider::new(
            Some(BundleSource::Base64("MIIK".to_string())),
            Some(String::new()),
        );
        match provider.state() {
            CertificateState::Failed(failure) => {
                assert_eq!(failure.kind_label(), "SOURCE_UNAVAILABLE")
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(provider.cache().is_empty());
    }
}
