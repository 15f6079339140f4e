//! Certificate availability state

use super::CertificateMaterial;
use crate::utils::{LoadError, SourceError};
use std::fmt;
use std::sync::Arc;

/// Why a configured certificate could not be made available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateFailure {
    /// The bundle bytes could not be obtained
    Source(SourceError),
    /// The bundle bytes were obtained but did not load
    Load(LoadError),
}

impl CertificateFailure {
    /// Stable label for reporting
    pub fn kind_label(&self) -> &'static str {
        match self {
            CertificateFailure::Source(_) => "SOURCE_UNAVAILABLE",
            CertificateFailure::Load(err) => err.kind().as_str(),
        }
    }

    /// Whether supplying a different passphrase may fix this failure
    pub fn is_retryable(&self) -> bool {
        match self {
            CertificateFailure::Source(_) => false,
            CertificateFailure::Load(err) => err.kind().is_retryable(),
        }
    }
}

impl fmt::Display for CertificateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateFailure::Source(err) => write!(f, "{}", err),
            CertificateFailure::Load(err) => write!(f, "{}", err),
        }
    }
}

impl From<SourceError> for CertificateFailure {
    fn from(err: SourceError) -> Self {
        CertificateFailure::Source(err)
    }
}

impl From<LoadError> for CertificateFailure {
    fn from(err: LoadError) -> Self {
        CertificateFailure::Load(err)
    }
}

/// What a caller currently knows about its signing certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateState {
    /// No bundle source has been configured
    NotConfigured,
    /// A bundle is configured but no passphrase was supplied yet
    AwaitingPassword,
    /// The bundle loaded successfully
    Loaded(Arc<CertificateMaterial>),
    /// The bundle is configured but could not be loaded
    Failed(CertificateFailure),
}

impl CertificateState {
    pub fn label(&self) -> &'static str {
        match self {
            CertificateState::NotConfigured => "not_configured",
            CertificateState::AwaitingPassword => "awaiting_password",
            CertificateState::Loaded(_) => "loaded",
            CertificateState::Failed(_) => "failed",
        }
    }

    pub fn material(&self) -> Option<&CertificateMaterial> {
        match self {
            CertificateState::Loaded(material) => Some(material),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CertificateState::Loaded(_))
    }
}
