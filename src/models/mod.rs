//! Data models for nfse-cert
//!
//! This module contains the certificate material record and the states a
//! caller can observe while making a certificate available.

pub mod certificate;
pub mod state;

pub use certificate::{
    days_until, is_within_validity, CertificateMaterial, CertificateStatus,
    DEFAULT_EXPIRING_SOON_DAYS,
};
pub use state::{CertificateFailure, CertificateState};
