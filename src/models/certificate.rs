//! Certificate material types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default threshold below which a valid certificate is reported as expiring soon
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 30;

/// Key material and validity information extracted from a PKCS#12 bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateMaterial {
    /// PEM-encoded PKCS#8 private key
    #[serde(skip_serializing)]
    pub private_key_pem: String,
    /// PEM-encoded leaf certificate
    pub certificate_pem: String,
    /// Uppercase hex SHA-1 of the certificate DER
    pub thumbprint: String,
    /// Uppercase hex SHA-256 of the certificate DER
    pub fingerprint_sha256: String,
    /// Certificate subject
    pub subject: String,
    /// Certificate issuer
    pub issuer: String,
    /// Serial number (hex string)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// Whether `loaded_at` falls inside the validity window
    pub is_valid: bool,
    /// Days from `loaded_at` to `not_after`, negative once expired
    pub days_to_expire: i64,
    /// When this record was produced
    pub loaded_at: DateTime<Utc>,
}

impl CertificateMaterial {
    /// Check if the certificate is valid (time-wise) at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        is_within_validity(self.not_before, self.not_after, now)
    }

    /// Days until expiry as seen from `now`
    pub fn days_to_expire_at(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.not_after, now)
    }

    /// Status label as of `now`
    pub fn status_at(&self, now: DateTime<Utc>, expiring_soon_days: i64) -> CertificateStatus {
        CertificateStatus::evaluate(self.not_before, self.not_after, now, expiring_soon_days)
    }

    /// Status label as of the moment the material was loaded
    pub fn status(&self, expiring_soon_days: i64) -> CertificateStatus {
        self.status_at(self.loaded_at, expiring_soon_days)
    }
}

/// Inclusive on both ends.
pub fn is_within_validity(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    now >= not_before && now <= not_after
}

/// Whole days from `now` to `not_after`, rounded half away from zero.
pub fn days_until(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = not_after.signed_duration_since(now).num_seconds();
    (seconds as f64 / SECONDS_PER_DAY).round() as i64
}

/// Time-validity label for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Valid,
    ExpiringSoon,
    Expired,
    NotYetValid,
}

impl CertificateStatus {
    /// Classify a validity window against `now`.
    ///
    /// `ExpiringSoon` is only reported for a certificate that is currently valid.
    pub fn evaluate(
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
        now: DateTime<Utc>,
        expiring_soon_days: i64,
    ) -> Self {
        if now < not_before {
            CertificateStatus::NotYetValid
        } else if now > not_after {
            CertificateStatus::Expired
        } else if days_until(not_after, now) < expiring_soon_days {
            CertificateStatus::ExpiringSoon
        } else {
            CertificateStatus::Valid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Valid => "valid",
            CertificateStatus::ExpiringSoon => "expiring_soon",
            CertificateStatus::Expired => "expired",
            CertificateStatus::NotYetValid => "not_yet_valid",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
