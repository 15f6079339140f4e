//! PKCS#12 certificate loading
//!
//! Turns a PKCS#12 bundle and its passphrase into [`CertificateMaterial`].
//! Loading is a pure function of its inputs and the supplied clock; callers
//! decide whether and how to cache the result.

use crate::cert_ops::pfx::{read_pfx, PfxContents};
use crate::models::{days_until, is_within_validity, CertificateMaterial};
use crate::utils::LoadError;
use chrono::{DateTime, TimeZone, Utc};
use sha1::{Digest, Sha1};
use x509_parser::prelude::*;

pub const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";
pub const PRIVATE_KEY_PEM_TAG: &str = "PRIVATE KEY";

/// Load a bundle, evaluating validity against the current time
pub fn load_certificate(bundle: &[u8], passphrase: &str) -> Result<CertificateMaterial, LoadError> {
    load_certificate_at(bundle, passphrase, Utc::now())
}

/// Load a bundle, evaluating validity against `now`.
///
/// The passphrase is used exactly as given; an empty string is a real
/// passphrase and is never treated as "no passphrase".
pub fn load_certificate_at(
    bundle: &[u8],
    passphrase: &str,
    now: DateTime<Utc>,
) -> Result<CertificateMaterial, LoadError> {
    let result = build_material(bundle, passphrase, now);

    match &result {
        Ok(material) => tracing::debug!(
            thumbprint = %material.thumbprint,
            not_after = %material.not_after,
            "Loaded certificate from PKCS#12 bundle"
        ),
        Err(e) => tracing::debug!(kind = %e.kind(), "PKCS#12 load failed: {}", e),
    }

    result
}

fn build_material(
    bundle: &[u8],
    passphrase: &str,
    now: DateTime<Utc>,
) -> Result<CertificateMaterial, LoadError> {
    let (key_der, cert_der) = single_identity(read_pfx(bundle, passphrase)?)?;

    let (_, cert) = X509Certificate::from_der(&cert_der).map_err(|e| {
        LoadError::invalid_contents(format!("certificate does not decode: {:?}", e))
    })?;

    let not_before = asn1_time_to_datetime(cert.validity().not_before)?;
    let not_after = asn1_time_to_datetime(cert.validity().not_after)?;

    if not_before > not_after {
        return Err(LoadError::invalid_contents(format!(
            "validity window is inverted ({} is after {})",
            not_before, not_after
        )));
    }

    let serial = cert
        .serial
        .to_bytes_be()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":");

    Ok(CertificateMaterial {
        private_key_pem: encode_pem(PRIVATE_KEY_PEM_TAG, &key_der),
        certificate_pem: encode_pem(CERTIFICATE_PEM_TAG, &cert_der),
        thumbprint: sha1_thumbprint(&cert_der),
        fingerprint_sha256: hex::encode_upper(sha2::Sha256::digest(&cert_der)),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial,
        not_before,
        not_after,
        is_valid: is_within_validity(not_before, not_after, now),
        days_to_expire: days_until(not_after, now),
        loaded_at: now,
    })
}

/// Require exactly one private key and one certificate in the bundle
fn single_identity(contents: PfxContents) -> Result<(Vec<u8>, Vec<u8>), LoadError> {
    let PfxContents {
        mut keys,
        mut certificates,
    } = contents;

    match (keys.len(), certificates.len()) {
        (1, 1) => Ok((keys.remove(0), certificates.remove(0))),
        (key_count, cert_count) => Err(LoadError::invalid_contents(format!(
            "expected exactly one private key and one certificate, found {} key(s) and {} certificate(s)",
            key_count, cert_count
        ))),
    }
}

/// Uppercase hex SHA-1 of DER bytes, no separators
pub fn sha1_thumbprint(der: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(der);
    hex::encode_upper(hasher.finalize())
}

fn encode_pem(tag: &str, der: &[u8]) -> String {
    let block = ::pem::Pem::new(tag, der.to_vec());
    ::pem::encode_config(
        &block,
        ::pem::EncodeConfig::new().set_line_ending(::pem::LineEnding::LF),
    )
}

/// Convert ASN.1 time to chrono DateTime
fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>, LoadError> {
    let timestamp = time.timestamp();
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| LoadError::invalid_contents("invalid timestamp in certificate"))
}
