//! PKCS#12 (PFX) container reader
//!
//! Walks every layer of the container and collects every key bag and
//! certificate bag, whatever attributes they carry, so callers see exactly
//! what the file holds.
//!
//! ```text
//! PFX ::= SEQUENCE {
//!   version   INTEGER {v3(3)},
//!   authSafe  ContentInfo,
//!   macData   MacData OPTIONAL
//! }
//! ```

use crate::cert_ops::ber::{BerError, Element};
use crate::cert_ops::pbe::{self, PbeError};
use crate::utils::LoadError;

/// Version field of every PFX structure
const PFX_VERSION: u32 = 3;

const PKCS7_DATA_OID: &str = "1.2.840.113549.1.7.1";
const PKCS7_SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";
const PKCS7_ENCRYPTED_DATA_OID: &str = "1.2.840.113549.1.7.6";

const KEY_BAG_OID: &str = "1.2.840.113549.1.12.10.1.1";
const SHROUDED_KEY_BAG_OID: &str = "1.2.840.113549.1.12.10.1.2";
const CERT_BAG_OID: &str = "1.2.840.113549.1.12.10.1.3";
const SAFE_CONTENTS_BAG_OID: &str = "1.2.840.113549.1.12.10.1.6";

const X509_CERTIFICATE_OID: &str = "1.2.840.113549.1.9.22.1";

/// Nesting limit for safeContentsBag
const MAX_BAG_DEPTH: usize = 8;

/// Everything a bundle holds, in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PfxContents {
    /// PKCS#8 PrivateKeyInfo DER of each key bag, decrypted
    pub keys: Vec<Vec<u8>>,
    /// DER of each X.509 certificate bag
    pub certificates: Vec<Vec<u8>>,
}

/// Open a bundle and collect its keys and certificates.
///
/// Failures are classified where they happen: structure that cannot be
/// read is MALFORMED_BUNDLE, a passphrase that does not verify or decrypt
/// is DECRYPTION_FAILED, and a bag this reader cannot represent is
/// INVALID_BUNDLE_CONTENTS.
pub fn read_pfx(data: &[u8], passphrase: &str) -> Result<PfxContents, LoadError> {
    let envelope = Envelope::parse(data)?;

    let mac_verified = match &envelope.mac {
        Some(mac) => {
            pbe::verify_mac(
                &mac.digest_oid,
                passphrase,
                &mac.salt,
                mac.iterations,
                &envelope.auth_safe,
                &mac.digest,
            )
            .map_err(|e| match e {
                PbeError::Unsupported(message) => LoadError::malformed(message),
                PbeError::Rejected(message) => {
                    LoadError::decryption(format!("{} (wrong passphrase?)", message))
                }
            })?;
            true
        }
        None => false,
    };

    let reader = BagReader {
        passphrase,
        mac_verified,
    };

    // AuthenticatedSafe ::= SEQUENCE OF ContentInfo
    let safes = Element::parse_exact(&envelope.auth_safe)
        .and_then(|e| e.sequence("AuthenticatedSafe"))
        .map_err(|e| LoadError::malformed(format!("unreadable AuthenticatedSafe: {}", e)))?;

    let mut contents = PfxContents::default();
    for safe in &safes {
        reader.read_safe(safe, &mut contents)?;
    }

    tracing::trace!(
        keys = contents.keys.len(),
        certificates = contents.certificates.len(),
        mac_verified,
        "Read PKCS#12 bags"
    );

    Ok(contents)
}

struct MacData {
    digest_oid: String,
    digest: Vec<u8>,
    salt: Vec<u8>,
    iterations: u32,
}

struct Envelope {
    /// Content octets of the pkcs7-data authSafe, as covered by the MAC
    auth_safe: Vec<u8>,
    mac: Option<MacData>,
}

impl Envelope {
    fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.is_empty() {
            return Err(LoadError::malformed("bundle is empty"));
        }

        Self::parse_fields(data).map_err(|e| LoadError::malformed(e.to_string()))
    }

    fn parse_fields(data: &[u8]) -> Result<Self, BerError> {
        let pfx = Element::parse_exact(data)?;
        let fields = pfx.sequence("PFX")?;

        let version = fields
            .first()
            .ok_or_else(|| BerError("PFX version is missing".to_string()))?
            .u32()
            .map_err(|e| BerError(format!("PFX version: {}", e)))?;
        if version != PFX_VERSION {
            return Err(BerError(format!("unsupported PFX version {}", version)));
        }

        let auth_safe = fields
            .get(1)
            .ok_or_else(|| BerError("PFX authSafe is missing".to_string()))?;
        let (content_type, content) = content_info(auth_safe, "authSafe")?;

        let auth_safe = match content_type.as_str() {
            PKCS7_DATA_OID => content
                .ok_or_else(|| BerError("authSafe has no content".to_string()))?
                .octet_string()?,
            PKCS7_SIGNED_DATA_OID => {
                return Err(BerError(
                    "public-key integrity mode (signedData) is not supported".to_string(),
                ))
            }
            other => {
                return Err(BerError(format!(
                    "unexpected authSafe content type {}",
                    other
                )))
            }
        };

        let mac = fields.get(2).map(parse_mac_data).transpose()?;

        if fields.len() > 3 {
            return Err(BerError("unexpected fields after PFX macData".to_string()));
        }

        Ok(Envelope { auth_safe, mac })
    }
}

/// ContentInfo ::= SEQUENCE { contentType OBJECT IDENTIFIER, content [0] EXPLICIT ANY OPTIONAL }
fn content_info<'a>(
    element: &Element<'a>,
    what: &str,
) -> Result<(String, Option<Element<'a>>), BerError> {
    let fields = element.sequence(what)?;
    let content_type = fields
        .first()
        .ok_or_else(|| BerError(format!("{} content type is missing", what)))?
        .oid()?;
    let content = fields
        .get(1)
        .map(|c| c.explicit(0, what))
        .transpose()?;
    Ok((content_type, content))
}

/// MacData ::= SEQUENCE { mac DigestInfo, macSalt OCTET STRING, iterations INTEGER DEFAULT 1 }
fn parse_mac_data(element: &Element<'_>) -> Result<MacData, BerError> {
    let fields = element.sequence("MacData")?;
    let (digest_info, salt) = match fields.as_slice() {
        [digest_info, salt, ..] => (digest_info, salt.octet_string()?),
        _ => return Err(BerError("MacData is incomplete".to_string())),
    };
    let iterations = match fields.get(2) {
        Some(iterations) => iterations.u32()?,
        None => 1,
    };

    // DigestInfo ::= SEQUENCE { digestAlgorithm AlgorithmIdentifier, digest OCTET STRING }
    let digest_fields = digest_info.sequence("MAC DigestInfo")?;
    let (algorithm, digest) = match digest_fields.as_slice() {
        [algorithm, digest] => (algorithm, digest.octet_string()?),
        _ => return Err(BerError("MAC DigestInfo is incomplete".to_string())),
    };
    let digest_oid = algorithm
        .sequence("MAC algorithm")?
        .first()
        .ok_or_else(|| BerError("MAC algorithm is empty".to_string()))?
        .oid()?;

    Ok(MacData {
        digest_oid,
        digest,
        salt,
        iterations,
    })
}

struct BagReader<'p> {
    passphrase: &'p str,
    mac_verified: bool,
}

impl BagReader<'_> {
    /// Classify a failure on data only reachable through the passphrase.
    ///
    /// With a verified MAC the passphrase is known to be right, so damage
    /// is structural; without one a wrong passphrase yields garbage.
    fn undecodable(&self, message: String) -> LoadError {
        if self.mac_verified {
            LoadError::malformed(message)
        } else {
            LoadError::decryption(message)
        }
    }

    fn decrypt(&self, algorithm: &Element<'_>, ciphertext: &[u8]) -> Result<Vec<u8>, LoadError> {
        pbe::decrypt(algorithm, ciphertext, self.passphrase).map_err(|e| match e {
            PbeError::Unsupported(message) => LoadError::malformed(message),
            PbeError::Rejected(message) => self.undecodable(message),
        })
    }

    fn read_safe(&self, safe: &Element<'_>, contents: &mut PfxContents) -> Result<(), LoadError> {
        let (content_type, content) = content_info(safe, "AuthenticatedSafe entry")
            .map_err(|e| LoadError::malformed(e.to_string()))?;
        let content = content.ok_or_else(|| {
            LoadError::malformed("AuthenticatedSafe entry has no content".to_string())
        })?;

        match content_type.as_str() {
            PKCS7_DATA_OID => {
                let safe_contents = content
                    .octet_string()
                    .map_err(|e| LoadError::malformed(format!("SafeContents: {}", e)))?;
                let bags = Element::parse_exact(&safe_contents)
                    .and_then(|e| e.sequence("SafeContents"))
                    .map_err(|e| LoadError::malformed(format!("unreadable SafeContents: {}", e)))?;
                self.read_bags(&bags, contents, 0)
            }
            PKCS7_ENCRYPTED_DATA_OID => {
                let plaintext = self.decrypt_encrypted_data(&content)?;
                let bags = Element::parse_exact(&plaintext)
                    .and_then(|e| e.sequence("SafeContents"))
                    .map_err(|e| {
                        self.undecodable(format!("decrypted SafeContents is unreadable: {}", e))
                    })?;
                self.read_bags(&bags, contents, 0)
            }
            other => Err(LoadError::malformed(format!(
                "unsupported AuthenticatedSafe content type {}",
                other
            ))),
        }
    }

    fn decrypt_encrypted_data(&self, content: &Element<'_>) -> Result<Vec<u8>, LoadError> {
        let (algorithm, ciphertext) =
            encrypted_content(content).map_err(|e| LoadError::malformed(e.to_string()))?;

        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        self.decrypt(&algorithm, &ciphertext)
    }

    /// SafeBag ::= SEQUENCE { bagId OBJECT IDENTIFIER, bagValue [0] EXPLICIT ANY, bagAttributes SET OPTIONAL }
    fn read_bags(
        &self,
        bags: &[Element<'_>],
        contents: &mut PfxContents,
        depth: usize,
    ) -> Result<(), LoadError> {
        if depth > MAX_BAG_DEPTH {
            return Err(LoadError::malformed("SafeContents nested too deeply"));
        }

        for bag in bags {
            let (bag_id, value) = bag
                .sequence("SafeBag")
                .and_then(|fields| {
                    let bag_id = fields
                        .first()
                        .ok_or_else(|| BerError("SafeBag id is missing".to_string()))?
                        .oid()?;
                    let value = fields
                        .get(1)
                        .ok_or_else(|| BerError("SafeBag value is missing".to_string()))?
                        .explicit(0, "SafeBag value")?;
                    Ok((bag_id, value))
                })
                .map_err(|e| LoadError::malformed(format!("unreadable SafeBag: {}", e)))?;

            match bag_id.as_str() {
                KEY_BAG_OID => {
                    check_private_key_info(value.raw)
                        .map_err(|e| LoadError::malformed(format!("key bag: {}", e)))?;
                    contents.keys.push(value.raw.to_vec());
                }
                SHROUDED_KEY_BAG_OID => {
                    let key = self.read_shrouded_key(&value)?;
                    contents.keys.push(key);
                }
                CERT_BAG_OID => {
                    contents.certificates.push(read_cert_bag(&value)?);
                }
                SAFE_CONTENTS_BAG_OID => {
                    let nested = value
                        .sequence("nested SafeContents")
                        .map_err(|e| LoadError::malformed(e.to_string()))?;
                    self.read_bags(&nested, contents, depth + 1)?;
                }
                // CRL and secret bags carry nothing a signer needs
                _ => {}
            }
        }

        Ok(())
    }

    /// EncryptedPrivateKeyInfo ::= SEQUENCE { encryptionAlgorithm, encryptedData OCTET STRING }
    fn read_shrouded_key(&self, value: &Element<'_>) -> Result<Vec<u8>, LoadError> {
        let (algorithm, ciphertext) = value
            .sequence("EncryptedPrivateKeyInfo")
            .and_then(|fields| match fields.as_slice() {
                [algorithm, encrypted] => Ok((*algorithm, encrypted.octet_string()?)),
                _ => Err(BerError("EncryptedPrivateKeyInfo is incomplete".to_string())),
            })
            .map_err(|e| LoadError::malformed(format!("shrouded key bag: {}", e)))?;

        let key = self.decrypt(&algorithm, &ciphertext)?;
        check_private_key_info(&key)
            .map_err(|e| self.undecodable(format!("decrypted private key is unreadable: {}", e)))?;
        Ok(key)
    }
}

/// EncryptedData ::= SEQUENCE { version, EncryptedContentInfo }
///
/// EncryptedContentInfo ::= SEQUENCE { contentType, contentEncryptionAlgorithm,
///                                     encryptedContent [0] IMPLICIT OCTET STRING OPTIONAL }
fn encrypted_content<'a>(content: &Element<'a>) -> Result<(Element<'a>, Vec<u8>), BerError> {
    let fields = content.sequence("EncryptedData")?;
    let info = fields
        .get(1)
        .ok_or_else(|| BerError("EncryptedContentInfo is missing".to_string()))?
        .sequence("EncryptedContentInfo")?;
    let algorithm = *info
        .get(1)
        .ok_or_else(|| BerError("content encryption algorithm is missing".to_string()))?;
    let ciphertext = match info.get(2) {
        Some(encrypted) if encrypted.is_context(0) => encrypted.octets()?,
        Some(_) => return Err(BerError("encryptedContent is not tagged [0]".to_string())),
        None => Vec::new(),
    };
    Ok((algorithm, ciphertext))
}

/// PrivateKeyInfo ::= SEQUENCE { version INTEGER, privateKeyAlgorithm, privateKey OCTET STRING, ... }
fn check_private_key_info(der: &[u8]) -> Result<(), BerError> {
    let fields = Element::parse_exact(der)?.sequence("PrivateKeyInfo")?;
    if fields.len() < 3 {
        return Err(BerError("PrivateKeyInfo is incomplete".to_string()));
    }
    fields[0].u32()?;
    Ok(())
}

/// CertBag ::= SEQUENCE { certId OBJECT IDENTIFIER, certValue [0] EXPLICIT OCTET STRING }
fn read_cert_bag(value: &Element<'_>) -> Result<Vec<u8>, LoadError> {
    let (cert_id, cert_value) = value
        .sequence("CertBag")
        .and_then(|fields| match fields.as_slice() {
            [cert_id, cert_value] => Ok((cert_id.oid()?, *cert_value)),
            _ => Err(BerError("CertBag is incomplete".to_string())),
        })
        .map_err(|e| LoadError::malformed(format!("certificate bag: {}", e)))?;

    if cert_id != X509_CERTIFICATE_OID {
        return Err(LoadError::invalid_contents(format!(
            "certificate bag holds unsupported certificate type {}",
            cert_id
        )));
    }

    cert_value
        .explicit(0, "certValue")
        .and_then(|v| v.octet_string())
        .map_err(|e| LoadError::malformed(format!("certificate bag: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert_ops::ber::encode;
    use crate::utils::LoadErrorKind;

    const DATA_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];

    fn pfx(version: u8, auth_safe_octets: &[u8]) -> Vec<u8> {
        let content_info = encode(
            0x30,
            &[
                encode(0x06, &DATA_OID),
                encode(0xa0, &encode(0x04, auth_safe_octets)),
            ]
            .concat(),
        );
        encode(0x30, &[encode(0x02, &[version]), content_info].concat())
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = read_pfx(&[], "").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MalformedBundle);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = read_pfx(b"this is not a certificate", "").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MalformedBundle);
    }

    #[test]
    fn test_wrong_version_is_malformed() {
        let err = read_pfx(&pfx(2, &encode(0x30, &[])), "").unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let mut data = pfx(3, &encode(0x30, &[]));
        data.push(0x00);
        let err = read_pfx(&data, "").unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_empty_authenticated_safe_reads_nothing() {
        let contents = read_pfx(&pfx(3, &encode(0x30, &[])), "").unwrap();
        assert!(contents.keys.is_empty());
        assert!(contents.certificates.is_empty());
    }

    #[test]
    fn test_unreadable_authenticated_safe_is_malformed() {
        let err = read_pfx(&pfx(3, b"garbage"), "any").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MalformedBundle);
    }

    #[test]
    fn test_signed_data_auth_safe_is_malformed() {
        let signed_data_oid = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];
        let content_info = encode(
            0x30,
            &[encode(0x06, &signed_data_oid), encode(0xa0, &encode(0x30, &[]))].concat(),
        );
        let data = encode(0x30, &[encode(0x02, &[3]), content_info].concat());

        let err = read_pfx(&data, "").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::MalformedBundle);
        assert!(err.to_string().contains("signedData"));
    }

    #[test]
    fn test_private_key_info_shape() {
        let key = encode(
            0x30,
            &[
                encode(0x02, &[0]),
                encode(0x30, &encode(0x06, &[0x2a, 0x03])),
                encode(0x04, &[1, 2, 3]),
            ]
            .concat(),
        );
        assert!(check_private_key_info(&key).is_ok());
        assert!(check_private_key_info(&encode(0x30, &encode(0x02, &[0]))).is_err());
    }
}
