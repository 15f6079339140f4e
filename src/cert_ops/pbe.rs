//! Password-based integrity and decryption for PKCS#12
//!
//! Covers the schemes produced by OpenSSL, Windows and Java keytool:
//! PBES2 (PBKDF2 with AES or 3DES) and the legacy PKCS#12 PBE modes
//! (SHA-1 with 3DES or RC2), plus the HMAC used for the integrity check.

use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecrypt, BlockDecryptMut, KeyInit, KeyIvInit};
use des::TdesEde3;
use hmac::{Mac, SimpleHmac};
use pkcs12::kdf::{self, Pkcs12KeyType};
use pkcs5::der::Decode;
use pkcs5::pbes2;
use rc2::Rc2;
use sha1::digest::{core_api::BlockSizeUser, Digest, FixedOutputReset};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::cert_ops::ber::Element;

pub const PBES2_OID: &str = "1.2.840.113549.1.5.13";
pub const PBE_SHA1_RC2_128_OID: &str = "1.2.840.113549.1.12.1.5";
pub const PBE_SHA1_RC2_40_OID: &str = "1.2.840.113549.1.12.1.6";
pub const PBE_SHA1_3DES_OID: &str = "1.2.840.113549.1.12.1.3";

pub const SHA1_OID: &str = "1.3.14.3.2.26";
pub const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";
pub const SHA384_OID: &str = "2.16.840.1.101.3.4.2.2";
pub const SHA512_OID: &str = "2.16.840.1.101.3.4.2.3";

/// Why a password-based operation did not produce plaintext
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbeError {
    /// The algorithm or its parameters cannot be used
    Unsupported(String),
    /// The key derived from the passphrase does not fit the data
    Rejected(String),
}

/// Verify the HMAC of `data` for the digest algorithm named by `digest_oid`
pub fn verify_mac(
    digest_oid: &str,
    passphrase: &str,
    salt: &[u8],
    iterations: u32,
    data: &[u8],
    expected: &[u8],
) -> Result<(), PbeError> {
    match digest_oid {
        SHA1_OID => hmac_verify::<Sha1>(passphrase, salt, iterations, data, expected),
        SHA256_OID => hmac_verify::<Sha256>(passphrase, salt, iterations, data, expected),
        SHA384_OID => hmac_verify::<Sha384>(passphrase, salt, iterations, data, expected),
        SHA512_OID => hmac_verify::<Sha512>(passphrase, salt, iterations, data, expected),
        other => Err(PbeError::Unsupported(format!(
            "unsupported MAC digest {}",
            other
        ))),
    }
}

fn hmac_verify<D>(
    passphrase: &str,
    salt: &[u8],
    iterations: u32,
    data: &[u8],
    expected: &[u8],
) -> Result<(), PbeError>
where
    D: Digest + FixedOutputReset + BlockSizeUser,
{
    let key = kdf::derive_key_utf8::<D>(
        passphrase,
        salt,
        Pkcs12KeyType::Mac,
        rounds(iterations)?,
        <D as Digest>::output_size(),
    )
    .map_err(|e| PbeError::Rejected(format!("passphrase cannot be encoded: {}", e)))?;

    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(&key)
        .map_err(|_| PbeError::Unsupported("invalid MAC key length".to_string()))?;
    Mac::update(&mut mac, data);
    mac.verify_slice(expected)
        .map_err(|_| PbeError::Rejected("MAC verification failed".to_string()))
}

/// Decrypt `ciphertext` with the scheme described by an AlgorithmIdentifier
pub fn decrypt(
    algorithm: &Element<'_>,
    ciphertext: &[u8],
    passphrase: &str,
) -> Result<Vec<u8>, PbeError> {
    let fields = algorithm
        .sequence("encryption algorithm")
        .map_err(|e| PbeError::Unsupported(e.to_string()))?;
    let oid = fields
        .first()
        .ok_or_else(|| PbeError::Unsupported("encryption algorithm is empty".to_string()))?
        .oid()
        .map_err(|e| PbeError::Unsupported(e.to_string()))?;
    let params = fields.get(1);

    match oid.as_str() {
        PBES2_OID => decrypt_pbes2(params, ciphertext, passphrase),
        PBE_SHA1_3DES_OID => decrypt_pbes1::<TdesEde3>(params, ciphertext, passphrase, 24),
        PBE_SHA1_RC2_128_OID => decrypt_pbes1::<Rc2>(params, ciphertext, passphrase, 16),
        PBE_SHA1_RC2_40_OID => decrypt_pbes1::<Rc2>(params, ciphertext, passphrase, 5),
        other => Err(PbeError::Unsupported(format!(
            "unsupported encryption scheme {}",
            other
        ))),
    }
}

fn decrypt_pbes2(
    params: Option<&Element<'_>>,
    ciphertext: &[u8],
    passphrase: &str,
) -> Result<Vec<u8>, PbeError> {
    let params = params
        .ok_or_else(|| PbeError::Unsupported("PBES2 parameters are missing".to_string()))?;
    let parameters = pbes2::Parameters::from_der(params.raw)
        .map_err(|e| PbeError::Unsupported(format!("invalid PBES2 parameters: {}", e)))?;

    parameters
        .decrypt(passphrase.as_bytes(), ciphertext)
        .map_err(|e| match e {
            pkcs5::Error::DecryptFailed => PbeError::Rejected("PBES2 decryption failed".to_string()),
            other => PbeError::Unsupported(format!("unsupported PBES2 scheme: {}", other)),
        })
}

/// PKCS#12 appendix B key derivation with SHA-1 and an 8-byte-block CBC cipher
fn decrypt_pbes1<C>(
    params: Option<&Element<'_>>,
    ciphertext: &[u8],
    passphrase: &str,
    key_len: usize,
) -> Result<Vec<u8>, PbeError>
where
    C: BlockCipher + BlockDecrypt + KeyInit,
{
    // pkcs-12PbeParams ::= SEQUENCE { salt OCTET STRING, iterations INTEGER }
    let fields = params
        .ok_or_else(|| PbeError::Unsupported("PBE parameters are missing".to_string()))?
        .sequence("PBE parameters")
        .map_err(|e| PbeError::Unsupported(e.to_string()))?;
    let (salt, iterations) = match fields.as_slice() {
        [salt, iterations] => (
            salt.octet_string()
                .map_err(|e| PbeError::Unsupported(e.to_string()))?,
            iterations
                .u32()
                .map_err(|e| PbeError::Unsupported(e.to_string()))?,
        ),
        _ => return Err(PbeError::Unsupported("invalid PBE parameters".to_string())),
    };
    let rounds = rounds(iterations)?;

    let derive = |key_type, len| {
        kdf::derive_key_utf8::<Sha1>(passphrase, &salt, key_type, rounds, len)
            .map_err(|e| PbeError::Rejected(format!("passphrase cannot be encoded: {}", e)))
    };
    let key = derive(Pkcs12KeyType::EncryptionKey, key_len)?;
    let iv = derive(Pkcs12KeyType::Iv, 8)?;

    let cipher = cbc::Decryptor::<C>::new_from_slices(&key, &iv)
        .map_err(|_| PbeError::Unsupported("invalid cipher key length".to_string()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PbeError::Rejected("bad padding after decryption".to_string()))
}

fn rounds(iterations: u32) -> Result<i32, PbeError> {
    match i32::try_from(iterations) {
        Ok(rounds) if rounds > 0 => Ok(rounds),
        _ => Err(PbeError::Unsupported(format!(
            "unsupported iteration count {}",
            iterations
        ))),
    }
}
