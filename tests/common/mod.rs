//! Test fixtures: self-signed identities packed into PKCS#12 bundles at test time

#![allow(dead_code)]

use p12_keystore::{
    Certificate, EncryptionAlgorithm, KeyStore, KeyStoreEntry, MacAlgorithm, PrivateKeyChain,
};
use rcgen::{date_time_ymd, CertificateParams, DnType, KeyPair};
use sha1::{Digest, Sha1};

pub const PASSWORD: &str = "test123";

/// A certificate and its PKCS#8 private key, both DER
pub struct TestIdentity {
    pub cert_der: Vec<u8>,
    pub key_der: Vec<u8>,
}

/// Generate a self-signed identity valid between two calendar dates (midnight UTC)
pub fn identity(common_name: &str, not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> TestIdentity {
    let key_pair = KeyPair::generate().expect("Failed to generate key pair");

    let mut params = CertificateParams::new(vec![format!("{}.example.com", common_name)])
        .expect("Failed to build certificate params");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.not_before = date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = date_time_ymd(not_after.0, not_after.1, not_after.2);

    let cert = params
        .self_signed(&key_pair)
        .expect("Failed to self-sign certificate");

    TestIdentity {
        cert_der: cert.der().to_vec(),
        key_der: key_pair.serialize_der(),
    }
}

/// The identity used by most tests: valid for calendar year 2024
pub fn identity_2024() -> TestIdentity {
    identity("prestador", (2024, 1, 1), (2025, 1, 1))
}

fn key_chain(identity: &TestIdentity) -> KeyStoreEntry {
    let cert = Certificate::from_der(&identity.cert_der).expect("Failed to parse certificate");
    let local_key_id = Sha1::digest(&identity.cert_der).to_vec();
    let chain = PrivateKeyChain::new(identity.key_der.clone(), &local_key_id, vec![cert]);
    KeyStoreEntry::PrivateKeyChain(chain)
}

fn trusted_cert(identity: &TestIdentity) -> KeyStoreEntry {
    KeyStoreEntry::Certificate(
        Certificate::from_der(&identity.cert_der).expect("Failed to parse certificate"),
    )
}

fn write(keystore: &KeyStore, password: &str) -> Vec<u8> {
    keystore
        .writer(password)
        .write()
        .expect("Failed to serialize PKCS#12")
}

/// One key with its certificate
pub fn bundle(identity: &TestIdentity, password: &str) -> Vec<u8> {
    let mut keystore = KeyStore::new();
    keystore.add_entry("client", key_chain(identity));
    write(&keystore, password)
}

/// One key with its certificate, written with the legacy SHA-1 schemes older tools emit
pub fn legacy_bundle(identity: &TestIdentity, password: &str, encryption: EncryptionAlgorithm) -> Vec<u8> {
    let mut keystore = KeyStore::new();
    keystore.add_entry("client", key_chain(identity));
    keystore
        .writer(password)
        .encryption_algorithm(encryption)
        .mac_algorithm(MacAlgorithm::HmacSha1)
        .write()
        .expect("Failed to serialize PKCS#12")
}

/// One key whose chain carries further certificates.
///
/// Only the first certificate gets a localKeyId; the others are written
/// as bare certificate bags, the way `openssl pkcs12 -export -certfile` does.
pub fn bundle_with_chain(identity: &TestIdentity, chain: &[&TestIdentity], password: &str) -> Vec<u8> {
    let mut certs =
        vec![Certificate::from_der(&identity.cert_der).expect("Failed to parse certificate")];
    for other in chain {
        certs.push(Certificate::from_der(&other.cert_der).expect("Failed to parse certificate"));
    }
    let local_key_id = Sha1::digest(&identity.cert_der).to_vec();

    let mut keystore = KeyStore::new();
    keystore.add_entry(
        "client",
        KeyStoreEntry::PrivateKeyChain(PrivateKeyChain::new(
            identity.key_der.clone(),
            &local_key_id,
            certs,
        )),
    );
    write(&keystore, password)
}

/// One key with its certificate, plus standalone certificates
pub fn bundle_with_extra_certs(identity: &TestIdentity, extra: &[&TestIdentity], password: &str) -> Vec<u8> {
    let mut keystore = KeyStore::new();
    keystore.add_entry("client", key_chain(identity));
    for (i, other) in extra.iter().enumerate() {
        keystore.add_entry(&format!("extra-{}", i), trusted_cert(other));
    }
    write(&keystore, password)
}

/// Two independent keys, each with its certificate
pub fn bundle_with_two_keys(first: &TestIdentity, second: &TestIdentity, password: &str) -> Vec<u8> {
    let mut keystore = KeyStore::new();
    keystore.add_entry("first", key_chain(first));
    keystore.add_entry("second", key_chain(second));
    write(&keystore, password)
}

/// Certificates only, no private key
pub fn bundle_without_key(identity: &TestIdentity, password: &str) -> Vec<u8> {
    let mut keystore = KeyStore::new();
    keystore.add_entry("ca", trusted_cert(identity));
    write(&keystore, password)
}

/// Uppercase hex SHA-1, computed independently of the crate under test
pub fn expected_thumbprint(der: &[u8]) -> String {
    Sha1::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

// Hand-assembled containers: unencrypted, without MAC or bag attributes.

pub const DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];
pub const ENCRYPTED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x06];
pub const KEY_BAG_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x0c, 0x0a, 0x01, 0x01];
pub const CERT_BAG_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x0c, 0x0a, 0x01, 0x03];
pub const X509_CERT_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x16, 0x01];
pub const SDSI_CERT_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x16, 0x02];

/// Definite-length TLV
pub fn der(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = len.to_be_bytes().iter().copied().skip_while(|b| *b == 0).collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend(bytes);
    }
    out.extend_from_slice(content);
    out
}

/// Re-encode the outermost element with an indefinite length
pub fn indefinite(encoded: &[u8]) -> Vec<u8> {
    let header_len = if encoded[1] & 0x80 == 0 {
        2
    } else {
        2 + usize::from(encoded[1] & 0x7f)
    };
    let mut out = vec![encoded[0], 0x80];
    out.extend_from_slice(&encoded[header_len..]);
    out.extend_from_slice(&[0x00, 0x00]);
    out
}

pub fn safe_bag(bag_oid: &[u8], value: &[u8]) -> Vec<u8> {
    der(0x30, &[der(0x06, bag_oid), der(0xa0, value)].concat())
}

pub fn key_bag(key_der: &[u8]) -> Vec<u8> {
    safe_bag(KEY_BAG_OID, key_der)
}

pub fn cert_bag(cert_der: &[u8]) -> Vec<u8> {
    typed_cert_bag(X509_CERT_OID, cert_der)
}

pub fn typed_cert_bag(cert_type_oid: &[u8], value: &[u8]) -> Vec<u8> {
    let cert_bag = der(
        0x30,
        &[der(0x06, cert_type_oid), der(0xa0, &der(0x04, value))].concat(),
    );
    safe_bag(CERT_BAG_OID, &cert_bag)
}

/// ContentInfo of type pkcs7-data around `octets`
pub fn data_content_info(octets: &[u8]) -> Vec<u8> {
    der(0x30, &[der(0x06, DATA_OID), der(0xa0, &der(0x04, octets))].concat())
}

/// PFX v3 without MacData whose authSafe holds `auth_safe_octets`
pub fn raw_pfx(auth_safe_octets: &[u8]) -> Vec<u8> {
    der(0x30, &[der(0x02, &[3]), data_content_info(auth_safe_octets)].concat())
}

/// PFX v3 without MacData holding the given AuthenticatedSafe entries
pub fn pfx_from_safes(safes: &[Vec<u8>]) -> Vec<u8> {
    raw_pfx(&der(0x30, &safes.concat()))
}

/// Unencrypted, unauthenticated bundle holding `bags` in one SafeContents
pub fn plain_bundle(bags: &[Vec<u8>]) -> Vec<u8> {
    pfx_from_safes(&[data_content_info(&der(0x30, &bags.concat()))])
}
