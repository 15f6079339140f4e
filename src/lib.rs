//! nfse-cert Library
//!
//! Loads the PKCS#12 client certificate used for NFS-e emission:
//! - Classified PKCS#12 loading (malformed, wrong passphrase, bad contents)
//! - SHA-1 thumbprint and PEM extraction of the leaf certificate and key
//! - Validity window evaluation and health status labels
//! - Caller-owned caching and configuration-driven certificate state
//!
//! # Usage
//!
//! ```rust,ignore
//! use nfse_cert::cert_ops::load_certificate;
//!
//! let bytes = std::fs::read("client.pfx")?;
//! let material = load_certificate(&bytes, "secret")?;
//! println!("{} expires in {} days", material.thumbprint, material.days_to_expire);
//! ```

pub mod cert_ops;
pub mod cli;
pub mod config;
pub mod models;
pub mod output;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use cert_ops::{load_certificate, load_certificate_at, CertificateCache, CertificateProvider};
pub use cli::Cli;
pub use config::Settings;
pub use models::{CertificateMaterial, CertificateState, CertificateStatus};
pub use report::HealthReport;
pub use utils::{LoadError, LoadErrorKind};
