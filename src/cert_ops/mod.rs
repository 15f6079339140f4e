//! Certificate bundle operations module
//!
//! Loads PKCS#12 bundles into certificate material, and provides the
//! sources, cache and provider that make a configured certificate available.

pub mod ber;
pub mod cache;
pub mod loader;
pub mod pbe;
pub mod pfx;
pub mod provider;
pub mod runner;
pub mod source;

pub use cache::CertificateCache;
pub use loader::{load_certificate, load_certificate_at, sha1_thumbprint};
pub use pfx::{read_pfx, PfxContents};
pub use provider::CertificateProvider;
pub use source::BundleSource;
