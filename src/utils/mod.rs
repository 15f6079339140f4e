//! Utility modules for nfse-cert
//!
//! This module contains the error types shared across the crate.

pub mod error;

pub use error::{ConfigError, LoadError, LoadErrorKind, SourceError};
