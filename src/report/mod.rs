//! Report generation module
//!
//! Builds the health payload consumed by status endpoints and the CLI.

pub mod health;

pub use health::HealthReport;
