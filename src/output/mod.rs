//! Output formatting module
//!
//! Provides rich terminal output and JSON export.

pub mod json;
pub mod terminal;

pub use json::print_json;
pub use terminal::{
    print_certificate_material, print_error, print_header, print_health_report, print_info,
    print_success, print_warning,
};
