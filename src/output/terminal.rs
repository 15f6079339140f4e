//! Rich terminal output formatting

use crate::models::{CertificateMaterial, CertificateStatus};
use crate::report::HealthReport;
use chrono::{DateTime, Utc};
use console::style;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style as TabledStyle},
    Table, Tabled,
};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

fn render_rows(rows: Vec<FieldRow>) -> String {
    Table::new(rows)
        .with(TabledStyle::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Print section header
pub fn print_header(title: &str) {
    println!();
    println!("{}", style(format!("━━━ {} ━━━", title)).cyan().bold());
    println!();
}

/// Print certificate material as of `now`
pub fn print_certificate_material(
    material: &CertificateMaterial,
    now: DateTime<Utc>,
    expiring_soon_days: i64,
    verbose: bool,
) {
    print_header("Certificate");

    let mut rows = vec![
        FieldRow::new("Subject", material.subject.clone()),
        FieldRow::new("Issuer", material.issuer.clone()),
        FieldRow::new(
            "Valid From",
            material.not_before.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        FieldRow::new(
            "Valid Until",
            material.not_after.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        FieldRow::new(
            "Days Until Expiry",
            format_expiry_days(material.days_to_expire_at(now), expiring_soon_days),
        ),
        FieldRow::new(
            "Status",
            format_status(material.status_at(now, expiring_soon_days)),
        ),
        FieldRow::new("Thumbprint (SHA-1)", material.thumbprint.clone()),
    ];

    if verbose {
        rows.push(FieldRow::new("Serial Number", material.serial.clone()));
        rows.push(FieldRow::new(
            "SHA-256 Fingerprint",
            material.fingerprint_sha256.clone(),
        ));
        rows.push(FieldRow::new(
            "Loaded At",
            material.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));
    }

    println!("{}", render_rows(rows));
}

/// Print a health report
pub fn print_health_report(report: &HealthReport, expiring_soon_days: i64) {
    print_header("Certificate Health");

    let mut rows = vec![FieldRow::new("State", report.state)];

    if let Some(thumbprint) = &report.thumbprint {
        rows.push(FieldRow::new("Thumbprint (SHA-1)", thumbprint.clone()));
    }
    if let Some(subject) = &report.subject {
        rows.push(FieldRow::new("Subject", subject.clone()));
    }
    if let Some(not_after) = report.not_after {
        rows.push(FieldRow::new(
            "Valid Until",
            not_after.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ));
    }
    if let Some(days) = report.days_to_expire {
        rows.push(FieldRow::new(
            "Days Until Expiry",
            format_expiry_days(days, expiring_soon_days),
        ));
    }
    if let Some(status) = report.status {
        rows.push(FieldRow::new("Status", format_status(status)));
    }
    if let Some(kind) = report.error_kind {
        rows.push(FieldRow::new("Error", style(kind).red().bold().to_string()));
    }
    if let Some(error) = &report.error {
        rows.push(FieldRow::new("Details", error.clone()));
    }

    println!("{}", render_rows(rows));

    match report.state {
        "not_configured" => print_warning("No certificate configured (set NFSE_CERT_PATH or NFSE_CERT_BASE64)"),
        "awaiting_password" => print_warning("Certificate configured, waiting for a passphrase (set NFSE_CERT_PASSWORD)"),
        _ => {}
    }
    if report.retryable == Some(true) {
        print_info("The passphrase did not open the bundle; try a different one");
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

fn format_expiry_days(days: i64, expiring_soon_days: i64) -> String {
    if days < 0 {
        style(format!("Expired {} days ago", days.abs()))
            .red()
            .to_string()
    } else if days == 0 {
        style("Expires today!").red().bold().to_string()
    } else if days <= 7 {
        style(format!("{} days (critical)", days))
            .red()
            .bold()
            .to_string()
    } else if days < expiring_soon_days {
        style(format!("{} days (warning)", days))
            .yellow()
            .to_string()
    } else {
        style(format!("{} days", days)).green().to_string()
    }
}

fn format_status(status: CertificateStatus) -> String {
    match status {
        CertificateStatus::Valid => style("✓ Valid").green().to_string(),
        CertificateStatus::ExpiringSoon => style("! Expiring Soon").yellow().to_string(),
        CertificateStatus::Expired => style("✗ Expired").red().to_string(),
        CertificateStatus::NotYetValid => style("✗ Not Yet Valid").red().to_string(),
    }
}
