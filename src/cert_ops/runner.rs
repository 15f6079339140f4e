//! Runner for the inspect, export and health commands
//!
//! Connects bundle sources, the loader and the provider to the output
//! formatters.

use crate::cert_ops::loader::load_certificate;
use crate::cert_ops::provider::CertificateProvider;
use crate::cert_ops::source::BundleSource;
use crate::cli::{ExportArgs, HealthArgs, InspectArgs};
use crate::config::Settings;
use crate::models::{CertificateMaterial, CertificateStatus};
use crate::output::{self, print_json};
use crate::report::HealthReport;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InspectOutput<'a> {
    #[serde(flatten)]
    certificate: &'a CertificateMaterial,
    status: CertificateStatus,
}

/// Load a bundle file, prompting for a passphrase if needed.
///
/// An explicit password is tried once. Without one, the empty passphrase is
/// tried first and, if it does not open the bundle, the user is prompted
/// when a terminal is available.
fn load_with_password_prompt(
    path: &Path,
    password: Option<&str>,
    allow_prompt: bool,
) -> Result<CertificateMaterial, anyhow::Error> {
    let bytes = BundleSource::File(path.to_path_buf()).read_bytes()?;

    if let Some(pwd) = password {
        return Ok(load_certificate(&bytes, pwd)?);
    }

    match load_certificate(&bytes, "") {
        Ok(material) => Ok(material),
        Err(e) if e.kind().is_retryable() => {
            if allow_prompt && console::Term::stderr().is_term() {
                let pwd = dialoguer::Password::new()
                    .with_prompt(format!(
                        "Password for {}",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    ))
                    .allow_empty_password(true)
                    .interact()?;

                Ok(load_certificate(&bytes, &pwd)?)
            } else {
                anyhow::bail!(
                    "PKCS#12 file {} requires a password (use --password)",
                    path.display()
                );
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the `inspect` command
pub fn run_inspect(
    args: &InspectArgs,
    allow_prompt: bool,
    verbose: bool,
) -> Result<(), anyhow::Error> {
    let material = load_with_password_prompt(&args.file, args.password.as_deref(), allow_prompt)?;
    let now = material.loaded_at;
    let status = material.status_at(now, args.expiring_soon_days);

    if args.json {
        print_json(&InspectOutput {
            certificate: &material,
            status,
        })?;
    } else {
        output::print_certificate_material(&material, now, args.expiring_soon_days, verbose);
        match status {
            CertificateStatus::Valid => output::print_success("Certificate is valid"),
            CertificateStatus::ExpiringSoon => output::print_warning(&format!(
                "Certificate expires in {} days - consider renewal",
                material.days_to_expire
            )),
            CertificateStatus::Expired => {
                output::print_error("Certificate has expired and needs renewal")
            }
            CertificateStatus::NotYetValid => {
                output::print_error("Certificate is not valid yet")
            }
        }
    }

    Ok(())
}

/// Run the `export` command
pub fn run_export(args: &ExportArgs, allow_prompt: bool) -> Result<(), anyhow::Error> {
    let material = load_with_password_prompt(&args.file, args.password.as_deref(), allow_prompt)?;

    std::fs::write(&args.cert_out, &material.certificate_pem).map_err(|e| {
        anyhow::anyhow!("Failed to write {}: {}", args.cert_out.display(), e)
    })?;
    std::fs::write(&args.key_out, &material.private_key_pem).map_err(|e| {
        anyhow::anyhow!("Failed to write {}: {}", args.key_out.display(), e)
    })?;

    tracing::debug!(thumbprint = %material.thumbprint, "Exported certificate and key");
    output::print_success(&format!(
        "Wrote certificate to {} and private key to {}",
        args.cert_out.display(),
        args.key_out.display()
    ));
    output::print_info(&format!("Thumbprint: {}", material.thumbprint));

    Ok(())
}

/// Run the `health` command against the configured certificate
pub fn run_health(settings: &Settings, args: &HealthArgs) -> Result<(), anyhow::Error> {
    let provider = CertificateProvider::from_settings(&settings.certificate);
    let now = Utc::now();
    let state = provider.state_at(now);
    let threshold = settings.health.expiring_soon_days;
    let report = HealthReport::from_state(&state, now, threshold);

    if args.json {
        print_json(&report)?;
    } else {
        output::print_health_report(&report, threshold);
    }

    if args.strict && !report.is_healthy() {
        anyhow::bail!(
            "certificate is not usable (state: {}, status: {})",
            report.state,
            report
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    Ok(())
}
