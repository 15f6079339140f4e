//! nfse-cert - PKCS#12 certificate inspection for NFS-e emission
//!
//! This tool provides functionality for:
//! - Inspecting a PKCS#12 bundle (thumbprint, validity window, status)
//! - Exporting the certificate and private key as PEM files
//! - Reporting the health of the configured signing certificate

use clap::Parser;
use console::style;
use nfse_cert::cert_ops::runner;
use nfse_cert::cli::{Cli, SubCommand};
use nfse_cert::config;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let allow_prompt = cli.allows_prompt();

    match &cli.command {
        SubCommand::Inspect(args) => runner::run_inspect(args, allow_prompt, cli.verbose),
        SubCommand::Export(args) => runner::run_export(args, allow_prompt),
        SubCommand::Health(args) => {
            let settings = config::load_config(cli.config.as_deref())?;
            runner::run_health(&settings, args)
        }
    }
}
