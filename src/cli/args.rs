//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nfse-cert")]
#[command(version)]
#[command(about = "Inspect and monitor the PKCS#12 certificate used for NFS-e emission", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Path to a settings file (defaults to config/default.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Never prompt for a passphrase
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Whether a passphrase prompt may be shown
    pub fn allows_prompt(&self) -> bool {
        if self.non_interactive {
            return false;
        }
        match &self.command {
            SubCommand::Inspect(args) => !args.json,
            SubCommand::Export(_) => true,
            SubCommand::Health(_) => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Load a PKCS#12 bundle and show its certificate
    Inspect(InspectArgs),

    /// Write the certificate and private key of a PKCS#12 bundle as PEM files
    Export(ExportArgs),

    /// Report the status of the configured certificate
    Health(HealthArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PKCS#12 file (.pfx / .p12)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Bundle passphrase (an empty value is a valid passphrase)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Days below which a valid certificate is reported as expiring soon
    #[arg(long, default_value = "30")]
    pub expiring_soon_days: i64,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// PKCS#12 file (.pfx / .p12)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Bundle passphrase (an empty value is a valid passphrase)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Output path for the certificate PEM
    #[arg(long, value_name = "FILE")]
    pub cert_out: PathBuf,

    /// Output path for the private key PEM
    #[arg(long, value_name = "FILE")]
    pub key_out: PathBuf,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with a non-zero status unless the certificate is usable
    #[arg(long)]
    pub strict: bool,
}
