use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use cloak::commands;
use cloak::config::Config;
use cloak::exit_codes;
use cloak::output::{JsonError, Output};

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "cloak")]
#[command(version = VERSION)]
#[command(about = "Format-preserving CSV anonymization", long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Path to config file (default: ./cloak.toml)
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,

    /// Minimal output (errors only)
    #[arg(long, global = true)]
    quiet: bool,

    /// Show per-cell diagnostics
    #[arg(long, global = true)]
    verbose: bool,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize a CSV file
    Run {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Profile name (built-in or from cloak.toml)
        #[arg(short, long)]
        profile: Option<String>,

        /// Override the profile's mode (fake, fpe, hmac, hybrid)
        #[arg(short, long)]
        mode: Option<String>,

        /// Seed for deterministic output (overrides CLOAK_SEED and profile)
        #[arg(short, long)]
        seed: Option<String>,

        /// Mapping vault path (enables reversible anonymization)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Vault password (prompted when omitted and a vault is used)
        #[arg(long)]
        password: Option<String>,

        /// Only anonymize these columns (comma-separated)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },

    /// Show the first rows original vs anonymized, without writing output
    Preview {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of rows to preview
        #[arg(short = 'n', long, default_value_t = 10)]
        rows: usize,

        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,

        /// Override the profile's mode
        #[arg(short, long)]
        mode: Option<String>,

        /// Seed for deterministic output
        #[arg(short, long)]
        seed: Option<String>,

        /// Only anonymize these columns (comma-separated)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },

    /// Show the detected column types for a CSV file
    Schema {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Profile name (for its type overrides)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Map an anonymized value back to its original
    Reverse {
        /// Mapping vault path
        #[arg(long)]
        vault: PathBuf,

        /// Vault password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Key file exported with `cloak vault export-key`
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Column the value was anonymized under
        #[arg(short, long)]
        column: String,

        /// Seed the value was anonymized with
        #[arg(short, long)]
        seed: Option<String>,

        /// The anonymized value
        value: String,
    },

    /// Vault maintenance
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },

    /// List built-in and configured profiles
    Profiles,
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Show mapping counts per type and column
    Stats {
        /// Mapping vault path
        #[arg(long)]
        vault: PathBuf,

        /// Vault password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Export the encryption key to a JSON file
    ExportKey {
        /// Mapping vault path
        #[arg(long)]
        vault: PathBuf,

        /// Vault password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Destination key file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let out = Output::new(cli.json, cli.quiet, cli.verbose);

    let exit_code = match dispatch(&cli, &out) {
        Ok(code) => code,
        Err(err) => {
            if out.is_json() {
                let _ = out.json(&JsonError::new(format!("{:#}", err)));
            } else {
                eprintln!("{} {:#}", "Error:".red(), err);
            }
            failure_code(&err)
        }
    };
    std::process::exit(exit_code);
}

fn dispatch(cli: &Cli, out: &Output) -> Result<i32> {
    let config = Config::load(cli.config_path.as_deref())?;

    match &cli.command {
        Commands::Run {
            input,
            output,
            profile,
            mode,
            seed,
            vault,
            password,
            columns,
        } => commands::run(
            &config,
            input,
            output,
            profile.as_deref(),
            mode.as_deref(),
            seed.as_deref(),
            vault.as_deref(),
            password.as_deref(),
            columns.as_deref(),
            out,
        ),
        Commands::Preview {
            input,
            rows,
            profile,
            mode,
            seed,
            columns,
        } => commands::preview(
            &config,
            input,
            *rows,
            profile.as_deref(),
            mode.as_deref(),
            seed.as_deref(),
            columns.as_deref(),
            out,
        ),
        Commands::Schema { input, profile } => {
            commands::schema(&config, input, profile.as_deref(), out)
        }
        Commands::Reverse {
            vault,
            password,
            key_file,
            column,
            seed,
            value,
        } => commands::reverse(
            vault,
            password.as_deref(),
            key_file.as_deref(),
            column,
            value,
            seed.as_deref(),
            out,
        ),
        Commands::Vault { command } => match command {
            VaultCommands::Stats { vault, password } => {
                commands::vault_stats(vault, password.as_deref(), out)
            }
            VaultCommands::ExportKey {
                vault,
                password,
                output,
            } => commands::vault_export_key(vault, password.as_deref(), output, out),
        },
        Commands::Profiles => commands::profiles(&config, out),
    }
}

/// Map an error chain onto the exit code policy.
fn failure_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(engine_err) = cause.downcast_ref::<cloak::Error>() {
            return match engine_err {
                cloak::Error::VaultUnavailable(_) | cloak::Error::CryptoKeyMismatch => {
                    exit_codes::VAULT_FAILURE
                }
                _ => exit_codes::OPERATIONAL_FAILURE,
            };
        }
    }
    if err.to_string().contains("Config file") {
        exit_codes::CONFIG_ERROR
    } else {
        exit_codes::OPERATIONAL_FAILURE
    }
}

/// Engine diagnostics go to stderr; CLOAK_LOG (then RUST_LOG) controls
/// the filter.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("CLOAK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
