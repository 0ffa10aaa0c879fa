//! rocketlog CLI - Command-line tool for rocket flight data loggers.
//!
//! ## Features
//!
//! - Download recorded flight data to a file
//! - Reformat the logger's EEPROM
//! - Interactive serial port selection
//! - Shell completion generation
//! - Environment variable and config file support

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use log::debug;
use rocketlog::port::{DEFAULT_BAUD, validate_baud};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

mod commands;
mod config;
mod progress;
mod serial;

use config::Config;
use serial::{SerialOptions, select_serial_port};

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Set by the Ctrl-C handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if animations should be used (TTY and colors enabled).
pub(crate) fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// Whether the user pressed Ctrl-C.
pub(crate) fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// rocketlog - Download and reformat rocket flight data loggers.
///
/// Environment variables:
///   ROCKETLOG_PORT              - Default serial port
///   ROCKETLOG_BAUD              - Default baud rate (default: 115200)
///   ROCKETLOG_NON_INTERACTIVE   - Non-interactive mode (disable prompts)
#[derive(Parser)]
#[command(name = "rocketlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = concat!(
    "Examples:\n",
    "  rocketlog -p /dev/ttyUSB0 download flight1.txt\n",
    "  rocketlog reformat --yes\n",
    "  rocketlog list-ports --json",
))]
pub(crate) struct Cli {
    /// Serial port to use (prompted for if not specified).
    #[arg(short, long, global = true, env = "ROCKETLOG_PORT")]
    port: Option<String>,

    /// Baud rate (1200, 2400, 9600, 19200 or 115200).
    #[arg(short, long, global = true, env = "ROCKETLOG_BAUD", value_parser = parse_baud)]
    baud: Option<u32>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Non-interactive mode (fail instead of prompting).
    #[arg(long, global = true, env = "ROCKETLOG_NON_INTERACTIVE")]
    non_interactive: bool,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Download the recorded flight data to a file.
    Download {
        /// Output file (default: Data.txt).
        output: Option<PathBuf>,

        /// Reformat the logger after a successful download.
        #[arg(long)]
        reformat: bool,

        /// Don't ask for confirmation before reformatting.
        #[arg(short, long)]
        yes: bool,
    },

    /// Erase all data on the logger.
    Reformat {
        /// Don't ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// List available serial ports.
    ListPorts {
        /// Output port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse and validate a baud rate argument.
fn parse_baud(s: &str) -> Result<u32, String> {
    let baud: u32 = s
        .trim()
        .parse()
        .map_err(|e| format!("Invalid baud rate '{s}': {e}"))?;
    validate_baud(baud).map_err(|e| e.to_string())
}

/// CLI failures with a fixed exit code class.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Bad invocation or missing input (exit 2).
    #[error("{0}")]
    Usage(String),
    /// Invalid configuration (exit 3).
    #[error("{0}")]
    Config(String),
    /// User or signal cancelled the operation (exit 130).
    #[error("{0}")]
    Cancelled(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::Cancelled(_) => 130,
        }
    }
}

/// Exit code for a library error.
fn library_exit_code(err: &rocketlog::Error) -> i32 {
    match err {
        e if e.is_interrupted() => 130,
        rocketlog::Error::Config(_) => 3,
        rocketlog::Error::Connection(_)
        | rocketlog::Error::Io(_)
        | rocketlog::Error::UnexpectedPreamble(_)
        | rocketlog::Error::UnexpectedPrompt(_)
        | rocketlog::Error::UnexpectedLine(_)
        | rocketlog::Error::PageCountMismatch(_) => 4,
    }
}

/// Map an error to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return cli_err.exit_code();
        }
        if let Some(lib_err) = cause.downcast_ref::<rocketlog::Error>() {
            return library_exit_code(lib_err);
        }
    }
    1
}

/// Resolve the serial port: CLI/env, then config, then discovery.
pub(crate) fn get_port(cli: &Cli, config: &Config) -> Result<String> {
    let options = SerialOptions {
        port: cli.port.clone(),
        non_interactive: cli.non_interactive,
    };
    select_serial_port(&options, config)
}

/// Resolve the baud rate: CLI/env, then config, then the default.
pub(crate) fn get_baud(cli: &Cli, config: &Config) -> Result<u32> {
    if let Some(baud) = cli.baud {
        return Ok(baud);
    }

    match config.connection.baud {
        Some(baud) => {
            validate_baud(baud).map_err(|e| CliError::Config(format!("config: {e}")).into())
        },
        None => Ok(DEFAULT_BAUD),
    }
}

fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(|| {
        if INTERRUPTED.swap(true, Ordering::Relaxed) {
            // Second Ctrl-C: give up on a clean shutdown.
            std::process::exit(130);
        }
    }) {
        debug!("Failed to install Ctrl-C handler: {e}");
    }
    rocketlog::set_interrupt_checker(was_interrupted);
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        commands::completions::cmd_completions(*shell);
        return Ok(());
    }

    let config = match &cli.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match &cli.command {
        Commands::Download {
            output,
            reformat,
            yes,
        } => commands::download::cmd_download(cli, &config, output.as_deref(), *reformat, *yes),
        Commands::Reformat { yes } => commands::reformat::cmd_reformat(cli, &config, *yes),
        Commands::ListPorts { json } => {
            commands::ports::cmd_list_ports(*json);
            Ok(())
        },
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var_os("NO_COLOR").is_some() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "rocketlog v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    install_interrupt_handler();

    if let Err(err) = run(&cli) {
        let code = if was_interrupted() {
            130
        } else {
            exit_code_for(&err)
        };
        eprintln!("{} {err:#}", style("Error:").red().bold());
        std::process::exit(code);
    }
}
