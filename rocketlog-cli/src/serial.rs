//! Interactive serial port selection.
//!
//! The port comes from, in order:
//! - the `--port` flag (or `ROCKETLOG_PORT`)
//! - the config file
//! - the ports found on this machine: one is used directly, several are
//!   offered in a prompt that defaults to the last one
//!
//! Non-interactive mode never prompts.

use {
    crate::{CliError, config::Config},
    anyhow::Result,
    console::style,
    dialoguer::{Error as DialoguerError, Select, theme::ColorfulTheme},
    log::{debug, info},
    rocketlog::{PortInfo, discover_ports, format_port},
    std::{cmp::Ordering, io::IsTerminal},
};

/// Options for serial port selection.
#[derive(Debug, Clone, Default)]
pub struct SerialOptions {
    /// Explicit port specified via CLI.
    pub port: Option<String>,
    /// Non-interactive mode (fail if there is no single port).
    pub non_interactive: bool,
}

fn usage_err(message: &str) -> anyhow::Error {
    CliError::Usage(message.to_string()).into()
}

fn select_non_interactive_port(ports: Vec<PortInfo>) -> Result<String> {
    match ports.len().cmp(&1) {
        Ordering::Equal => ports
            .into_iter()
            .next()
            .map(|p| p.name)
            .ok_or_else(|| usage_err("No serial ports available")),
        Ordering::Greater => Err(usage_err(
            "Multiple serial ports found; use --port to choose one",
        )),
        Ordering::Less => Err(usage_err("No serial ports available")),
    }
}

/// Select a serial port interactively or automatically.
pub fn select_serial_port(options: &SerialOptions, config: &Config) -> Result<String> {
    // If port explicitly specified, use it
    if let Some(port_name) = &options.port {
        return Ok(port_name.clone());
    }

    // If port in config, use it
    if let Some(port_name) = &config.connection.serial {
        debug!("Using port from config: {port_name}");
        return Ok(port_name.clone());
    }

    let ports = discover_ports();

    if ports.is_empty() {
        return Err(usage_err("No serial ports found; connect the logger or use --port"));
    }

    // Non-interactive mode must never prompt
    if options.non_interactive {
        return select_non_interactive_port(ports);
    }

    if ports.len() == 1 {
        let port = select_non_interactive_port(ports)?;
        info!("Auto-selected port: {port}");
        return Ok(port);
    }

    ensure_interactive_terminal()?;
    select_port_interactive(ports)
}

pub(crate) fn ensure_interactive_terminal() -> Result<()> {
    if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
        Ok(())
    } else {
        Err(usage_err(
            "Interactive prompt requires a terminal; use --non-interactive with explicit options",
        ))
    }
}

pub(crate) fn map_prompt_error(err: DialoguerError) -> anyhow::Error {
    match err {
        DialoguerError::IO(io_err) => {
            if io_err.kind() == std::io::ErrorKind::Interrupted {
                CliError::Cancelled("Cancelled".to_string()).into()
            } else {
                usage_err("Failed to read from the terminal")
            }
        },
    }
}

/// Index the prompt starts on: the last enumerated port.
fn default_index(ports: &[PortInfo]) -> usize {
    ports.len().saturating_sub(1)
}

/// Interactive port selection.
fn select_port_interactive(ports: Vec<PortInfo>) -> Result<String> {
    eprintln!(
        "{} Found {} serial ports",
        style("ℹ").blue(),
        ports.len()
    );

    // Truncate labels to fit terminal width to prevent wrapping in narrow
    // terminals.
    let term_width = console::Term::stderr().size().1 as usize;
    let max_item_width = term_width.saturating_sub(4);
    let labels: Vec<String> = ports
        .iter()
        .map(|p| console::truncate_str(&format_port(p), max_item_width, "\u{2026}").into_owned())
        .collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select the logger's serial port")
        .items(&labels)
        .default(default_index(&ports))
        .interact_opt()
        .map_err(map_prompt_error)?;

    match selection {
        Some(index) => ports
            .into_iter()
            .nth(index)
            .map(|p| p.name)
            .ok_or_else(|| anyhow::anyhow!("Invalid port index: {index}")),
        None => Err(CliError::Cancelled("Port selection cancelled".to_string()).into()),
    }
}
