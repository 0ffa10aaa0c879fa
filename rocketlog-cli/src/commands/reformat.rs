//! Reformat command implementation.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use rocketlog::{DataLogger, ReformatRequest};

use crate::config::Config;
use crate::progress::{DisplayMode, ProgressDisplay, run_with_progress};
use crate::serial::{ensure_interactive_terminal, map_prompt_error};
use crate::{Cli, CliError, get_baud, get_port};

/// Make sure the user really wants to erase the logger.
///
/// `--yes` skips the prompt; without it non-interactive mode refuses.
pub(crate) fn confirm_erase(yes: bool, non_interactive: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    if non_interactive {
        return Err(CliError::Usage(
            "Reformat erases all logged data; pass --yes to confirm in non-interactive mode"
                .to_string(),
        )
        .into());
    }

    ensure_interactive_terminal()?;
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Reformat EEPROM? All data on the logger will be erased")
        .default(false)
        .interact_opt()
        .map_err(map_prompt_error)?
        .unwrap_or(false);

    if confirmed {
        Ok(())
    } else {
        Err(CliError::Cancelled("Reformat cancelled".to_string()).into())
    }
}

/// Reformat command implementation.
pub(crate) fn cmd_reformat(cli: &Cli, config: &Config, yes: bool) -> Result<()> {
    let baud = get_baud(cli, config)?;
    confirm_erase(yes, cli.non_interactive)?;

    let port = get_port(cli, config)?;
    if !cli.quiet {
        eprintln!(
            "{} Using port {} at {} baud",
            style("🔌").cyan(),
            style(&port).cyan(),
            baud
        );
    }

    let mut logger = DataLogger::open(&port, baud)?;

    let mut display = ProgressDisplay::new(DisplayMode::detect(cli.quiet));
    let result = run_with_progress(&mut display, move |status| {
        let result = logger.reformat(&ReformatRequest::default(), status);
        if let Err(e) = logger.close() {
            log::debug!("Failed to close port: {e}");
        }
        result
    })?;
    let pages = result.context("Reformat failed")?;

    if !cli.quiet {
        eprintln!(
            "\n{} Reformat complete ({pages} pages)",
            style("✓").green().bold()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_erase_with_yes() {
        assert!(confirm_erase(true, true).is_ok());
        assert!(confirm_erase(true, false).is_ok());
    }

    #[test]
    fn test_confirm_erase_non_interactive_needs_yes() {
        let err = confirm_erase(false, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Usage(_))
        ));
        assert!(err.to_string().contains("--yes"));
    }
}
