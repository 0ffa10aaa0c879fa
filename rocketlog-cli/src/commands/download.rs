//! Download command implementation.

use anyhow::{Context, Result};
use console::style;
use rocketlog::{DataLogger, DownloadRequest};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::reformat::confirm_erase;
use crate::config::Config;
use crate::progress::{DisplayMode, ProgressDisplay, run_with_progress};
use crate::{Cli, CliError, get_baud, get_port, was_interrupted};

/// Output file used when neither the command line nor the config names one.
pub(crate) const DEFAULT_OUTPUT: &str = "Data.txt";

/// Pick the output path: argument, then config, then [`DEFAULT_OUTPUT`].
fn resolve_output(output: Option<&Path>, config: &Config) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .or_else(|| config.download.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

/// Whether to chain a reformat: `--reformat`, else `[download] reformat_after`.
fn reformat_after_enabled(flag: bool, config: &Config) -> bool {
    flag || config.download.reformat_after.unwrap_or(false)
}

/// Settle a finished download.
///
/// A Ctrl-C during the chained reformat leaves the download result `Ok`,
/// but the command still ends as cancelled.
fn check_not_interrupted(bytes: u64, interrupted: bool, output: &Path) -> Result<u64> {
    if interrupted {
        return Err(CliError::Cancelled(format!(
            "Reformat interrupted; {bytes} bytes saved to {}",
            output.display()
        ))
        .into());
    }
    Ok(bytes)
}

/// Download command implementation.
pub(crate) fn cmd_download(
    cli: &Cli,
    config: &Config,
    output: Option<&Path>,
    reformat: bool,
    yes: bool,
) -> Result<()> {
    let baud = get_baud(cli, config)?;
    let reformat_after = reformat_after_enabled(reformat, config);
    if reformat_after {
        confirm_erase(yes, cli.non_interactive)?;
    }

    let output = resolve_output(output, config);
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

    let file = File::create(&output)
        .with_context(|| format!("Failed to create output file {}", output.display()))?;
    let mut sink = BufWriter::new(file);
    let request = DownloadRequest::default().with_reformat_after(reformat_after);

    let mut display = ProgressDisplay::new(DisplayMode::detect(cli.quiet));
    let result = run_with_progress(&mut display, move |status| {
        let result = logger.download(&request, &mut sink, status);
        if let Err(e) = logger.close() {
            log::debug!("Failed to close port: {e}");
        }
        result
    })?;

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) if e.is_interrupted() || was_interrupted() => {
            return Err(e).context(format!(
                "Download interrupted; partial data kept in {}",
                output.display()
            ));
        },
        Err(e) => {
            return Err(e).context(format!(
                "Download failed; partial data kept in {}",
                output.display()
            ));
        },
    };
    let bytes = check_not_interrupted(bytes, was_interrupted(), &output)?;

    if !cli.quiet {
        eprintln!(
            "\n{} Saved {} bytes to {}",
            style("✓").green().bold(),
            bytes,
            style(output.display()).cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_argument_wins() {
        let mut config = Config::default();
        config.download.output = Some(PathBuf::from("from_config.txt"));
        let path = resolve_output(Some(Path::new("flight7.txt")), &config);
        assert_eq!(path, PathBuf::from("flight7.txt"));
    }

    #[test]
    fn test_output_from_config() {
        let mut config = Config::default();
        config.download.output = Some(PathBuf::from("from_config.txt"));
        assert_eq!(
            resolve_output(None, &config),
            PathBuf::from("from_config.txt")
        );
    }

    #[test]
    fn test_reformat_after_sources() {
        let mut config = Config::default();
        assert!(!reformat_after_enabled(false, &config));
        assert!(reformat_after_enabled(true, &config));

        config.download.reformat_after = Some(true);
        assert!(reformat_after_enabled(false, &config));

        config.download.reformat_after = Some(false);
        assert!(!reformat_after_enabled(false, &config));
        assert!(reformat_after_enabled(true, &config));
    }

    #[test]
    fn test_interrupted_reformat_cancels_command() {
        let err = check_not_interrupted(1024, true, Path::new("Data.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Cancelled(_))
        ));
        assert_eq!(crate::exit_code_for(&err), 130);
        assert!(err.to_string().contains("1024 bytes saved"));
    }

    #[test]
    fn test_uninterrupted_download_keeps_byte_count() {
        assert_eq!(
            check_not_interrupted(1024, false, Path::new("Data.txt")).unwrap(),
            1024
        );
    }

    #[test]
    fn test_output_default() {
        assert_eq!(
            resolve_output(None, &Config::default()),
            PathBuf::from("Data.txt")
        );
    }
}
