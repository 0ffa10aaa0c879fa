//! Terminal progress for running sessions.
//!
//! Sessions run on a worker thread and report through an
//! `mpsc::Sender<StatusEvent>`; the main thread replays the events into a
//! [`ProgressDisplay`].

use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rocketlog::protocol::REQUIRED_PAGES;
use rocketlog::{Status, StatusEvent, StatusSink};

const TICK: Duration = Duration::from_millis(100);

/// How status and progress are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisplayMode {
    /// Animated bars on a terminal.
    Fancy,
    /// One line per status change.
    Plain,
    /// Nothing.
    Quiet,
}

impl DisplayMode {
    /// Pick the mode for the current terminal and flags.
    pub(crate) fn detect(quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if crate::use_fancy_output() {
            Self::Fancy
        } else {
            Self::Plain
        }
    }
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn pages_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Status sink that draws on stderr.
pub(crate) struct ProgressDisplay {
    mode: DisplayMode,
    bar: Option<ProgressBar>,
    total: u64,
}

impl ProgressDisplay {
    pub(crate) fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            bar: None,
            total: 0,
        }
    }

    /// Progress units seen since the last reset.
    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    fn start_bar(&mut self, bar: ProgressBar, status: Status) {
        bar.set_message(status.to_string());
        bar.enable_steady_tick(TICK);
        self.bar = Some(bar);
    }
}

impl StatusSink for ProgressDisplay {
    fn on_status(&mut self, status: Status) {
        match self.mode {
            DisplayMode::Quiet => {},
            DisplayMode::Plain => eprintln!("{status}"),
            DisplayMode::Fancy => match status {
                Status::Starting => {
                    eprintln!("{} {status}", style("⏳").yellow());
                },
                Status::Downloading => {
                    let bar = ProgressBar::new_spinner().with_style(bytes_style());
                    self.start_bar(bar, status);
                },
                Status::Reformatting => {
                    let bar = ProgressBar::new(u64::from(REQUIRED_PAGES)).with_style(pages_style());
                    self.start_bar(bar, status);
                },
                Status::Complete => {
                    if let Some(bar) = self.bar.take() {
                        bar.finish_with_message(status.to_string());
                    }
                },
                Status::Failed => {
                    if let Some(bar) = self.bar.take() {
                        bar.abandon_with_message(style(status).red().to_string());
                    }
                },
            },
        }
    }

    fn on_progress(&mut self, delta: u64) {
        self.total += delta;
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    fn on_reset(&mut self) {
        self.total = 0;
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Run `job` on a worker thread, drawing its status events until it ends.
pub(crate) fn run_with_progress<T, F>(display: &mut ProgressDisplay, job: F) -> Result<T>
where
    F: FnOnce(&mut Sender<StatusEvent>) -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let mut tx = tx;
        job(&mut tx)
    });

    // Ends once the worker drops its sender.
    for event in rx {
        event.apply(display);
    }

    worker
        .join()
        .map_err(|_| anyhow::anyhow!("Session worker panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_display_counts_progress() {
        let mut display = ProgressDisplay::new(DisplayMode::Quiet);
        display.on_reset();
        display.on_status(Status::Downloading);
        display.on_progress(1);
        display.on_progress(3);
        assert_eq!(display.total(), 4);

        display.on_reset();
        assert_eq!(display.total(), 0);
    }

    #[test]
    fn test_run_with_progress_replays_worker_events() {
        let mut display = ProgressDisplay::new(DisplayMode::Quiet);

        let result = run_with_progress(&mut display, |status| {
            status.on_reset();
            status.on_status(Status::Downloading);
            status.on_progress(2);
            status.on_progress(3);
            status.on_status(Status::Complete);
            42u64
        })
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(display.total(), 5);
    }

    #[test]
    fn test_run_with_progress_reports_panic() {
        let mut display = ProgressDisplay::new(DisplayMode::Quiet);
        let result: Result<()> = run_with_progress(&mut display, |_| panic!("worker died"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fancy_display_tracks_bar_lifecycle() {
        let mut display = ProgressDisplay::new(DisplayMode::Fancy);
        display.on_status(Status::Reformatting);
        assert!(display.bar.is_some());
        display.on_progress(1);
        display.on_status(Status::Complete);
        assert!(display.bar.is_none());
        assert_eq!(display.total(), 1);
    }
}
