use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Operator-facing progress output. Best-effort: implementations never fail.
pub trait Progress: Send + Sync {
    /// A single request attempt is about to go out.
    fn tick(&self);
    /// A full line of text for the operator.
    fn line(&self, message: &str);
}

/// Terminal spinner counting request attempts. Lines are printed above it.
#[derive(Debug, Clone)]
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {pos} requests {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Draws nothing; used when output is not wanted but the counter is.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn requests(&self) -> u64 {
        self.bar.position()
    }

    /// Removes the spinner from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for ConsoleProgress {
    fn tick(&self) {
        self.bar.inc(1);
    }

    fn line(&self, message: &str) {
        self.bar.println(message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn tick(&self) {}
    fn line(&self, _message: &str) {}
}
