//! Progress bar on stderr
//!
//! Shown only when enabled and stderr is a terminal, so piped output and
//! `--total` runs stay clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.cyan} Processing files [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";
const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Optional progress display for a count run
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a spinner if `enabled` and stderr is interactive
    pub fn new(enabled: bool) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self::hidden();
        }

        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style.tick_strings(TICKS));
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    /// A progress display that draws nothing
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.set_message(msg.into());
        }
    }

    /// Switch to a bar over `total` files
    pub fn start_files(&self, total: usize) {
        if let Some(bar) = &self.bar {
            if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                bar.set_style(style.tick_strings(TICKS).progress_chars("=> "));
            }
            bar.set_length(total as u64);
            bar.set_position(0);
            bar.set_message(String::new());
        }
    }

    /// Mark one file done, showing its path
    pub fn file_done(&self, path: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(path.to_string());
            bar.inc(1);
        }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish_and_clear();
    }
}
