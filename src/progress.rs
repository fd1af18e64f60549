//! Progress indicators for mmdot CLI.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with a message.
///
/// Hidden when `quiet` is set, so callers need not branch.
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with an error mark.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("{} {}", "✗".red(), msg));
}

/// Remove a spinner from the terminal.
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
