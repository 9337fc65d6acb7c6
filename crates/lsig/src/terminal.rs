//! Styled terminal output for the CLI.
//!
//! Status lines go to stderr with a right-aligned verb, so stdout carries
//! only verdicts and reports.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

const VERB_WIDTH: usize = 10;

/// Progress over a replay, counting escalations as they are found.
pub struct ReplayProgress {
    bar: ProgressBar,
    escalated: AtomicUsize,
}

impl ReplayProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(bar_style) = ProgressStyle::with_template(
            "{prefix:>10.cyan.bold} [{bar:30.cyan/dim}] {pos}/{len} {msg}",
        ) {
            bar.set_style(bar_style.progress_chars("=> "));
        }
        bar.set_prefix("Replaying");
        Self {
            bar,
            escalated: AtomicUsize::new(0),
        }
    }

    /// Count one finished input.
    pub fn advance(&self, escalated: bool) {
        if escalated {
            let n = self.escalated.fetch_add(1, Ordering::Relaxed) + 1;
            self.bar.set_message(format!("({n} escalated)"));
        }
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn status_line(verb: &str, verb_style: &Style, message: &str) {
    eprintln!(
        "{} {message}",
        verb_style.apply_to(format!("{verb:>VERB_WIDTH$}"))
    );
}

/// Neutral progress note.
pub fn status(verb: &str, message: &str) {
    status_line(verb, &Style::new().cyan().bold(), message);
}

pub fn finished(verb: &str, message: &str) {
    status_line(verb, &Style::new().green().bold(), message);
}

pub fn failed(verb: &str, message: &str) {
    status_line(verb, &Style::new().red().bold(), message);
}

pub fn warning(message: &str) {
    status_line("warning", &Style::new().yellow().bold(), message);
}

/// One replay result on stdout.
pub fn verdict(path: &Path, label: &str) {
    let label = match label {
        "interesting" => style(label).green(),
        "escalated" => style(label).red().bold(),
        _ => style(label).dim(),
    };
    println!("{}: {label}", path.display());
}

/// Title above a report.
pub fn title(text: &str) {
    eprintln!("{}", style(format!("== {text} ==")).bold());
}
