use std::cell::RefCell;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Sink for user-facing status messages.
///
/// Every stage of the generation pipeline takes a `&dyn Reporter` instead of
/// writing to a global console, so callers decide where messages go.
pub trait Reporter {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Called before row `index` (1-based) of `total` is processed.
    fn progress(&self, _index: usize, _total: usize, _label: &str) {}

    /// Called once the whole batch is done.
    fn finish(&self) {}
}

/// Styled terminal output, optionally driving a progress bar.
pub struct ConsoleReporter {
    verbose: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, bar: None }
    }

    /// Show a progress bar sized to `total` rows while the batch runs.
    pub fn with_progress(verbose: bool, total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(bar_style) =
            ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(bar_style.progress_chars("=> "));
        }
        Self {
            verbose,
            bar: Some(bar),
        }
    }

    fn emit(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, message: &str) {
        if self.verbose {
            self.emit(format!("{} {}", style("ℹ").blue().bold(), message));
        }
    }

    fn success(&self, message: &str) {
        self.emit(format!("{} {}", style("✓").green().bold(), message));
    }

    fn warn(&self, message: &str) {
        self.emit(format!(
            "{} {}",
            style("warning:").yellow().bold(),
            style(message).yellow()
        ));
    }

    fn error(&self, message: &str) {
        self.emit(format!("{} {}", style("✗").red().bold(), message));
    }

    fn progress(&self, index: usize, total: usize, label: &str) {
        if let Some(bar) = &self.bar {
            bar.set_position(index.saturating_sub(1) as u64);
            bar.set_message(label.to_string());
        } else {
            self.info(&format!("Processing row {index}/{total}: {label}"));
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
}

/// Collects messages in memory; used by tests and embedding callers.
#[derive(Default)]
pub struct MemoryReporter {
    messages: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(Level::Success, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}
