//! Terminal renderings of the loading spinner and the confidence bar.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use tokio::task::JoinHandle;

const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// "Operation in progress" indicator. Carries no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingIndicator;

impl LoadingIndicator {
    /// The glyph to draw on animation tick `tick`.
    pub fn frame(tick: usize) -> char {
        SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
    }

    /// Animate on stderr until the returned guard is finished or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(label: impl Into<String>) -> LoadingGuard {
        let label = label.into();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
            let mut stderr = io::stderr();
            let mut tick = 0usize;
            loop {
                ticker.tick().await;
                let line = format!("{} {}", Self::frame(tick).cyan(), label);
                let _ = execute!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line));
                tick = tick.wrapping_add(1);
            }
        });
        LoadingGuard { task: Some(task) }
    }
}

/// Stops the spinner and clears its line.
#[derive(Debug)]
pub struct LoadingGuard {
    task: Option<JoinHandle<()>>,
}

impl LoadingGuard {
    pub fn finish(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let mut stderr = io::stderr();
            let _ = execute!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine));
            let _ = stderr.flush();
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A percentage bar whose label and fill both derive from one clamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressBar {
    value: f64,
}

impl ProgressBar {
    pub const LABEL: &'static str = "Confidence Level";

    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Build from a score such as 3 correct out of 5.
    pub fn from_ratio(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self::new(0.0);
        }
        Self::new(done as f64 * 100.0 / total as f64)
    }

    /// The value clamped to [0, 100]; NaN counts as 0.
    pub fn clamped(&self) -> f64 {
        if self.value.is_nan() {
            return 0.0;
        }
        self.value.clamp(0.0, 100.0)
    }

    /// Displayed percentage.
    pub fn percent(&self) -> u8 {
        self.clamped().round() as u8
    }

    /// Number of filled cells in a bar `width` cells wide.
    ///
    /// Scaled from `percent()` in integer arithmetic so the bar can never
    /// disagree with the label.
    pub fn filled_cells(&self, width: usize) -> usize {
        (usize::from(self.percent()) * width + 50) / 100
    }

    /// Plain two-line rendering: label, then bar and percentage.
    pub fn render(&self, width: usize) -> String {
        let filled = self.filled_cells(width);
        format!(
            "{}\n[{}{}] {}%",
            Self::LABEL,
            "#".repeat(filled),
            ".".repeat(width - filled),
            self.percent()
        )
    }

    /// Coloured rendering for terminals.
    pub fn render_styled(&self, width: usize) -> String {
        let filled = self.filled_cells(width);
        format!(
            "{}\n{}{} {}",
            Self::LABEL.bold(),
            "█".repeat(filled).blue(),
            "░".repeat(width - filled).dark_grey(),
            format!("{}%", self.percent()).bold()
        )
    }
}
