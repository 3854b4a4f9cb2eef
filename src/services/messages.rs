//! User-facing message channel: reported errors, the last action result,
//! a loading counter and an operation progress value.

use tracing::warn;

use crate::error::FmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Messages {
    errors: Vec<ErrorRecord>,
    action_result: Option<ActionResult>,
    loading_count: usize,
    progress: u8,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable error. Superseded requests are not reported.
    pub fn report(&mut self, error: &FmError) {
        if !error.is_reportable() {
            return;
        }
        warn!(%error, "reported");
        self.set_error(&error.to_string());
    }

    pub fn set_error(&mut self, message: &str) {
        self.errors.push(ErrorRecord {
            message: message.to_string(),
        });
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn set_action_result(&mut self, status: &str, message: &str) {
        self.action_result = Some(ActionResult {
            status: status.to_string(),
            message: message.to_string(),
        });
    }

    pub fn action_result(&self) -> Option<&ActionResult> {
        self.action_result.as_ref()
    }

    pub fn clear_action_result(&mut self) {
        self.action_result = None;
    }

    pub fn add_loading(&mut self) {
        self.loading_count += 1;
    }

    pub fn subtract_loading(&mut self) {
        self.loading_count = self.loading_count.saturating_sub(1);
    }

    pub fn clear_loading(&mut self) {
        self.loading_count = 0;
    }

    pub fn is_loading(&self) -> bool {
        self.loading_count > 0
    }

    /// Percentage, clamped to 100
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn clear_progress(&mut self) {
        self.progress = 0;
    }
}
