//! Client-side processing state.
//!
//! The five progress steps are cosmetic: the server has already answered by
//! the time steps 2-5 are shown. Everything the view needs is derived from a
//! single [`UiState`] so the counters cannot drift apart.

use crate::parser::ParsedResult;

/// A step of the progress indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub id: u8,
    pub title: &'static str,
    pub description: &'static str,
}

pub const STEPS: [StepInfo; 5] = [
    StepInfo {
        id: 1,
        title: "Analyzing Image",
        description: "Detecting language and scanning text...",
    },
    StepInfo {
        id: 2,
        title: "Extracting Text",
        description: "Reading text characters...",
    },
    StepInfo {
        id: 3,
        title: "Transliteration",
        description: "Converting to Roman script...",
    },
    StepInfo {
        id: 4,
        title: "Translation",
        description: "Translating to English...",
    },
    StepInfo {
        id: 5,
        title: "Analysis",
        description: "Analyzing content...",
    },
];

/// Shown instead of the description for steps skipped by a quick stop
pub const SKIPPED_DESCRIPTION: &str = "Skipped - No readable text detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    Skipped,
}

/// Where the client is in its request lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    FileSelected,
    /// Request in flight; step 1 is shown
    Uploading,
    /// Response received; stepping through 2..=5
    Animating(u8),
    Done(ParsedResult),
    NoText {
        quick_stop: bool,
    },
    Failed(String),
}

/// View model of the client: lifecycle state plus any inline selection error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingState {
    ui: UiState,
    selection_error: Option<String>,
}

impl ProcessingState {
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Index of the active step, 0 when no step is active
    pub fn current_step(&self) -> u8 {
        match self.ui {
            UiState::Uploading => 1,
            UiState::Animating(step) => step,
            _ => 0,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.ui, UiState::Uploading | UiState::Animating(_))
    }

    pub fn processed_data(&self) -> Option<&ParsedResult> {
        match &self.ui {
            UiState::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.ui {
            UiState::Failed(message) => Some(message),
            _ => self.selection_error.as_deref(),
        }
    }

    pub fn no_text_found(&self) -> bool {
        matches!(self.ui, UiState::NoText { .. })
    }

    pub fn quick_stop(&self) -> bool {
        matches!(self.ui, UiState::NoText { quick_stop: true })
    }

    pub fn step_status(&self, id: u8) -> StepStatus {
        match &self.ui {
            UiState::Idle | UiState::FileSelected | UiState::Failed(_) => StepStatus::Pending,
            UiState::Uploading | UiState::Animating(_) => {
                let current = self.current_step();
                if id == current {
                    StepStatus::Active
                } else if id < current {
                    StepStatus::Completed
                } else {
                    StepStatus::Pending
                }
            }
            UiState::Done(_) | UiState::NoText { quick_stop: false } => StepStatus::Completed,
            UiState::NoText { quick_stop: true } => {
                if id == 1 {
                    StepStatus::Completed
                } else {
                    StepStatus::Skipped
                }
            }
        }
    }

    pub(crate) fn select(&mut self) {
        self.ui = UiState::FileSelected;
        self.selection_error = None;
    }

    pub(crate) fn clear(&mut self) {
        self.ui = UiState::Idle;
        self.selection_error = None;
    }

    /// A rejected selection keeps whatever was there and only shows the error
    pub(crate) fn reject(&mut self, message: String) {
        self.selection_error = Some(message);
    }

    pub(crate) fn start_upload(&mut self) {
        self.ui = UiState::Uploading;
        self.selection_error = None;
    }

    pub(crate) fn advance(&mut self, step: u8) {
        self.ui = UiState::Animating(step);
    }

    pub(crate) fn finish(&mut self, result: ParsedResult) {
        self.ui = UiState::Done(result);
    }

    pub(crate) fn no_text(&mut self, quick_stop: bool) {
        self.ui = UiState::NoText { quick_stop };
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.ui = UiState::Failed(message);
    }
}
