//! Terminal rendering of the progress steps and the final result.

use super::session::ProgressObserver;
use super::state::{ProcessingState, StepInfo, StepStatus, UiState, SKIPPED_DESCRIPTION, STEPS};
use crate::api::NO_TEXT_MESSAGE;
use crate::parser::ParsedResult;
use console::style;
use std::sync::Mutex;

/// Shown when the full animation ran but the server still found no text
pub const NO_TEXT_COMPLETE_TITLE: &str = "Processing Complete - No Readable Text Found";

fn step_line(step: &StepInfo, status: StepStatus) -> String {
    let counter = format!("[{}/{}]", step.id, STEPS.len());
    match status {
        StepStatus::Pending => format!(
            "  {} {} {}",
            style("·").dim(),
            style(counter).dim(),
            style(step.title).dim()
        ),
        StepStatus::Active => format!(
            "  {} {} {} - {}",
            style("→").cyan(),
            counter,
            style(step.title).bold(),
            step.description
        ),
        StepStatus::Completed => {
            format!("  {} {} {}", style("✓").green(), counter, step.title)
        }
        StepStatus::Skipped => format!(
            "  {} {} {} - {}",
            style("-").yellow(),
            style(counter).dim(),
            step.title,
            style(SKIPPED_DESCRIPTION).yellow()
        ),
    }
}

/// All five steps with their current status, one per line
pub fn render_steps(state: &ProcessingState) -> String {
    STEPS
        .iter()
        .map(|step| step_line(step, state.step_status(step.id)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_block(out: &mut String, title: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    out.push_str(&format!(
        "\n{}\n{}\n",
        style(title).bold().underlined(),
        body.trim()
    ));
}

pub fn render_result(result: &ParsedResult) -> String {
    let mut out = String::new();

    let language = if result.language_code.is_empty() {
        result.detected_language.clone()
    } else {
        format!("{} ({})", result.detected_language, result.language_code)
    };
    push_block(&mut out, "Detected Language", &language);
    push_block(&mut out, "Content Type", &result.content_type);
    push_block(&mut out, "Original Text", &result.original_text);
    push_block(&mut out, "Romanized", &result.romanized_text);
    push_block(&mut out, "English Translation", &result.english_translation);

    let sections = result.analysis_sections();
    if sections.is_empty() {
        push_block(&mut out, "Detailed Analysis", &result.detailed_analysis);
    } else {
        out.push_str(&format!("\n{}\n", style("Detailed Analysis").bold().underlined()));
        for section in sections {
            if let Some(heading) = &section.heading {
                out.push_str(&format!("{}\n", style(heading).cyan()));
            }
            for line in &section.lines {
                if !line.source.is_empty() {
                    match &line.transliteration {
                        Some(romanized) => out.push_str(&format!(
                            "  ● {} {}\n",
                            line.source,
                            style(format!("({romanized})")).dim()
                        )),
                        None => out.push_str(&format!("  ● {}\n", line.source)),
                    }
                }
                if let Some(meaning) = &line.meaning {
                    out.push_str(&format!("    ○ {}\n", style(meaning).italic()));
                }
            }
        }
    }

    out
}

pub fn render_no_text(quick_stop: bool) -> String {
    if quick_stop {
        format!("{} {}", style("!").yellow(), NO_TEXT_MESSAGE)
    } else {
        format!("{} {}", style("!").yellow(), NO_TEXT_COMPLETE_TITLE)
    }
}

pub fn render_error(message: &str) -> String {
    format!("{} {}", style("✗").red(), message)
}

/// Prints step transitions to stderr and the final state to stdout
#[derive(Default)]
pub struct TerminalView {
    last: Mutex<Option<UiState>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for TerminalView {
    fn on_update(&self, state: &ProcessingState) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.as_ref() == Some(state.ui()) {
            return;
        }
        *last = Some(state.ui().clone());

        match state.ui() {
            UiState::Uploading | UiState::Animating(_) => {
                let current = state.current_step();
                if let Some(step) = STEPS.iter().find(|s| s.id == current) {
                    eprintln!("{}", step_line(step, StepStatus::Active));
                }
            }
            UiState::Done(result) => {
                eprintln!("{}", render_steps(state));
                println!("{}", render_result(result));
            }
            UiState::NoText { quick_stop } => {
                eprintln!("{}", render_steps(state));
                println!("{}", render_no_text(*quick_stop));
            }
            UiState::Failed(message) => eprintln!("{}", render_error(message)),
            UiState::Idle | UiState::FileSelected => {
                if let Some(message) = state.error() {
                    eprintln!("{}", render_error(message));
                }
            }
        }
    }
}
