//! Step indicator shown above each wizard page.

use crate::wizard::WizardStep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMarker {
    Completed,
    Current,
    Pending,
}

impl StepMarker {
    pub fn symbol(self) -> &'static str {
        match self {
            StepMarker::Completed => "[x]",
            StepMarker::Current => "[>]",
            StepMarker::Pending => "[ ]",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressEntry {
    pub step: WizardStep,
    pub marker: StepMarker,
}

pub fn progress_entries(current: WizardStep) -> Vec<ProgressEntry> {
    WizardStep::ALL
        .into_iter()
        .map(|step| ProgressEntry {
            step,
            marker: match step.cmp(&current) {
                std::cmp::Ordering::Less => StepMarker::Completed,
                std::cmp::Ordering::Equal => StepMarker::Current,
                std::cmp::Ordering::Greater => StepMarker::Pending,
            },
        })
        .collect()
}

/// One line per step, e.g. `[>] 2. Risk Factors`.
pub fn render_progress(current: WizardStep) -> String {
    progress_entries(current)
        .iter()
        .map(|entry| {
            format!(
                "{} {}. {}",
                entry.marker.symbol(),
                entry.step.index() + 1,
                entry.step.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
