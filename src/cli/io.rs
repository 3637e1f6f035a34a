//! Labelled messages and yes/no prompts shared by the commands and the wizard.

use std::fmt;

use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::cli::output;
use crate::cli::ui::test_mode::{self, TextTestInput};
use crate::errors::IntakeError;

pub fn print_info(message: impl fmt::Display) {
    output::info(message);
}

pub fn print_warning(message: impl fmt::Display) {
    output::warning(message);
}

pub fn print_error(message: impl fmt::Display) {
    output::error(message);
}

pub fn print_success(message: impl fmt::Display) {
    output::success(message);
}

/// Yes/no question. In scripted mode the next queued token answers: `y`/`yes` confirm,
/// `<KEEP>` takes the default, anything else declines.
pub fn confirm_action(prompt: &str, default: bool) -> Result<bool, IntakeError> {
    if let Some(scripted) = test_mode::next_text_input(prompt) {
        output::prompt(prompt);
        return Ok(match scripted {
            TextTestInput::Value(value) => {
                matches!(value.trim().to_ascii_lowercase().as_str(), "y" | "yes")
            }
            TextTestInput::Keep => default,
            _ => false,
        });
    }

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(IntakeError::from)
}
