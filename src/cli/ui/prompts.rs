use std::io::{self, Stdout, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{self, ClearType},
    ExecutableCommand,
};
use dialoguer::{theme::ColorfulTheme, Select};

use crate::cli::output;
use crate::cli::ui::test_mode::{self, TextTestInput};

const BACK_LABEL: &str = "← Back";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPromptResult {
    Value(String),
    Keep,
    Back,
    Help,
    Cancel,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoicePromptResult {
    Value(String),
    Back,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPromptResult {
    Confirm,
    Back,
    Cancel,
}

/// Reads one line in raw mode. `masked` echoes `*` instead of the typed text.
pub fn text_input(label: &str, default: Option<&str>, masked: bool) -> io::Result<TextPromptResult> {
    if let Some(scripted) = test_mode::next_text_input(label) {
        return Ok(match scripted {
            TextTestInput::Value(value) => interpret_buffer(&value, default),
            TextTestInput::Keep => TextPromptResult::Keep,
            TextTestInput::Back => TextPromptResult::Back,
            TextTestInput::Help => TextPromptResult::Help,
            TextTestInput::Cancel => TextPromptResult::Cancel,
            TextTestInput::Escape => TextPromptResult::Escape,
        });
    }

    let mut guard = RawModeGuard::activate()?;
    let mut stdout = io::stdout();
    redraw_input(&mut stdout, "", masked)?;
    let mut buffer = String::new();

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => {
                    guard.deactivate();
                    println!();
                    return Ok(TextPromptResult::Cancel);
                }
                KeyCode::Char('u') | KeyCode::Char('U') => {
                    buffer.clear();
                    redraw_input(&mut stdout, &buffer, masked)?;
                    continue;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Esc => {
                guard.deactivate();
                println!();
                return Ok(TextPromptResult::Escape);
            }
            KeyCode::Enter => {
                guard.deactivate();
                println!();
                return Ok(interpret_buffer(&buffer, default));
            }
            KeyCode::Backspace => {
                buffer.pop();
                redraw_input(&mut stdout, &buffer, masked)?;
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                redraw_input(&mut stdout, &buffer, masked)?;
            }
            KeyCode::Delete => {
                buffer.clear();
                redraw_input(&mut stdout, &buffer, masked)?;
            }
            _ => {}
        }
    }
}

/// Arrow-key menu over `options`. Scripted runs pass the token through
/// untouched so the caller's validator resolves numbers and labels.
pub fn choice_menu(
    title: &str,
    context_lines: &[String],
    options: &[String],
    default: Option<&str>,
    enable_back: bool,
) -> io::Result<ChoicePromptResult> {
    if options.is_empty() {
        return Ok(ChoicePromptResult::Cancel);
    }

    if let Some(scripted) = test_mode::next_text_input(title) {
        output::prompt(title);
        for option in options {
            output::line(format!("  {option}"));
        }
        return Ok(match scripted {
            TextTestInput::Value(value) => ChoicePromptResult::Value(value),
            TextTestInput::Keep => match default {
                Some(value) => ChoicePromptResult::Value(value.to_string()),
                None => ChoicePromptResult::Cancel,
            },
            TextTestInput::Back if enable_back => ChoicePromptResult::Back,
            _ => ChoicePromptResult::Cancel,
        });
    }

    for line in context_lines {
        output::line(line);
    }

    let mut items: Vec<String> = options.to_vec();
    if enable_back {
        items.push(BACK_LABEL.to_string());
    }
    let initial = default
        .and_then(|label| {
            options
                .iter()
                .position(|candidate| candidate.eq_ignore_ascii_case(label))
        })
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(title)
        .items(&items)
        .default(initial)
        .interact_opt()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    Ok(match selection {
        Some(index) if index < options.len() => ChoicePromptResult::Value(options[index].clone()),
        Some(_) => ChoicePromptResult::Back,
        None => ChoicePromptResult::Cancel,
    })
}

pub fn confirm_menu(context_lines: &[String]) -> io::Result<ConfirmationPromptResult> {
    for line in context_lines {
        output::line(line);
    }

    if let Some(scripted) = test_mode::next_text_input("Review entries") {
        return Ok(match scripted {
            TextTestInput::Value(value) => {
                match value.trim().to_ascii_lowercase().as_str() {
                    "" | "y" | "yes" | "confirm" => ConfirmationPromptResult::Confirm,
                    "back" | "edit" => ConfirmationPromptResult::Back,
                    _ => ConfirmationPromptResult::Cancel,
                }
            }
            TextTestInput::Keep => ConfirmationPromptResult::Confirm,
            TextTestInput::Back => ConfirmationPromptResult::Back,
            _ => ConfirmationPromptResult::Cancel,
        });
    }

    let items = ["Confirm", "Edit previous field", "Cancel"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Review entries")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    Ok(match selection {
        Some(0) => ConfirmationPromptResult::Confirm,
        Some(1) => ConfirmationPromptResult::Back,
        _ => ConfirmationPromptResult::Cancel,
    })
}

fn redraw_input(stdout: &mut Stdout, buffer: &str, masked: bool) -> io::Result<()> {
    stdout.execute(cursor::MoveToColumn(0))?;
    stdout.execute(terminal::Clear(ClearType::CurrentLine))?;
    if masked {
        write!(stdout, "> {}", "*".repeat(buffer.chars().count()))?;
    } else {
        write!(stdout, "> {}", buffer)?;
    }
    stdout.flush()
}

pub(crate) fn interpret_buffer(buffer: &str, default: Option<&str>) -> TextPromptResult {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return if default.is_some() {
            TextPromptResult::Keep
        } else {
            TextPromptResult::Value(String::new())
        };
    }

    match trimmed.to_ascii_lowercase().as_str() {
        ":cancel" => TextPromptResult::Cancel,
        ":back" => TextPromptResult::Back,
        ":help" => TextPromptResult::Help,
        ":clear" => TextPromptResult::Value(String::new()),
        _ => TextPromptResult::Value(buffer.to_string()),
    }
}

pub(crate) struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub(crate) fn activate() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { active: true })
    }

    pub(crate) fn deactivate(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
            self.active = false;
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.deactivate();
    }
}
