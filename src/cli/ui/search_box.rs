//! Type-ahead catalogue search rendered in raw mode.
//!
//! Keystrokes feed the [`SearchBox`]; lookups only fire once the quiet
//! period elapses, and the key poll timeout is the time left until then.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use mediaid_core::{Clock, SearchBox, SearchProvider, MIN_QUERY_CHARS};
use mediaid_domain::SearchHit;

use crate::cli::io as cli_io;
use crate::cli::ui::prompts::{choice_menu, ChoicePromptResult, RawModeGuard};
use crate::cli::ui::test_mode::{self, TextTestInput};

const IDLE_TICK: Duration = Duration::from_millis(250);
const PREFIX: &str = "Search: ";

/// Runs the search box until a hit is picked (`Some`) or the user leaves (`None`).
pub fn live_search(
    search: &mut SearchBox,
    provider: &dyn SearchProvider,
    clock: &dyn Clock,
) -> io::Result<Option<SearchHit>> {
    if test_mode::is_enabled() {
        return scripted_search(search, provider, clock);
    }

    cli_io::print_info(format!(
        "Type to search {}s. ↑/↓ to highlight, Enter to add, Esc to go back.",
        search.kind()
    ));

    let mut guard = RawModeGuard::activate()?;
    let mut stdout = io::stdout();
    let mut highlight = 0usize;
    draw(&mut stdout, search, highlight, false)?;

    loop {
        let timeout = match search.due_at() {
            Some(due) => (due - clock.now()).to_std().unwrap_or(Duration::ZERO),
            None => IDLE_TICK,
        };

        if event::poll(timeout)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));
            match key.code {
                KeyCode::Esc => return finish(&mut stdout, &mut guard, None),
                _ if ctrl_c => return finish(&mut stdout, &mut guard, None),
                KeyCode::Enter => {
                    if let Some(hit) = search.results().get(highlight).cloned() {
                        return finish(&mut stdout, &mut guard, Some(hit));
                    }
                }
                KeyCode::Up => highlight = highlight.saturating_sub(1),
                KeyCode::Down => {
                    if highlight + 1 < search.results().len() {
                        highlight += 1;
                    }
                }
                KeyCode::Backspace => {
                    let mut query = search.query().to_string();
                    query.pop();
                    search.set_query(&query, clock.now());
                }
                KeyCode::Char(ch) => {
                    let mut query = search.query().to_string();
                    query.push(ch);
                    search.set_query(&query, clock.now());
                }
                _ => {}
            }
        } else if search.due_at().is_some() {
            draw(&mut stdout, search, highlight, true)?;
            if search.run_due(provider, clock.now()) {
                highlight = 0;
            }
        }
        draw(&mut stdout, search, highlight, false)?;
    }
}

fn finish(
    stdout: &mut Stdout,
    guard: &mut RawModeGuard,
    picked: Option<SearchHit>,
) -> io::Result<Option<SearchHit>> {
    stdout.queue(cursor::MoveToColumn(0))?;
    stdout.queue(Clear(ClearType::FromCursorDown))?;
    stdout.flush()?;
    guard.deactivate();
    Ok(picked)
}

fn draw(stdout: &mut Stdout, search: &SearchBox, highlight: usize, searching: bool) -> io::Result<()> {
    stdout.queue(cursor::MoveToColumn(0))?;
    stdout.queue(Clear(ClearType::FromCursorDown))?;
    write!(stdout, "{PREFIX}{}", search.query())?;

    let mut lines: u16 = 0;
    if searching {
        write!(stdout, "\r\n  searching...")?;
        lines += 1;
    } else if search.query().trim().chars().count() < MIN_QUERY_CHARS {
        write!(stdout, "\r\n  (type at least {MIN_QUERY_CHARS} characters)")?;
        lines += 1;
    }
    for (index, hit) in search.results().iter().enumerate() {
        let marker = if index == highlight { ">" } else { " " };
        write!(stdout, "\r\n{marker} {} (CUI: {})", hit.name, hit.cui)?;
        lines += 1;
    }

    if lines > 0 {
        stdout.queue(cursor::MoveUp(lines))?;
    }
    let column = PREFIX.len() + search.query().chars().count();
    stdout.queue(cursor::MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX)))?;
    stdout.flush()
}

/// Scripted variant: one token is the whole query, the quiet period is
/// treated as elapsed, and the next token picks a result.
fn scripted_search(
    search: &mut SearchBox,
    provider: &dyn SearchProvider,
    clock: &dyn Clock,
) -> io::Result<Option<SearchHit>> {
    let label = format!("Search {}s", search.kind());
    let Some(TextTestInput::Value(query)) = test_mode::next_text_input(&label) else {
        return Ok(None);
    };

    search.set_query(&query, clock.now());
    if let Some(due) = search.due_at() {
        search.run_due(provider, due);
    } else {
        cli_io::print_warning(format!(
            "Type at least {MIN_QUERY_CHARS} characters to search."
        ));
        return Ok(None);
    }

    if search.results().is_empty() {
        cli_io::print_warning(format!("No matches for `{}`.", query.trim()));
        return Ok(None);
    }

    let options = result_labels(search.results());
    match choice_menu("Select a result", &[], &options, None, true)? {
        ChoicePromptResult::Value(raw) => Ok(resolve_pick(search.results(), &raw)),
        _ => Ok(None),
    }
}

fn result_labels(results: &[SearchHit]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(index, hit)| format!("[{}] {} (CUI: {})", index + 1, hit.name, hit.cui))
        .collect()
}

/// Accepts a 1-based position, a name, or the full rendered label.
fn resolve_pick(results: &[SearchHit], raw: &str) -> Option<SearchHit> {
    let needle = raw.trim();
    if let Ok(position) = needle.parse::<usize>() {
        return position.checked_sub(1).and_then(|index| results.get(index)).cloned();
    }
    let labels = result_labels(results);
    results
        .iter()
        .zip(labels.iter())
        .find(|(hit, label)| hit.name.eq_ignore_ascii_case(needle) || label.as_str() == needle)
        .map(|(hit, _)| hit.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits() -> Vec<SearchHit> {
        vec![
            SearchHit::new("C0025598", "Metformin"),
            SearchHit::new("C0004057", "Aspirin"),
        ]
    }

    #[test]
    fn picks_by_position_or_name() {
        let results = hits();
        assert_eq!(resolve_pick(&results, "2").unwrap().name, "Aspirin");
        assert_eq!(resolve_pick(&results, "metformin").unwrap().name, "Metformin");
        assert_eq!(
            resolve_pick(&results, "[1] Metformin (CUI: C0025598)").unwrap().name,
            "Metformin"
        );
        assert!(resolve_pick(&results, "0").is_none());
        assert!(resolve_pick(&results, "ibuprofen").is_none());
    }
}
