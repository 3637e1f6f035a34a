use mediaid_core::{IntakeApi, Session};
use tracing::warn;

use super::{CommandDefinition, CommandResult};
use crate::cli::context::AppContext;
use crate::cli::intake::{IntakeDriver, IntakeOutcome, TerminalInteraction};
use crate::cli::io;
use crate::cli::output;
use crate::cli::profile::render_profile;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "setup",
        "Create an account through the four-step intake wizard",
        "setup",
        cmd_setup,
    )]
}

fn cmd_setup(context: &mut AppContext, _args: &[&str]) -> CommandResult {
    let api = context.api()?;
    let store = context.session_store();
    let driver = IntakeDriver::new(
        &api,
        &api,
        store.as_ref(),
        context.clock(),
        context.search_settings(),
    );

    let mut ui = TerminalInteraction::new();
    match driver.run(&mut ui)? {
        IntakeOutcome::Submitted(report) => {
            show_landing(&api, &report.session);
            Ok(())
        }
        IntakeOutcome::Cancelled => {
            io::print_info("Intake cancelled. Nothing was sent.");
            Ok(())
        }
    }
}

/// Profile landing after sign-up. A failed fetch never undoes the submission.
fn show_landing(api: &dyn IntakeApi, session: &Session) {
    match api.fetch_profile(session) {
        Ok(profile) => {
            output::section("Your profile");
            for line in render_profile(&profile) {
                output::line(line);
            }
        }
        Err(err) => {
            warn!(error = %err, "profile fetch after sign-up failed");
            io::print_warning("Your profile could not be loaded right now. Try `mediaid_intake profile` later.");
        }
    }
}
