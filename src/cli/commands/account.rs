use chrono::{TimeZone, Utc};
use mediaid_core::{IntakeApi, Session};
use tracing::info;

use super::{CommandDefinition, CommandResult};
use crate::cli::context::AppContext;
use crate::cli::forms::{FormEngine, FormResult, LoginFlow, WizardInteraction};
use crate::cli::io;
use crate::cli::output;
use crate::cli::profile::render_profile;
use crate::errors::IntakeError;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("login", "Sign in to an existing account", "login", cmd_login),
        CommandDefinition::new("logout", "Forget the stored session", "logout", cmd_logout),
        CommandDefinition::new("status", "Show who is signed in", "status", cmd_status),
        CommandDefinition::new(
            "profile",
            "Show the profile of the signed-in user",
            "profile",
            cmd_profile,
        ),
    ]
}

fn cmd_login(context: &mut AppContext, _args: &[&str]) -> CommandResult {
    let flow = LoginFlow::new();
    let mut ui = WizardInteraction::new();
    let request = match FormEngine::new(&flow).run(&mut ui) {
        Ok(FormResult::Completed(request)) => request,
        Ok(_) => {
            io::print_info("Sign-in cancelled.");
            return Ok(());
        }
        Err(never) => match never {},
    };

    let api = context.api()?;
    let response = api.login(&request).map_err(|err| {
        IntakeError::Message(
            err.server_message()
                .unwrap_or("Sign-in failed")
                .to_string(),
        )
    })?;
    let session = Session::from(response);
    context.session_store().save(&session)?;
    info!(user = session.username().unwrap_or("-"), "signed in");
    io::print_success(format!(
        "Signed in as {}.",
        session.username().or(session.email()).unwrap_or("you")
    ));
    Ok(())
}

fn cmd_logout(context: &mut AppContext, _args: &[&str]) -> CommandResult {
    context.session_store().clear()?;
    io::print_success("Signed out.");
    Ok(())
}

fn cmd_status(context: &mut AppContext, _args: &[&str]) -> CommandResult {
    let Some(session) = context.session_store().load()? else {
        io::print_info("Not signed in.");
        return Ok(());
    };

    output::section("Session");
    output::line(format!("User: {}", session.username().unwrap_or("-")));
    output::line(format!("Email: {}", session.email().unwrap_or("-")));
    let claims = session.claims().unwrap_or_default();
    if let Some(user_id) = claims.user_id() {
        output::line(format!("User id: {user_id}"));
    }
    if let Some(expires) = claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()) {
        output::line(format!("Expires: {}", expires.format("%Y-%m-%d %H:%M UTC")));
    }
    if session.is_expired(context.clock().now()) {
        io::print_warning("The stored session has expired. Run `mediaid_intake login` again.");
    }
    Ok(())
}

fn cmd_profile(context: &mut AppContext, _args: &[&str]) -> CommandResult {
    let session = signed_in(context)?;
    let api = context.api()?;
    let profile = match api.fetch_profile(&session) {
        Ok(profile) => profile,
        Err(err) if err.is_unauthorized() => {
            context.session_store().clear()?;
            return Err(IntakeError::NotSignedIn);
        }
        Err(err) => return Err(err.into()),
    };
    output::section("Your profile");
    for line in render_profile(&profile) {
        output::line(line);
    }
    Ok(())
}

fn signed_in(context: &AppContext) -> Result<Session, IntakeError> {
    match context.session_store().load()? {
        Some(session) if !session.is_expired(context.clock().now()) => Ok(session),
        _ => Err(IntakeError::NotSignedIn),
    }
}
