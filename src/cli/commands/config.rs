use mediaid_config::IntakeConfig;
use tracing::info;

use super::{CommandDefinition, CommandResult};
use crate::cli::context::AppContext;
use crate::cli::io;
use crate::cli::output;
use crate::errors::IntakeError;

const USAGE: &str =
    "config [show | set-url <url> | set <key> <value> | backup [note] | backups | restore <name>]";

const KEYS: &[&str] = &[
    "api-base-url",
    "search-limit",
    "search-debounce-ms",
    "request-timeout-secs",
    "remember-session",
    "color",
    "plain-output",
    "high-contrast",
];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "Inspect or change CLI settings",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut AppContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => show(context),
        ["set-url", url] => update(context, "api-base-url", url),
        ["set", key, value] => update(context, key, value),
        ["backup", note @ ..] => backup(context, (!note.is_empty()).then(|| note.join(" "))),
        ["backups"] => list_backups(context),
        ["restore", name] => restore(context, name),
        _ => Err(IntakeError::InvalidArguments(format!(
            "usage: mediaid_intake {USAGE}"
        ))),
    }
}

fn show(context: &AppContext) -> CommandResult {
    let config = context.config();
    output::section("Configuration");
    output::line(format!("  File               : {}", context.manager().config_path().display()));
    output::line(format!("  API base URL       : {}", config.base_url()));
    output::line(format!("  Search limit       : {}", config.search_limit));
    output::line(format!("  Search debounce    : {} ms", config.search_debounce_ms));
    output::line(format!(
        "  Request timeout    : {}",
        config
            .request_timeout_secs
            .map(|secs| format!("{secs} s"))
            .unwrap_or_else(|| "default".into())
    ));
    output::line(format!("  Remember session   : {}", on_off(config.remember_session)));
    output::line(format!("  Color              : {}", on_off(config.ui_color_enabled)));
    output::line(format!("  Plain output       : {}", on_off(config.accessibility.plain_output)));
    output::line(format!("  High contrast      : {}", on_off(config.accessibility.high_contrast)));
    Ok(())
}

/// Changes one setting in the stored file. Environment overrides are not saved.
fn update(context: &mut AppContext, key: &str, value: &str) -> CommandResult {
    let mut config = context.manager().load()?;
    apply_setting(&mut config, key, value)?;
    context.manager().save(&config)?;
    info!(key, "configuration updated");
    io::print_success(format!("Updated {key}."));
    context.replace_config(config);
    Ok(())
}

fn apply_setting(config: &mut IntakeConfig, key: &str, value: &str) -> Result<(), IntakeError> {
    match key {
        "api-base-url" => config.set_api_base_url(value)?,
        "search-limit" => {
            let limit: usize = parse(key, value)?;
            if limit == 0 {
                return Err(IntakeError::InvalidArguments(
                    "search-limit must be at least 1".into(),
                ));
            }
            config.search_limit = limit;
        }
        "search-debounce-ms" => config.search_debounce_ms = parse(key, value)?,
        "request-timeout-secs" => {
            config.request_timeout_secs = match value {
                "none" | "default" => None,
                other => Some(parse(key, other)?),
            }
        }
        "remember-session" => config.remember_session = parse_flag(key, value)?,
        "color" => config.ui_color_enabled = parse_flag(key, value)?,
        "plain-output" => config.accessibility.plain_output = parse_flag(key, value)?,
        "high-contrast" => config.accessibility.high_contrast = parse_flag(key, value)?,
        other => {
            return Err(IntakeError::InvalidArguments(format!(
                "unknown setting `{other}` (expected one of: {})",
                KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, IntakeError> {
    value
        .trim()
        .parse()
        .map_err(|_| IntakeError::InvalidArguments(format!("`{value}` is not a valid {key}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, IntakeError> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(IntakeError::InvalidArguments(format!(
            "{key} expects on or off (got `{value}`)"
        ))),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn backup(context: &AppContext, note: Option<String>) -> CommandResult {
    let config = context.manager().load()?;
    let name = context.manager().backup(&config, note.as_deref())?;
    io::print_success(format!("Configuration backed up as `{name}`."));
    Ok(())
}

fn list_backups(context: &AppContext) -> CommandResult {
    let backups = context.manager().list_backups()?;
    if backups.is_empty() {
        io::print_info("No configuration backups yet.");
        return Ok(());
    }
    output::section("Configuration backups");
    for name in backups {
        output::line(format!("  {name}"));
    }
    Ok(())
}

fn restore(context: &mut AppContext, name: &str) -> CommandResult {
    let config = context.manager().restore(name)?;
    io::print_success(format!("Configuration restored from `{name}`."));
    context.replace_config(config);
    Ok(())
}
