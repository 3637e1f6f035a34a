//! Subcommands of the `mediaid_intake` binary.

use std::collections::HashMap;

use strsim::levenshtein;

use crate::cli::context::AppContext;
use crate::cli::io;
use crate::errors::IntakeError;

pub mod account;
pub mod config;
pub mod intake;
pub mod system;

pub const DEFAULT_COMMAND: &str = "setup";

pub type CommandResult = Result<(), IntakeError>;

pub type CommandHandler = fn(&mut AppContext, &[&str]) -> CommandResult;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(intake::definitions());
    commands.extend(account::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// Closest command name within edit distance 3.
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.names()
            .map(|name| (levenshtein(name, &needle), name))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }
}

fn normalize(name: &str) -> String {
    match name {
        "-h" | "--help" => "help".to_string(),
        "-V" | "--version" => "version".to_string(),
        other => other.to_lowercase(),
    }
}

/// Runs one subcommand. With no arguments the intake wizard starts.
pub fn dispatch(args: &[String]) -> CommandResult {
    let registry = CommandRegistry::new(all_definitions());
    let (name, rest) = match args.split_first() {
        Some((name, rest)) => (normalize(name), rest),
        None => (DEFAULT_COMMAND.to_string(), &[][..]),
    };

    let Some(command) = registry.get(&name) else {
        let raw = args.first().map(String::as_str).unwrap_or_default();
        io::print_warning(format!(
            "Unknown command `{raw}`. Run `mediaid_intake help` to see available commands."
        ));
        if let Some(best) = registry.suggest(raw) {
            io::print_info(format!("Suggestion: `{best}`?"));
        }
        return Err(IntakeError::InvalidArguments(format!("unknown command `{raw}`")));
    };

    let mut context = AppContext::load()?;
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    (command.handler)(&mut context, &rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_declaration_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&DEFAULT_COMMAND));
        assert!(names.contains(&"login"));
        assert!(names.contains(&"config"));
        assert_eq!(registry.iter().count(), names.len());
    }

    #[test]
    fn suggests_near_misses_only() {
        let registry = CommandRegistry::new(all_definitions());
        assert_eq!(registry.suggest("lgin"), Some("login"));
        assert_eq!(registry.suggest("STATUS"), Some("status"));
        assert_eq!(registry.suggest("prescriptions"), None);
    }

    #[test]
    fn flags_map_to_commands() {
        assert_eq!(normalize("--help"), "help");
        assert_eq!(normalize("-V"), "version");
        assert_eq!(normalize("Setup"), "setup");
    }
}
