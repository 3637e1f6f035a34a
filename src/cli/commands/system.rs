use super::{all_definitions, CommandDefinition, CommandRegistry, CommandResult};
use crate::cli::context::AppContext;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::errors::IntakeError;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
    ]
}

fn cmd_version(_context: &mut AppContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("MediAid intake {}", meta.version));
    io::print_info(format!("  CLI version  : {}", build_info::CLI_VERSION));
    io::print_info(format!(
        "  Build hash   : {} ({})",
        meta.git_hash, meta.git_status
    ));
    io::print_info(format!("  Built at     : {}", meta.timestamp));
    io::print_info(format!("  Target       : {}", meta.target));
    io::print_info(format!("  Profile      : {}", meta.profile));
    io::print_info(format!("  Rustc        : {}", meta.rustc));
    Ok(())
}

fn cmd_help(_context: &mut AppContext, args: &[&str]) -> CommandResult {
    let registry = CommandRegistry::new(all_definitions());
    let Some(name) = args.first() else {
        print_overview(&registry);
        return Ok(());
    };

    match registry.get(&name.to_lowercase()) {
        Some(command) => {
            print_command(command);
            Ok(())
        }
        None => {
            if let Some(best) = registry.suggest(name) {
                io::print_info(format!("Suggestion: `{best}`?"));
            }
            Err(IntakeError::InvalidArguments(format!("unknown command `{name}`")))
        }
    }
}

fn print_overview(registry: &CommandRegistry) {
    output_section("Available commands");
    for command in registry.iter() {
        io::print_info(format!("  {:<16} {}", command.name, command.description));
    }
    io::print_info("Run without a command to start the intake wizard.");
    io::print_info("Use `help <command>` for details.");
}

fn print_command(command: &CommandDefinition) {
    output_section(format!("Help: {}", command.name));
    io::print_info(format!("  Description: {}", command.description));
    io::print_info(format!("  Usage: mediaid_intake {}", command.usage));
}
