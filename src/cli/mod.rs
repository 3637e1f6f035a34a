pub mod commands;
pub mod context;
pub mod forms;
pub mod intake;
pub mod io;
pub mod output;
pub mod profile;
pub mod ui;

use crate::errors::IntakeError;

/// Entry point of the `mediaid_intake` binary.
pub fn run_cli() -> Result<(), IntakeError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    commands::dispatch(&args)
}
