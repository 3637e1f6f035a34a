use thiserror::Error;

use mediaid_domain::LocalId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Entry not found: {0}")]
    EntryNotFound(LocalId),
    #[error("Step not completed: {0}")]
    StepIncomplete(&'static str),
    #[error("Search failed: {0}")]
    Search(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}
