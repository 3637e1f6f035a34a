//! mediaid-core
//!
//! Intake wizard orchestration for MediAid.
//! Depends on mediaid-domain. No CLI, no terminal I/O, no HTTP client; remote
//! collaborators are reached through the [`IntakeApi`] and [`SearchProvider`] traits.

pub mod api;
pub mod error;
pub mod ids;
pub mod progress;
pub mod search;
pub mod session;
pub mod steps;
pub mod submission;
pub mod time;
pub mod validation;
pub mod wizard;

pub use api::*;
pub use error::CoreError;
pub use ids::LocalIdGenerator;
pub use progress::*;
pub use search::*;
pub use session::*;
pub use steps::*;
pub use submission::*;
pub use time::*;
pub use validation::*;
pub use wizard::*;

#[cfg(test)]
mod tests;
