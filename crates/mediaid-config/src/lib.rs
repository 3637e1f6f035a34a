//! mediaid-config
//!
//! Persistent intake client settings.
//! Owns the IntakeConfig structure, its on-disk location and backup helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{AccessibilitySettings, IntakeConfig};
