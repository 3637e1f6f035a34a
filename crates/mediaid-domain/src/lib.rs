//! mediaid-domain
//!
//! Pure intake models (draft record, risk factors, medications, diseases, BMI).
//! No I/O, no CLI, no network. Only data types and core enums.

pub mod bmi;
pub mod common;
pub mod disease;
pub mod draft;
pub mod identity;
pub mod medication;
pub mod risk;

pub use bmi::*;
pub use common::*;
pub use disease::*;
pub use draft::*;
pub use identity::*;
pub use medication::*;
pub use risk::*;
