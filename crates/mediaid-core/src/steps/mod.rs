//! Per-step local form state. Each step validates locally and hands a
//! [`StepPartial`](crate::wizard::StepPartial) to the wizard on "Next".

mod entries;
mod identity;
mod risk;

pub use entries::*;
pub use identity::*;
pub use risk::*;

use crate::validation::FieldErrors;
use crate::wizard::{StepPartial, WizardStep};

/// Contract shared by the four step forms.
pub trait StepForm {
    fn step(&self) -> WizardStep;

    /// Validates the local state and produces the slice to merge.
    fn commit(&mut self) -> Result<StepPartial, FieldErrors>;
}
