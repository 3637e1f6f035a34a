//! Wizard aggregate: current step pointer plus the merged draft record.

use std::fmt;

use mediaid_domain::{
    DiseaseEntry, DraftRecord, IdentityDraft, Measurements, MedicationEntry, RiskFactorsDraft,
};
use tracing::debug;

use crate::steps::StepForm;
use crate::validation::FieldErrors;

/// The four intake steps, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    BasicInfo,
    RiskFactors,
    Medications,
    MedicalHistory,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::BasicInfo,
        WizardStep::RiskFactors,
        WizardStep::Medications,
        WizardStep::MedicalHistory,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::BasicInfo => 0,
            WizardStep::RiskFactors => 1,
            WizardStep::Medications => 2,
            WizardStep::MedicalHistory => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Basic Info",
            WizardStep::RiskFactors => "Risk Factors",
            WizardStep::Medications => "Medications",
            WizardStep::MedicalHistory => "Medical History",
        }
    }

    pub fn is_last(self) -> bool {
        self == WizardStep::MedicalHistory
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Validated slice of the draft handed over by a step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepPartial {
    BasicInfo {
        identity: IdentityDraft,
        measurements: Measurements,
    },
    RiskFactors {
        risk_factors: RiskFactorsDraft,
        measurements: Measurements,
    },
    Medications(Vec<MedicationEntry>),
    MedicalHistory(Vec<DiseaseEntry>),
}

impl StepPartial {
    pub fn step(&self) -> WizardStep {
        match self {
            StepPartial::BasicInfo { .. } => WizardStep::BasicInfo,
            StepPartial::RiskFactors { .. } => WizardStep::RiskFactors,
            StepPartial::Medications(_) => WizardStep::Medications,
            StepPartial::MedicalHistory(_) => WizardStep::MedicalHistory,
        }
    }
}

/// Single owner of the draft and the step pointer for one wizard session.
#[derive(Clone, Debug, Default)]
pub struct WizardState {
    current: usize,
    draft: DraftRecord,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> WizardStep {
        WizardStep::from_index(self.current).unwrap_or(WizardStep::BasicInfo)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    pub fn is_on_last_step(&self) -> bool {
        self.current_step().is_last()
    }

    /// Moves forward one step; stays put on the last step.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < WizardStep::ALL.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Moves back one step without touching merged data.
    pub fn retreat(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Writes the partial's namespace into the draft, leaving sibling namespaces as they were.
    pub fn merge(&mut self, partial: StepPartial) {
        debug!(step = %partial.step(), "merging step data into draft");
        match partial {
            StepPartial::BasicInfo {
                identity,
                measurements,
            } => {
                self.draft.identity = Some(identity);
                self.draft.measurements = measurements;
            }
            StepPartial::RiskFactors {
                risk_factors,
                measurements,
            } => {
                self.draft.risk_factors = risk_factors;
                self.draft.measurements = measurements;
            }
            StepPartial::Medications(medications) => self.draft.medications = medications,
            StepPartial::MedicalHistory(diseases) => self.draft.diseases = diseases,
        }
    }

    pub fn merge_and_advance(&mut self, partial: StepPartial) {
        self.merge(partial);
        self.advance();
    }

    /// Runs a step's "Next" action: validate, merge, advance.
    ///
    /// On validation failure the draft and step pointer are left untouched.
    pub fn submit_step<F: StepForm + ?Sized>(&mut self, form: &mut F) -> Result<(), FieldErrors> {
        let partial = form.commit()?;
        self.merge_and_advance(partial);
        Ok(())
    }
}
