use mediaid_domain::{BmiCategory, DraftRecord, Measurements, RiskFactorsDraft};

use crate::validation::FieldErrors;
use crate::wizard::{StepPartial, WizardStep};

use super::StepForm;

/// Step 2: optional risk factors with a live BMI readout.
#[derive(Clone, Debug, Default)]
pub struct RiskFactorStep {
    risk_factors: RiskFactorsDraft,
    measurements: Measurements,
}

impl RiskFactorStep {
    pub fn from_draft(draft: &DraftRecord) -> Self {
        Self {
            risk_factors: draft.risk_factors.clone(),
            measurements: draft.measurements.clone(),
        }
    }

    pub fn risk_factors(&self) -> &RiskFactorsDraft {
        &self.risk_factors
    }

    pub fn risk_factors_mut(&mut self) -> &mut RiskFactorsDraft {
        &mut self.risk_factors
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    pub fn set_height(&mut self, height: impl Into<String>) {
        self.measurements.height = height.into();
    }

    pub fn set_weight(&mut self, weight: impl Into<String>) {
        self.measurements.weight = weight.into();
    }

    /// Derived from the current inputs on every call.
    pub fn bmi(&self) -> Option<f64> {
        self.measurements.bmi()
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        self.bmi().map(BmiCategory::from_bmi)
    }
}

impl StepForm for RiskFactorStep {
    fn step(&self) -> WizardStep {
        WizardStep::RiskFactors
    }

    fn commit(&mut self) -> Result<StepPartial, FieldErrors> {
        Ok(StepPartial::RiskFactors {
            risk_factors: self.risk_factors.clone(),
            measurements: self.measurements.clone(),
        })
    }
}
