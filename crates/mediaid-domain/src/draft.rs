//! The client-only aggregate of every wizard step.

use serde::{Deserialize, Serialize};

use crate::bmi::BmiCategory;
use crate::disease::DiseaseEntry;
use crate::identity::{IdentityDraft, Measurements};
use crate::medication::MedicationEntry;
use crate::risk::RiskFactorsDraft;

/// Draft record owned by the wizard. Each step writes its own namespace.
///
/// BMI is not stored; [`DraftRecord::bmi`] derives it from the current measurements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub identity: Option<IdentityDraft>,
    #[serde(default)]
    pub measurements: Measurements,
    #[serde(default)]
    pub risk_factors: RiskFactorsDraft,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
    #[serde(default)]
    pub diseases: Vec<DiseaseEntry>,
}

impl DraftRecord {
    pub fn bmi(&self) -> Option<f64> {
        self.measurements.bmi()
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        self.bmi().map(BmiCategory::from_bmi)
    }

    pub fn is_empty(&self) -> bool {
        self == &DraftRecord::default()
    }
}
