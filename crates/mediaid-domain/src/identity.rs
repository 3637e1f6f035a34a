//! Account identity and body measurements captured by the first step.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bmi::compute_bmi;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn tag(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Case-insensitive lookup by tag or label.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.tag().eq_ignore_ascii_case(needle) || g.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated identity fields. Only constructed after the identity step passes validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

/// Height (cm) and weight (kg) as entered. Both optional, kept as raw numeric strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub weight: String,
}

impl Measurements {
    pub fn new(height: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            height: height.into(),
            weight: weight.into(),
        }
    }

    /// BMI for the current inputs; `None` unless both parse and are positive.
    pub fn bmi(&self) -> Option<f64> {
        compute_bmi(&self.height, &self.weight)
    }

    pub fn height_value(&self) -> Option<f64> {
        parse_positive(&self.height)
    }

    pub fn weight_value(&self) -> Option<f64> {
        parse_positive(&self.weight)
    }
}

pub(crate) fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
