//! Body-mass index calculation and bucketing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::parse_positive;

/// `weight / (height/100)^2`, rounded to two decimals.
///
/// Returns `None` when either input is non-numeric or not strictly positive.
pub fn compute_bmi(height_cm: &str, weight_kg: &str) -> Option<f64> {
    let height = parse_positive(height_cm)?;
    let weight = parse_positive(weight_kg)?;
    let meters = height / 100.0;
    let bmi = weight / (meters * meters);
    if bmi.is_finite() {
        Some((bmi * 100.0).round() / 100.0)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObeseClass1,
    ObeseClass2,
    ObeseClass3,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else if bmi < 35.0 {
            BmiCategory::ObeseClass1
        } else if bmi < 40.0 {
            BmiCategory::ObeseClass2
        } else {
            BmiCategory::ObeseClass3
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::ObeseClass1 => "Obese class 1",
            BmiCategory::ObeseClass2 => "Obese class 2",
            BmiCategory::ObeseClass3 => "Obese class 3",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_for_reference_adult() {
        let bmi = compute_bmi("180", "81").unwrap();
        assert_eq!(bmi, 25.0);
        assert_eq!(BmiCategory::from_bmi(bmi), BmiCategory::Overweight);
    }

    #[test]
    fn bmi_rounds_to_two_decimals() {
        assert_eq!(compute_bmi("175", "70"), Some(22.86));
    }

    #[test]
    fn bmi_is_none_for_invalid_inputs() {
        assert_eq!(compute_bmi("", "70"), None);
        assert_eq!(compute_bmi("170", ""), None);
        assert_eq!(compute_bmi("0", "70"), None);
        assert_eq!(compute_bmi("170", "-3"), None);
        assert_eq!(compute_bmi("tall", "70"), None);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::ObeseClass1);
        assert_eq!(BmiCategory::from_bmi(35.0), BmiCategory::ObeseClass2);
        assert_eq!(BmiCategory::from_bmi(40.0), BmiCategory::ObeseClass3);
        assert_eq!(BmiCategory::ObeseClass1.to_string(), "Obese class 1");
    }
}
