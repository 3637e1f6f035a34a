//! Risk-factor tags. Each enum is a closed set with a fixed wire tag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Common surface of every risk-factor tag enum.
pub trait RiskOption: Copy + Sized + 'static {
    /// Every variant in display order.
    fn options() -> &'static [Self];
    /// Wire tag sent to the server, e.g. `FORMER_LIGHT`.
    fn tag(self) -> &'static str;
    /// Human-readable label.
    fn label(self) -> &'static str;

    fn from_tag(tag: &str) -> Option<Self> {
        let needle = tag.trim();
        Self::options()
            .iter()
            .copied()
            .find(|option| option.tag().eq_ignore_ascii_case(needle))
    }
}

macro_rules! risk_option {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($tag:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl RiskOption for $name {
            fn options() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn tag(self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

risk_option!(SmokingStatus {
    Never => ("NEVER", "Never smoked"),
    FormerLight => ("FORMER_LIGHT", "Former smoker - light"),
    FormerHeavy => ("FORMER_HEAVY", "Former smoker - heavy"),
    CurrentLight => ("CURRENT_LIGHT", "Current smoker - light"),
    CurrentHeavy => ("CURRENT_HEAVY", "Current smoker - heavy"),
});

risk_option!(AlcoholConsumption {
    Never => ("NEVER", "Never drinks"),
    Light => ("LIGHT", "Drinks lightly"),
    Moderate => ("MODERATE", "Drinks moderately"),
    Heavy => ("HEAVY", "Drinks heavily"),
    Excessive => ("EXCESSIVE", "Drinks excessively"),
});

risk_option!(PhysicalActivity {
    VeryActive => ("VERY_ACTIVE", "Very active"),
    Active => ("ACTIVE", "Active"),
    Moderate => ("MODERATE", "Moderate"),
    Low => ("LOW", "Low activity"),
    Sedentary => ("SEDENTARY", "Sedentary"),
});

risk_option!(BloodPressure {
    Normal => ("NORMAL", "Normal"),
    Elevated => ("ELEVATED", "Elevated"),
    Stage1 => ("STAGE_1", "Stage 1 Hypertension"),
    Stage2 => ("STAGE_2", "Stage 2 Hypertension"),
    Crisis => ("CRISIS", "Hypertensive crisis"),
});

risk_option!(StressLevel {
    Low => ("LOW", "Low"),
    Moderate => ("MODERATE", "Moderate"),
    High => ("HIGH", "High"),
    VeryHigh => ("VERY_HIGH", "Very high"),
});

risk_option!(AgeGroup {
    Under30 => ("UNDER_30", "Under 30"),
    Age30To40 => ("AGE_30_40", "30-40"),
    Age40To50 => ("AGE_40_50", "40-50"),
    Age50To60 => ("AGE_50_60", "50-60"),
    Age60To70 => ("AGE_60_70", "60-70"),
    Over70 => ("OVER_70", "Over 70"),
});

risk_option!(
    /// Family history scale shared by heart disease and cancer.
    FamilyHistory {
        NoneKnown => ("NONE", "No known history"),
        Distant => ("DISTANT", "Distant relative"),
        Sibling => ("SIBLING", "Sibling"),
        Parent => ("PARENT", "Parent"),
        Multiple => ("MULTIPLE", "Multiple family members"),
    }
);

/// Optional lifestyle and family-history answers. Every field defaults to unselected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactorsDraft {
    pub smoking_status: Option<SmokingStatus>,
    pub alcohol_consumption: Option<AlcoholConsumption>,
    pub physical_activity: Option<PhysicalActivity>,
    pub blood_pressure: Option<BloodPressure>,
    pub stress_level: Option<StressLevel>,
    pub age_group: Option<AgeGroup>,
    pub family_heart_disease: Option<FamilyHistory>,
    pub family_cancer: Option<FamilyHistory>,
}

impl RiskFactorsDraft {
    /// True when no risk-factor field has been selected.
    pub fn is_empty(&self) -> bool {
        self.selected_count() == 0
    }

    pub fn selected_count(&self) -> usize {
        [
            self.smoking_status.is_some(),
            self.alcohol_consumption.is_some(),
            self.physical_activity.is_some(),
            self.blood_pressure.is_some(),
            self.stress_level.is_some(),
            self.age_group.is_some(),
            self.family_heart_disease.is_some(),
            self.family_cancer.is_some(),
        ]
        .into_iter()
        .filter(|selected| *selected)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_match_server_vocabulary() {
        assert_eq!(BloodPressure::Stage1.tag(), "STAGE_1");
        assert_eq!(AgeGroup::Age30To40.tag(), "AGE_30_40");
        assert_eq!(
            serde_json::to_string(&SmokingStatus::FormerLight).unwrap(),
            "\"FORMER_LIGHT\""
        );
        let parsed: StressLevel = serde_json::from_str("\"VERY_HIGH\"").unwrap();
        assert_eq!(parsed, StressLevel::VeryHigh);
    }

    #[test]
    fn from_tag_is_case_insensitive() {
        assert_eq!(
            PhysicalActivity::from_tag("sedentary"),
            Some(PhysicalActivity::Sedentary)
        );
        assert_eq!(FamilyHistory::from_tag("bogus"), None);
    }

    #[test]
    fn option_catalogue_sizes() {
        assert_eq!(SmokingStatus::options().len(), 5);
        assert_eq!(StressLevel::options().len(), 4);
        assert_eq!(AgeGroup::options().len(), 6);
    }

    #[test]
    fn empty_draft_detection() {
        let mut draft = RiskFactorsDraft::default();
        assert!(draft.is_empty());
        draft.family_cancer = Some(FamilyHistory::Parent);
        assert!(!draft.is_empty());
        assert_eq!(draft.selected_count(), 1);
    }
}
