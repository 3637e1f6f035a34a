use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::{Cui, Identifiable, LocalId, NamedEntity, SearchHit};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseStatus {
    #[default]
    Active,
    Resolved,
    Chronic,
}

impl DiseaseStatus {
    pub const ALL: [DiseaseStatus; 3] = [
        DiseaseStatus::Active,
        DiseaseStatus::Resolved,
        DiseaseStatus::Chronic,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            DiseaseStatus::Active => "active",
            DiseaseStatus::Resolved => "resolved",
            DiseaseStatus::Chronic => "chronic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.tag().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for DiseaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiseaseStatus::Active => "Active",
            DiseaseStatus::Resolved => "Resolved",
            DiseaseStatus::Chronic => "Chronic",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Severe];

    pub fn tag(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.tag().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        };
        f.write_str(label)
    }
}

/// A diagnosed condition listed in the draft.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseEntry {
    pub local_id: LocalId,
    pub cui: Cui,
    pub name: String,
    pub diagnosis_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub severity: Option<Severity>,
    pub status: Option<DiseaseStatus>,
    pub notes: Option<String>,
}

impl DiseaseEntry {
    pub fn from_hit(local_id: LocalId, hit: &SearchHit) -> Self {
        Self {
            local_id,
            cui: hit.cui.clone(),
            name: hit.name.clone(),
            diagnosis_date: None,
            end_date: None,
            severity: None,
            status: Some(DiseaseStatus::Active),
            notes: None,
        }
    }

    pub fn apply(&mut self, edit: DiseaseEdit) {
        match edit {
            DiseaseEdit::DiagnosisDate(value) => self.diagnosis_date = value,
            DiseaseEdit::Severity(value) => self.severity = value,
            DiseaseEdit::Status(value) => self.status = Some(value),
        }
    }

    pub fn status_or_default(&self) -> DiseaseStatus {
        self.status.unwrap_or_default()
    }
}

impl Identifiable for DiseaseEntry {
    fn local_id(&self) -> LocalId {
        self.local_id
    }
}

impl NamedEntity for DiseaseEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiseaseEdit {
    DiagnosisDate(Option<NaiveDate>),
    Severity(Option<Severity>),
    Status(DiseaseStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_disease_is_active() {
        let entry = DiseaseEntry::from_hit(LocalId(7), &SearchHit::new("C0011849", "Diabetes"));
        assert_eq!(entry.status, Some(DiseaseStatus::Active));
        assert_eq!(entry.severity, None);
    }

    #[test]
    fn unset_status_defaults_to_active() {
        let mut entry = DiseaseEntry::from_hit(LocalId(7), &SearchHit::new("C1", "X"));
        entry.status = None;
        assert_eq!(entry.status_or_default(), DiseaseStatus::Active);
        entry.apply(DiseaseEdit::Status(DiseaseStatus::Chronic));
        assert_eq!(entry.status_or_default(), DiseaseStatus::Chronic);
    }

    #[test]
    fn status_and_severity_parse() {
        assert_eq!(DiseaseStatus::parse("Resolved"), Some(DiseaseStatus::Resolved));
        assert_eq!(Severity::parse("severe"), Some(Severity::Severe));
        assert_eq!(Severity::parse("critical"), None);
    }
}
