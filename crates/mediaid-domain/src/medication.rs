use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::{Cui, Identifiable, LocalId, NamedEntity, SearchHit};

pub const DEFAULT_ADMINISTRATION_ROUTE: &str = "oral";

/// A medication the user currently takes or took, as listed in the draft.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationEntry {
    pub local_id: LocalId,
    pub cui: Cui,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub administration_route: Option<String>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl MedicationEntry {
    /// Builds a fresh entry from a search hit; the CUI always comes from the lookup.
    pub fn from_hit(local_id: LocalId, hit: &SearchHit) -> Self {
        Self {
            local_id,
            cui: hit.cui.clone(),
            name: hit.name.clone(),
            dosage: String::new(),
            frequency: String::new(),
            start_date: None,
            end_date: None,
            administration_route: None,
            is_active: Some(true),
            notes: None,
        }
    }

    pub fn apply(&mut self, edit: MedicationEdit) {
        match edit {
            MedicationEdit::Dosage(value) => self.dosage = value,
            MedicationEdit::Frequency(value) => self.frequency = value,
            MedicationEdit::StartDate(value) => self.start_date = value,
        }
    }

    pub fn route_or_default(&self) -> &str {
        self.administration_route
            .as_deref()
            .filter(|route| !route.trim().is_empty())
            .unwrap_or(DEFAULT_ADMINISTRATION_ROUTE)
    }

    /// Active unless explicitly marked otherwise.
    pub fn is_active(&self) -> bool {
        self.is_active != Some(false)
    }
}

impl Identifiable for MedicationEntry {
    fn local_id(&self) -> LocalId {
        self.local_id
    }
}

impl NamedEntity for MedicationEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// In-place edits permitted on a listed medication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MedicationEdit {
    Dosage(String),
    Frequency(String),
    StartDate(Option<NaiveDate>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_defaults() {
        let hit = SearchHit::new("C0025598", "Metformin");
        let entry = MedicationEntry::from_hit(LocalId(1), &hit);
        assert_eq!(entry.cui.as_str(), "C0025598");
        assert!(entry.is_active());
        assert_eq!(entry.route_or_default(), "oral");
        assert!(entry.dosage.is_empty());
    }

    #[test]
    fn only_explicit_false_deactivates() {
        let hit = SearchHit::new("C1", "Drug");
        let mut entry = MedicationEntry::from_hit(LocalId(1), &hit);
        entry.is_active = None;
        assert!(entry.is_active());
        entry.is_active = Some(false);
        assert!(!entry.is_active());
    }

    #[test]
    fn edits_touch_single_field() {
        let hit = SearchHit::new("C1", "Drug");
        let mut entry = MedicationEntry::from_hit(LocalId(1), &hit);
        entry.apply(MedicationEdit::Dosage("10mg".into()));
        entry.apply(MedicationEdit::StartDate(NaiveDate::from_ymd_opt(2024, 2, 1)));
        assert_eq!(entry.dosage, "10mg");
        assert!(entry.frequency.is_empty());
        assert_eq!(entry.start_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }
}
