use mediaid_domain::{
    DiseaseEdit, DiseaseEntry, DraftRecord, Identifiable, LocalId, MedicationEdit,
    MedicationEntry, SearchHit, SearchKind,
};
use tracing::debug;

use crate::error::CoreError;
use crate::ids::LocalIdGenerator;
use crate::search::{SearchBox, SearchSettings};
use crate::time::Clock;
use crate::validation::FieldErrors;
use crate::wizard::{StepPartial, WizardStep};

use super::StepForm;

/// An entry that can be picked from a search hit and edited in place.
pub trait ListEntry: Identifiable + Clone {
    type Edit;

    const KIND: SearchKind;
    const STEP: WizardStep;

    fn from_hit(local_id: LocalId, hit: &SearchHit) -> Self;
    fn apply_edit(&mut self, edit: Self::Edit);
    fn from_draft(draft: &DraftRecord) -> Vec<Self>;
    fn into_partial(entries: Vec<Self>) -> StepPartial;
}

impl ListEntry for MedicationEntry {
    type Edit = MedicationEdit;

    const KIND: SearchKind = SearchKind::Medication;
    const STEP: WizardStep = WizardStep::Medications;

    fn from_hit(local_id: LocalId, hit: &SearchHit) -> Self {
        MedicationEntry::from_hit(local_id, hit)
    }

    fn apply_edit(&mut self, edit: MedicationEdit) {
        self.apply(edit);
    }

    fn from_draft(draft: &DraftRecord) -> Vec<Self> {
        draft.medications.clone()
    }

    fn into_partial(entries: Vec<Self>) -> StepPartial {
        StepPartial::Medications(entries)
    }
}

impl ListEntry for DiseaseEntry {
    type Edit = DiseaseEdit;

    const KIND: SearchKind = SearchKind::Disease;
    const STEP: WizardStep = WizardStep::MedicalHistory;

    fn from_hit(local_id: LocalId, hit: &SearchHit) -> Self {
        DiseaseEntry::from_hit(local_id, hit)
    }

    fn apply_edit(&mut self, edit: DiseaseEdit) {
        self.apply(edit);
    }

    fn from_draft(draft: &DraftRecord) -> Vec<Self> {
        draft.diseases.clone()
    }

    fn into_partial(entries: Vec<Self>) -> StepPartial {
        StepPartial::MedicalHistory(entries)
    }
}

/// Steps 3 and 4: a search box feeding an editable list of picked entries.
#[derive(Debug)]
pub struct EntryListStep<E: ListEntry> {
    entries: Vec<E>,
    search: SearchBox,
    ids: LocalIdGenerator,
}

pub type MedicationStep = EntryListStep<MedicationEntry>;
pub type DiseaseStep = EntryListStep<DiseaseEntry>;

impl<E: ListEntry> EntryListStep<E> {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            entries: Vec::new(),
            search: SearchBox::new(E::KIND, settings),
            ids: LocalIdGenerator::new(),
        }
    }

    /// Starts from entries already merged into the draft.
    pub fn from_draft(draft: &DraftRecord, settings: SearchSettings) -> Self {
        let mut step = Self::new(settings);
        step.entries = E::from_draft(draft);
        let last = step.entries.iter().map(|entry| entry.local_id()).max();
        step.ids = LocalIdGenerator::starting_after(last);
        step
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn search(&self) -> &SearchBox {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchBox {
        &mut self.search
    }

    pub fn get(&self, id: LocalId) -> Option<&E> {
        self.entries.iter().find(|entry| entry.local_id() == id)
    }

    /// Appends a new entry for `hit` and resets the search box.
    pub fn pick(&mut self, hit: &SearchHit, clock: &dyn Clock) -> LocalId {
        let id = self.ids.next(clock);
        self.entries.push(E::from_hit(id, hit));
        self.search.clear();
        debug!(kind = %E::KIND, %id, "entry added from search");
        id
    }

    /// Picks the `index`-th visible search result.
    pub fn pick_result(&mut self, index: usize, clock: &dyn Clock) -> Result<LocalId, CoreError> {
        let hit = self
            .search
            .results()
            .get(index)
            .cloned()
            .ok_or_else(|| CoreError::InvalidOperation(format!("no search result #{}", index + 1)))?;
        Ok(self.pick(&hit, clock))
    }

    pub fn update(&mut self, id: LocalId, edit: E::Edit) -> Result<(), CoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.local_id() == id)
            .ok_or(CoreError::EntryNotFound(id))?;
        entry.apply_edit(edit);
        Ok(())
    }

    pub fn remove(&mut self, id: LocalId) -> Result<E, CoreError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.local_id() == id)
            .ok_or(CoreError::EntryNotFound(id))?;
        Ok(self.entries.remove(position))
    }
}

impl<E: ListEntry> StepForm for EntryListStep<E> {
    fn step(&self) -> WizardStep {
        E::STEP
    }

    fn commit(&mut self) -> Result<StepPartial, FieldErrors> {
        Ok(E::into_partial(self.entries.clone()))
    }
}
