//! Terminal driver for the four-step intake wizard.
//!
//! Each step runs a form flow against its `mediaid-core` step form and hands
//! the result to [`WizardState`]. The final step submits the draft through
//! [`SubmissionOrchestrator`].

use std::convert::Infallible;

use mediaid_core::{
    progress_entries, Clock, EntryListStep, IdentityField, IdentityStep, IntakeApi, ListEntry,
    RiskFactorStep, SearchBox, SearchProvider, SearchSettings, SessionStore, SubmissionError,
    SubmissionOrchestrator, SubmissionReport, WizardState, WizardStep,
};
use mediaid_domain::{DiseaseEntry, LocalId, MedicationEntry, NamedEntity, SearchHit};
use tracing::{debug, info};

use crate::cli::forms::{
    bmi_line, ChoiceMapper, ConfirmationResponse, DiseaseDetailsFlow, FormEngine, FormFlow,
    FormInteraction, FormResult, FormSummary, IdentityFlow, MedicationDetailsFlow, PromptContext,
    PromptResponse, RiskFactorFlow, WizardInteraction,
};
use crate::cli::io;
use crate::cli::output;
use crate::cli::ui::prompts::{choice_menu, ChoicePromptResult};
use crate::cli::ui::search_box::live_search;
use crate::errors::IntakeError;

pub const WELCOME_MESSAGE: &str = "Account created successfully! Welcome to MediAid!";

/// Everything the wizard needs from the user beyond single form fields.
pub trait IntakeInteraction: FormInteraction {
    fn choose(&mut self, title: &str, lines: &[String], options: &[String]) -> ChoicePromptResult;

    /// Runs a catalogue search; `None` when the user leaves without picking.
    fn search(
        &mut self,
        search: &mut SearchBox,
        provider: &dyn SearchProvider,
        clock: &dyn Clock,
    ) -> Option<SearchHit>;

    /// Asks whether to abandon the wizard.
    fn confirm_leave(&mut self) -> bool;
}

/// Interactive terminal implementation.
#[derive(Debug, Default)]
pub struct TerminalInteraction {
    forms: WizardInteraction,
}

impl TerminalInteraction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormInteraction for TerminalInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
        self.forms.prompt_field(context)
    }

    fn confirm(&mut self, summary: &FormSummary, lines: &[String]) -> ConfirmationResponse {
        self.forms.confirm(summary, lines)
    }
}

impl IntakeInteraction for TerminalInteraction {
    fn choose(&mut self, title: &str, lines: &[String], options: &[String]) -> ChoicePromptResult {
        choice_menu(title, lines, options, None, true).unwrap_or_else(|err| {
            io::print_error(format!("Menu failed: {err}"));
            ChoicePromptResult::Cancel
        })
    }

    fn search(
        &mut self,
        search: &mut SearchBox,
        provider: &dyn SearchProvider,
        clock: &dyn Clock,
    ) -> Option<SearchHit> {
        live_search(search, provider, clock).unwrap_or_else(|err| {
            io::print_error(format!("Search failed: {err}"));
            None
        })
    }

    fn confirm_leave(&mut self) -> bool {
        io::confirm_action("Leave the intake wizard? Your answers will be lost.", false)
            .unwrap_or(true)
    }
}

#[derive(Debug)]
pub enum IntakeOutcome {
    Submitted(SubmissionReport),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepNav {
    Advanced,
    Back,
    Leave,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryAction {
    Add,
    Edit,
    Remove,
    Finish,
}

fn run_form<F, I>(flow: &F, ui: &mut I) -> FormResult<F::Output>
where
    F: FormFlow<Error = Infallible>,
    I: FormInteraction + ?Sized,
{
    match FormEngine::new(flow).run(ui) {
        Ok(result) => result,
        Err(never) => match never {},
    }
}

/// Per-entry presentation and the detail form used to edit it.
trait EntryDetails: ListEntry + NamedEntity {
    fn describe(&self) -> String;

    fn edit_details<I: FormInteraction + ?Sized>(&self, ui: &mut I) -> FormResult<Vec<Self::Edit>>;
}

impl EntryDetails for MedicationEntry {
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.dosage.is_empty() {
            parts.push(self.dosage.clone());
        }
        if !self.frequency.is_empty() {
            parts.push(self.frequency.clone());
        }
        if let Some(date) = self.start_date {
            parts.push(format!("since {date}"));
        }
        describe_with(&self.name, self.cui.as_str(), &parts)
    }

    fn edit_details<I: FormInteraction + ?Sized>(&self, ui: &mut I) -> FormResult<Vec<Self::Edit>> {
        run_form(&MedicationDetailsFlow::new(self), ui)
    }
}

impl EntryDetails for DiseaseEntry {
    fn describe(&self) -> String {
        let mut parts = vec![self.status_or_default().to_string()];
        if let Some(severity) = self.severity {
            parts.push(severity.to_string());
        }
        if let Some(date) = self.diagnosis_date {
            parts.push(format!("diagnosed {date}"));
        }
        describe_with(&self.name, self.cui.as_str(), &parts)
    }

    fn edit_details<I: FormInteraction + ?Sized>(&self, ui: &mut I) -> FormResult<Vec<Self::Edit>> {
        run_form(&DiseaseDetailsFlow::new(self), ui)
    }
}

fn describe_with(name: &str, cui: &str, details: &[String]) -> String {
    if details.is_empty() {
        format!("{name} (CUI: {cui})")
    } else {
        format!("{name} (CUI: {cui}): {}", details.join(", "))
    }
}

/// Runs the wizard against its remote collaborators.
pub struct IntakeDriver<'a> {
    api: &'a dyn IntakeApi,
    search: &'a dyn SearchProvider,
    store: &'a dyn SessionStore,
    clock: &'a dyn Clock,
    settings: SearchSettings,
}

impl<'a> IntakeDriver<'a> {
    pub fn new(
        api: &'a dyn IntakeApi,
        search: &'a dyn SearchProvider,
        store: &'a dyn SessionStore,
        clock: &'a dyn Clock,
        settings: SearchSettings,
    ) -> Self {
        Self {
            api,
            search,
            store,
            clock,
            settings,
        }
    }

    pub fn run<I: IntakeInteraction + ?Sized>(&self, ui: &mut I) -> Result<IntakeOutcome, IntakeError> {
        let mut wizard = WizardState::new();

        loop {
            let step = wizard.current_step();
            output::section(format!(
                "Step {} of {}: {}",
                step.index() + 1,
                WizardStep::ALL.len(),
                step.title()
            ));
            output::progress(&progress_entries(step));

            let nav = match step {
                WizardStep::BasicInfo => self.basic_info(ui, &mut wizard),
                WizardStep::RiskFactors => self.risk_factors(ui, &mut wizard),
                WizardStep::Medications => self.entry_list::<MedicationEntry, I>(ui, &mut wizard)?,
                WizardStep::MedicalHistory => self.entry_list::<DiseaseEntry, I>(ui, &mut wizard)?,
            };
            debug!(?step, ?nav, "wizard step finished");

            match nav {
                StepNav::Advanced => {}
                StepNav::Back => {
                    wizard.retreat();
                }
                StepNav::Leave => {
                    info!("intake wizard abandoned");
                    return Ok(IntakeOutcome::Cancelled);
                }
                StepNav::Submit => match self.submit(&wizard) {
                    Ok(report) => {
                        io::print_success(WELCOME_MESSAGE);
                        if !report.session_persisted {
                            io::print_warning(
                                "Your session could not be saved. Sign in again with `mediaid_intake login`.",
                            );
                        }
                        return Ok(IntakeOutcome::Submitted(report));
                    }
                    // The draft stays on the last step so the user can retry.
                    Err(err @ SubmissionError::AccountCreation { .. }) => io::print_error(err),
                    Err(err) => return Err(err.into()),
                },
            }
        }
    }

    fn basic_info<I: IntakeInteraction + ?Sized>(&self, ui: &mut I, wizard: &mut WizardState) -> StepNav {
        let mut step = IdentityStep::from_draft(wizard.draft());
        loop {
            let flow = IdentityFlow::new(step.form());
            match run_form(&flow, ui) {
                FormResult::Completed(form) => {
                    for field in IdentityField::ALL {
                        step.set(field, form.get(field));
                    }
                    match wizard.submit_step(&mut step) {
                        Ok(()) => return StepNav::Advanced,
                        Err(errors) => {
                            for (_, message) in errors.iter() {
                                io::print_error(message);
                            }
                        }
                    }
                }
                FormResult::Back => {}
                FormResult::Cancelled => {
                    if ui.confirm_leave() {
                        return StepNav::Leave;
                    }
                }
            }
        }
    }

    fn risk_factors<I: IntakeInteraction + ?Sized>(&self, ui: &mut I, wizard: &mut WizardState) -> StepNav {
        let mut step = RiskFactorStep::from_draft(wizard.draft());
        loop {
            let measurements = step.measurements();
            let flow = RiskFactorFlow::new(
                step.risk_factors(),
                &measurements.height,
                &measurements.weight,
            );
            match run_form(&flow, ui) {
                FormResult::Completed(answers) => {
                    *step.risk_factors_mut() = answers.risk_factors;
                    step.set_height(answers.height);
                    step.set_weight(answers.weight);
                    let measurements = step.measurements();
                    io::print_info(bmi_line(&measurements.height, &measurements.weight));
                    match wizard.submit_step(&mut step) {
                        Ok(()) => return StepNav::Advanced,
                        Err(errors) => io::print_error(errors),
                    }
                }
                FormResult::Back => return StepNav::Back,
                FormResult::Cancelled => {
                    if ui.confirm_leave() {
                        return StepNav::Leave;
                    }
                }
            }
        }
    }

    fn entry_list<E, I>(&self, ui: &mut I, wizard: &mut WizardState) -> Result<StepNav, IntakeError>
    where
        E: EntryDetails,
        I: IntakeInteraction + ?Sized,
    {
        let mut step = EntryListStep::<E>::from_draft(wizard.draft(), self.settings);
        let kind = E::KIND;
        let is_last = E::STEP.is_last();

        loop {
            let mut lines = Vec::new();
            if step.entries().is_empty() {
                lines.push(format!("No {kind}s added yet."));
            } else {
                for (index, entry) in step.entries().iter().enumerate() {
                    lines.push(format!("  {}. {}", index + 1, entry.describe()));
                }
            }

            let mut pairs = vec![(format!("Add {kind}"), EntryAction::Add)];
            if !step.entries().is_empty() {
                pairs.push((format!("Edit {kind} details"), EntryAction::Edit));
                pairs.push((format!("Remove {kind}"), EntryAction::Remove));
            }
            let finish = if is_last { "Submit intake" } else { "Continue" };
            pairs.push((finish.to_string(), EntryAction::Finish));
            let actions = ChoiceMapper::from_pairs(pairs);

            let title = format!("{}: choose an action", E::STEP.title());
            let raw = match ui.choose(&title, &lines, &actions.options()) {
                ChoicePromptResult::Value(raw) => raw,
                // Returning discards list edits that were not merged yet.
                ChoicePromptResult::Back => return Ok(StepNav::Back),
                ChoicePromptResult::Cancel => {
                    if ui.confirm_leave() {
                        return Ok(StepNav::Leave);
                    }
                    continue;
                }
            };

            let Some(action) = actions
                .resolve(&raw)
                .and_then(|display| actions.value_for_display(&display).copied())
            else {
                match actions.suggest(&raw) {
                    Some(hint) => io::print_warning(format!("Unknown action `{raw}`. Did you mean `{hint}`?")),
                    None => io::print_warning(format!("Unknown action `{raw}`.")),
                }
                continue;
            };

            match action {
                EntryAction::Add => {
                    let Some(hit) = ui.search(step.search_mut(), self.search, self.clock) else {
                        continue;
                    };
                    let id = step.pick(&hit, self.clock);
                    io::print_success(format!("Added {}.", hit.name));
                    self.edit_entry(ui, &mut step, id)?;
                }
                EntryAction::Edit => {
                    if let Some(id) = pick_entry(ui, &step, "Edit which entry?") {
                        self.edit_entry(ui, &mut step, id)?;
                    }
                }
                EntryAction::Remove => {
                    if let Some(id) = pick_entry(ui, &step, "Remove which entry?") {
                        let removed = step.remove(id)?;
                        io::print_success(format!("Removed {}.", removed.name()));
                    }
                }
                EntryAction::Finish => match wizard.submit_step(&mut step) {
                    Ok(()) if is_last => return Ok(StepNav::Submit),
                    Ok(()) => return Ok(StepNav::Advanced),
                    Err(errors) => io::print_error(errors),
                },
            }
        }
    }

    fn edit_entry<E, I>(&self, ui: &mut I, step: &mut EntryListStep<E>, id: LocalId) -> Result<(), IntakeError>
    where
        E: EntryDetails,
        I: IntakeInteraction + ?Sized,
    {
        let Some(entry) = step.get(id).cloned() else {
            return Ok(());
        };
        if let FormResult::Completed(edits) = entry.edit_details(ui) {
            for edit in edits {
                step.update(id, edit)?;
            }
        }
        Ok(())
    }

    fn submit(&self, wizard: &WizardState) -> Result<SubmissionReport, SubmissionError> {
        io::print_info("Submitting your intake...");
        SubmissionOrchestrator::new(self.api, self.store).submit(wizard.draft())
    }
}

fn pick_entry<E, I>(ui: &mut I, step: &EntryListStep<E>, title: &str) -> Option<LocalId>
where
    E: EntryDetails,
    I: IntakeInteraction + ?Sized,
{
    let choices = ChoiceMapper::from_pairs(
        step.entries()
            .iter()
            .map(|entry| (entry.name().to_string(), entry.local_id()))
            .collect(),
    );
    match ui.choose(title, &[], &choices.options()) {
        ChoicePromptResult::Value(raw) => {
            let id = choices
                .resolve(&raw)
                .and_then(|display| choices.value_for_display(&display).copied());
            if id.is_none() {
                io::print_warning(format!("No entry matches `{raw}`."));
            }
            id
        }
        _ => None,
    }
}
