//! Field-by-field form engine used by the intake wizard.
//!
//! A step describes its inputs with a [`FormDescriptor`]; the [`FormEngine`]
//! walks those fields through a [`FormInteraction`], handling keep, back,
//! help and cancel responses before an optional review screen. Concrete
//! flows at the bottom of this module map collected values onto the step
//! forms from `mediaid-core`.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use mediaid_core::{IdentityField, IdentityForm, LoginRequest};
use mediaid_domain::{
    compute_bmi, AgeGroup, AlcoholConsumption, BloodPressure, BmiCategory, DiseaseEdit,
    DiseaseEntry, DiseaseStatus, FamilyHistory, Gender, MedicationEdit, MedicationEntry,
    PhysicalActivity, RiskFactorsDraft, RiskOption, Severity, SmokingStatus, StressLevel,
};
use strsim::levenshtein;

use crate::cli::io;
use crate::cli::output;
use crate::cli::ui::prompts::{
    choice_menu, confirm_menu, text_input, ChoicePromptResult, ConfirmationPromptResult,
    TextPromptResult,
};

const NOT_SPECIFIED: &str = "Not specified";
const MASKED_VALUE: &str = "********";

/// Outcome of running a form to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult<T> {
    Completed(T),
    /// The user stepped back past the first field of a form that allows it.
    Back,
    Cancelled,
}

/// Describes how prompts can be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// User supplied a concrete value.
    Value(String),
    /// User chose to keep the default/current value.
    Keep,
    /// Abort the entire form immediately.
    Cancel,
    /// Go back to the previous field.
    Back,
    /// Request additional information for the current field.
    Help,
}

/// Responses accepted when confirming the collected data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Confirm,
    Back,
    Cancel,
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    /// Never echoed or shown in summaries.
    Secret,
    Decimal,
    Date,
    Choice(Vec<String>),
}

type ValidatorCallback = dyn Fn(&str) -> Result<String, String> + Send + Sync;
type SharedValidatorCallback = Arc<ValidatorCallback>;

/// Built-in validation helpers.
#[derive(Clone)]
pub enum Validator {
    None,
    NonEmpty,
    Decimal,
    Date,
    Custom(SharedValidatorCallback),
}

impl Validator {
    fn validate(&self, input: &str) -> Result<String, ValidationError> {
        match self {
            Validator::None => Ok(input.to_string()),
            Validator::NonEmpty => {
                if input.trim().is_empty() {
                    Err(ValidationError::new("Value cannot be empty"))
                } else {
                    Ok(input.trim().to_string())
                }
            }
            Validator::Decimal => input
                .trim()
                .parse::<f64>()
                .map(|v| v.to_string())
                .map_err(|_| ValidationError::new("Enter a numeric value")),
            Validator::Date => NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
                .map(|d| d.to_string())
                .map_err(|_| ValidationError::new("Use YYYY-MM-DD format")),
            Validator::Custom(func) => func(input).map_err(ValidationError::new),
        }
    }
}

/// Declarative description of a single form field.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub help: Option<&'static str>,
    pub validator: Validator,
}

impl FieldDescriptor {
    pub fn new(
        key: &'static str,
        label: &'static str,
        kind: FieldKind,
        validator: Validator,
    ) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
            help: None,
            validator,
        }
    }

    pub fn with_optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    fn is_secret(&self) -> bool {
        matches!(self.kind, FieldKind::Secret)
    }
}

/// Metadata describing a full form, including field order.
pub struct FormDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
    /// Show the review screen before committing.
    pub review: bool,
    /// `Back` on the first field leaves the form with [`FormResult::Back`].
    pub back_exits: bool,
}

impl FormDescriptor {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            fields,
            review: true,
            back_exits: false,
        }
    }

    pub fn with_back_exit(mut self) -> Self {
        self.back_exits = true;
        self
    }

    pub fn without_review(mut self) -> Self {
        self.review = false;
        self
    }
}

/// Menu-style choices that accept the display label, the bare label, or its
/// 1-based index.
#[derive(Clone)]
pub(crate) struct ChoiceMapper<T: Clone + PartialEq + Send + Sync> {
    labels: Vec<String>,
    display: Vec<String>,
    values: Vec<T>,
    alias_to_index: HashMap<String, usize>,
}

impl<T: Clone + PartialEq + Send + Sync> ChoiceMapper<T> {
    pub(crate) fn from_pairs(pairs: Vec<(String, T)>) -> Self {
        let mut labels = Vec::new();
        let mut display = Vec::new();
        let mut values = Vec::new();
        let mut alias_to_index = HashMap::new();

        for (idx, (label, value)) in pairs.into_iter().enumerate() {
            let index = idx + 1;
            let display_label = format!("[{}] {}", index, label);
            alias_to_index.insert(index.to_string(), idx);
            alias_to_index.insert(label.to_ascii_lowercase(), idx);
            alias_to_index.insert(display_label.to_ascii_lowercase(), idx);
            labels.push(label);
            display.push(display_label);
            values.push(value);
        }

        Self {
            labels,
            display,
            values,
            alias_to_index,
        }
    }

    pub(crate) fn options(&self) -> Vec<String> {
        self.display.clone()
    }

    pub(crate) fn resolve(&self, input: &str) -> Option<String> {
        let key = input.trim().to_ascii_lowercase();
        self.alias_to_index
            .get(&key)
            .map(|index| self.display[*index].clone())
    }

    /// Closest label within a small edit distance, for "did you mean" hints.
    pub(crate) fn suggest(&self, input: &str) -> Option<&str> {
        let needle = input.trim().to_ascii_lowercase();
        self.labels
            .iter()
            .map(|label| (levenshtein(&needle, &label.to_ascii_lowercase()), label))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, label)| label.as_str())
    }

    pub(crate) fn value_for_display(&self, display: &str) -> Option<&T> {
        self.display
            .iter()
            .position(|candidate| candidate == display)
            .and_then(|index| self.values.get(index))
    }

    pub(crate) fn display_for_value(&self, value: &T) -> Option<String> {
        self.values
            .iter()
            .position(|candidate| candidate == value)
            .map(|index| self.display[index].clone())
    }
}

fn make_choice_validator<T: Clone + PartialEq + Send + Sync + 'static>(
    mapper: ChoiceMapper<T>,
    field_label: &'static str,
) -> Validator {
    Validator::Custom(Arc::new(move |input| {
        if let Some(display) = mapper.resolve(input) {
            return Ok(display);
        }
        let mut message = format!(
            "Select a valid {} (options: {})",
            field_label,
            mapper.labels.join(", ")
        );
        if let Some(suggestion) = mapper.suggest(input) {
            message.push_str(&format!(". Did you mean `{suggestion}`?"));
        }
        Err(message)
    }))
}

fn make_optional_date_validator() -> Validator {
    Validator::Custom(Arc::new(|input| {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            Ok(String::new())
        } else {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| date.to_string())
                .map_err(|_| "Use YYYY-MM-DD format".to_string())
        }
    }))
}

fn make_optional_measure_validator(unit: &'static str) -> Validator {
    Validator::Custom(Arc::new(move |input| {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(trimmed.to_string()),
            Ok(_) => Err(format!("Enter a positive number of {unit}")),
            Err(_) => Err(format!("Enter a number of {unit} (e.g., 72.5)")),
        }
    }))
}

fn parse_optional_date(value: Option<&String>) -> Option<NaiveDate> {
    value.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
}

#[derive(Debug, Default)]
pub struct FormSummary {
    pub entries: Vec<(String, String)>,
}

/// Data handed to the interaction when prompting for one field.
pub struct PromptContext<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub default: Option<&'a str>,
    pub index: usize,
    pub total: usize,
}

/// Interaction surface used by the form engine.
pub trait FormInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse;

    fn confirm(&mut self, summary: &FormSummary, lines: &[String]) -> ConfirmationResponse;
}

/// Terminal implementation backed by the shared prompt components.
#[derive(Debug, Default)]
pub struct WizardInteraction;

impl WizardInteraction {
    pub fn new() -> Self {
        Self
    }

    fn prompt_text(&mut self, context: &PromptContext<'_>) -> PromptResponse {
        let masked = context.descriptor.is_secret();
        match text_input(context.descriptor.label, context.default, masked) {
            Ok(TextPromptResult::Value(value)) => PromptResponse::Value(value),
            Ok(TextPromptResult::Keep) => PromptResponse::Keep,
            Ok(TextPromptResult::Back) => PromptResponse::Back,
            Ok(TextPromptResult::Help) => PromptResponse::Help,
            Ok(TextPromptResult::Escape) => {
                if context.index == 0 {
                    PromptResponse::Cancel
                } else {
                    PromptResponse::Back
                }
            }
            Ok(TextPromptResult::Cancel) | Err(_) => PromptResponse::Cancel,
        }
    }

    fn prompt_choice(&mut self, context: &PromptContext<'_>, options: &[String]) -> PromptResponse {
        let mut lines = self.choice_context_lines(context);
        if let Some(help) = context.descriptor.help {
            lines.push(help.to_string());
        }
        let title = self.step_title(context);
        match choice_menu(&title, &lines, options, context.default, true) {
            Ok(ChoicePromptResult::Value(value)) => {
                if context
                    .default
                    .map(|d| d.eq_ignore_ascii_case(&value))
                    .unwrap_or(false)
                {
                    PromptResponse::Keep
                } else {
                    PromptResponse::Value(value)
                }
            }
            Ok(ChoicePromptResult::Back) => PromptResponse::Back,
            _ => PromptResponse::Cancel,
        }
    }

    fn choice_context_lines(&self, context: &PromptContext<'_>) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(default) = context.default {
            lines.push(format!("Current: {}", default));
        }
        lines.push("Use ↑ ↓ to highlight an option, Enter to select.".into());
        lines.push("Press ESC to cancel.".into());
        lines.push("Select ← Back to revisit the previous field.".into());
        lines
    }

    fn step_title(&self, context: &PromptContext<'_>) -> String {
        format!(
            "Field {} of {}: {}",
            context.index + 1,
            context.total,
            context.descriptor.label
        )
    }
}

impl FormInteraction for WizardInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
        match &context.descriptor.kind {
            FieldKind::Choice(options) => self.prompt_choice(context, options),
            _ => self.prompt_text(context),
        }
    }

    fn confirm(&mut self, _summary: &FormSummary, lines: &[String]) -> ConfirmationResponse {
        let mut context_lines = Vec::new();
        context_lines.extend_from_slice(lines);
        context_lines.push(String::new());
        context_lines.push(
            "Use the menu below to confirm, edit the previous field, or cancel. ESC cancels."
                .into(),
        );
        match confirm_menu(&context_lines) {
            Ok(ConfirmationPromptResult::Confirm) => ConfirmationResponse::Confirm,
            Ok(ConfirmationPromptResult::Back) => ConfirmationResponse::Back,
            _ => ConfirmationResponse::Cancel,
        }
    }
}

/// In-progress form session. Callers may drive it manually or use
/// [`FormEngine::run`] to handle the whole loop.
pub struct FormSession<'a> {
    descriptor: &'a FormDescriptor,
    values: BTreeMap<String, String>,
    index: usize,
    completed: bool,
    cancelled: bool,
}

impl<'a> FormSession<'a> {
    pub fn new(descriptor: &'a FormDescriptor, defaults: BTreeMap<String, String>) -> Self {
        Self {
            descriptor,
            values: defaults,
            index: 0,
            completed: false,
            cancelled: false,
        }
    }

    pub fn start(&mut self) -> Option<FormStep<'_>> {
        self.index = 0;
        self.current_field()
    }

    pub fn current_field(&self) -> Option<FormStep<'_>> {
        self.descriptor.fields.get(self.index).map(|field| FormStep {
            descriptor: field,
            default: self.values.get(field.key).filter(|v| !v.is_empty()).cloned(),
            index: self.index,
            total: self.descriptor.fields.len(),
        })
    }

    pub fn apply_response(
        &mut self,
        response: PromptResponse,
    ) -> Result<FormSessionEvent, ValidationError> {
        if self.completed || self.cancelled {
            return Ok(FormSessionEvent::NoOp);
        }

        let Some(field) = self.descriptor.fields.get(self.index) else {
            return Ok(FormSessionEvent::NoOp);
        };

        match response {
            PromptResponse::Cancel => {
                self.cancelled = true;
                Ok(FormSessionEvent::Cancelled)
            }
            PromptResponse::Back => {
                if self.index > 0 {
                    self.index -= 1;
                    Ok(FormSessionEvent::Moved)
                } else if self.descriptor.back_exits {
                    Ok(FormSessionEvent::ExitedBack)
                } else {
                    io::print_warning("Already at the first field.");
                    Ok(FormSessionEvent::Repeat)
                }
            }
            PromptResponse::Help => {
                if let Some(help) = field.help {
                    io::print_info(help);
                } else {
                    io::print_info("No additional information available for this field.");
                }
                Ok(FormSessionEvent::Repeat)
            }
            PromptResponse::Keep => {
                let has_value = self
                    .values
                    .get(field.key)
                    .map(|value| !value.is_empty())
                    .unwrap_or(false);
                if has_value {
                    self.index += 1;
                    Ok(FormSessionEvent::Moved)
                } else if field.required {
                    io::print_warning("This field is required.");
                    Ok(FormSessionEvent::Repeat)
                } else {
                    self.values.remove(field.key);
                    self.index += 1;
                    Ok(FormSessionEvent::Moved)
                }
            }
            PromptResponse::Value(raw) => match self.validate_field(field, &raw) {
                Ok(value) => {
                    self.values.insert(field.key.to_string(), value);
                    self.index += 1;
                    Ok(FormSessionEvent::Moved)
                }
                Err(err) => {
                    io::print_warning(&err.message);
                    Err(err)
                }
            },
        }
    }

    fn validate_field(
        &self,
        field: &FieldDescriptor,
        raw: &str,
    ) -> Result<String, ValidationError> {
        match (&field.kind, &field.validator) {
            (FieldKind::Choice(options), Validator::None) => {
                let normalized = raw.trim().to_lowercase();
                options
                    .iter()
                    .find(|candidate| candidate.to_lowercase() == normalized)
                    .cloned()
                    .ok_or_else(|| {
                        ValidationError::new(format!(
                            "Value must be one of: {}",
                            options.join(", ")
                        ))
                    })
            }
            (FieldKind::Secret, Validator::None) => Ok(raw.to_string()),
            (FieldKind::Decimal, Validator::None) => Validator::Decimal.validate(raw),
            (FieldKind::Date, Validator::None) => Validator::Date.validate(raw),
            (_, Validator::None) => Ok(raw.trim().to_string()),
            (_, validator) => validator.validate(raw),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.descriptor.fields.len()
    }

    pub fn mark_complete(&mut self) {
        self.completed = true;
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSessionEvent {
    Moved,
    Repeat,
    Cancelled,
    ExitedBack,
    NoOp,
}

/// Data provided to render the current field.
pub struct FormStep<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub default: Option<String>,
    pub index: usize,
    pub total: usize,
}

impl<'a> FormStep<'a> {
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// Contract for a concrete form: its fields, starting values, review text
/// and the conversion of collected values into a typed output.
pub trait FormFlow {
    type Output;
    type Error;

    fn descriptor(&self) -> &FormDescriptor;

    fn defaults(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Lines shown on the review screen.
    fn review_lines(&self, values: &BTreeMap<String, String>) -> Vec<String> {
        format_summary_lines(&build_summary(self.descriptor(), values))
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error>;
}

/// Drives a [`FormFlow`] using a [`FormInteraction`] implementation.
pub struct FormEngine<'a, F: FormFlow> {
    flow: &'a F,
}

impl<'a, F: FormFlow> FormEngine<'a, F> {
    pub fn new(flow: &'a F) -> Self {
        Self { flow }
    }

    pub fn run<I: FormInteraction + ?Sized>(
        &self,
        interaction: &mut I,
    ) -> Result<FormResult<F::Output>, F::Error> {
        let descriptor = self.flow.descriptor();
        let mut session = FormSession::new(descriptor, self.flow.defaults());

        session.start();

        loop {
            if session.cancelled {
                return Ok(FormResult::Cancelled);
            }

            if session.is_complete() {
                if !descriptor.review {
                    session.mark_complete();
                    let output = self.flow.commit(session.values().clone())?;
                    return Ok(FormResult::Completed(output));
                }
                let summary = build_summary(descriptor, session.values());
                let summary_lines = self.flow.review_lines(session.values());
                match interaction.confirm(&summary, &summary_lines) {
                    ConfirmationResponse::Confirm => {
                        session.mark_complete();
                        let output = self.flow.commit(session.values().clone())?;
                        return Ok(FormResult::Completed(output));
                    }
                    ConfirmationResponse::Back => {
                        if descriptor.fields.is_empty() {
                            return Ok(FormResult::Cancelled);
                        }
                        session.index = descriptor.fields.len() - 1;
                        continue;
                    }
                    ConfirmationResponse::Cancel => {
                        session.mark_cancelled();
                        return Ok(FormResult::Cancelled);
                    }
                }
            }

            let Some(step) = session.current_field() else {
                session.mark_complete();
                continue;
            };

            let response = {
                let context = PromptContext {
                    descriptor: step.descriptor,
                    default: step.default_value(),
                    index: step.index,
                    total: step.total,
                };
                if !matches!(context.descriptor.kind, FieldKind::Choice(_)) {
                    render_prompt(&context);
                }
                interaction.prompt_field(&context)
            };
            if let PromptResponse::Cancel = response {
                session.mark_cancelled();
                return Ok(FormResult::Cancelled);
            }

            match session.apply_response(response) {
                Ok(FormSessionEvent::Moved | FormSessionEvent::Repeat | FormSessionEvent::NoOp) => {
                    continue;
                }
                Ok(FormSessionEvent::ExitedBack) => return Ok(FormResult::Back),
                Ok(FormSessionEvent::Cancelled) => return Ok(FormResult::Cancelled),
                // Already reported by the session.
                Err(_) => continue,
            }
        }
    }
}

fn render_prompt(context: &PromptContext<'_>) {
    output::section(format!(
        "Field {} of {}: {}",
        context.index + 1,
        context.total,
        context.descriptor.label
    ));
    if let Some(default_value) = context.default {
        let shown = if context.descriptor.is_secret() {
            MASKED_VALUE
        } else {
            default_value
        };
        output::line(format!("Current: {}", shown));
    }
    if let Some(help) = context.descriptor.help {
        output::line(help);
    }
    let mut instructions = vec!["Type a value and press Enter to continue.".to_string()];
    if context.index == 0 {
        instructions.push("Press ESC to cancel.".into());
    } else {
        instructions.push("Press ESC to return to the previous field.".into());
    }
    instructions.push("Type :help for details or :clear to remove the current value.".into());
    instructions.push("Type :back to revisit the previous field.".into());
    output::line(instructions.join(" "));
}

fn format_summary_lines(summary: &FormSummary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Review your entries:".into());
    for (key, value) in &summary.entries {
        lines.push(format!("  {}: {}", key, value));
    }
    lines
}

fn build_summary(descriptor: &FormDescriptor, values: &BTreeMap<String, String>) -> FormSummary {
    let mut summary = FormSummary::default();
    for field in &descriptor.fields {
        let shown = match values.get(field.key).filter(|value| !value.is_empty()) {
            Some(_) if field.is_secret() => MASKED_VALUE.to_string(),
            Some(value) => value.clone(),
            None => "[unfilled]".to_string(),
        };
        summary.entries.push((field.label.to_string(), shown));
    }
    summary
}

fn selected<'m, T: Clone + PartialEq + Send + Sync>(
    mapper: &'m ChoiceMapper<T>,
    values: &BTreeMap<String, String>,
    key: &str,
) -> Option<&'m T> {
    values
        .get(key)
        .and_then(|display| mapper.value_for_display(display))
}

/// Step 1 inputs. Field-level checks stay light; the identity step itself
/// produces the blocking messages once the form is committed.
pub struct IdentityFlow {
    descriptor: FormDescriptor,
    defaults: BTreeMap<String, String>,
    gender_choices: ChoiceMapper<Gender>,
}

impl IdentityFlow {
    pub fn new(current: &IdentityForm) -> Self {
        let gender_choices = ChoiceMapper::from_pairs(
            Gender::ALL
                .iter()
                .map(|gender| (gender.label().to_string(), *gender))
                .collect(),
        );
        let gender_validator = make_choice_validator(gender_choices.clone(), "gender");

        let fields = vec![
            FieldDescriptor::new(
                IdentityField::Username.key(),
                "Username",
                FieldKind::Text,
                Validator::None,
            )
            .with_optional(),
            FieldDescriptor::new(
                IdentityField::Email.key(),
                "Email",
                FieldKind::Text,
                Validator::None,
            )
            .with_optional(),
            FieldDescriptor::new(
                IdentityField::Password.key(),
                "Password",
                FieldKind::Secret,
                Validator::None,
            )
            .with_optional()
            .with_help("At least 8 characters."),
            FieldDescriptor::new(
                IdentityField::DateOfBirth.key(),
                "Date of birth",
                FieldKind::Date,
                make_optional_date_validator(),
            )
            .with_optional()
            .with_help("Use YYYY-MM-DD."),
            FieldDescriptor::new(
                IdentityField::Gender.key(),
                "Gender",
                FieldKind::Choice(gender_choices.options()),
                gender_validator,
            )
            .with_optional(),
            FieldDescriptor::new(
                IdentityField::Height.key(),
                "Height (cm)",
                FieldKind::Decimal,
                make_optional_measure_validator("centimetres"),
            )
            .with_optional()
            .with_help("Optional. Used with weight to calculate BMI."),
            FieldDescriptor::new(
                IdentityField::Weight.key(),
                "Weight (kg)",
                FieldKind::Decimal,
                make_optional_measure_validator("kilograms"),
            )
            .with_optional()
            .with_help("Optional. Used with height to calculate BMI."),
        ];

        let mut defaults = BTreeMap::new();
        for field in IdentityField::ALL {
            let value = current.get(field);
            if value.is_empty() {
                continue;
            }
            if field == IdentityField::Gender {
                if let Some(display) = Gender::parse(value)
                    .and_then(|gender| gender_choices.display_for_value(&gender))
                {
                    defaults.insert(field.key().to_string(), display);
                }
            } else {
                defaults.insert(field.key().to_string(), value.to_string());
            }
        }

        Self {
            descriptor: FormDescriptor::new("basic-info", fields),
            defaults,
            gender_choices,
        }
    }
}

impl FormFlow for IdentityFlow {
    type Output = IdentityForm;
    type Error = Infallible;

    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn defaults(&self) -> BTreeMap<String, String> {
        self.defaults.clone()
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
        let text = |field: IdentityField| values.get(field.key()).cloned().unwrap_or_default();
        let gender = selected(&self.gender_choices, &values, IdentityField::Gender.key())
            .map(|gender| gender.tag().to_string())
            .unwrap_or_default();

        Ok(IdentityForm {
            username: text(IdentityField::Username),
            email: text(IdentityField::Email),
            password: text(IdentityField::Password),
            date_of_birth: text(IdentityField::DateOfBirth),
            gender,
            height: text(IdentityField::Height),
            weight: text(IdentityField::Weight),
        })
    }
}

/// Collected step 2 answers, ready for the risk factor step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskFactorAnswers {
    pub risk_factors: RiskFactorsDraft,
    pub height: String,
    pub weight: String,
}

type TagChoices = ChoiceMapper<Option<&'static str>>;

fn risk_choices<T: RiskOption>() -> TagChoices {
    let mut pairs = vec![(NOT_SPECIFIED.to_string(), None)];
    pairs.extend(
        T::options()
            .iter()
            .map(|option| (option.label().to_string(), Some(option.tag()))),
    );
    ChoiceMapper::from_pairs(pairs)
}

/// Step 2: every risk factor is optional; BMI is shown on review.
pub struct RiskFactorFlow {
    descriptor: FormDescriptor,
    defaults: BTreeMap<String, String>,
    choices: Vec<(&'static str, TagChoices)>,
}

impl RiskFactorFlow {
    pub fn new(current: &RiskFactorsDraft, height: &str, weight: &str) -> Self {
        let catalogue: Vec<(&'static str, &'static str, TagChoices, Option<&'static str>)> = vec![
            (
                "smokingStatus",
                "Smoking status",
                risk_choices::<SmokingStatus>(),
                current.smoking_status.map(|v| v.tag()),
            ),
            (
                "alcoholConsumption",
                "Alcohol consumption",
                risk_choices::<AlcoholConsumption>(),
                current.alcohol_consumption.map(|v| v.tag()),
            ),
            (
                "physicalActivity",
                "Physical activity",
                risk_choices::<PhysicalActivity>(),
                current.physical_activity.map(|v| v.tag()),
            ),
            (
                "bloodPressure",
                "Blood pressure",
                risk_choices::<BloodPressure>(),
                current.blood_pressure.map(|v| v.tag()),
            ),
            (
                "stressLevel",
                "Stress level",
                risk_choices::<StressLevel>(),
                current.stress_level.map(|v| v.tag()),
            ),
            (
                "ageGroup",
                "Age group",
                risk_choices::<AgeGroup>(),
                current.age_group.map(|v| v.tag()),
            ),
            (
                "familyHeartDisease",
                "Family history of heart disease",
                risk_choices::<FamilyHistory>(),
                current.family_heart_disease.map(|v| v.tag()),
            ),
            (
                "familyCancer",
                "Family history of cancer",
                risk_choices::<FamilyHistory>(),
                current.family_cancer.map(|v| v.tag()),
            ),
        ];

        let mut fields = Vec::new();
        let mut defaults = BTreeMap::new();
        let mut choices = Vec::new();
        for (key, label, mapper, value) in catalogue {
            let validator = make_choice_validator(mapper.clone(), label);
            fields.push(
                FieldDescriptor::new(key, label, FieldKind::Choice(mapper.options()), validator)
                    .with_optional(),
            );
            if let Some(display) = mapper.display_for_value(&value) {
                defaults.insert(key.to_string(), display);
            }
            choices.push((key, mapper));
        }

        fields.push(
            FieldDescriptor::new(
                IdentityField::Height.key(),
                "Height (cm)",
                FieldKind::Decimal,
                make_optional_measure_validator("centimetres"),
            )
            .with_optional(),
        );
        fields.push(
            FieldDescriptor::new(
                IdentityField::Weight.key(),
                "Weight (kg)",
                FieldKind::Decimal,
                make_optional_measure_validator("kilograms"),
            )
            .with_optional(),
        );
        if !height.trim().is_empty() {
            defaults.insert(IdentityField::Height.key().to_string(), height.to_string());
        }
        if !weight.trim().is_empty() {
            defaults.insert(IdentityField::Weight.key().to_string(), weight.to_string());
        }

        Self {
            descriptor: FormDescriptor::new("risk-factors", fields).with_back_exit(),
            defaults,
            choices,
        }
    }

    fn tag(&self, values: &BTreeMap<String, String>, key: &str) -> Option<&'static str> {
        self.choices
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .and_then(|(_, mapper)| selected(mapper, values, key))
            .copied()
            .flatten()
    }
}

/// One review line for the BMI derived from the entered measurements.
pub fn bmi_line(height: &str, weight: &str) -> String {
    match compute_bmi(height, weight) {
        Some(bmi) => format!("BMI: {:.2} ({})", bmi, BmiCategory::from_bmi(bmi)),
        None => "BMI: enter height and weight to calculate".to_string(),
    }
}

impl FormFlow for RiskFactorFlow {
    type Output = RiskFactorAnswers;
    type Error = Infallible;

    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn defaults(&self) -> BTreeMap<String, String> {
        self.defaults.clone()
    }

    fn review_lines(&self, values: &BTreeMap<String, String>) -> Vec<String> {
        let mut lines = format_summary_lines(&build_summary(&self.descriptor, values));
        let height = values.get(IdentityField::Height.key()).map(String::as_str);
        let weight = values.get(IdentityField::Weight.key()).map(String::as_str);
        lines.push(format!(
            "  {}",
            bmi_line(height.unwrap_or_default(), weight.unwrap_or_default())
        ));
        lines
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
        let risk_factors = RiskFactorsDraft {
            smoking_status: self
                .tag(&values, "smokingStatus")
                .and_then(SmokingStatus::from_tag),
            alcohol_consumption: self
                .tag(&values, "alcoholConsumption")
                .and_then(AlcoholConsumption::from_tag),
            physical_activity: self
                .tag(&values, "physicalActivity")
                .and_then(PhysicalActivity::from_tag),
            blood_pressure: self
                .tag(&values, "bloodPressure")
                .and_then(BloodPressure::from_tag),
            stress_level: self.tag(&values, "stressLevel").and_then(StressLevel::from_tag),
            age_group: self.tag(&values, "ageGroup").and_then(AgeGroup::from_tag),
            family_heart_disease: self
                .tag(&values, "familyHeartDisease")
                .and_then(FamilyHistory::from_tag),
            family_cancer: self
                .tag(&values, "familyCancer")
                .and_then(FamilyHistory::from_tag),
        };

        Ok(RiskFactorAnswers {
            risk_factors,
            height: values
                .get(IdentityField::Height.key())
                .cloned()
                .unwrap_or_default(),
            weight: values
                .get(IdentityField::Weight.key())
                .cloned()
                .unwrap_or_default(),
        })
    }
}

/// Dosage, frequency and start date of a listed medication.
pub struct MedicationDetailsFlow {
    descriptor: FormDescriptor,
    defaults: BTreeMap<String, String>,
}

impl MedicationDetailsFlow {
    pub fn new(entry: &MedicationEntry) -> Self {
        let fields = vec![
            FieldDescriptor::new("dosage", "Dosage", FieldKind::Text, Validator::None)
                .with_optional()
                .with_help("Free text, e.g. 500mg."),
            FieldDescriptor::new("frequency", "Frequency", FieldKind::Text, Validator::None)
                .with_optional()
                .with_help("Free text, e.g. twice daily."),
            FieldDescriptor::new(
                "startDate",
                "Start date",
                FieldKind::Date,
                make_optional_date_validator(),
            )
            .with_optional()
            .with_help("Use YYYY-MM-DD. Type :clear to remove it."),
        ];

        let mut defaults = BTreeMap::new();
        if !entry.dosage.is_empty() {
            defaults.insert("dosage".to_string(), entry.dosage.clone());
        }
        if !entry.frequency.is_empty() {
            defaults.insert("frequency".to_string(), entry.frequency.clone());
        }
        if let Some(date) = entry.start_date {
            defaults.insert("startDate".to_string(), date.to_string());
        }

        Self {
            descriptor: FormDescriptor::new("medication", fields),
            defaults,
        }
    }
}

impl FormFlow for MedicationDetailsFlow {
    type Output = Vec<MedicationEdit>;
    type Error = Infallible;

    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn defaults(&self) -> BTreeMap<String, String> {
        self.defaults.clone()
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
        Ok(vec![
            MedicationEdit::Dosage(values.get("dosage").cloned().unwrap_or_default()),
            MedicationEdit::Frequency(values.get("frequency").cloned().unwrap_or_default()),
            MedicationEdit::StartDate(parse_optional_date(values.get("startDate"))),
        ])
    }
}

/// Diagnosis date, severity and status of a listed condition.
pub struct DiseaseDetailsFlow {
    descriptor: FormDescriptor,
    defaults: BTreeMap<String, String>,
    severity_choices: ChoiceMapper<Option<Severity>>,
    status_choices: ChoiceMapper<DiseaseStatus>,
}

impl DiseaseDetailsFlow {
    pub fn new(entry: &DiseaseEntry) -> Self {
        let mut severity_pairs = vec![(NOT_SPECIFIED.to_string(), None)];
        severity_pairs.extend(
            Severity::ALL
                .iter()
                .map(|severity| (severity.to_string(), Some(*severity))),
        );
        let severity_choices = ChoiceMapper::from_pairs(severity_pairs);
        let status_choices = ChoiceMapper::from_pairs(
            DiseaseStatus::ALL
                .iter()
                .map(|status| (status.to_string(), *status))
                .collect(),
        );

        let fields = vec![
            FieldDescriptor::new(
                "diagnosisDate",
                "Diagnosis date",
                FieldKind::Date,
                make_optional_date_validator(),
            )
            .with_optional()
            .with_help("Use YYYY-MM-DD. Type :clear to remove it."),
            FieldDescriptor::new(
                "severity",
                "Severity",
                FieldKind::Choice(severity_choices.options()),
                make_choice_validator(severity_choices.clone(), "severity"),
            )
            .with_optional(),
            FieldDescriptor::new(
                "status",
                "Status",
                FieldKind::Choice(status_choices.options()),
                make_choice_validator(status_choices.clone(), "status"),
            ),
        ];

        let mut defaults = BTreeMap::new();
        if let Some(date) = entry.diagnosis_date {
            defaults.insert("diagnosisDate".to_string(), date.to_string());
        }
        if let Some(display) = severity_choices.display_for_value(&entry.severity) {
            defaults.insert("severity".to_string(), display);
        }
        if let Some(display) = status_choices.display_for_value(&entry.status_or_default()) {
            defaults.insert("status".to_string(), display);
        }

        Self {
            descriptor: FormDescriptor::new("condition", fields),
            defaults,
            severity_choices,
            status_choices,
        }
    }
}

impl FormFlow for DiseaseDetailsFlow {
    type Output = Vec<DiseaseEdit>;
    type Error = Infallible;

    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn defaults(&self) -> BTreeMap<String, String> {
        self.defaults.clone()
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
        let severity = selected(&self.severity_choices, &values, "severity")
            .copied()
            .flatten();
        let status = selected(&self.status_choices, &values, "status")
            .copied()
            .unwrap_or_default();
        Ok(vec![
            DiseaseEdit::DiagnosisDate(parse_optional_date(values.get("diagnosisDate"))),
            DiseaseEdit::Severity(severity),
            DiseaseEdit::Status(status),
        ])
    }
}

/// Credentials collected by `login`.
pub struct LoginFlow {
    descriptor: FormDescriptor,
}

impl LoginFlow {
    pub fn new() -> Self {
        let descriptor = FormDescriptor::new(
            "Sign in",
            vec![
                FieldDescriptor::new("mail", "Email", FieldKind::Text, Validator::NonEmpty),
                FieldDescriptor::new("password", "Password", FieldKind::Secret, Validator::NonEmpty),
            ],
        )
        .without_review();
        Self { descriptor }
    }
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl FormFlow for LoginFlow {
    type Output = LoginRequest;
    type Error = Infallible;

    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
        let field = |key: &str| values.get(key).cloned().unwrap_or_default();
        Ok(LoginRequest {
            mail: field("mail"),
            password: field("password"),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mediaid_domain::{LocalId, SearchHit};
    use std::collections::VecDeque;
    use std::sync::OnceLock;

    pub(crate) struct MockInteraction {
        pub(crate) prompts: VecDeque<PromptResponse>,
        pub(crate) confirmations: VecDeque<ConfirmationResponse>,
        pub(crate) help_hits: usize,
        pub(crate) reviews: Vec<Vec<String>>,
    }

    impl MockInteraction {
        pub(crate) fn new(
            prompts: Vec<PromptResponse>,
            confirmations: Vec<ConfirmationResponse>,
        ) -> Self {
            Self {
                prompts: prompts.into(),
                confirmations: confirmations.into(),
                help_hits: 0,
                reviews: Vec::new(),
            }
        }
    }

    impl FormInteraction for MockInteraction {
        fn prompt_field(&mut self, _context: &PromptContext<'_>) -> PromptResponse {
            let response = self.prompts.pop_front().unwrap_or(PromptResponse::Cancel);
            if matches!(response, PromptResponse::Help) {
                self.help_hits += 1;
            }
            response
        }

        fn confirm(&mut self, _summary: &FormSummary, lines: &[String]) -> ConfirmationResponse {
            self.reviews.push(lines.to_vec());
            self.confirmations
                .pop_front()
                .unwrap_or(ConfirmationResponse::Confirm)
        }
    }

    struct TestForm;

    impl FormFlow for TestForm {
        type Output = BTreeMap<String, String>;
        type Error = &'static str;

        fn descriptor(&self) -> &FormDescriptor {
            static DESCRIPTOR: OnceLock<FormDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                FormDescriptor::new(
                    "test",
                    vec![
                        FieldDescriptor::new("name", "Name", FieldKind::Text, Validator::NonEmpty),
                        FieldDescriptor::new(
                            "weight",
                            "Weight",
                            FieldKind::Decimal,
                            make_optional_measure_validator("kilograms"),
                        )
                        .with_help("Weight in kilograms."),
                    ],
                )
            })
        }

        fn commit(&self, values: BTreeMap<String, String>) -> Result<Self::Output, Self::Error> {
            Ok(values)
        }
    }

    fn completed<T: fmt::Debug>(result: FormResult<T>) -> T {
        match result {
            FormResult::Completed(value) => value,
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn form_reprompts_on_invalid_input() {
        let form = TestForm;
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Value("".into()),
                PromptResponse::Value("Ana".into()),
                PromptResponse::Value("-5".into()),
                PromptResponse::Value("61.5".into()),
            ],
            vec![ConfirmationResponse::Confirm],
        );

        let values = completed(FormEngine::new(&form).run(&mut interaction).unwrap());
        assert_eq!(values.get("name").unwrap(), "Ana");
        assert_eq!(values.get("weight").unwrap(), "61.5");
    }

    #[test]
    fn form_supports_back_and_help() {
        let form = TestForm;
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Value("Ana".into()),
                PromptResponse::Help,
                PromptResponse::Back,
                PromptResponse::Value("Bea".into()),
                PromptResponse::Value("70".into()),
            ],
            vec![ConfirmationResponse::Confirm],
        );

        let values = completed(FormEngine::new(&form).run(&mut interaction).unwrap());
        assert_eq!(interaction.help_hits, 1);
        assert_eq!(values.get("name").unwrap(), "Bea");
    }

    #[test]
    fn back_on_first_field_only_exits_when_allowed() {
        let form = TestForm;
        let mut interaction = MockInteraction::new(
            vec![PromptResponse::Back, PromptResponse::Cancel],
            vec![],
        );
        let result = FormEngine::new(&form).run(&mut interaction).unwrap();
        assert_eq!(result, FormResult::Cancelled);

        let flow = RiskFactorFlow::new(&RiskFactorsDraft::default(), "", "");
        let mut interaction = MockInteraction::new(vec![PromptResponse::Back], vec![]);
        let result = FormEngine::new(&flow).run(&mut interaction).unwrap();
        assert_eq!(result, FormResult::Back);
    }

    #[test]
    fn identity_flow_maps_gender_and_keeps_password_verbatim() {
        let flow = IdentityFlow::new(&IdentityForm::default());
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Value("ana".into()),
                PromptResponse::Value("ana@example.com".into()),
                PromptResponse::Value(" secret pw ".into()),
                PromptResponse::Value("1990-04-12".into()),
                PromptResponse::Value("2".into()),
                PromptResponse::Value("165".into()),
                PromptResponse::Keep,
            ],
            vec![ConfirmationResponse::Confirm],
        );

        let form = completed(FormEngine::new(&flow).run(&mut interaction).unwrap());
        assert_eq!(form.gender, "female");
        assert_eq!(form.password, " secret pw ");
        assert_eq!(form.height, "165");
        assert!(form.weight.is_empty());
        let review = interaction.reviews.concat();
        assert!(review.iter().any(|line| line == "  Password: ********"));
    }

    #[test]
    fn identity_flow_prefills_from_existing_input() {
        let current = IdentityForm {
            username: "ana".into(),
            gender: "other".into(),
            ..IdentityForm::default()
        };
        let flow = IdentityFlow::new(&current);
        let defaults = flow.defaults();
        assert_eq!(defaults.get("username").unwrap(), "ana");
        assert_eq!(defaults.get("gender").unwrap(), "[3] Other");
        assert!(!defaults.contains_key("email"));
    }

    #[test]
    fn bmi_line_shows_two_decimals() {
        assert_eq!(bmi_line("170", "65"), "BMI: 22.49 (Normal)");
        assert_eq!(bmi_line("180", "81"), "BMI: 25.00 (Overweight)");
        assert_eq!(bmi_line("", "81"), "BMI: enter height and weight to calculate");
    }

    #[test]
    fn risk_flow_collects_tags_and_reports_bmi() {
        let flow = RiskFactorFlow::new(&RiskFactorsDraft::default(), "180", "");
        let mut prompts = vec![
            PromptResponse::Value("Never smoked".into()),
            PromptResponse::Keep,
            PromptResponse::Value("3".into()),
        ];
        prompts.extend(std::iter::repeat(PromptResponse::Keep).take(5));
        prompts.push(PromptResponse::Keep);
        prompts.push(PromptResponse::Value("81".into()));
        let mut interaction = MockInteraction::new(prompts, vec![ConfirmationResponse::Confirm]);

        let answers = completed(FormEngine::new(&flow).run(&mut interaction).unwrap());
        assert_eq!(answers.risk_factors.smoking_status, Some(SmokingStatus::Never));
        assert_eq!(answers.risk_factors.alcohol_consumption, None);
        assert_eq!(
            answers.risk_factors.physical_activity,
            Some(PhysicalActivity::Active)
        );
        assert_eq!(answers.risk_factors.selected_count(), 2);
        assert_eq!(answers.height, "180");
        assert_eq!(answers.weight, "81");
        let review = interaction.reviews.concat();
        assert!(review.iter().any(|line| line == "  BMI: 25.00 (Overweight)"));
    }

    #[test]
    fn choice_validator_suggests_close_label() {
        let mapper = risk_choices::<StressLevel>();
        let Validator::Custom(check) = make_choice_validator(mapper, "stress level") else {
            panic!("expected custom validator");
        };
        let err = check("moderat").unwrap_err();
        assert!(err.contains("Did you mean `Moderate`?"));
        assert_eq!(check("very high").unwrap(), "[5] Very high");
    }

    #[test]
    fn medication_details_clear_start_date() {
        let mut entry = MedicationEntry::from_hit(LocalId(1), &SearchHit::new("C1", "Metformin"));
        entry.start_date = NaiveDate::from_ymd_opt(2024, 1, 2);
        entry.dosage = "500mg".into();
        let flow = MedicationDetailsFlow::new(&entry);
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Keep,
                PromptResponse::Value("twice daily".into()),
                PromptResponse::Value("".into()),
            ],
            vec![ConfirmationResponse::Confirm],
        );

        let edits = completed(FormEngine::new(&flow).run(&mut interaction).unwrap());
        assert_eq!(
            edits,
            vec![
                MedicationEdit::Dosage("500mg".into()),
                MedicationEdit::Frequency("twice daily".into()),
                MedicationEdit::StartDate(None),
            ]
        );
    }

    #[test]
    fn disease_details_default_to_active() {
        let entry = DiseaseEntry::from_hit(LocalId(2), &SearchHit::new("C2", "Asthma"));
        let flow = DiseaseDetailsFlow::new(&entry);
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Value("2023-05-01".into()),
                PromptResponse::Value("severe".into()),
                PromptResponse::Keep,
            ],
            vec![ConfirmationResponse::Confirm],
        );

        let edits = completed(FormEngine::new(&flow).run(&mut interaction).unwrap());
        assert_eq!(
            edits,
            vec![
                DiseaseEdit::DiagnosisDate(NaiveDate::from_ymd_opt(2023, 5, 1)),
                DiseaseEdit::Severity(Some(Severity::Severe)),
                DiseaseEdit::Status(DiseaseStatus::Active),
            ]
        );
    }

    #[test]
    fn login_flow_requires_both_fields() {
        let flow = LoginFlow::new();
        let mut interaction = MockInteraction::new(
            vec![
                PromptResponse::Value(" ".into()),
                PromptResponse::Value("ana@example.com".into()),
                PromptResponse::Value("secret-pass".into()),
            ],
            vec![],
        );

        let request = completed(FormEngine::new(&flow).run(&mut interaction).unwrap());
        assert_eq!(request.mail, "ana@example.com");
        assert_eq!(request.password, "secret-pass");
        assert!(interaction.reviews.is_empty());
    }
}
