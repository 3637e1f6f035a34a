use chrono::NaiveDate;
use mediaid_domain::{DraftRecord, Gender, IdentityDraft, Measurements};

use crate::validation::{is_plausible_email, FieldErrors, MIN_PASSWORD_LEN};
use crate::wizard::{StepPartial, WizardStep};

use super::StepForm;

/// Keys of the identity step, as reported in [`FieldErrors`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Username,
    Email,
    Password,
    DateOfBirth,
    Gender,
    Height,
    Weight,
}

impl IdentityField {
    pub const ALL: [IdentityField; 7] = [
        IdentityField::Username,
        IdentityField::Email,
        IdentityField::Password,
        IdentityField::DateOfBirth,
        IdentityField::Gender,
        IdentityField::Height,
        IdentityField::Weight,
    ];

    pub fn key(self) -> &'static str {
        match self {
            IdentityField::Username => "username",
            IdentityField::Email => "email",
            IdentityField::Password => "password",
            IdentityField::DateOfBirth => "dateOfBirth",
            IdentityField::Gender => "gender",
            IdentityField::Height => "height",
            IdentityField::Weight => "weight",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// Raw identity inputs exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
}

impl IdentityForm {
    pub fn get(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::Username => &self.username,
            IdentityField::Email => &self.email,
            IdentityField::Password => &self.password,
            IdentityField::DateOfBirth => &self.date_of_birth,
            IdentityField::Gender => &self.gender,
            IdentityField::Height => &self.height,
            IdentityField::Weight => &self.weight,
        }
    }

    fn slot(&mut self, field: IdentityField) -> &mut String {
        match field {
            IdentityField::Username => &mut self.username,
            IdentityField::Email => &mut self.email,
            IdentityField::Password => &mut self.password,
            IdentityField::DateOfBirth => &mut self.date_of_birth,
            IdentityField::Gender => &mut self.gender,
            IdentityField::Height => &mut self.height,
            IdentityField::Weight => &mut self.weight,
        }
    }
}

/// Step 1: account identity plus optional height/weight.
#[derive(Clone, Debug, Default)]
pub struct IdentityStep {
    form: IdentityForm,
    errors: FieldErrors,
}

impl IdentityStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-populates the form from whatever the draft already holds.
    pub fn from_draft(draft: &DraftRecord) -> Self {
        let mut form = IdentityForm {
            height: draft.measurements.height.clone(),
            weight: draft.measurements.weight.clone(),
            ..IdentityForm::default()
        };
        if let Some(identity) = &draft.identity {
            form.username = identity.username.clone();
            form.email = identity.email.clone();
            form.password = identity.password.clone();
            form.date_of_birth = identity.date_of_birth.format("%Y-%m-%d").to_string();
            form.gender = identity.gender.tag().to_string();
        }
        Self {
            form,
            errors: FieldErrors::new(),
        }
    }

    pub fn form(&self) -> &IdentityForm {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Updates one input and clears any message previously shown for it.
    pub fn set(&mut self, field: IdentityField, value: impl Into<String>) {
        *self.form.slot(field) = value.into();
        self.errors.clear_field(field.key());
    }

    /// Checks the identity contract without touching stored errors.
    pub fn validate(&self) -> Result<(IdentityDraft, Measurements), FieldErrors> {
        let form = &self.form;
        let mut errors = FieldErrors::new();

        let username = form.username.trim();
        if username.is_empty() {
            errors.insert(IdentityField::Username.key(), "Username is required");
        }

        let email = form.email.trim();
        if email.is_empty() {
            errors.insert(IdentityField::Email.key(), "Email is required");
        } else if !is_plausible_email(email) {
            errors.insert(IdentityField::Email.key(), "Enter a valid email address");
        }

        if form.password.is_empty() {
            errors.insert(IdentityField::Password.key(), "Password is required");
        } else if form.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                IdentityField::Password.key(),
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }

        let date_of_birth = match form.date_of_birth.trim() {
            "" => {
                errors.insert(IdentityField::DateOfBirth.key(), "Date of birth is required");
                None
            }
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.insert(
                        IdentityField::DateOfBirth.key(),
                        "Date of birth must use YYYY-MM-DD",
                    );
                    None
                }
            },
        };

        let gender = match form.gender.trim() {
            "" => {
                errors.insert(IdentityField::Gender.key(), "Gender is required");
                None
            }
            raw => {
                let parsed = Gender::parse(raw);
                if parsed.is_none() {
                    errors.insert(IdentityField::Gender.key(), "Select male, female, or other");
                }
                parsed
            }
        };

        errors.clone().into_result()?;

        match (date_of_birth, gender) {
            (Some(date_of_birth), Some(gender)) => Ok((
                IdentityDraft {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: form.password.clone(),
                    date_of_birth,
                    gender,
                },
                Measurements::new(form.height.trim(), form.weight.trim()),
            )),
            _ => Err(errors),
        }
    }
}

impl StepForm for IdentityStep {
    fn step(&self) -> WizardStep {
        WizardStep::BasicInfo
    }

    fn commit(&mut self) -> Result<StepPartial, FieldErrors> {
        match self.validate() {
            Ok((identity, measurements)) => {
                self.errors = FieldErrors::new();
                Ok(StepPartial::BasicInfo {
                    identity,
                    measurements,
                })
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}
