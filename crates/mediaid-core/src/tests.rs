use std::cell::RefCell;

use chrono::{TimeZone, Utc};
use mediaid_domain::{
    BmiCategory, DiseaseEdit, DiseaseStatus, Gender, LocalId, MedicationEdit, SearchHit,
    SearchKind, Severity, SmokingStatus,
};

use crate::{
    ApiError, AuthResponse, Clock, CoreError, CreateAccountRequest, DiseaseStep, DiseasesRequest,
    IdentityField, IdentityStep, IntakeApi, LoginRequest, ManualClock, MedicationStep,
    MedicationsRequest, MemorySessionStore, RiskFactorStep, RiskFactorsRequest, SearchProvider,
    SearchSettings, Session, SessionStore, StepForm, StepOutcome, SubmissionError,
    SubmissionOrchestrator, SubmissionStage, UserProfile, WizardState, WizardStep,
};

#[derive(Default)]
struct RecordingApi {
    calls: RefCell<Vec<&'static str>>,
    last_medications: RefCell<Option<MedicationsRequest>>,
    last_diseases: RefCell<Option<DiseasesRequest>>,
    reject_account: Option<String>,
    fail_risk_factors: bool,
    fail_medications: bool,
}

impl IntakeApi for RecordingApi {
    fn create_account(&self, _request: &CreateAccountRequest) -> Result<AuthResponse, ApiError> {
        self.calls.borrow_mut().push("create_account");
        match &self.reject_account {
            Some(message) => Err(ApiError::Rejected {
                status: 409,
                message: Some(message.clone()),
            }),
            None => Ok(AuthResponse {
                token: "tok-123".into(),
                username: Some("bob".into()),
                email: Some("bob@x.io".into()),
                message: None,
            }),
        }
    }

    fn attach_risk_factors(&self, session: &Session, _request: &RiskFactorsRequest) -> Result<(), ApiError> {
        assert_eq!(session.token(), "tok-123");
        self.calls.borrow_mut().push("risk_factors");
        if self.fail_risk_factors {
            return Err(ApiError::Rejected { status: 500, message: None });
        }
        Ok(())
    }

    fn attach_medications(&self, session: &Session, request: &MedicationsRequest) -> Result<(), ApiError> {
        assert_eq!(session.token(), "tok-123");
        self.calls.borrow_mut().push("medications");
        *self.last_medications.borrow_mut() = Some(request.clone());
        if self.fail_medications {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(())
    }

    fn attach_diseases(&self, session: &Session, request: &DiseasesRequest) -> Result<(), ApiError> {
        assert_eq!(session.token(), "tok-123");
        self.calls.borrow_mut().push("diseases");
        *self.last_diseases.borrow_mut() = Some(request.clone());
        Ok(())
    }

    fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        unreachable!("login is not part of submission")
    }

    fn fetch_profile(&self, _session: &Session) -> Result<UserProfile, ApiError> {
        unreachable!("profile is not part of submission")
    }
}

struct FixedCatalogue;

impl SearchProvider for FixedCatalogue {
    fn search(&self, kind: SearchKind, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError> {
        assert_eq!(limit, 10);
        let hits = match (kind, query) {
            (SearchKind::Medication, "metf") => vec![SearchHit::new("C0025598", "Metformin")],
            (SearchKind::Disease, "diab") => vec![
                SearchHit::new("C0011849", "Diabetes Mellitus"),
                SearchHit::new("C0011860", "Diabetes Mellitus, Type 2"),
            ],
            _ => Vec::new(),
        };
        Ok(hits)
    }
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

fn fill_identity(step: &mut IdentityStep) {
    step.set(IdentityField::Username, "bob");
    step.set(IdentityField::Email, "bob@x.io");
    step.set(IdentityField::Password, "secret123");
    step.set(IdentityField::DateOfBirth, "1990-01-01");
    step.set(IdentityField::Gender, "male");
    step.set(IdentityField::Height, "180");
    step.set(IdentityField::Weight, "81");
}

fn identity_wizard() -> WizardState {
    let mut wizard = WizardState::new();
    let mut step = IdentityStep::new();
    fill_identity(&mut step);
    wizard.submit_step(&mut step).expect("valid identity");
    wizard
}

#[test]
fn missing_username_blocks_advance() {
    let mut wizard = WizardState::new();
    let mut step = IdentityStep::new();
    fill_identity(&mut step);
    step.set(IdentityField::Username, "");

    let errors = wizard.submit_step(&mut step).unwrap_err();
    assert_eq!(errors.get("username"), Some("Username is required"));
    assert_eq!(errors.len(), 1);
    assert_eq!(wizard.current_step(), WizardStep::BasicInfo);
    assert!(wizard.draft().identity.is_none());
    assert!(step.errors().contains("username"));
}

#[test]
fn short_password_is_rejected() {
    let mut step = IdentityStep::new();
    fill_identity(&mut step);
    step.set(IdentityField::Password, "short");

    let errors = step.commit().unwrap_err();
    assert_eq!(
        errors.get("password"),
        Some("Password must be at least 8 characters")
    );
}

#[test]
fn empty_identity_reports_every_required_field() {
    let mut step = IdentityStep::new();
    let errors = step.commit().unwrap_err();
    for key in ["username", "email", "password", "dateOfBirth", "gender"] {
        assert!(errors.contains(key), "missing error for {key}");
    }
    assert!(!errors.contains("height"));
}

#[test]
fn editing_a_field_clears_its_error() {
    let mut step = IdentityStep::new();
    let _ = step.commit();
    assert!(step.errors().contains("email"));
    step.set(IdentityField::Email, "bob@x.io");
    assert!(!step.errors().contains("email"));
    assert!(step.errors().contains("username"));
}

#[test]
fn malformed_email_and_date_are_flagged() {
    let mut step = IdentityStep::new();
    fill_identity(&mut step);
    step.set(IdentityField::Email, "bob.at.example");
    step.set(IdentityField::DateOfBirth, "01/01/1990");
    step.set(IdentityField::Gender, "robot");

    let errors = step.commit().unwrap_err();
    assert!(errors.contains("email"));
    assert!(errors.contains("dateOfBirth"));
    assert!(errors.contains("gender"));
}

#[test]
fn valid_identity_advances_with_submitted_fields() {
    let wizard = identity_wizard();
    assert_eq!(wizard.current_step(), WizardStep::RiskFactors);

    let identity = wizard.draft().identity.as_ref().unwrap();
    assert_eq!(identity.username, "bob");
    assert_eq!(identity.gender, Gender::Male);
    assert_eq!(wizard.draft().measurements.height, "180");
    assert_eq!(wizard.draft().bmi(), Some(25.0));
    assert_eq!(wizard.draft().bmi_category(), Some(BmiCategory::Overweight));
}

#[test]
fn risk_step_recomputes_bmi_live() {
    let wizard = identity_wizard();
    let mut step = RiskFactorStep::from_draft(wizard.draft());
    assert_eq!(step.bmi(), Some(25.0));

    step.set_weight("70");
    step.set_height("175");
    assert_eq!(step.bmi(), Some(22.86));
    assert_eq!(step.bmi_category(), Some(BmiCategory::Normal));

    step.set_height("abc");
    assert_eq!(step.bmi(), None);
}

#[test]
fn going_back_and_forward_preserves_draft() {
    let mut wizard = identity_wizard();
    let mut risk = RiskFactorStep::from_draft(wizard.draft());
    risk.risk_factors_mut().smoking_status = Some(SmokingStatus::FormerLight);
    wizard.submit_step(&mut risk).unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Medications);

    let before = wizard.draft().clone();
    assert!(wizard.retreat());
    assert_eq!(wizard.current_step(), WizardStep::RiskFactors);

    let mut reopened = RiskFactorStep::from_draft(wizard.draft());
    assert_eq!(
        reopened.risk_factors().smoking_status,
        Some(SmokingStatus::FormerLight)
    );
    wizard.submit_step(&mut reopened).unwrap();
    assert_eq!(wizard.draft(), &before);
}

#[test]
fn identity_form_repopulates_from_draft() {
    let wizard = identity_wizard();
    let step = IdentityStep::from_draft(wizard.draft());
    assert_eq!(step.form().username, "bob");
    assert_eq!(step.form().date_of_birth, "1990-01-01");
    assert_eq!(step.form().gender, "male");
}

#[test]
fn picking_a_search_result_adds_an_entry_and_clears_search() {
    let clock = clock();
    let mut step = MedicationStep::new(SearchSettings::default());
    step.search_mut().set_query("metf", clock.now());
    clock.advance_ms(300);
    assert!(step.search_mut().run_due(&FixedCatalogue, clock.now()));
    assert_eq!(step.search().results().len(), 1);

    let id = step.pick_result(0, &clock).unwrap();
    assert!(step.search().results().is_empty());
    assert_eq!(step.search().query(), "");

    let entry = step.get(id).unwrap();
    assert_eq!(entry.name, "Metformin");
    assert_eq!(entry.cui.as_str(), "C0025598");
    assert_eq!(entry.dosage, "");
    assert!(entry.is_active());
}

#[test]
fn entries_added_in_the_same_millisecond_get_distinct_ids() {
    let clock = clock();
    let mut step = DiseaseStep::new(SearchSettings::default());
    let a = step.pick(&SearchHit::new("C1", "Asthma"), &clock);
    let b = step.pick(&SearchHit::new("C1", "Asthma"), &clock);
    assert_ne!(a, b);
    assert_eq!(step.entries().len(), 2);
}

#[test]
fn reentering_a_list_step_keeps_ids_unique() {
    let clock = clock();
    let mut wizard = identity_wizard();
    let mut risk = RiskFactorStep::from_draft(wizard.draft());
    wizard.submit_step(&mut risk).unwrap();

    let mut meds = MedicationStep::from_draft(wizard.draft(), SearchSettings::default());
    let first = meds.pick(&SearchHit::new("C0004057", "Aspirin"), &clock);
    wizard.submit_step(&mut meds).unwrap();
    assert!(wizard.retreat());
    assert_eq!(wizard.current_step(), WizardStep::Medications);

    let mut meds = MedicationStep::from_draft(wizard.draft(), SearchSettings::default());
    let second = meds.pick(&SearchHit::new("C0025598", "Metformin"), &clock);
    assert_ne!(first, second);

    meds.remove(second).unwrap();
    let names: Vec<_> = meds.entries().iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, ["Aspirin"]);
}

#[test]
fn update_and_remove_by_local_id() {
    let clock = clock();
    let mut step = MedicationStep::new(SearchSettings::default());
    let id = step.pick(&SearchHit::new("C0025598", "Metformin"), &clock);

    step.update(id, MedicationEdit::Dosage("500mg".into())).unwrap();
    step.update(id, MedicationEdit::Frequency("twice daily".into())).unwrap();
    assert_eq!(step.get(id).unwrap().dosage, "500mg");

    let missing = LocalId(42);
    assert!(matches!(
        step.update(missing, MedicationEdit::Dosage("1g".into())),
        Err(CoreError::EntryNotFound(id)) if id == missing
    ));

    step.remove(id).unwrap();
    assert!(step.entries().is_empty());
    assert!(step.remove(id).is_err());
}

#[test]
fn account_failure_stops_everything() {
    let mut wizard = identity_wizard();
    let mut meds = MedicationStep::from_draft(wizard.draft(), SearchSettings::default());
    meds.pick(&SearchHit::new("C0025598", "Metformin"), &clock());
    wizard.merge(meds.commit().unwrap());

    let api = RecordingApi {
        reject_account: Some("Email already in use".into()),
        ..RecordingApi::default()
    };
    let store = MemorySessionStore::new();
    let err = SubmissionOrchestrator::new(&api, &store)
        .submit(wizard.draft())
        .unwrap_err();

    assert_eq!(err.to_string(), "Email already in use");
    assert_eq!(api.calls.borrow().as_slice(), ["create_account"]);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn account_failure_without_message_uses_fallback() {
    let api = RecordingApi {
        reject_account: Some(String::new()),
        ..RecordingApi::default()
    };
    let store = MemorySessionStore::new();
    let err = SubmissionOrchestrator::new(&api, &store)
        .submit(identity_wizard().draft())
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AccountCreation { .. }));
    assert_eq!(err.to_string(), "Failed to create account");
}

#[test]
fn submit_without_identity_is_refused() {
    let api = RecordingApi::default();
    let store = MemorySessionStore::new();
    let err = SubmissionOrchestrator::new(&api, &store)
        .submit(WizardState::new().draft())
        .unwrap_err();
    assert!(matches!(err, SubmissionError::MissingIdentity));
    assert!(api.calls.borrow().is_empty());
}

#[test]
fn medication_failure_still_attempts_diseases() {
    let clock = clock();
    let mut wizard = identity_wizard();
    let mut risk = RiskFactorStep::from_draft(wizard.draft());
    risk.risk_factors_mut().smoking_status = Some(SmokingStatus::Never);
    wizard.submit_step(&mut risk).unwrap();

    let mut meds = MedicationStep::from_draft(wizard.draft(), SearchSettings::default());
    meds.pick(&SearchHit::new("C0025598", "Metformin"), &clock);
    wizard.submit_step(&mut meds).unwrap();

    let mut history = DiseaseStep::from_draft(wizard.draft(), SearchSettings::default());
    history.pick(&SearchHit::new("C0011849", "Diabetes Mellitus"), &clock);
    wizard.submit_step(&mut history).unwrap();

    let api = RecordingApi {
        fail_medications: true,
        ..RecordingApi::default()
    };
    let store = MemorySessionStore::new();
    let report = SubmissionOrchestrator::new(&api, &store)
        .submit(wizard.draft())
        .unwrap();

    assert_eq!(
        api.calls.borrow().as_slice(),
        ["create_account", "risk_factors", "medications", "diseases"]
    );
    assert_eq!(report.failed_stages(), vec![SubmissionStage::AttachMedications]);
    assert_eq!(report.diseases, StepOutcome::Attached);
    assert!(report.session_persisted);
}

#[test]
fn empty_sections_are_skipped() {
    let api = RecordingApi::default();
    let store = MemorySessionStore::new();
    let report = SubmissionOrchestrator::new(&api, &store)
        .submit(identity_wizard().draft())
        .unwrap();

    assert_eq!(api.calls.borrow().as_slice(), ["create_account"]);
    assert_eq!(report.risk_factors, StepOutcome::Skipped);
    assert_eq!(report.medications, StepOutcome::Skipped);
    assert_eq!(report.diseases, StepOutcome::Skipped);
    assert!(report.is_complete());
}

#[test]
fn risk_factor_failure_is_reported_not_raised() {
    let mut wizard = identity_wizard();
    let mut risk = RiskFactorStep::from_draft(wizard.draft());
    risk.risk_factors_mut().smoking_status = Some(SmokingStatus::CurrentHeavy);
    wizard.submit_step(&mut risk).unwrap();

    let api = RecordingApi {
        fail_risk_factors: true,
        ..RecordingApi::default()
    };
    let store = MemorySessionStore::new();
    let report = SubmissionOrchestrator::new(&api, &store)
        .submit(wizard.draft())
        .unwrap();
    assert!(report.risk_factors.is_failed());
    assert_eq!(store.load().unwrap().unwrap().token(), "tok-123");
}

#[test]
fn full_intake_end_to_end() {
    let clock = clock();
    let mut wizard = identity_wizard();
    assert_eq!(wizard.draft().bmi(), Some(25.0));

    let mut risk = RiskFactorStep::from_draft(wizard.draft());
    wizard.submit_step(&mut risk).unwrap();

    let mut meds = MedicationStep::from_draft(wizard.draft(), SearchSettings::default());
    meds.search_mut().set_query("metf", clock.now());
    clock.advance_ms(300);
    meds.search_mut().run_due(&FixedCatalogue, clock.now());
    let med_id = meds.pick_result(0, &clock).unwrap();
    meds.update(med_id, MedicationEdit::Dosage("500mg".into())).unwrap();
    meds.update(med_id, MedicationEdit::Frequency("twice daily".into())).unwrap();
    wizard.submit_step(&mut meds).unwrap();

    let mut history = DiseaseStep::from_draft(wizard.draft(), SearchSettings::default());
    history.search_mut().set_query("diab", clock.now());
    clock.advance_ms(300);
    history.search_mut().run_due(&FixedCatalogue, clock.now());
    let disease_id = history.pick_result(1, &clock).unwrap();
    history
        .update(disease_id, DiseaseEdit::Status(DiseaseStatus::Chronic))
        .unwrap();
    history
        .update(disease_id, DiseaseEdit::Severity(Some(Severity::Moderate)))
        .unwrap();
    assert_eq!(history.step(), WizardStep::MedicalHistory);
    wizard.submit_step(&mut history).unwrap();
    assert_eq!(wizard.current_step(), WizardStep::MedicalHistory);

    let api = RecordingApi::default();
    let store = MemorySessionStore::new();
    let report = SubmissionOrchestrator::new(&api, &store)
        .submit(wizard.draft())
        .unwrap();

    assert_eq!(
        api.calls.borrow().as_slice(),
        ["create_account", "medications", "diseases"]
    );
    assert!(report.is_complete());
    assert_eq!(report.session.username(), Some("bob"));

    let meds_sent = api.last_medications.borrow().clone().unwrap();
    let sent = &meds_sent.medications[0];
    assert_eq!(sent.name, "Metformin");
    assert_eq!(sent.dosage, "500mg");
    assert_eq!(sent.administration_route, "oral");
    assert!(sent.is_active);

    let diseases_sent = api.last_diseases.borrow().clone().unwrap();
    assert_eq!(diseases_sent.diseases[0].name, "Diabetes Mellitus, Type 2");
    assert_eq!(diseases_sent.diseases[0].status, DiseaseStatus::Chronic);
}

#[test]
fn wire_payloads_use_camel_case_and_defaults() {
    let wizard = identity_wizard();
    let body = serde_json::to_value(CreateAccountRequest::from_draft(wizard.draft()).unwrap()).unwrap();
    assert_eq!(body["dateOfBirth"], "1990-01-01");
    assert_eq!(body["gender"], "male");
    assert_eq!(body["height"], 180.0);

    let risk = serde_json::to_value(RiskFactorsRequest::from_draft(wizard.draft())).unwrap();
    assert_eq!(risk["bmi"], 25.0);
    assert!(risk.get("smokingStatus").is_none());
}

#[test]
fn progress_marks_completed_current_and_pending() {
    assert_eq!(
        crate::render_progress(WizardStep::RiskFactors),
        "[x] 1. Basic Info\n[>] 2. Risk Factors\n[ ] 3. Medications\n[ ] 4. Medical History"
    );
}
