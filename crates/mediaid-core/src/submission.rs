//! Multi-call submission of a finished draft.
//!
//! Account creation gates everything. The three attachments that follow are
//! best-effort: each one is attempted independently and a failure is logged
//! and reported, never propagated.

use std::fmt;

use mediaid_domain::DraftRecord;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{
    ApiError, CreateAccountRequest, DiseasesRequest, IntakeApi, MedicationsRequest,
    RiskFactorsRequest,
};
use crate::session::{Session, SessionStore};

pub const ACCOUNT_CREATION_FALLBACK: &str = "Failed to create account";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStage {
    CreateAccount,
    AttachRiskFactors,
    AttachMedications,
    AttachDiseases,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStage::CreateAccount => "create account",
            SubmissionStage::AttachRiskFactors => "risk factors",
            SubmissionStage::AttachMedications => "medications",
            SubmissionStage::AttachDiseases => "medical history",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Attached,
    /// Nothing to send.
    Skipped,
    Failed(ApiError),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Basic info has not been completed")]
    MissingIdentity,
    #[error("{message}")]
    AccountCreation {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl SubmissionError {
    fn account_creation(source: ApiError) -> Self {
        let message = source
            .server_message()
            .unwrap_or(ACCOUNT_CREATION_FALLBACK)
            .to_string();
        SubmissionError::AccountCreation { message, source }
    }
}

/// Result of a submission whose account creation succeeded.
#[derive(Clone, Debug)]
pub struct SubmissionReport {
    pub session: Session,
    pub session_persisted: bool,
    pub risk_factors: StepOutcome,
    pub medications: StepOutcome,
    pub diseases: StepOutcome,
}

impl SubmissionReport {
    pub fn failed_stages(&self) -> Vec<SubmissionStage> {
        [
            (SubmissionStage::AttachRiskFactors, &self.risk_factors),
            (SubmissionStage::AttachMedications, &self.medications),
            (SubmissionStage::AttachDiseases, &self.diseases),
        ]
        .into_iter()
        .filter(|(_, outcome)| outcome.is_failed())
        .map(|(stage, _)| stage)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_stages().is_empty()
    }
}

pub struct SubmissionOrchestrator<'a, A: IntakeApi + ?Sized, S: SessionStore + ?Sized> {
    api: &'a A,
    store: &'a S,
}

impl<'a, A: IntakeApi + ?Sized, S: SessionStore + ?Sized> SubmissionOrchestrator<'a, A, S> {
    pub fn new(api: &'a A, store: &'a S) -> Self {
        Self { api, store }
    }

    pub fn submit(&self, draft: &DraftRecord) -> Result<SubmissionReport, SubmissionError> {
        let request =
            CreateAccountRequest::from_draft(draft).map_err(|_| SubmissionError::MissingIdentity)?;

        let auth = self.api.create_account(&request).map_err(|err| {
            warn!(error = %err, "account creation failed");
            SubmissionError::account_creation(err)
        })?;
        let session = Session::from(auth);
        info!(username = ?session.username(), "account created");

        let session_persisted = match self.store.save(&session) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to persist session");
                false
            }
        };

        let risk_factors = if draft.risk_factors.is_empty() {
            StepOutcome::Skipped
        } else {
            let request = RiskFactorsRequest::from_draft(draft);
            Self::attempt(
                SubmissionStage::AttachRiskFactors,
                self.api.attach_risk_factors(&session, &request),
            )
        };

        let medications = if draft.medications.is_empty() {
            StepOutcome::Skipped
        } else {
            let request = MedicationsRequest::from_entries(&draft.medications);
            Self::attempt(
                SubmissionStage::AttachMedications,
                self.api.attach_medications(&session, &request),
            )
        };

        let diseases = if draft.diseases.is_empty() {
            StepOutcome::Skipped
        } else {
            let request = DiseasesRequest::from_entries(&draft.diseases);
            Self::attempt(
                SubmissionStage::AttachDiseases,
                self.api.attach_diseases(&session, &request),
            )
        };

        let report = SubmissionReport {
            session,
            session_persisted,
            risk_factors,
            medications,
            diseases,
        };
        info!(failed = report.failed_stages().len(), "submission finished");
        Ok(report)
    }

    fn attempt(stage: SubmissionStage, result: Result<(), ApiError>) -> StepOutcome {
        match result {
            Ok(()) => StepOutcome::Attached,
            Err(err) => {
                warn!(%stage, error = %err, "best-effort attachment failed");
                StepOutcome::Failed(err)
            }
        }
    }
}
