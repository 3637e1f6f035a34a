//! Wire payloads and the remote API seam used by submission and search.

use chrono::NaiveDate;
use mediaid_domain::{
    AgeGroup, AlcoholConsumption, BloodPressure, DiseaseEntry, DiseaseStatus, DraftRecord,
    FamilyHistory, Gender, MedicationEntry, PhysicalActivity, Severity, SmokingStatus, StressLevel,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;
use crate::session::Session;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("request rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 401 | 403, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl CreateAccountRequest {
    pub fn from_draft(draft: &DraftRecord) -> Result<Self, CoreError> {
        let identity = draft
            .identity
            .as_ref()
            .ok_or(CoreError::StepIncomplete("Basic Info"))?;
        Ok(Self {
            username: identity.username.clone(),
            email: identity.email.clone(),
            password: identity.password.clone(),
            date_of_birth: identity.date_of_birth,
            gender: identity.gender,
            height: draft.measurements.height_value(),
            weight: draft.measurements.weight_value(),
        })
    }
}

/// Absent selections are omitted from the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactorsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoking_status: Option<SmokingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcohol_consumption: Option<AlcoholConsumption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_activity: Option<PhysicalActivity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<StressLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_heart_disease: Option<FamilyHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_cancer: Option<FamilyHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
}

impl RiskFactorsRequest {
    pub fn from_draft(draft: &DraftRecord) -> Self {
        let risk = &draft.risk_factors;
        Self {
            smoking_status: risk.smoking_status,
            alcohol_consumption: risk.alcohol_consumption,
            physical_activity: risk.physical_activity,
            blood_pressure: risk.blood_pressure,
            stress_level: risk.stress_level,
            age_group: risk.age_group,
            family_heart_disease: risk.family_heart_disease,
            family_cancer: risk.family_cancer,
            height: draft.measurements.height_value(),
            weight: draft.measurements.weight_value(),
            bmi: draft.bmi(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    pub cui: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub administration_route: String,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl From<&MedicationEntry> for MedicationRecord {
    fn from(entry: &MedicationEntry) -> Self {
        Self {
            cui: entry.cui.as_str().to_string(),
            name: entry.name.clone(),
            dosage: entry.dosage.clone(),
            frequency: entry.frequency.clone(),
            start_date: entry.start_date,
            end_date: entry.end_date,
            administration_route: entry.route_or_default().to_string(),
            is_active: entry.is_active(),
            notes: entry.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicationsRequest {
    pub medications: Vec<MedicationRecord>,
}

impl MedicationsRequest {
    pub fn from_entries(entries: &[MedicationEntry]) -> Self {
        Self {
            medications: entries.iter().map(MedicationRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseRecord {
    pub cui: String,
    pub name: String,
    pub diagnosis_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: DiseaseStatus,
    pub severity: Option<Severity>,
    pub notes: Option<String>,
}

impl From<&DiseaseEntry> for DiseaseRecord {
    fn from(entry: &DiseaseEntry) -> Self {
        Self {
            cui: entry.cui.as_str().to_string(),
            name: entry.name.clone(),
            diagnosis_date: entry.diagnosis_date,
            end_date: entry.end_date,
            status: entry.status_or_default(),
            severity: entry.severity,
            notes: entry.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseasesRequest {
    pub diseases: Vec<DiseaseRecord>,
}

impl DiseasesRequest {
    pub fn from_entries(entries: &[DiseaseEntry]) -> Self {
        Self {
            diseases: entries.iter().map(DiseaseRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub mail: String,
    pub password: String,
}

/// Body returned by account creation and login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shape; only `message` is relied on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileBasicInfo {
    pub username: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRiskFactors {
    pub smoking_status: Option<String>,
    pub alcohol_consumption: Option<String>,
    pub physical_activity: Option<String>,
    pub blood_pressure: Option<String>,
    pub stress_level: Option<String>,
    pub age_group: Option<String>,
    pub family_heart_disease: Option<String>,
    pub family_cancer: Option<String>,
    pub overall_risk_score: Option<f64>,
    pub risk_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileStats {
    pub active_medications: Option<u32>,
    pub active_diseases: Option<u32>,
    pub profile_completeness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileItem {
    pub cui: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Profile landing view fetched after a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub basic_info: Option<ProfileBasicInfo>,
    pub risk_factors: Option<ProfileRiskFactors>,
    pub stats: Option<ProfileStats>,
    pub medications: Vec<ProfileItem>,
    pub diseases: Vec<ProfileItem>,
}

/// Remote MediAid backend as seen by the intake flow.
pub trait IntakeApi {
    fn create_account(&self, request: &CreateAccountRequest) -> Result<AuthResponse, ApiError>;
    fn attach_risk_factors(&self, session: &Session, request: &RiskFactorsRequest) -> Result<(), ApiError>;
    fn attach_medications(&self, session: &Session, request: &MedicationsRequest) -> Result<(), ApiError>;
    fn attach_diseases(&self, session: &Session, request: &DiseasesRequest) -> Result<(), ApiError>;
    fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError>;
}
