//! Blocking HTTP adapter for the MediAid backend.

use std::time::Duration;

use mediaid_config::IntakeConfig;
use mediaid_core::{
    ApiError, AuthResponse, CreateAccountRequest, DiseasesRequest, ErrorBody, IntakeApi,
    LoginRequest, MedicationsRequest, RiskFactorsRequest, SearchProvider, Session, UserProfile,
};
use mediaid_domain::{SearchHit, SearchKind};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub mod endpoints {
    pub const CREATE_ACCOUNT: &str = "/api/user/create-account";
    pub const LOGIN: &str = "/api/user/logIn";
    pub const USER_PROFILE: &str = "/api/user/profile";
    pub const RISK_FACTORS: &str = "/api/user/risk-factors";
    pub const USER_MEDICATIONS: &str = "/api/user/medications";
    pub const USER_DISEASES: &str = "/api/user/diseases";
    pub const SEARCH_MEDICATIONS: &str = "/api/medications/search";
    pub const SEARCH_DISEASES: &str = "/api/diseases/search";
}

/// Search endpoints answer with either a bare list or a page wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    List(Vec<SearchHit>),
    Page { content: Vec<SearchHit> },
}

impl SearchPayload {
    fn into_hits(self) -> Vec<SearchHit> {
        match self {
            SearchPayload::List(hits) | SearchPayload::Page { content: hits } => hits,
        }
    }
}

pub struct HttpIntakeApi {
    base_url: String,
    client: Client,
}

impl HttpIntakeApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B, session: Option<&Session>) -> RequestBuilder {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(session) = session {
            request = request.header(header::AUTHORIZATION, session.bearer());
        }
        request
    }

    fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);
        debug!(status = status.as_u16(), ?message, "request rejected");
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().map_err(transport)?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

impl IntakeApi for HttpIntakeApi {
    #[instrument(skip_all, fields(username = %request.username))]
    fn create_account(&self, request: &CreateAccountRequest) -> Result<AuthResponse, ApiError> {
        let response = Self::send(self.post(endpoints::CREATE_ACCOUNT, request, None))?;
        Self::decode(response)
    }

    fn attach_risk_factors(&self, session: &Session, request: &RiskFactorsRequest) -> Result<(), ApiError> {
        Self::send(self.post(endpoints::RISK_FACTORS, request, Some(session)))?;
        Ok(())
    }

    fn attach_medications(&self, session: &Session, request: &MedicationsRequest) -> Result<(), ApiError> {
        Self::send(self.post(endpoints::USER_MEDICATIONS, request, Some(session)))?;
        Ok(())
    }

    fn attach_diseases(&self, session: &Session, request: &DiseasesRequest) -> Result<(), ApiError> {
        Self::send(self.post(endpoints::USER_DISEASES, request, Some(session)))?;
        Ok(())
    }

    fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let response = Self::send(self.post(endpoints::LOGIN, request, None))?;
        Self::decode(response)
    }

    fn fetch_profile(&self, session: &Session) -> Result<UserProfile, ApiError> {
        let request = self
            .client
            .get(self.url(endpoints::USER_PROFILE))
            .header(header::AUTHORIZATION, session.bearer());
        let response = Self::send(request)?;
        Self::decode(response)
    }
}

impl SearchProvider for HttpIntakeApi {
    #[instrument(skip(self))]
    fn search(&self, kind: SearchKind, query: &str, limit: usize) -> Result<Vec<SearchHit>, ApiError> {
        let path = match kind {
            SearchKind::Medication => endpoints::SEARCH_MEDICATIONS,
            SearchKind::Disease => endpoints::SEARCH_DISEASES,
        };
        let request = self
            .client
            .get(self.url(path))
            .query(&[("query", query.to_string()), ("limit", limit.to_string())]);
        let response = Self::send(request)?;
        Self::decode::<SearchPayload>(response).map(SearchPayload::into_hits)
    }
}
