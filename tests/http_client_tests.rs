use chrono::NaiveDate;
use mediaid_core::{
    ApiError, CreateAccountRequest, IntakeApi, LoginRequest, MedicationRecord, MedicationsRequest,
    SearchProvider, Session,
};
use mediaid_domain::{Gender, SearchHit, SearchKind};
use mediaid_intake::http::{endpoints, HttpIntakeApi};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account_request() -> CreateAccountRequest {
    CreateAccountRequest {
        username: "ana".into(),
        email: "ana@example.com".into(),
        password: "secret-pass".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        gender: Gender::Female,
        height: Some(165.0),
        weight: None,
    }
}

async fn with_client<T, F>(server: &MockServer, call: F) -> T
where
    T: Send + 'static,
    F: FnOnce(HttpIntakeApi) -> T + Send + 'static,
{
    let base_url = server.uri();
    tokio::task::spawn_blocking(move || call(HttpIntakeApi::new(&base_url, None).unwrap()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn create_account_posts_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::CREATE_ACCOUNT))
        .and(body_partial_json(json!({
            "username": "ana",
            "dateOfBirth": "1990-04-12",
            "gender": "female",
            "height": 165.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc.def.ghi",
            "username": "ana",
            "email": "ana@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = with_client(&server, |api| api.create_account(&account_request())).await;
    let response = response.unwrap();
    assert_eq!(response.token, "abc.def.ghi");
    assert_eq!(response.username.as_deref(), Some("ana"));
}

#[tokio::test(flavor = "multi_thread")]
async fn weight_is_left_out_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::CREATE_ACCOUNT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
        .mount(&server)
        .await;

    with_client(&server, |api| api.create_account(&account_request()))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("weight").is_none());
    assert_eq!(body["password"], "secret-pass");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::CREATE_ACCOUNT))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Email already in use" })),
        )
        .mount(&server)
        .await;

    let err = with_client(&server, |api| api.create_account(&account_request()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 409, .. }));
    assert_eq!(err.server_message(), Some("Email already in use"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejection_without_json_has_no_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::LOGIN))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = with_client(&server, |api| {
        api.login(&LoginRequest {
            mail: "ana@example.com".into(),
            password: "wrong".into(),
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.server_message(), None);
    assert!(!err.is_unauthorized());
}

#[tokio::test(flavor = "multi_thread")]
async fn attachments_send_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::USER_MEDICATIONS))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_partial_json(json!({
            "medications": [{ "cui": "C0025598", "name": "Metformin", "isActive": true }]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let request = MedicationsRequest {
        medications: vec![MedicationRecord {
            cui: "C0025598".into(),
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "daily".into(),
            start_date: None,
            end_date: None,
            administration_route: String::new(),
            is_active: true,
            notes: None,
        }],
    };
    with_client(&server, move |api| {
        api.attach_medications(&Session::new("tok-123"), &request)
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn search_accepts_list_and_page_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::SEARCH_MEDICATIONS))
        .and(query_param("query", "met"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "cui": "C0025598", "name": "Metformin" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoints::SEARCH_DISEASES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "cui": "C0004096", "name": "Asthma" }],
            "totalElements": 1
        })))
        .mount(&server)
        .await;

    let (medications, diseases) = with_client(&server, |api| {
        (
            api.search(SearchKind::Medication, "met", 5),
            api.search(SearchKind::Disease, "asth", 5),
        )
    })
    .await;
    assert_eq!(medications.unwrap(), vec![SearchHit::new("C0025598", "Metformin")]);
    assert_eq!(diseases.unwrap(), vec![SearchHit::new("C0004096", "Asthma")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn profile_fetch_decodes_partial_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::USER_PROFILE))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "basicInfo": { "username": "ana", "bmi": 22.0 },
            "medications": [{ "cui": "C0025598", "name": "Metformin" }]
        })))
        .mount(&server)
        .await;

    let profile = with_client(&server, |api| api.fetch_profile(&Session::new("tok-9")))
        .await
        .unwrap();
    let basic = profile.basic_info.unwrap();
    assert_eq!(basic.username.as_deref(), Some("ana"));
    assert_eq!(profile.medications.len(), 1);
    assert!(profile.diseases.is_empty());
}
