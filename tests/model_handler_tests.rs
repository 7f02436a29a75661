use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use resume_matcher::{
    config::Settings,
    test_utils::test_helpers::{self, MultipartPart},
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "model-test-boundary";

const TRAINING_CSV: &str = "resume_text,job_desc,label\n\
Rust backend engineer with Kafka,Backend engineer Rust Kafka,1\n\
Pastry chef and baker,Backend engineer Rust Kafka,0\n\
Python data scientist,Machine learning engineer Python,1\n\
Truck driver,Machine learning engineer Python,0\n";

async fn app_with(settings: &Settings) -> Router {
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::test_app(pool, settings).await
}

fn train_request(parts: &[MultipartPart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/train")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(test_helpers::multipart_body(BOUNDARY, parts)))
        .unwrap()
}

fn push_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/push_model")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn csv_part(bytes: &[u8]) -> MultipartPart<'_> {
    MultipartPart::File {
        name: "file",
        filename: "train.csv",
        content_type: "text/csv",
        bytes,
    }
}

#[tokio::test]
async fn train_without_file_is_rejected() {
    let model_dir = TempDir::new().unwrap();
    let app = app_with(&test_helpers::test_settings(model_dir.path())).await;

    let response = app
        .oneshot(train_request(&[MultipartPart::Text {
            name: "note",
            value: "no csv here",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "CSV file missing" }));
}

#[tokio::test]
async fn oversized_training_csv_is_rejected_with_413() {
    let model_dir = TempDir::new().unwrap();
    let mut settings = test_helpers::test_settings(model_dir.path());
    settings.max_upload_bytes = 512;
    let app = app_with(&settings).await;

    let csv = TRAINING_CSV.repeat(20);
    let response = app
        .oneshot(train_request(&[csv_part(csv.as_bytes())]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_json(response).await["error"].is_string());
    assert!(!model_dir.path().join("adapter.json").exists());
}

#[tokio::test]
async fn train_with_wrong_columns_is_rejected() {
    let model_dir = TempDir::new().unwrap();
    let app = app_with(&test_helpers::test_settings(model_dir.path())).await;

    let response = app
        .oneshot(train_request(&[csv_part(b"resume,job,score\na,b,1\n")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "CSV must have columns: resume_text, job_desc, label" })
    );
    assert!(!model_dir.path().join("adapter.json").exists());
}

#[tokio::test]
async fn train_saves_and_activates_fine_tuned_model() {
    let model_dir = TempDir::new().unwrap();
    let app = app_with(&test_helpers::test_settings(model_dir.path())).await;

    let response = app
        .clone()
        .oneshot(train_request(&[csv_part(TRAINING_CSV.as_bytes())]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Model fine-tuned and saved." })
    );
    assert!(model_dir.path().join("adapter.json").exists());
    assert!(model_dir.path().join("config.json").exists());

    let health = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(health).await["fine_tuned"], true);
}

#[tokio::test]
async fn push_without_token_is_unauthorized() {
    let model_dir = TempDir::new().unwrap();
    let app = app_with(&test_helpers::test_settings(model_dir.path())).await;

    let response = app.oneshot(push_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "HF_TOKEN environment variable not set." })
    );
}

#[tokio::test]
async fn push_uploads_adapter_to_hub() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/whoami-v2"))
        .and(header_matcher("authorization", "Bearer hf_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "alice" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/repos/create"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "You already created this model repo"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/models/alice/test-resume-matcher/commit/main"))
        .and(body_string_contains("\"path\":\"adapter.json\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model_dir = TempDir::new().unwrap();
    let mut settings = test_helpers::test_settings(model_dir.path());
    settings.hf_token = Some("hf_test_token".to_string());
    settings.hf_endpoint = mock_server.uri();
    let app = app_with(&settings).await;

    let response = app.oneshot(push_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        format!(
            "Model pushed to Hugging Face: {}/alice/test-resume-matcher",
            mock_server.uri()
        )
    );
}

#[tokio::test]
async fn push_maps_hub_rejection_to_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/whoami-v2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Invalid credentials in Authorization header"
        })))
        .mount(&mock_server)
        .await;

    let model_dir = TempDir::new().unwrap();
    let mut settings = test_helpers::test_settings(model_dir.path());
    settings.hf_token = Some("hf_revoked".to_string());
    settings.hf_endpoint = mock_server.uri();
    let app = app_with(&settings).await;

    let response = app.oneshot(push_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "HuggingFace Hub error: 401: Invalid credentials in Authorization header"
    );
}
