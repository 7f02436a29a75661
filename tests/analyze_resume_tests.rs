use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use resume_matcher::test_utils::test_helpers::{self, MultipartPart};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "resume-matcher-test-boundary";

const JOB_FIELDS: [(&str, &str); 5] = [
    ("skills", "Rust, Kafka"),
    ("experience", "Backend services"),
    ("education", "Computer science degree"),
    ("tools", "Docker"),
    ("description", "Streaming platform engineer"),
];

async fn app() -> Router {
    let model_dir = tempfile::tempdir().unwrap();
    let pool = test_helpers::create_test_db().await.unwrap();
    test_helpers::test_app(pool, &test_helpers::test_settings(model_dir.path())).await
}

fn analyze_request(parts: &[MultipartPart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze_resume")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(test_helpers::multipart_body(BOUNDARY, parts)))
        .unwrap()
}

fn job_parts() -> Vec<MultipartPart<'static>> {
    JOB_FIELDS
        .iter()
        .map(|&(name, value)| MultipartPart::Text { name, value })
        .collect()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_resumes_is_rejected() {
    let response = app()
        .await
        .oneshot(analyze_request(&job_parts()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Missing required form fields" })
    );
}

#[tokio::test]
async fn blank_job_field_is_rejected() {
    let pdf = test_helpers::simple_pdf(&["Skills: Rust"]);
    let mut parts: Vec<MultipartPart<'_>> = job_parts()
        .into_iter()
        .filter(|part| !matches!(part, MultipartPart::Text { name: "tools", .. }))
        .collect();
    parts.push(MultipartPart::Text {
        name: "tools",
        value: "   ",
    });
    parts.push(MultipartPart::File {
        name: "resumes",
        filename: "jane.pdf",
        content_type: "application/pdf",
        bytes: &pdf,
    });

    let response = app().await.oneshot(analyze_request(&parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing required form fields"
    );
}

#[tokio::test]
async fn scores_each_uploaded_resume() {
    let pdf = test_helpers::simple_pdf(&[
        "Skills: Rust, Docker",
        "Experience: Backend services for streaming data",
        "Education: Computer science degree",
    ]);
    let mut parts = job_parts();
    parts.push(MultipartPart::File {
        name: "resumes",
        filename: "jane.pdf",
        content_type: "application/pdf",
        bytes: &pdf,
    });
    parts.push(MultipartPart::File {
        name: "resumes",
        filename: "notes.pdf",
        content_type: "application/pdf",
        bytes: b"plain text pretending to be a pdf",
    });

    let response = app().await.oneshot(analyze_request(&parts)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let results = body.as_array().expect("array of results");
    assert_eq!(results.len(), 2);

    let jane = &results[0];
    assert_eq!(jane["filename"], "jane.pdf");
    assert!(jane["match_percentage"].as_i64().unwrap() > 0);
    assert!(jane["tokens_used"].as_u64().unwrap() > 0);
    assert!(!jane["summary"].as_str().unwrap().starts_with("Error:"));
    assert_eq!(jane["missing_skills"], json!(["Kafka"]));

    let notes = &results[1];
    assert_eq!(notes["filename"], "notes.pdf");
    assert_eq!(notes["match_percentage"], 0);
    assert_eq!(notes["tokens_used"], 0);
    assert!(notes["summary"].as_str().unwrap().starts_with("Error: "));
    assert_eq!(notes["missing_skills"], json!([]));
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() {
    let model_dir = tempfile::tempdir().unwrap();
    let mut settings = test_helpers::test_settings(model_dir.path());
    settings.max_upload_bytes = 1024;
    let pool = test_helpers::create_test_db().await.unwrap();
    let app = test_helpers::test_app(pool, &settings).await;

    let large = vec![b'x'; 8 * 1024];
    let mut parts = job_parts();
    parts.push(MultipartPart::File {
        name: "resumes",
        filename: "large.pdf",
        content_type: "application/pdf",
        bytes: &large,
    });

    let response = app.oneshot(analyze_request(&parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_json(response).await["error"].is_string());
}
