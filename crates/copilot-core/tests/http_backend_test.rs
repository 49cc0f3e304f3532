//! HttpBackend against a local axum server shaped like the CAD backend.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use copilot_core::{CopilotError, GenerationBackend, HttpBackend, ServiceStatus};
use serde_json::{json, Value};

async fn generate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let prompt = body["prompt"].as_str().unwrap_or_default();
    if prompt == "reject me" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "code": "ERR_VALIDATION",
                "error": {
                    "type": "validation_error",
                    "message": "Prompt rejected",
                    "details": "contains forbidden words"
                }
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "stl_url": "/outputs/0a1b.stl",
            "code": format!("# {}", prompt)
        })),
    )
}

async fn refine(Json(body): Json<Value>) -> Json<Value> {
    let code = format!(
        "{}\n# {}",
        body["original_code"].as_str().unwrap_or_default(),
        body["instruction"].as_str().unwrap_or_default()
    );
    Json(json!({ "status": "success", "stl_url": "/outputs/2c3d.stl", "code": code }))
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "warning",
        "ollama_reachable": true,
        "freecad_available": false,
        "freecad_executable": null,
        "rag_status": {"documents": 0},
        "output_dir_writable": true
    }))
}

async fn spawn_backend() -> HttpBackend {
    let app = Router::new()
        .route("/api/generate", post(generate))
        .route("/api/refine", post(refine))
        .route("/api/status", get(status));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpBackend::new(&format!("http://{}/", addr))
}

#[tokio::test]
async fn test_generate_posts_prompt() {
    let backend = spawn_backend().await;
    let result = backend.generate("a flanged pipe").await.unwrap();
    assert_eq!(result.mesh_reference, "/outputs/0a1b.stl");
    assert_eq!(result.script_text, "# a flanged pipe");
}

#[tokio::test]
async fn test_refine_posts_code_and_instruction() {
    let backend = spawn_backend().await;
    let result = backend.refine("pipe()", "add a flange").await.unwrap();
    assert_eq!(result.script_text, "pipe()\n# add a flange");
}

#[tokio::test]
async fn test_structured_error_is_parsed() {
    let backend = spawn_backend().await;
    let err = backend.generate("reject me").await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Prompt rejected (contains forbidden words)"
    );
    match err {
        CopilotError::Backend { code, .. } => assert_eq!(code.as_deref(), Some("ERR_VALIDATION")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_status_reports_components() {
    let backend = spawn_backend().await;
    let status = backend.status().await.unwrap();
    assert_eq!(status.status, ServiceStatus::Warning);
    assert_eq!(
        status.component_summary(),
        vec![
            "LLM: reachable".to_string(),
            "FreeCAD: missing".to_string(),
            "Output dir: writable".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_success() {
    let backend = spawn_backend().await;
    // axum answers 404 with an empty body, which is not JSON.
    let err = HttpBackend::new(&format!("{}/missing", backend.base_url()))
        .generate("x")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Failed to connect to backend.");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpBackend::new(&format!("http://{}", addr))
        .generate("x")
        .await
        .unwrap_err();
    assert!(matches!(err, CopilotError::Transport(_)));
    assert_eq!(err.user_message(), "Failed to connect to backend.");
}
