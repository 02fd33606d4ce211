//! Router-level tests for the analysis API, with both upstream services
//! faked by a local HTTP server.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use aisov::config::Config;

/// Canned responses for the faked Perplexity and Gemini endpoints.
#[derive(Clone)]
struct Upstream {
    search_status: u16,
    search_body: serde_json::Value,
    extract_status: u16,
    extract_body: serde_json::Value,
}

impl Upstream {
    fn healthy(answer: &str, citations: &[&str], extraction: serde_json::Value) -> Self {
        Self {
            search_status: 200,
            search_body: perplexity_answer(answer, citations),
            extract_status: 200,
            extract_body: gemini_slot(&extraction.to_string()),
        }
    }
}

fn perplexity_answer(text: &str, citations: &[&str]) -> serde_json::Value {
    json!({
        "model": "sonar-pro",
        "citations": citations,
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": text}
        }]
    })
}

/// Wraps a structured-output slot the way generateContent returns it: as a
/// JSON string inside the first candidate part.
fn gemini_slot(slot: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": slot}]}
        }]
    })
}

async fn search_handler(State(upstream): State<Upstream>) -> impl IntoResponse {
    (
        StatusCode::from_u16(upstream.search_status).unwrap(),
        Json(upstream.search_body.clone()),
    )
}

async fn extract_handler(State(upstream): State<Upstream>) -> impl IntoResponse {
    (
        StatusCode::from_u16(upstream.extract_status).unwrap(),
        Json(upstream.extract_body.clone()),
    )
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake upstream");
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/chat/completions", post(search_handler))
        .route("/models/{call}", post(extract_handler))
        .with_state(upstream);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn spawn_app(upstream_base: &str) -> Router {
    let db_path = std::env::temp_dir().join(format!("aisov-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.perplexity.base_url = upstream_base.to_string();
    config.perplexity.api_key = "pplx-test".to_string();
    config.gemini.base_url = upstream_base.to_string();
    config.gemini.api_key = "gm-test".to_string();

    let state = aisov::api::create_app_state_from_config(config)
        .await
        .expect("failed to create app state");
    aisov::api::router(state)
}

async fn spawn_app_with_ranked_answer() -> Router {
    let upstream = Upstream::healthy(
        "1. Stripe 2. PayPal 3. Square",
        &["https://example.com/payments", "https://example.com/review"],
        json!({"is_visible": true, "competitors": ["PayPal", "Square"], "rank_position": 1}),
    );
    let base = spawn_upstream(upstream).await;
    spawn_app(&base).await
}

fn post_analysis(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyses")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_starts_empty() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn validation_rejects_blank_fields_before_any_upstream_call() {
    // Unroutable upstream: if validation let the request through, the
    // handler would answer 502 instead of 400.
    let app = spawn_app("http://127.0.0.1:1").await;

    let response = app
        .clone()
        .oneshot(post_analysis(
            json!({"id": null, "query": "", "targetClient": "Stripe"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Query"));

    let response = app
        .clone()
        .oneshot(post_analysis(
            json!({"id": null, "query": "best payment processors", "targetClient": "   "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Target"));

    // Nothing was persisted along the way.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn end_to_end_analysis_round_trips_through_the_store() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .clone()
        .oneshot(post_analysis(json!({
            "id": null,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;

    let id = record["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(record["targets"], "Stripe");
    assert_eq!(record["prompts"], "best payment processors");
    assert_eq!(record["answer_text"], "1. Stripe 2. PayPal 3. Square");
    assert_eq!(record["is_visible"], true);
    assert_eq!(record["rank_position"], 1);
    assert_eq!(record["competitors"], json!(["PayPal", "Square"]));
    assert_eq!(
        record["citations"],
        json!(["https://example.com/payments", "https://example.com/review"])
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0], record);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/analyses/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, record);
}

#[tokio::test]
async fn regenerate_preserves_the_record_id() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .clone()
        .oneshot(post_analysis(json!({
            "id": null,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();
    let first = json_body(response).await;
    let id = first["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_analysis(json!({
            "id": id,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;
    assert_eq!(second["id"].as_i64().unwrap(), id);

    // Still a single row; regenerate mutated in place.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn new_submissions_get_distinct_ids() {
    let app = spawn_app_with_ranked_answer().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_analysis(json!({
                "id": null,
                "query": "best payment processors",
                "targetClient": "Stripe"
            })))
            .await
            .unwrap();
        ids.push(json_body(response).await["id"].as_i64().unwrap());
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn regenerate_of_a_missing_id_is_404() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .oneshot(post_analysis(json!({
            "id": 4242,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("4242"));
}

#[tokio::test]
async fn search_failure_returns_an_error_and_persists_nothing() {
    let upstream = Upstream {
        search_status: 500,
        search_body: json!({"error": "upstream exploded"}),
        extract_status: 200,
        extract_body: gemini_slot(
            &json!({"is_visible": true, "competitors": [], "rank_position": 0}).to_string(),
        ),
    };
    let base = spawn_upstream(upstream).await;
    let app = spawn_app(&base).await;

    let response = app
        .clone()
        .oneshot(post_analysis(json!({
            "id": null,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn malformed_extraction_output_returns_an_error_and_persists_nothing() {
    let upstream = Upstream {
        search_status: 200,
        search_body: perplexity_answer("Some answer text", &[]),
        extract_status: 200,
        extract_body: gemini_slot("this is not the JSON you are looking for"),
    };
    let base = spawn_upstream(upstream).await;
    let app = spawn_app(&base).await;

    let response = app
        .clone()
        .oneshot(post_analysis(json!({
            "id": null,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn invisible_target_with_positive_rank_is_stored_with_null_rank() {
    let upstream = Upstream::healthy(
        "PayPal and Square dominate the space.",
        &["https://example.com/market"],
        json!({"is_visible": false, "competitors": ["PayPal", "Square"], "rank_position": 2}),
    );
    let base = spawn_upstream(upstream).await;
    let app = spawn_app(&base).await;

    let response = app
        .oneshot(post_analysis(json!({
            "id": null,
            "query": "best payment processors",
            "targetClient": "Stripe"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record = json_body(response).await;
    assert_eq!(record["is_visible"], false);
    assert_eq!(record["rank_position"], serde_json::Value::Null);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/analyses")
                .header("Origin", "https://dashboard.example")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "content-type, apikey")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn dashboard_assets_are_served_at_the_root() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_app_with_ranked_answer().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}
