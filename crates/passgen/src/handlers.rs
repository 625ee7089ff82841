//! 密码派生 HTTP 处理器

use crate::{
    clock::{Clock, SystemClock},
    config::PassgenConfig,
    derive::derive,
    error::PassgenError,
    types::{
        DiscoveryResponse, ErrorResponse, GenerateBody, GenerateQuery, GenerationRequest,
        GenerationResult, HealthResponse,
    },
};
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Html,
    routing::get,
};
use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use utoipa::OpenApi;

lazy_static! {
    /// 派生服务指标
    static ref PASSWORDS_GENERATED: IntCounterVec = IntCounterVec::new(
        Opts::new("passwords_generated_total", "Total number of passwords generated")
            .namespace("hashpass"),
        &["method"]
    ).unwrap();

    static ref REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("request_duration_seconds", "HTTP request duration in seconds")
            .namespace("hashpass")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["method", "path", "status"]
    ).unwrap();

    static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("requests_total", "Total number of HTTP requests")
            .namespace("hashpass"),
        &["method", "path", "status"]
    ).unwrap();
}

/// 注册派生服务 metrics 到给定 registry
pub fn register_passgen_metrics(registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PASSWORDS_GENERATED.clone()))?;
    registry.register(Box::new(REQUEST_DURATION.clone()))?;
    registry.register(Box::new(REQUESTS_TOTAL.clone()))?;
    Ok(())
}

/// 根路径列出的端点
pub const ENDPOINTS: &[&str] = &["/generate", "/docs"];

/// OpenAPI 文档路径
pub const OPENAPI_PATH: &str = "/openapi.json";

/// 派生服务 OpenAPI 描述
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Password Generator API",
        description = "Generate passwords using SHA256 hashing with timestamp"
    ),
    paths(
        root_handler,
        generate_get_handler,
        generate_post_handler,
        health_check_handler
    ),
    components(schemas(
        GenerateBody,
        GenerationResult,
        DiscoveryResponse,
        HealthResponse,
        ErrorResponse
    )),
    tags((name = "passgen", description = "Password derivation"))
)]
pub struct ApiDoc;

const DOCS_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Password Generator API - Docs</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

/// 派生服务状态
///
/// 只读，可在任意多个并发请求间共享
#[derive(Clone)]
pub struct PassgenState {
    pub config: Arc<PassgenConfig>,
    pub clock: Arc<dyn Clock>,
}

impl PassgenState {
    pub fn new<C: Clock + 'static>(config: PassgenConfig, clock: C) -> Self {
        Self {
            config: Arc::new(config),
            clock: Arc::new(clock),
        }
    }

    /// 对已校验的请求派生密码
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, PassgenError> {
        derive(request, self.clock.as_ref())
    }
}

/// 以系统时钟创建派生服务状态
pub fn create_passgen_state(config: &PassgenConfig) -> PassgenState {
    info!(
        "Initializing passgen state (default phrase length: {})",
        config.default_phrase.len()
    );
    PassgenState::new(config.clone(), SystemClock)
}

/// 创建派生服务的路由
pub fn create_router(state: PassgenState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/generate", get(generate_get_handler).post(generate_post_handler))
        .route("/health", get(health_check_handler))
        .route(OPENAPI_PATH, get(openapi_handler))
        .route("/docs", get(docs_handler))
        .with_state(state)
}

fn record_request(method: &str, status: StatusCode, start_time: Instant) {
    let status = status.as_str();
    REQUEST_DURATION
        .with_label_values(&[method, "/generate", status])
        .observe(start_time.elapsed().as_secs_f64());
    REQUESTS_TOTAL
        .with_label_values(&[method, "/generate", status])
        .inc();
}

fn finish(
    method: &str,
    start_time: Instant,
    result: Result<GenerationResult, PassgenError>,
) -> Result<Json<GenerationResult>, PassgenError> {
    match result {
        Ok(generated) => {
            record_request(method, StatusCode::OK, start_time);
            PASSWORDS_GENERATED.with_label_values(&[method]).inc();
            debug!(
                "Generated password of length {} at {}",
                generated.length, generated.timestamp
            );
            Ok(Json(generated))
        }
        Err(e) => {
            record_request(method, e.status_code(), start_time);
            if e.is_client_error() {
                warn!("Rejected {} /generate: {}", method, e);
            }
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "passgen",
    responses((status = 200, description = "Service discovery", body = DiscoveryResponse))
)]
async fn root_handler(State(app_state): State<PassgenState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        message: app_state.config.service_name.clone(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        author: app_state.config.author.clone(),
    })
}

/// Generate a password from the SHA256 of phrase + current timestamp
#[utoipa::path(
    get,
    path = "/generate",
    tag = "passgen",
    params(GenerateQuery),
    responses(
        (status = 200, description = "Derived password", body = GenerationResult),
        (status = 400, description = "Length out of range or malformed query", body = ErrorResponse),
        (status = 500, description = "Derivation failed", body = ErrorResponse)
    )
)]
async fn generate_get_handler(
    State(app_state): State<PassgenState>,
    query: Result<Query<GenerateQuery>, QueryRejection>,
) -> Result<Json<GenerationResult>, PassgenError> {
    let start_time = Instant::now();

    let result = query
        .map_err(|e| PassgenError::InvalidRequest(e.body_text()))
        .and_then(|Query(query)| {
            GenerationRequest::from_query(query, &app_state.config.default_phrase)
        })
        .and_then(|request| app_state.generate(&request));

    finish("GET", start_time, result)
}

/// Generate a password from a JSON body
#[utoipa::path(
    post,
    path = "/generate",
    tag = "passgen",
    request_body = GenerateBody,
    responses(
        (status = 200, description = "Derived password", body = GenerationResult),
        (status = 400, description = "Length out of range or malformed body", body = ErrorResponse),
        (status = 500, description = "Derivation failed", body = ErrorResponse)
    )
)]
async fn generate_post_handler(
    State(app_state): State<PassgenState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationResult>, PassgenError> {
    let start_time = Instant::now();

    let result = body
        .map_err(|e| PassgenError::InvalidRequest(e.body_text()))
        .and_then(|Json(body)| {
            GenerationRequest::from_body(body, &app_state.config.default_phrase)
        })
        .and_then(|request| app_state.generate(&request));

    finish("POST", start_time, result)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "passgen",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "System clock unavailable", body = ErrorResponse)
    )
)]
async fn health_check_handler(
    State(app_state): State<PassgenState>,
) -> Result<Json<HealthResponse>, PassgenError> {
    debug!("Health check requested");

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: app_state.clock.now_secs()?,
    }))
}

async fn openapi_handler(State(app_state): State<PassgenState>) -> Json<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    doc.info.title = app_state.config.service_name.clone();
    Json(doc)
}

async fn docs_handler() -> Html<&'static str> {
    Html(DOCS_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const T: u64 = 1_700_000_000;
    const TEST_DIGEST: &str = "253f647956f2dfaee8a7a94c8c84f3060319e08be928f1a55965b89df01d7af7";

    fn create_test_app() -> Router {
        create_router(PassgenState::new(PassgenConfig::default(), FixedClock(T)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root() {
        let (status, json) = send(create_test_app(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Password Generator API");
        assert_eq!(json["endpoints"], serde_json::json!(["/generate", "/docs"]));
        assert_eq!(json["author"], "rohan srivastav");
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, json) = send(create_test_app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["timestamp"], T);
    }

    #[tokio::test]
    async fn test_generate_get() {
        let (status, json) = send(create_test_app(), get("/generate?length=12&phrase=test")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["password"], &TEST_DIGEST[..12]);
        assert_eq!(json["timestamp"], T);
        assert_eq!(json["length"], 12);
    }

    #[tokio::test]
    async fn test_generate_post() {
        let (status, json) =
            send(create_test_app(), post_json(r#"{"length": 64, "phrase": "test"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["password"], TEST_DIGEST);
        assert_eq!(json["length"], 64);
    }

    #[tokio::test]
    async fn test_get_and_post_agree() {
        let (_, from_get) = send(create_test_app(), get("/generate?length=20")).await;
        let (_, from_post) = send(create_test_app(), post_json(r#"{"length": 20}"#)).await;
        assert_eq!(from_get, from_post);
    }

    #[tokio::test]
    async fn test_out_of_range_rejected_identically() {
        for length in [0, 65] {
            let (get_status, get_json) =
                send(create_test_app(), get(&format!("/generate?length={length}"))).await;
            let (post_status, post_json_body) = send(
                create_test_app(),
                post_json(&format!(r#"{{"length": {length}}}"#)),
            )
            .await;

            assert_eq!(get_status, StatusCode::BAD_REQUEST);
            assert_eq!(post_status, StatusCode::BAD_REQUEST);
            assert_eq!(get_json, post_json_body);
            assert_eq!(
                get_json["detail"],
                format!("Length must be between 1 and 64 characters (got {length})")
            );
        }
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, json) = send(create_test_app(), get(OPENAPI_PATH)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["info"]["title"], "Password Generator API");
        assert!(json["openapi"].as_str().unwrap().starts_with("3."));

        let generate = &json["paths"]["/generate"];
        assert!(generate["get"].is_object());
        assert!(generate["post"].is_object());
        assert!(json["paths"]["/health"]["get"].is_object());
        assert!(json["components"]["schemas"]["GenerationResult"].is_object());
    }

    #[tokio::test]
    async fn test_docs_page_points_at_openapi() {
        let response = create_test_app().oneshot(get("/docs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(OPENAPI_PATH));
    }

    #[tokio::test]
    async fn test_malformed_input_is_bad_request() {
        let (status, json) = send(create_test_app(), get("/generate?length=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 400);

        let (status, _) = send(create_test_app(), get("/generate")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(create_test_app(), post_json(r#"{"phrase": "x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
