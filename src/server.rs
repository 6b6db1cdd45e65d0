use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::{ChatCompletionsGenerator, LlmSettings};
use crate::security::rate_limit_middleware;

/// Returned in place of an answer when generation fails.
pub const FALLBACK_ANSWER: &str = "An error occurred while processing your request.";

const FRONTEND_NOT_FOUND: &str = "<h1>Frontend not found</h1><p>Create static/index.html</p>";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        "LLM configuration loaded"
    );

    let generator = Arc::new(ChatCompletionsGenerator::new(settings));
    let state = AppState::new(Arc::clone(&config), generator)?;
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        rate_limit = config.resilience.rate_limit_enabled,
        "Server started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let answer = Router::new()
        .route("/api/answer", post(api_answer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(api_health))
        .route("/api/logs", get(api_logs))
        .merge(answer)
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir))
        .layer(cors_layer(&state.config.server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Serve the frontend page.
async fn index_handler(State(state): State<AppState>) -> Response {
    let path = state.config.server.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Frontend page not found");
            (StatusCode::NOT_FOUND, Html(FRONTEND_NOT_FOUND)).into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the answer API.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub user_query: String,
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

/// First `max` characters of `text`, for log lines.
fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// POST /api/answer - Screen a query, generate an answer and screen the answer.
///
/// Screening failures answer 400 with a plain-text reason.
async fn api_answer(State(state): State<AppState>, Json(req): Json<AnswerRequest>) -> Response {
    let request_id = Uuid::new_v4();
    let query = req.user_query;

    if query.trim().is_empty() {
        warn!(name: "answer.request.empty", request_id = %request_id, "Empty query received");
        return detail(StatusCode::BAD_REQUEST, "Query cannot be empty");
    }

    let max = state.config.guardrails.max_query_chars;
    let len = query.chars().count();
    if len > max {
        warn!(name: "answer.request.too_long", request_id = %request_id, len, "Query too long");
        return detail(
            StatusCode::BAD_REQUEST,
            format!("Query too long (max {max} characters)"),
        );
    }

    if let Err(violation) = state.guardrails.detect_prompt_injection(&query) {
        warn!(
            name: "answer.request.blocked",
            request_id = %request_id,
            query = %preview(&query, 50),
            reason = violation.reason,
            "Prompt injection blocked"
        );
        return (
            StatusCode::BAD_REQUEST,
            format!("Request blocked: {violation}"),
        )
            .into_response();
    }

    info!(
        name: "answer.request.accepted",
        request_id = %request_id,
        query = %preview(&query, 50),
        "Processing query"
    );

    let answer = match state.generator.generate(&query).await {
        Ok(answer) => answer,
        Err(e) => {
            error!(name: "answer.generate.failed", request_id = %request_id, error = %e, "Answer generation failed");
            FALLBACK_ANSWER.to_string()
        }
    };

    if let Err(violation) = state.guardrails.check_output(&answer) {
        warn!(
            name: "answer.response.blocked",
            request_id = %request_id,
            reason = violation.reason,
            "Unsafe output blocked"
        );
        return (
            StatusCode::BAD_REQUEST,
            format!("Response blocked: {violation}"),
        )
            .into_response();
    }

    info!(
        name: "answer.response.sent",
        request_id = %request_id,
        query_len = len,
        answer_len = answer.len(),
        "Response sent successfully"
    );
    answer.into_response()
}

/// GET /api/health - Liveness probe.
async fn api_health() -> Json<serde_json::Value> {
    info!(name: "health.checked", "Health check called");
    Json(json!({ "status": "healthy" }))
}

/// GET /api/logs - Trailing lines of the server log file.
async fn api_logs(State(state): State<AppState>) -> Json<serde_json::Value> {
    let logging = &state.config.logging;

    if let Err(e) = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .await
    {
        error!(path = %logging.file.display(), error = %e, "Failed to create log file");
        return Json(json!({ "error": "Could not read log file" }));
    }

    match tokio::fs::read_to_string(&logging.file).await {
        Ok(contents) => {
            let lines: Vec<&str> = contents.lines().map(str::trim).collect();
            let start = lines.len().saturating_sub(logging.tail_lines);
            Json(json!({ "logs": &lines[start..] }))
        }
        Err(e) => {
            error!(path = %logging.file.display(), error = %e, "Failed to read log file");
            Json(json!({ "error": "Could not read log file" }))
        }
    }
}
