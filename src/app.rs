use crate::catalog::{DEMO_COMMAND, PATTERN_EXAMPLES, PROMPT, QUICK_COMMANDS, standard_book};
use crate::commands::CommandBook;
use crate::config::Config;
use crate::console::{Console, ConsoleEvent, EventError, EventOutcome};
use crate::logger::Logger;
use crate::render::render_fragment;
use crate::sessions::{SessionSettings, SessionStore};
use anyhow::Result;
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Path, State};
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::System;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

pub struct AppState {
    pub config: Arc<Config>,
    pub logger: Logger,
    pub book: Arc<CommandBook>,
    pub sessions: Arc<SessionStore>,
    pub started_at: Instant,
}

#[derive(Debug)]
pub enum ApiError {
    SessionNotFound,
    MalformedBody(&'static str),
    Validation(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::SessionNotFound => "Session not found",
            ApiError::MalformedBody(message) => message,
            ApiError::Validation(message) => message.as_str(),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(error: EventError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "message": self.detail() }))).into_response()
    }
}

pub fn build_router(config: Arc<Config>, logger: Logger) -> Result<Router> {
    let book = Arc::new(standard_book()?);
    let sessions = Arc::new(SessionStore::new(
        book.clone(),
        SessionSettings {
            max_sessions: config.max_sessions,
            ttl: config.session_ttl,
            timing: config.timing.clone(),
            demo: config.demo.clone(),
        },
        logger.clone(),
    ));
    let state = Arc::new(AppState {
        config,
        logger,
        book,
        sessions,
        started_at: Instant::now(),
    });

    let cors = build_cors(&state.config);

    Ok(Router::new()
        .route("/healthz", get(handle_healthz))
        .route("/info", get(handle_info))
        .route("/sessions", post(handle_create_session))
        .route(
            "/sessions/{id}",
            get(handle_snapshot).delete(handle_delete_session),
        )
        .route("/sessions/{id}/render", get(handle_render))
        .route("/sessions/{id}/events", post(handle_event))
        .route("/internal/status", get(handle_status))
        .fallback(handle_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_context_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_payload_bytes))
        .with_state(state))
}

async fn request_context_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let origin = request
        .headers()
        .get("origin")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let client_ip = resolve_client_ip(&request, request.extensions().get::<ConnectInfo<SocketAddr>>());
    let method = request.method().to_string();
    let raw_url = request.uri().to_string();

    let started_at = Instant::now();
    state.logger.info(
        "request.received",
        json!({
            "requestId": request_id,
            "method": method,
            "rawUrl": raw_url,
            "origin": origin,
            "clientIp": client_ip,
        }),
    );

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        HeaderName::from_static("x-request-id"),
        HeaderValue::from_str(&request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );

    let duration_ms = started_at.elapsed().as_secs_f64() * 1000.0;
    state.logger.info(
        "request.completed",
        json!({
            "requestId": request_id,
            "method": method,
            "rawUrl": raw_url,
            "statusCode": response.status().as_u16(),
            "durationMs": duration_ms,
            "origin": origin,
            "clientIp": client_ip,
        }),
    );

    response
}

fn resolve_client_ip(request: &Request<Body>, connect: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded;
    }
    connect.map(|info| info.0.ip().to_string())
}

fn build_cors(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);
    if config.allow_all_origins {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

async fn handle_healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn handle_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "prompt": PROMPT,
            "staticCommands": state.book.static_keys(),
            "patternExamples": PATTERN_EXAMPLES,
            "quickCommands": QUICK_COMMANDS,
            "demoCommand": DEMO_COMMAND,
        })),
    )
}

async fn handle_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (id, console) = state.sessions.create().await;
    let snapshot = console.snapshot().await;
    (
        StatusCode::CREATED,
        Json(json!({ "sessionId": id, "snapshot": snapshot })),
    )
}

async fn handle_snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let console = find_console(&state, &id).await?;
    Ok(Json(console.snapshot().await).into_response())
}

async fn handle_render(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let console = find_console(&state, &id).await?;
    let fragment = render_fragment(&console.snapshot().await);
    Ok((
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Html(fragment),
    )
        .into_response())
}

async fn handle_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    bytes: Bytes,
) -> Result<Response, ApiError> {
    let console = find_console(&state, &id).await?;
    if bytes.is_empty() {
        return Err(ApiError::MalformedBody("Malformed JSON body"));
    }
    let event: ConsoleEvent = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::MalformedBody("Invalid console event"))?;
    if let ConsoleEvent::Input { value } = &event {
        let length = value.chars().count();
        if length > state.config.max_input_chars {
            return Err(ApiError::Validation(format!(
                "Input length exceeds limit of {}",
                state.config.max_input_chars
            )));
        }
    }

    match console.handle_event(event).await? {
        EventOutcome::Updated => Ok(Json(console.snapshot().await).into_response()),
        EventOutcome::Queued(submission) => {
            // The submission holds the console's turn, so its echo is already
            // logged and later events queue behind it.
            let snapshot = console.snapshot().await;
            let logger = state.logger.clone();
            tokio::spawn(async move {
                let started_at = Instant::now();
                let command = submission.text().to_string();
                let dispatch = submission.finish().await;
                logger.info(
                    "console.dispatched",
                    json!({
                        "sessionId": id,
                        "command": command,
                        "dispatch": dispatch.as_str(),
                        "durationMs": started_at.elapsed().as_secs_f64() * 1000.0,
                    }),
                );
            });
            Ok((
                StatusCode::ACCEPTED,
                Json(json!({ "accepted": true, "snapshot": snapshot })),
            )
                .into_response())
        }
    }
}

async fn handle_delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

async fn handle_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut system = System::new();
    system.refresh_memory();
    let payload = json!({
        "status": "ok",
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "memoryTotalBytes": system.total_memory(),
        "memoryUsedBytes": system.used_memory(),
        "liveSessions": state.sessions.len().await,
    });
    (StatusCode::OK, Json(payload))
}

async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
}

async fn find_console(
    state: &AppState,
    raw_id: &str,
) -> Result<Arc<Console>, ApiError> {
    let id = parse_session_id(raw_id)?;
    state
        .sessions
        .get(&id)
        .await
        .ok_or(ApiError::SessionNotFound)
}

// Malformed ids cannot name a live session, so they share the 404.
fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::SessionNotFound)
}
