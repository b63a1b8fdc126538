//! HTTP API over the trace engine, tutor and session store
//!
//! Every route speaks JSON. Failures are rendered as a uniform
//! `{ "error": { "code", "message" } }` body with a sanitized message, so
//! the frontend can branch on `code` without parsing prose.

use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

use crate::algorithms::graph::{self, GraphInput};
use crate::algorithms::knapsack::{self, KnapsackInput};
use crate::algorithms::list::{self, ListInput};
use crate::algorithms::queens::{self, QueensInput};
use crate::algorithms::sorting::{self, SortInput};
use crate::catalog::AlgorithmKind;
use crate::config::{AppConfig, TraceLimits};
use crate::error::{sanitize_error_message, AppError, ErrorBody, ErrorDetail};
use crate::observability::metrics::metrics;
use crate::session::SessionStore;
use crate::trace::{TraceEnvelope, TraceError};
use crate::tutor::TutorService;

/// Request bodies larger than this are rejected with 413
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Shared state cloned into every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tutor: Arc<TutorService>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, tutor: Arc<TutorService>, sessions: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            tutor,
            sessions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: String,
    message: String,
    algorithm: Option<AlgorithmKind>,
}

#[derive(Debug, Deserialize)]
struct ExplainRequest {
    algorithm: AlgorithmKind,
    step_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClearedResponse {
    cleared: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ComponentCheck {
    status: String,
    message: Option<String>,
    last_check: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: u64,
    uptime_seconds: u64,
    checks: HashMap<String, ComponentCheck>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    service: String,
    version: String,
    endpoints: HashMap<String, String>,
}

/// Generates one trace envelope as loosely-typed JSON
///
/// The per-algorithm input and step types never leak past this function,
/// so the HTTP layer and the CLI can stay generic over algorithms.
pub fn generate_trace(
    kind: AlgorithmKind,
    input: Value,
    limits: &TraceLimits,
) -> Result<Value, AppError> {
    match build_trace(kind, input, limits) {
        Ok(envelope) => {
            metrics().trace_generated(kind.wire_name());
            Ok(envelope)
        }
        Err(err) => {
            metrics().trace_failed();
            warn!(
                algorithm = kind.wire_name(),
                error = %err,
                "trace generation failed"
            );
            Err(err)
        }
    }
}

fn build_trace(
    kind: AlgorithmKind,
    input: Value,
    limits: &TraceLimits,
) -> Result<Value, AppError> {
    match kind {
        AlgorithmKind::BubbleSort => {
            let parsed: SortInput = parse_input(input)?;
            to_json(sorting::bubble_sort_steps(&parsed, limits)?)
        }
        AlgorithmKind::MergeSort => {
            let parsed: SortInput = parse_input(input)?;
            to_json(sorting::merge_sort_steps(&parsed, limits)?)
        }
        AlgorithmKind::BellmanFord => {
            let parsed: GraphInput = parse_input(input)?;
            to_json(graph::bellman_ford_steps(&parsed, limits)?)
        }
        AlgorithmKind::NQueens => {
            let parsed: QueensInput = parse_input(input)?;
            to_json(queens::n_queens_steps(&parsed, limits)?)
        }
        AlgorithmKind::Knapsack01 => {
            let parsed: KnapsackInput = parse_input(input)?;
            to_json(knapsack::knapsack_steps(&parsed, limits)?)
        }
        AlgorithmKind::LinkedList => {
            let parsed: ListInput = parse_input(input)?;
            to_json(list::linked_list_steps(&parsed, limits)?)
        }
    }
}

fn parse_input<T: serde::de::DeserializeOwned>(input: Value) -> Result<T, TraceError> {
    serde_json::from_value(input).map_err(|err| TraceError::invalid_input(err.to_string()))
}

fn to_json<S: Serialize>(envelope: TraceEnvelope<S>) -> Result<Value, AppError> {
    serde_json::to_value(envelope)
        .map_err(|err| AppError::internal_error(format!("trace serialization failed: {err}")))
}

/// Builds the full route tree
///
/// Exposed separately from [`run`] so tests can drive it through
/// `warp::test` without binding a socket.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let root_route = warp::path::end().and(warp::get()).and_then(move || async move {
        let mut endpoints = HashMap::new();
        endpoints.insert(
            "GET /api/algorithms".to_string(),
            "Catalog of traceable algorithms".to_string(),
        );
        endpoints.insert(
            "POST /api/trace/{algorithm}".to_string(),
            "Generate a step trace from an algorithm input".to_string(),
        );
        endpoints.insert(
            "POST /api/tutor/chat".to_string(),
            "Ask the tutor a question within a session".to_string(),
        );
        endpoints.insert(
            "POST /api/tutor/explain".to_string(),
            "One-shot explanation of an algorithm or step".to_string(),
        );
        endpoints.insert(
            "GET /api/sessions/{id}".to_string(),
            "Session transcript".to_string(),
        );
        endpoints.insert(
            "DELETE /api/sessions/{id}".to_string(),
            "Clear a session".to_string(),
        );
        endpoints.insert(
            "GET /health".to_string(),
            "Overall health status with per-component checks".to_string(),
        );
        endpoints.insert("GET /ready".to_string(), "Readiness probe".to_string());
        endpoints.insert("GET /live".to_string(), "Liveness probe".to_string());
        endpoints.insert("GET /metrics".to_string(), "Runtime counters".to_string());

        let response = ApiDocumentationResponse {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        };
        Ok::<_, Infallible>(warp::reply::json(&response))
    });

    let algorithms_route = warp::path!("api" / "algorithms")
        .and(warp::get())
        .and_then(move || async move {
            Ok::<_, Infallible>(warp::reply::json(&AlgorithmKind::catalog()))
        });

    let trace_state = state.clone();
    let trace_route = warp::path!("api" / "trace" / String)
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<Value>())
        .and_then(move |algorithm: String, input: Value| {
            let state = trace_state.clone();
            async move {
                let reply = match AlgorithmKind::from_str(&algorithm) {
                    Ok(kind) => match generate_trace(kind, input, &state.config.limits) {
                        Ok(envelope) => {
                            warp::reply::with_status(warp::reply::json(&envelope), StatusCode::OK)
                        }
                        Err(err) => error_reply(&err),
                    },
                    Err(err) => error_reply(&AppError::from(err)),
                };
                Ok::<_, Infallible>(reply)
            }
        });

    let chat_state = state.clone();
    let chat_route = warp::path!("api" / "tutor" / "chat")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ChatRequest>())
        .and_then(move |request: ChatRequest| {
            let state = chat_state.clone();
            async move {
                let reply = match state
                    .tutor
                    .chat(&request.session_id, &request.message, request.algorithm)
                    .await
                {
                    Ok(reply) => {
                        warp::reply::with_status(warp::reply::json(&reply), StatusCode::OK)
                    }
                    Err(err) => error_reply(&AppError::from(err)),
                };
                Ok::<_, Infallible>(reply)
            }
        });

    let explain_state = state.clone();
    let explain_route = warp::path!("api" / "tutor" / "explain")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ExplainRequest>())
        .and_then(move |request: ExplainRequest| {
            let state = explain_state.clone();
            async move {
                let reply = state
                    .tutor
                    .explain(request.algorithm, request.step_message.as_deref())
                    .await;
                Ok::<_, Infallible>(warp::reply::json(&reply))
            }
        });

    let get_session_state = state.clone();
    let get_session_route = warp::path!("api" / "sessions" / String)
        .and(warp::get())
        .and_then(move |session_id: String| {
            let state = get_session_state.clone();
            async move {
                let reply = match state.sessions.history(&session_id) {
                    Ok(Some(snapshot)) => {
                        warp::reply::with_status(warp::reply::json(&snapshot), StatusCode::OK)
                    }
                    Ok(None) => error_reply(&AppError::session_not_found(session_id.as_str())),
                    Err(err) => error_reply(&AppError::from(err)),
                };
                Ok::<_, Infallible>(reply)
            }
        });

    let delete_session_state = state.clone();
    let delete_session_route = warp::path!("api" / "sessions" / String)
        .and(warp::delete())
        .and_then(move |session_id: String| {
            let state = delete_session_state.clone();
            async move {
                let reply = match state.sessions.remove(&session_id) {
                    Ok(cleared) => warp::reply::with_status(
                        warp::reply::json(&ClearedResponse { cleared }),
                        StatusCode::OK,
                    ),
                    Err(err) => error_reply(&AppError::from(err)),
                };
                Ok::<_, Infallible>(reply)
            }
        });

    let health_state = state.clone();
    let health_route = warp::path!("health").and(warp::get()).and_then(move || {
        let state = health_state.clone();
        async move {
            let status = health_status(&state).await;
            let code = if status.status == "healthy" {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&status), code))
        }
    });

    let ready_state = state.clone();
    let ready_route = warp::path!("ready").and(warp::get()).and_then(move || {
        let state = ready_state.clone();
        async move {
            let ready = match state.tutor.provider_name() {
                Some(_) => state.tutor.health().await.is_ok(),
                None => true,
            };
            let code = if ready {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            let response = ReadinessResponse {
                ready,
                timestamp: current_timestamp(),
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&response), code))
        }
    });

    let live_route = warp::path!("live").and(warp::get()).and_then(move || async move {
        let response = LivenessResponse {
            alive: true,
            timestamp: current_timestamp(),
        };
        Ok::<_, Infallible>(warp::reply::json(&response))
    });

    let metrics_route = warp::path!("metrics")
        .and(warp::get())
        .and_then(move || async move {
            Ok::<_, Infallible>(warp::reply::json(&metrics().get_metrics()))
        });

    let api = root_route
        .or(algorithms_route)
        .or(trace_route)
        .or(chat_route)
        .or(explain_route)
        .or(get_session_route)
        .or(delete_session_route)
        .or(health_route)
        .or(ready_route)
        .or(live_route)
        .or(metrics_route);

    api.recover(handle_rejection).with(
        warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "DELETE"])
            .allow_headers(vec!["content-type"]),
    )
}

/// Binds the route tree and serves until the task is dropped
pub async fn run(state: AppState) -> Result<(), AppError> {
    let addr = state.config.listen_addr()?;
    info!(bind = %addr.0, port = addr.1, "starting algoscope server");
    warp::serve(routes(state)).run(addr).await;
    Ok(())
}

fn error_reply(err: &AppError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = StatusCode::from_u16(err.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(warp::reply::json(&err.to_error_body()), status)
}

async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, code, message) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "not_found",
            "resource not found".to_string(),
        )
    } else if let Some(deserialize_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            "invalid_input",
            deserialize_err.to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "request body too large".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "method not allowed".to_string(),
        )
    } else {
        error!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error".to_string(),
        )
    };

    let body = ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message: sanitize_error_message(&message),
        },
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

async fn health_status(state: &AppState) -> HealthResponse {
    let now = current_timestamp();
    let mut checks = HashMap::new();

    let llm_check = match state.tutor.provider_name() {
        Some(name) => match state.tutor.health().await {
            Ok(()) => ComponentCheck {
                status: "healthy".to_string(),
                message: Some(format!("{name} provider reachable")),
                last_check: now,
            },
            Err(err) => ComponentCheck {
                status: "unhealthy".to_string(),
                message: Some(sanitize_error_message(&err.to_string())),
                last_check: now,
            },
        },
        None => ComponentCheck {
            status: "healthy".to_string(),
            message: Some("no provider configured, answering from the fallback".to_string()),
            last_check: now,
        },
    };
    checks.insert("llm_provider".to_string(), llm_check);

    let session_count = state.sessions.session_count();
    checks.insert(
        "sessions".to_string(),
        ComponentCheck {
            status: "healthy".to_string(),
            message: Some(format!("{session_count} active sessions")),
            last_check: now,
        },
    );

    let overall_healthy = checks.values().all(|check| check.status == "healthy");
    let status = if overall_healthy { "healthy" } else { "degraded" };

    HealthResponse {
        status: status.to_string(),
        timestamp: now,
        uptime_seconds: metrics().get_metrics().uptime_seconds,
        checks,
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
