//! HTTP API gateway for Lodestar.
//!
//! Endpoints:
//! - `POST /v1/chat/stream` — send a message, receive an SSE event stream
//!   (`progress` | `chunk` | `done` | `error`)
//! - `GET  /health`         — liveness probe
//!
//! Built on Axum. Every chat request is resolved to a verified user by the
//! configured identity provider before any core component runs.

pub mod auth;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Router, extract::State};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use lodestar_agent::context::ContextAssembler;
use lodestar_agent::orchestrator::Coordinator;
use lodestar_agent::router::MessageRouter;
use lodestar_config::AppConfig;
use lodestar_core::error::AuthError;
use lodestar_core::identity::IdentityProvider;
use lodestar_core::message::{Message, Role};
use lodestar_core::store::ProductivityQueries;
use lodestar_store::{MemoryStore, SqliteStore};
use lodestar_tools::ToolExecutor;

/// Shared state for the gateway.
pub struct GatewayState {
    pub router: MessageRouter,
    pub identity: Arc<dyn IdentityProvider>,
}

pub type SharedState = Arc<GatewayState>;

// ── Request / Response types ──────────────────────────────────────────────

/// One prior turn, as the client stores it.
#[derive(Debug, Deserialize)]
struct HistoryTurn {
    role: Role,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// The user's message.
    message: String,
    /// Prior turns, oldest first. History persistence is the client's
    /// responsibility; the gateway only replays what it is given.
    #[serde(default)]
    conversation_history: Vec<HistoryTurn>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the Axum router.
pub fn build_router(state: SharedState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::exact(origin))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ]),
        Err(_) => {
            warn!(origin = %cors_origin, "Invalid CORS origin, denying cross-origin requests");
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/chat/stream", post(chat_stream_handler))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /v1/chat/stream` — authenticate, route, and stream events.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<
    Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>,
    (StatusCode, Json<ErrorResponse>),
> {
    let token = auth::bearer_token(&headers).map_err(unauthorized)?;
    let user = state
        .identity
        .authenticate(token)
        .await
        .map_err(unauthorized)?;

    info!(user = %user, "chat/stream request");

    let history: Vec<Message> = payload
        .conversation_history
        .into_iter()
        .map(|turn| Message {
            role: turn.role,
            content: turn.content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        })
        .collect();

    let rx = state.router.route(user, history, payload.message);

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

fn unauthorized(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ── Startup wiring ────────────────────────────────────────────────────────

/// Build the full application state from config and start serving.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config).await?;
    let router = build_router(state, &config.gateway.cors_origin);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Wire provider, store, agent, and identity into gateway state.
pub async fn build_state(config: &AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    let provider = lodestar_providers::build_from_config(config)?;

    let (queries, executor): (Arc<dyn ProductivityQueries>, ToolExecutor) =
        match config.store.backend.as_str() {
            "memory" => {
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone(),
                    ToolExecutor::new()
                        .with_task_actions(store.clone())
                        .with_goal_actions(store.clone())
                        .with_milestone_actions(store),
                )
            }
            _ => {
                let store = Arc::new(SqliteStore::new(&config.store.path).await?);
                (
                    store.clone(),
                    ToolExecutor::new()
                        .with_task_actions(store.clone())
                        .with_goal_actions(store.clone())
                        .with_milestone_actions(store),
                )
            }
        };

    let coordinator = Arc::new(
        Coordinator::new(provider, &config.agent.model)
            .with_temperature(config.agent.temperature)
            .with_max_tokens(config.agent.max_tokens)
            .with_history_budget(config.agent.history_token_budget)
            .with_executor(executor),
    );
    let assembler = Arc::new(ContextAssembler::new(queries));
    let router = MessageRouter::new(coordinator, assembler)
        .with_chunk_size(config.agent.chunk_size);

    let identity = Arc::new(auth::StaticTokenIdentity::new(
        config.gateway.bearer_tokens.clone(),
    ));

    Ok(Arc::new(GatewayState { router, identity }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lodestar_core::error::ProviderError;
    use lodestar_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("You said: {last}")),
                usage: None,
                model: "echo".into(),
            })
        }
    }

    fn test_state() -> SharedState {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(Coordinator::new(Arc::new(EchoProvider), "echo"));
        let assembler = Arc::new(ContextAssembler::new(store));
        let router = MessageRouter::new(coordinator, assembler);
        let identity = Arc::new(auth::StaticTokenIdentity::new(HashMap::from([(
            "secret-token".to_string(),
            "user-1".to_string(),
        )])));
        Arc::new(GatewayState { router, identity })
    }

    fn app() -> Router {
        build_router(test_state(), "http://localhost:3000")
    }

    #[tokio::test]
    async fn health_is_open() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_requires_bearer_token() {
        let request = Request::post("/v1/chat/stream")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "hello"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn chat_rejects_unknown_token() {
        let request = Request::post("/v1/chat/stream")
            .header("content-type", "application/json")
            .header("authorization", "Bearer wrong")
            .body(Body::from(r#"{"message": "hello"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn chat_streams_chunk_then_done() {
        let request = Request::post("/v1/chat/stream")
            .header("content-type", "application/json")
            .header("authorization", "Bearer secret-token")
            .body(Body::from(
                r#"{"message": "what should I focus on?", "conversation_history": []}"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains(r#""type":"chunk""#));
        assert!(body.contains("You said: what should I focus on?"));
        assert!(body.contains(r#""type":"done""#));
    }

    #[tokio::test]
    async fn history_replayed_in_order() {
        let request = Request::post("/v1/chat/stream")
            .header("content-type", "application/json")
            .header("authorization", "Bearer secret-token")
            .body(Body::from(
                r#"{
                    "message": "and now?",
                    "conversation_history": [
                        {"role": "user", "content": "earlier question"},
                        {"role": "assistant", "content": "earlier answer"}
                    ]
                }"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        // The echo provider answers with the latest user turn.
        assert!(body.contains("You said: and now?"));
    }
}
