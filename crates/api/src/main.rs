use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use orchestrator::{Conversation, Orchestrator, Role, RunOutcome, Turn};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Reply used when the pipeline could not be built at start-up.
const LLM_NOT_INITIALIZED: &str = "LLM not initialized. Cannot generate a response.";

#[derive(Clone)]
struct AppState {
    api_token: Option<String>,
    default_model: String,
    orchestrator: Option<Arc<Orchestrator>>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    #[serde(default)]
    model: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    stream: bool,
    /// Non-standard: serializes requests sharing a conversation.
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatCompletionResponse {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize)]
struct ChatChoice {
    index: u32,
    message: ChatMessageResponse,
    finish_reason: String,
}

#[derive(Debug, Serialize)]
struct ChatMessageResponse {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionChunk {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<ChatChoiceChunk>,
}

#[derive(Debug, Serialize)]
struct ChatChoiceChunk {
    index: u32,
    delta: serde_json::Value,
    finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModelList {
    object: String,
    data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    id: String,
    object: String,
    owned_by: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
    pipeline: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".secrets");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = env::var("LINER_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
    let api_token = env::var("LINER_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
    let default_model = env::var("LINER_API_MODEL").unwrap_or_else(|_| "liner-notes".to_string());

    let orchestrator = match Orchestrator::from_env().await {
        Ok(orchestrator) => Some(Arc::new(orchestrator)),
        Err(err) => {
            error!(error = %err, "Failed to initialize chat pipeline");
            None
        }
    };

    let state = AppState {
        api_token,
        default_model,
        orchestrator: orchestrator.clone(),
    };

    let app = router(state);

    let addr: SocketAddr = addr.parse()?;
    info!(%addr, "Liner Notes API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(orchestrator) = orchestrator {
        orchestrator.shutdown().await;
    }
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/models", get(list_models))
        .route("/v1/chat", post(chat))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let pipeline = match &state.orchestrator {
        Some(orchestrator) if orchestrator.is_ready().await => "ready",
        Some(_) => "not_ready",
        None => "unavailable",
    };
    Json(Health {
        status: "ok".to_string(),
        pipeline: pipeline.to_string(),
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: vec![ModelInfo {
            id: state.default_model.clone(),
            object: "model".to_string(),
            owned_by: "liner-notes".to_string(),
        }],
    })
}

/// `submit` over HTTP: one user message plus the prior history.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    authorize(&state, &headers)?;

    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is empty".to_string()));
    }

    let mut conversation: Conversation = history_to_turns(&payload.history).into();
    conversation.push(Turn::user(payload.message));

    let (reply, status) = answer(&state, payload.conversation_id.as_deref(), conversation).await;
    Ok(Json(ChatResponse { reply, status }))
}

async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let model = if payload.model.is_empty() {
        state.default_model.clone()
    } else {
        payload.model.clone()
    };

    let turns = messages_to_turns(&payload.messages);
    if turns.last().map(|t| t.role) != Some(Role::User) {
        return Err(ApiError::BadRequest(
            "last message must be a user message".to_string(),
        ));
    }

    let (response_text, _) = answer(&state, payload.user.as_deref(), turns.into()).await;

    if payload.stream {
        let stream = stream_chat_completion(model, response_text);
        return Ok(Sse::new(stream).into_response());
    }

    let response = ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion".to_string(),
        created: unix_timestamp(),
        model,
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessageResponse {
                role: "assistant".to_string(),
                content: response_text,
            },
            finish_reason: "stop".to_string(),
        }],
    };

    Ok(Json(response).into_response())
}

/// Run the pipeline, or fall back when it was never built.
async fn answer(
    state: &AppState,
    key: Option<&str>,
    conversation: Conversation,
) -> (String, String) {
    let Some(orchestrator) = state.orchestrator.as_ref() else {
        warn!("Chat request received but the pipeline is not initialized");
        return (LLM_NOT_INITIALIZED.to_string(), "unavailable".to_string());
    };

    let outcome: RunOutcome = match key {
        Some(key) if !key.trim().is_empty() => orchestrator.run_keyed(key, conversation).await,
        _ => orchestrator.run(conversation).await,
    };

    (outcome.answer, outcome.status.label().to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

/// Front-end history to turns. Only user and assistant entries are kept.
fn history_to_turns(history: &[HistoryEntry]) -> Vec<Turn> {
    history
        .iter()
        .filter_map(|entry| to_turn(&entry.role, entry.content.clone()))
        .collect()
}

fn messages_to_turns(messages: &[ChatMessage]) -> Vec<Turn> {
    messages
        .iter()
        .filter_map(|msg| to_turn(&msg.role, extract_text(&msg.content)?))
        .collect()
}

fn to_turn(role: &str, content: String) -> Option<Turn> {
    match Role::parse(role) {
        Some(Role::User) => Some(Turn::user(content)),
        Some(Role::Assistant) => Some(Turn::assistant(content)),
        _ => {
            debug!(role, "Ignoring history entry");
            None
        }
    }
}

fn extract_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(""))
            }
        }
        _ => None,
    }
}

fn stream_chat_completion(
    model: String,
    content: String,
) -> impl tokio_stream::Stream<Item = Result<Event, axum::Error>> {
    let id = format!("chatcmpl-{}", Uuid::new_v4());
    let created = unix_timestamp();

    let first = ChatCompletionChunk {
        id: id.clone(),
        object: "chat.completion.chunk".to_string(),
        created,
        model: model.clone(),
        choices: vec![ChatChoiceChunk {
            index: 0,
            delta: serde_json::json!({
                "role": "assistant",
                "content": content,
            }),
            finish_reason: None,
        }],
    };

    let done = ChatCompletionChunk {
        id,
        object: "chat.completion.chunk".to_string(),
        created,
        model,
        choices: vec![ChatChoiceChunk {
            index: 0,
            delta: serde_json::json!({}),
            finish_reason: Some("stop".to_string()),
        }],
    };

    let events = vec![
        Event::default().json_data(&first),
        Event::default().json_data(&done),
        Ok(Event::default().data("[DONE]")),
    ];

    tokio_stream::iter(events)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), "auth_error")
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, message, "invalid_request_error")
            }
        };
        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": kind
            }
        });
        (status, Json(body)).into_response()
    }
}
