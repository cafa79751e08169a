//! HTTP Handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use agent_core::LlmProvider;
use agent_core::provider::ProviderInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crypto_analyst::markup::{self, Block};
use crypto_analyst::persona::Character;
use crypto_analyst::{
    AnalystError, CapabilityFlags, ChatMessage, ChatSession, QuickAction, SendOutcome, TierKind,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub capabilities: CapabilityFlags,
    pub market_provider: String,
    pub tiers: Vec<TierKind>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Transcript entry with its content parsed for rendering
#[derive(Debug, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub blocks: Vec<Block>,
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        let blocks = markup::parse(&message.content);
        Self { message, blocks }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub character: Character,
    pub messages: Vec<MessageView>,
    pub suggestions: Vec<String>,
}

impl ConversationResponse {
    async fn snapshot(session: &ChatSession) -> Self {
        Self {
            id: session.id(),
            character: session.character().clone(),
            messages: session.messages().await.into_iter().map(MessageView::from).collect(),
            suggestions: session.suggestions().await,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyResponse {
    Replied {
        message: MessageView,
        /// Banner text when a fallback tier answered
        #[serde(skip_serializing_if = "Option::is_none")]
        advisory: Option<String>,
        suggestions: Vec<String>,
    },
    Superseded,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Language model details, fetched from the provider on demand
#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub configured: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderInfo>,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub character_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QuickActionRequest {
    pub action: QuickAction,
    #[serde(default)]
    pub token: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut tiers = Vec::with_capacity(3);
    if state.llm.is_some() {
        tiers.push(TierKind::LanguageModel);
    }
    tiers.extend([TierKind::MarketData, TierKind::Mock]);

    let capabilities = state.monitor.current();
    Json(HealthResponse {
        // Mock tier still answers when both providers are down
        status: if capabilities.any_available() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        capabilities,
        market_provider: state.market.name().to_string(),
        tiers,
    })
}

/// Re-run the availability probe now
pub async fn refresh_capabilities(State(state): State<AppState>) -> Json<CapabilityFlags> {
    Json(state.monitor.refresh().await)
}

/// Ask the language model provider whether it answers and what it serves
pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    let Some(llm) = state.llm.as_ref() else {
        return Json(ModelStatusResponse {
            configured: false,
            reachable: false,
            provider: None,
        });
    };

    let reachable = llm.health_check().await.unwrap_or_else(|e| {
        tracing::warn!("Language model health check failed: {}", e);
        false
    });
    let provider = if reachable {
        llm.info().await.map_err(|e| tracing::warn!("Provider info unavailable: {}", e)).ok()
    } else {
        None
    };

    Json(ModelStatusResponse {
        configured: llm.is_configured(),
        reachable,
        provider,
    })
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationResponse>), ApiError> {
    let id = payload
        .character_id
        .unwrap_or_else(|| state.config.default_character.clone());

    let character = state.characters.character(&id).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, format!("Unknown character: {id}"), "UNKNOWN_CHARACTER")
    })?;
    if !state.characters.is_unlocked(&id) {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("{} is locked", character.name),
            "CHARACTER_LOCKED",
        ));
    }

    let resolver = Arc::new(state.resolver_for(&character));
    let session = Arc::new(
        ChatSession::open(character, resolver, state.config.pacing)
            .with_history_limit(state.config.history_limit),
    );

    tracing::info!(conversation = %session.id(), character = %id, "Conversation opened");
    state.sessions.write().await.insert(session.id(), Arc::clone(&session));

    Ok((StatusCode::CREATED, Json(ConversationResponse::snapshot(&session).await)))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    Ok(Json(ConversationResponse::snapshot(&session).await))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let outcome = session
        .send(&payload.message, state.monitor.current())
        .await
        .map_err(send_error)?;

    Ok(Json(reply(&session, outcome).await))
}

pub async fn quick_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuickActionRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let outcome = session
        .quick_action(payload.action, payload.token.as_deref(), state.monitor.current())
        .await
        .map_err(send_error)?;

    Ok(Json(reply(&session, outcome).await))
}

/// Abandon the pending reply, e.g. when the user navigates away
pub async fn cancel_in_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    Ok(Json(CancelResponse {
        cancelled: session.cancel_in_flight().await,
    }))
}

/// Close a conversation, abandoning any pending reply
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.write().await.remove(&id).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, "Conversation not found", "UNKNOWN_CONVERSATION")
    })?;
    session.cancel_in_flight().await;

    tracing::info!(conversation = %id, "Conversation closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<ChatSession>, ApiError> {
    state.session(id).await.ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, "Conversation not found", "UNKNOWN_CONVERSATION")
    })
}

fn send_error(err: AnalystError) -> ApiError {
    match err {
        AnalystError::Validation(_) => {
            api_error(StatusCode::BAD_REQUEST, err.user_message(), "INVALID_MESSAGE")
        }
        other => {
            tracing::error!(kind = other.kind(), "Send failed: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.user_message(), "ANALYST_ERROR")
        }
    }
}

async fn reply(session: &ChatSession, outcome: SendOutcome) -> ReplyResponse {
    match outcome {
        SendOutcome::Replied { message, advisory } => ReplyResponse::Replied {
            message: message.into(),
            advisory: advisory.map(|a| a.banner()),
            suggestions: session.suggestions().await,
        },
        SendOutcome::Superseded => ReplyResponse::Superseded,
    }
}
