//! Chat Session
//!
//! One conversation: an append-only transcript, the persona answering it,
//! the token suggestion list and the handle of the in-flight resolution.
//!
//! A new message cancels the previous in-flight resolution. Every send
//! carries a generation number; replies from older generations are
//! discarded instead of appended.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Pacing;
use crate::error::Result;
use crate::model::{AnalysisRequest, AnalysisResult, CapabilityFlags, ChatMessage, MessageId};
use crate::persona::Character;
use crate::resolver::{Advisory, TieredResolver};

/// Tokens offered as quick actions before anything has been analyzed
pub const DEFAULT_SUGGESTIONS: [&str; 5] = ["BTC", "ETH", "SOL", "MATIC", "AVAX"];

pub const MAX_SUGGESTIONS: usize = 5;

/// Token compared against when no other suggestion exists
const FALLBACK_COMPARISON: &str = "ETH";

/// Canned prompts behind the quick-action buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAction {
    Analyze,
    Technical,
    Fundamental,
    Risk,
    Comparison,
}

impl QuickAction {
    /// Prompt text for `token`. Comparisons pair it with the first other
    /// suggestion.
    pub fn prompt(self, token: &str, suggestions: &[String]) -> String {
        match self {
            Self::Analyze => format!("Analyze {token}"),
            Self::Technical => format!("Analyze {token} using technical analysis"),
            Self::Fundamental => format!("Provide fundamental analysis of {token}"),
            Self::Risk => format!("Assess the risk factors for {token}"),
            Self::Comparison => {
                let other = suggestions
                    .iter()
                    .find(|s| !s.eq_ignore_ascii_case(token))
                    .map_or(FALLBACK_COMPARISON, String::as_str);
                format!("Compare {token} and {other}")
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendOutcome {
    Replied {
        message: ChatMessage,
        #[serde(skip_serializing_if = "Option::is_none")]
        advisory: Option<Advisory>,
    },
    /// A newer message or an explicit cancel replaced this one
    Superseded,
}

struct SessionState {
    messages: Vec<ChatMessage>,
    next_id: u64,
    suggestions: Vec<String>,
    in_flight: Option<CancellationToken>,
    generation: u64,
}

impl SessionState {
    fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    fn remember_token(&mut self, token: &str) {
        let symbol = token.to_uppercase();
        if !self.suggestions.contains(&symbol) {
            self.suggestions.insert(0, symbol);
            self.suggestions.truncate(MAX_SUGGESTIONS);
        }
    }
}

pub struct ChatSession {
    id: Uuid,
    character: Character,
    resolver: Arc<TieredResolver>,
    pacing: Pacing,
    history_limit: usize,
    state: Mutex<SessionState>,
}

impl ChatSession {
    /// Start a conversation with the persona's welcome message
    pub fn open(character: Character, resolver: Arc<TieredResolver>, pacing: Pacing) -> Self {
        let welcome = ChatMessage::assistant(
            MessageId(1),
            character.name.clone(),
            AnalysisResult::new(character.welcome_message()),
        );

        Self {
            id: Uuid::new_v4(),
            character,
            resolver,
            pacing,
            history_limit: 5,
            state: Mutex::new(SessionState {
                messages: vec![welcome],
                next_id: 2,
                suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect(),
                in_flight: None,
                generation: 0,
            }),
        }
    }

    /// Limit the prior messages handed to the language model
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn character(&self) -> &Character {
        &self.character
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn suggestions(&self) -> Vec<String> {
        self.state.lock().await.suggestions.clone()
    }

    /// Submit user text and wait for the reply.
    ///
    /// The user message is appended before resolution starts; the reply is
    /// appended only if no newer send or cancel happened in the meantime.
    /// Replies are held back until the pacing delay, measured from
    /// submission, has elapsed.
    pub async fn send(&self, text: &str, flags: CapabilityFlags) -> Result<SendOutcome> {
        let submitted = Instant::now();
        let request = AnalysisRequest::new(text)?;
        let delay = self.pacing.sample(&mut rand::thread_rng());

        let (request, cancel, generation) = {
            let mut state = self.state.lock().await;
            let request = request.with_history(&state.messages, self.history_limit);

            let id = state.next_id();
            state.messages.push(ChatMessage::user(id, request.raw_text.clone()));

            if let Some(previous) = state.in_flight.take() {
                tracing::debug!(session = %self.id, "Cancelling superseded request");
                previous.cancel();
            }
            let cancel = CancellationToken::new();
            state.in_flight = Some(cancel.clone());
            state.generation += 1;

            (request, cancel, state.generation)
        };

        tracing::debug!(
            session = %self.id,
            generation,
            token = request.token.as_deref().unwrap_or("-"),
            "Resolving message"
        );

        let resolution = self.resolver.resolve(&request, flags, &cancel).await;

        tokio::select! {
            () = cancel.cancelled() => return Ok(SendOutcome::Superseded),
            () = tokio::time::sleep_until(submitted + delay) => {}
        }

        let mut state = self.state.lock().await;
        if cancel.is_cancelled() || state.generation != generation {
            return Ok(SendOutcome::Superseded);
        }
        state.in_flight = None;

        if let Some(token) = &resolution.result.token {
            state.remember_token(token);
        }

        let id = state.next_id();
        let message = ChatMessage::assistant(id, self.character.name.clone(), resolution.result);
        state.messages.push(message.clone());

        Ok(SendOutcome::Replied {
            message,
            advisory: resolution.advisory,
        })
    }

    /// Send the prompt behind a quick action. Without a token the first
    /// suggestion is used.
    pub async fn quick_action(
        &self,
        action: QuickAction,
        token: Option<&str>,
        flags: CapabilityFlags,
    ) -> Result<SendOutcome> {
        let suggestions = self.suggestions().await;
        let token = token
            .map(str::to_string)
            .or_else(|| suggestions.first().cloned())
            .unwrap_or_else(|| DEFAULT_SUGGESTIONS[0].to_string());

        self.send(&action.prompt(&token, &suggestions), flags).await
    }

    /// Abandon the in-flight resolution, if any
    pub async fn cancel_in_flight(&self) -> bool {
        let mut state = self.state.lock().await;
        match state.in_flight.take() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }
}
