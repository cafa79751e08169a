//! Application State

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{GenerationOptions, LlmProvider};
use crypto_analyst::persona::{Character, CharacterDirectory};
use crypto_analyst::{AnalystConfig, CapabilityMonitor, ChatSession, MarketDataProvider, TieredResolver};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Language model (None if no credential is configured)
    pub llm: Option<Arc<dyn LlmProvider>>,

    pub generation: GenerationOptions,

    /// Live CoinGecko client or the in-process mock
    pub market: Arc<dyn MarketDataProvider>,

    pub monitor: Arc<CapabilityMonitor>,

    pub characters: Arc<dyn CharacterDirectory>,

    pub config: Arc<AnalystConfig>,

    /// Open conversations, in memory only
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<ChatSession>>>>,
}

impl AppState {
    /// Tier chain answering as `character`
    pub fn resolver_for(&self, character: &Character) -> TieredResolver {
        TieredResolver::standard(
            self.llm.clone(),
            Arc::clone(&self.market),
            character.clone(),
            self.generation.clone(),
        )
    }

    pub async fn session(&self, id: Uuid) -> Option<Arc<ChatSession>> {
        self.sessions.read().await.get(&id).cloned()
    }
}
