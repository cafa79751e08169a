//! # crypto-analyst
//!
//! Conversational cryptocurrency analyst with tiered, failure-tolerant
//! answer resolution.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌──────────────────────────────────┐
//! │ user text  │──▶│ extract_token │──▶│ TieredResolver                   │
//! └────────────┘   └───────────────┘   │  1. language model  (primary)    │
//!                                      │  2. market data     (secondary)  │
//!        CapabilityFlags ─────────────▶│  3. mock generator  (always)     │
//!        (ApiProbe / watch)            └──────────────┬───────────────────┘
//!                                                     ▼
//!                                      ChatSession transcript ──▶ markup::parse
//! ```
//!
//! Whatever the upstream state, a request always resolves to non-empty
//! text. Failures surface only as an optional [`Advisory`](resolver::Advisory).

pub mod chat;
pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod market;
pub mod markup;
pub mod mock;
pub mod model;
pub mod persona;
pub mod probe;
pub mod resolver;

pub use chat::{ChatSession, QuickAction, SendOutcome};
pub use config::{AnalystConfig, MarketMode, Pacing};
pub use error::{AnalystError, Result};
pub use extractor::extract_token;
pub use market::{CoinGeckoClient, MarketDataProvider, MockMarketData};
pub use model::{AnalysisRequest, AnalysisResult, AnalysisType, CapabilityFlags, ChatMessage};
pub use probe::{ApiProbe, CapabilityMonitor};
pub use resolver::{Advisory, Resolution, TierKind, TieredResolver};

/// Closing line of every token analysis
pub const DISCLAIMER: &str =
    "This analysis represents educational information based on available data, not financial advice.";

/// Substituted when every tier produced empty text
pub const FALLBACK_SENTENCE: &str =
    "I'm sorry, I couldn't put together an analysis right now. Please try again in a moment.";
