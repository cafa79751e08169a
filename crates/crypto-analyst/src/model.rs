//! Domain Models
//!
//! Conversation, request/result and market data types shared by the
//! resolution pipeline. Monetary values use `rust_decimal`.

use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agent_core::Message;
use agent_core::message::recent_window;

use crate::error::{AnalystError, Result};
use crate::extractor::extract_token;

/// Which upstream providers are currently usable.
///
/// Always replaced as a whole; never patched field by field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// Language-model provider configured
    pub primary_available: bool,

    /// Market-data provider reachable
    pub secondary_available: bool,
}

impl CapabilityFlags {
    pub const fn new(primary_available: bool, secondary_available: bool) -> Self {
        Self {
            primary_available,
            secondary_available,
        }
    }

    /// Both providers down, answers come from the mock generator
    pub const fn offline() -> Self {
        Self::new(false, false)
    }

    pub const fn any_available(self) -> bool {
        self.primary_available || self.secondary_available
    }
}

/// Kind of analysis an answer represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    General,
    Comprehensive,
    Technical,
    Fundamental,
    Risk,
    Comparison,
}

impl AnalysisType {
    /// Classify a request from its wording. Without a token only general
    /// or comparison answers make sense.
    pub fn infer(text: &str, has_token: bool) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("compare") || lower.contains(" vs ") || lower.contains(" versus ") {
            Self::Comparison
        } else if !has_token {
            Self::General
        } else if lower.contains("technical") {
            Self::Technical
        } else if lower.contains("fundamental") {
            Self::Fundamental
        } else if lower.contains("risk") {
            Self::Risk
        } else {
            Self::Comprehensive
        }
    }
}

/// Per-conversation message identifier, strictly increasing
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message in the visible transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,

    pub content: String,

    /// Display name of the sender
    pub sender: String,

    pub is_user: bool,

    /// Display time ("HH:MM")
    pub time: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<AnalysisType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Sender name used for user messages
pub const USER_SENDER: &str = "You";

impl ChatMessage {
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            sender: USER_SENDER.into(),
            is_user: true,
            time: display_time(),
            analysis_type: None,
            token: None,
        }
    }

    pub fn assistant(id: MessageId, sender: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            id,
            content: result.content,
            sender: sender.into(),
            is_user: false,
            time: display_time(),
            analysis_type: result.analysis_type,
            token: result.token,
        }
    }

    /// Role + content view for provider history
    pub fn to_history(&self) -> Message {
        if self.is_user {
            Message::user(self.content.clone())
        } else {
            Message::assistant(self.content.clone())
        }
    }
}

fn display_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// One user submission, ready for resolution
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    pub raw_text: String,

    /// Asset symbol recognized in the text
    pub token: Option<String>,

    /// Most recent prior messages, oldest first
    pub history: Vec<Message>,
}

impl AnalysisRequest {
    /// Build a request from user text, rejecting blank input.
    pub fn new(raw_text: impl Into<String>) -> Result<Self> {
        let raw_text = raw_text.into().trim().to_string();
        if raw_text.is_empty() {
            return Err(AnalystError::Validation("message is empty".into()));
        }

        Ok(Self {
            token: extract_token(&raw_text),
            raw_text,
            history: Vec::new(),
        })
    }

    /// Attach the last `limit` messages of the prior transcript
    pub fn with_history(mut self, prior: &[ChatMessage], limit: usize) -> Self {
        let history: Vec<Message> = prior.iter().map(ChatMessage::to_history).collect();
        self.history = recent_window(&history, limit);
        self
    }
}

/// Answer produced by the resolver
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub content: String,

    pub analysis_type: Option<AnalysisType>,

    pub token: Option<String>,
}

impl AnalysisResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            analysis_type: None,
            token: None,
        }
    }

    pub const fn with_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = Some(analysis_type);
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Buy/sell transaction counts over 24h on a DEX pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCounts {
    pub buys: u64,
    pub sells: u64,
}

/// Supply, all-time-high and developer figures
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    pub max_supply: Option<Decimal>,
    pub ath: Option<Decimal>,
    /// Percent distance from the all-time high (negative below ATH)
    pub ath_change_percentage: Option<Decimal>,
    pub commit_count_4_weeks: Option<u64>,
}

impl Fundamentals {
    pub const fn is_empty(&self) -> bool {
        self.circulating_supply.is_none()
            && self.total_supply.is_none()
            && self.max_supply.is_none()
            && self.ath.is_none()
            && self.commit_count_4_weeks.is_none()
    }
}

/// Direction of the price trend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Sideways => "Sideways",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rsi {
    pub value: f64,
    pub signal: RsiSignal,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
}

/// Support levels below the current price and resistance levels above it,
/// nearest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<PriceLevel>,
    pub resistance: Vec<PriceLevel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub trend: Trend,
    pub histogram: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub trend: Trend,
    pub rsi: Rsi,
    pub support_resistance: SupportResistance,
    pub macd: Option<Macd>,
}

/// Point-in-time market view of one token. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price: Option<Decimal>,
    /// 24h change in percent
    pub change_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub volume_24h: Option<Decimal>,
    /// USD liquidity of the most liquid DEX pair
    pub liquidity: Option<Decimal>,
    pub dex_id: Option<String>,
    pub dex_volume_24h: Option<Decimal>,
    pub txns: Option<TxnCounts>,
    pub technicals: Option<TechnicalIndicators>,
    pub fundamentals: Option<Fundamentals>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_blank_text() {
        let err = AnalysisRequest::new("   \n").unwrap_err();
        assert!(matches!(err, AnalystError::Validation(_)));
    }

    #[test]
    fn test_request_extracts_token() {
        let request = AnalysisRequest::new("  What about Ethereum?  ").unwrap();
        assert_eq!(request.raw_text, "What about Ethereum?");
        assert_eq!(request.token.as_deref(), Some("eth"));
    }

    #[test]
    fn test_history_window() {
        let prior: Vec<_> = (1..=7)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::assistant(MessageId(i), "Nova", AnalysisResult::new(format!("a{i}")))
                } else {
                    ChatMessage::user(MessageId(i), format!("u{i}"))
                }
            })
            .collect();

        let request = AnalysisRequest::new("hello").unwrap().with_history(&prior, 5);
        assert_eq!(request.history.len(), 5);
        assert_eq!(request.history[0], Message::user("u3"));
        assert_eq!(request.history[4], Message::user("u7"));
    }

    #[test]
    fn test_analysis_type_inference() {
        assert_eq!(AnalysisType::infer("Analyze BTC", true), AnalysisType::Comprehensive);
        assert_eq!(
            AnalysisType::infer("Analyze SOL using technical analysis", true),
            AnalysisType::Technical
        );
        assert_eq!(
            AnalysisType::infer("Provide fundamental analysis of ETH", true),
            AnalysisType::Fundamental
        );
        assert_eq!(AnalysisType::infer("Assess the risk factors for ADA", true), AnalysisType::Risk);
        assert_eq!(AnalysisType::infer("Compare BTC and ETH", true), AnalysisType::Comparison);
        assert_eq!(AnalysisType::infer("technical question", false), AnalysisType::General);
    }

    #[test]
    fn test_flags_default_offline() {
        assert_eq!(CapabilityFlags::default(), CapabilityFlags::offline());
        assert!(!CapabilityFlags::offline().any_available());
        assert!(CapabilityFlags::new(false, true).any_available());
    }
}
