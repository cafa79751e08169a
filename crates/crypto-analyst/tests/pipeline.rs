//! End-to-end behavior of the resolution pipeline with in-process
//! providers only.

use std::sync::Arc;
use std::time::Duration;

use agent_core::provider::{ModelInfo, ProviderInfo};
use agent_core::{AgentError, Completion, GenerationOptions, LlmProvider, Message};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use crypto_analyst::extractor::TOKEN_TABLE;
use crypto_analyst::format::{format_buy_sell_ratio, format_large_number};
use crypto_analyst::market::TokenReport;
use crypto_analyst::mock::MockGenerator;
use crypto_analyst::persona::{CharacterDirectory, StaticCharacterDirectory};
use crypto_analyst::{
    AnalysisRequest, AnalystError, ApiProbe, CapabilityFlags, ChatSession, DISCLAIMER,
    MarketDataProvider, MockMarketData, Pacing, SendOutcome, TierKind, TieredResolver,
    extract_token,
};

/// Language model that always errors
struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn info(&self) -> agent_core::Result<ProviderInfo> {
        Err(AgentError::ProviderUnavailable("down".into()))
    }

    async fn health_check(&self) -> agent_core::Result<bool> {
        Ok(false)
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &GenerationOptions,
    ) -> agent_core::Result<Completion> {
        Err(AgentError::RateLimited("429".into()))
    }

    async fn list_models(&self) -> agent_core::Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }
}

/// Market provider that panics mid-request and fails its health check
struct PanickingMarket;

#[async_trait]
impl MarketDataProvider for PanickingMarket {
    async fn health_check(&self) -> bool {
        false
    }

    async fn comprehensive_analysis(&self, _token: &str) -> crypto_analyst::Result<TokenReport> {
        panic!("upstream returned garbage")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Market provider whose requests fail at the transport level
struct UnreachableMarket;

#[async_trait]
impl MarketDataProvider for UnreachableMarket {
    async fn health_check(&self) -> bool {
        false
    }

    async fn comprehensive_analysis(&self, _token: &str) -> crypto_analyst::Result<TokenReport> {
        Err(AnalystError::Network("connection refused".into()))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

fn resolver(llm: Option<Arc<dyn LlmProvider>>, market: Arc<dyn MarketDataProvider>) -> TieredResolver {
    let nova = StaticCharacterDirectory::default().character("nova").unwrap();
    TieredResolver::standard(llm, market, nova, GenerationOptions::default())
}

const ALL_FLAGS: [CapabilityFlags; 4] = [
    CapabilityFlags::new(false, false),
    CapabilityFlags::new(true, false),
    CapabilityFlags::new(false, true),
    CapabilityFlags::new(true, true),
];

#[test]
fn canonical_mock_reports_are_stable() {
    let generator = MockGenerator::new();
    for token in ["btc", "bitcoin", "eth", "ethereum", "sol", "solana"] {
        let first = generator.generate(Some(token), "analyze");
        let second = generator.generate(Some(token), "analyze");
        assert_eq!(first, second, "report for {token} changed between calls");
    }
}

#[tokio::test]
async fn offline_answers_name_the_symbol() {
    let resolver = resolver(None, Arc::new(MockMarketData::unavailable()));

    for (ticker, aliases) in TOKEN_TABLE {
        for alias in *aliases {
            let request = AnalysisRequest::new(format!("What do you think about {alias}?")).unwrap();
            assert_eq!(request.token.as_deref(), Some(*ticker));

            let resolution = resolver
                .resolve(&request, CapabilityFlags::offline(), &CancellationToken::new())
                .await;

            assert_eq!(resolution.tier, TierKind::Mock);
            assert!(
                resolution.result.content.contains(&ticker.to_uppercase()),
                "answer for {alias} does not mention {ticker}"
            );
            assert!(resolution.result.content.trim_end().ends_with(DISCLAIMER));
        }
    }
}

#[tokio::test]
async fn resolve_survives_every_failure_mode() {
    let chains = [
        (true, resolver(Some(Arc::new(FailingLlm)), Arc::new(PanickingMarket))),
        (true, resolver(Some(Arc::new(FailingLlm)), Arc::new(UnreachableMarket))),
        (false, resolver(None, Arc::new(PanickingMarket))),
    ];
    let texts = ["Analyze Bitcoin", "hello", "Compare SOL vs ADA", "analyze zzz"];

    for (has_llm, chain) in &chains {
        for flags in ALL_FLAGS {
            for text in texts {
                let request = AnalysisRequest::new(text).unwrap();
                let resolution = chain.resolve(&request, flags, &CancellationToken::new()).await;

                assert!(!resolution.result.content.trim().is_empty());
                assert_eq!(resolution.tier, TierKind::Mock);

                let llm_failed = *has_llm && flags.primary_available;
                let market_failed = flags.secondary_available && request.token.is_some();
                assert_eq!(resolution.advisory.is_some(), llm_failed || market_failed);
            }
        }
    }
}

#[tokio::test]
async fn live_market_tier_answers_with_formatted_report() {
    let resolver = resolver(None, Arc::new(MockMarketData::new()));
    let request = AnalysisRequest::new("Analyze Cardano").unwrap();

    let resolution = resolver
        .resolve(&request, CapabilityFlags::new(false, true), &CancellationToken::new())
        .await;

    assert_eq!(resolution.tier, TierKind::MarketData);
    assert!(resolution.advisory.is_none());
    assert!(resolution.result.content.starts_with("## ADA Analysis"));
    assert!(resolution.result.content.trim_end().ends_with(DISCLAIMER));
}

#[tokio::test]
async fn market_report_carries_every_indicator() {
    let resolver = resolver(None, Arc::new(MockMarketData::new()));
    let request = AnalysisRequest::new("Analyze BTC").unwrap();

    let resolution = resolver
        .resolve(&request, CapabilityFlags::new(false, true), &CancellationToken::new())
        .await;

    assert_eq!(resolution.tier, TierKind::MarketData);
    let content = &resolution.result.content;
    assert!(content.contains("**RSI(14)**"), "{content}");
    assert!(content.contains("**MACD**"), "{content}");
}

#[test]
fn formatting_examples() {
    assert_eq!(format_large_number(Some(dec!(1234567890))), "1.23B");
    assert_eq!(format_large_number(Some(dec!(999))), "999.00");
    assert_eq!(format_large_number(None), "N/A");
    assert_eq!(
        format_buy_sell_ratio(70, 30).as_deref(),
        Some("70.0% buys / 30.0% sells")
    );
}

#[test]
fn analyze_pattern_accepts_unknown_symbols() {
    assert_eq!(extract_token("I want to analyze Pepe").as_deref(), Some("pepe"));
}

#[tokio::test]
async fn probe_failure_marks_market_unavailable() {
    let probe = ApiProbe::new(None, Arc::new(UnreachableMarket), Duration::from_secs(1));
    let flags = probe.probe().await;

    assert!(!flags.secondary_available);
    assert!(!flags.primary_available);
}

#[tokio::test]
async fn conversation_transcript_order() {
    let session = ChatSession::open(
        StaticCharacterDirectory::default().character("nova").unwrap(),
        Arc::new(resolver(None, Arc::new(MockMarketData::new()))),
        Pacing::immediate(),
    );

    for text in ["hi", "Analyze ETH", "Compare BTC and SOL"] {
        let outcome = session.send(text, CapabilityFlags::new(false, true)).await.unwrap();
        assert!(matches!(outcome, SendOutcome::Replied { .. }));

        let messages = session.messages().await;
        let user = &messages[messages.len() - 2];
        let assistant = &messages[messages.len() - 1];
        assert!(user.is_user);
        assert_eq!(user.content, text);
        assert!(!assistant.is_user);
        assert!(!assistant.content.is_empty());
    }
}
