//! Answer Sources
//!
//! The three tiers of the standard chain: language model, live market data
//! and the offline mock generator.

use std::sync::Arc;

use agent_core::{GenerationOptions, LlmProvider, Message};
use async_trait::async_trait;
use chrono::Local;
use tokio_util::sync::CancellationToken;

use super::{Tier, TierKind};
use crate::error::{AnalystError, Result};
use crate::format::format_market_analysis;
use crate::market::MarketDataProvider;
use crate::mock::MockGenerator;
use crate::model::{AnalysisRequest, AnalysisResult, AnalysisType, CapabilityFlags, MarketSnapshot};
use crate::persona::{Character, system_preamble};

fn classify(request: &AnalysisRequest, content: String) -> AnalysisResult {
    AnalysisResult::new(content)
        .with_type(AnalysisType::infer(&request.raw_text, request.token.is_some()))
        .with_token(request.token.clone())
}

/// Chat completion with the persona preamble and recent history
pub struct LanguageModelTier {
    llm: Arc<dyn LlmProvider>,
    character: Character,
    options: GenerationOptions,
}

impl LanguageModelTier {
    pub fn new(llm: Arc<dyn LlmProvider>, character: Character, options: GenerationOptions) -> Self {
        Self {
            llm,
            character,
            options,
        }
    }

    fn build_messages(&self, request: &AnalysisRequest) -> Vec<Message> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(Message::system(system_preamble(
            &self.character,
            Local::now().date_naive(),
        )));
        messages.extend(request.history.iter().cloned());
        messages.push(Message::user(request.raw_text.clone()));
        messages
    }
}

#[async_trait]
impl Tier for LanguageModelTier {
    fn kind(&self) -> TierKind {
        TierKind::LanguageModel
    }

    fn enabled(&self, _request: &AnalysisRequest, flags: CapabilityFlags) -> bool {
        flags.primary_available
    }

    async fn answer(
        &self,
        request: &AnalysisRequest,
        _cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let messages = self.build_messages(request);
        let completion = self.llm.complete(&messages, &self.options).await?;

        if completion.truncated() {
            tracing::debug!(model = %completion.model, "Completion hit the token limit");
        }

        Ok(classify(request, completion.content.trim().to_string()))
    }
}

/// Live market data rendered by the formatter
pub struct MarketDataTier {
    market: Arc<dyn MarketDataProvider>,
}

impl MarketDataTier {
    pub fn new(market: Arc<dyn MarketDataProvider>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tier for MarketDataTier {
    fn kind(&self) -> TierKind {
        TierKind::MarketData
    }

    fn enabled(&self, request: &AnalysisRequest, flags: CapabilityFlags) -> bool {
        request.token.is_some() && flags.secondary_available
    }

    async fn answer(
        &self,
        request: &AnalysisRequest,
        _cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let token = request
            .token
            .as_deref()
            .ok_or_else(|| AnalystError::Validation("no token in request".into()))?;

        let report = self.market.comprehensive_analysis(token).await?;
        if !report.has_data() {
            return Err(AnalystError::NoData(token.to_string()));
        }

        let technicals = self.market.technical_indicators(&report.price_history);
        let snapshot = MarketSnapshot::from_report(&report, technicals);

        tracing::debug!(
            token,
            provider = self.market.name(),
            has_technicals = snapshot.technicals.is_some(),
            "Formatting market analysis"
        );

        Ok(classify(request, format_market_analysis(token, &snapshot)))
    }
}

/// Terminal tier: always enabled, never fails
#[derive(Default)]
pub struct MockTier {
    generator: MockGenerator,
}

impl MockTier {
    pub const fn new(generator: MockGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tier for MockTier {
    fn kind(&self) -> TierKind {
        TierKind::Mock
    }

    fn enabled(&self, _request: &AnalysisRequest, _flags: CapabilityFlags) -> bool {
        true
    }

    async fn answer(
        &self,
        request: &AnalysisRequest,
        _cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let content = self
            .generator
            .generate(request.token.as_deref(), &request.raw_text);
        Ok(classify(request, content))
    }
}
