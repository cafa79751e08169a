//! Tiered Response Resolver
//!
//! Walks an ordered chain of answer sources, demoting to the next tier on
//! any failure. The chain always ends in the mock generator, so `resolve`
//! never fails and never returns empty content.
//!
//! ```text
//!   request ──▶ [LanguageModel] ──fail──▶ [MarketData] ──fail──▶ [Mock]
//!                    │                         │                   │
//!                    └────────── answered ─────┴───────────────────┴──▶ Resolution
//! ```

mod tiers;

pub use tiers::{LanguageModelTier, MarketDataTier, MockTier};

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use agent_core::{GenerationOptions, LlmProvider};
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::FALLBACK_SENTENCE;
use crate::error::Result;
use crate::market::MarketDataProvider;
use crate::mock::MockGenerator;
use crate::model::{AnalysisRequest, AnalysisResult, AnalysisType, CapabilityFlags};
use crate::persona::Character;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    LanguageModel,
    MarketData,
    Mock,
}

impl TierKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LanguageModel => "language model",
            Self::MarketData => "market data",
            Self::Mock => "offline analysis",
        }
    }

    /// Tiers that wait on a network call and can be abandoned on cancel
    pub const fn is_network(self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer source in the chain (Strategy pattern)
#[async_trait]
pub trait Tier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// Whether this tier should be tried for the request under `flags`
    fn enabled(&self, request: &AnalysisRequest, flags: CapabilityFlags) -> bool;

    async fn answer(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult>;
}

/// Outcome of trying a single tier
#[derive(Debug)]
pub enum Attempt {
    Answered(AnalysisResult),
    Skipped,
    Failed(String),
    Cancelled,
}

/// Try one tier, turning errors, panics, empty output and cancellation into
/// an [`Attempt`] instead of propagating them.
pub async fn attempt_tier(
    tier: &dyn Tier,
    request: &AnalysisRequest,
    flags: CapabilityFlags,
    cancel: &CancellationToken,
) -> Attempt {
    if !tier.enabled(request, flags) {
        return Attempt::Skipped;
    }

    let network = tier.kind().is_network();
    if network && cancel.is_cancelled() {
        return Attempt::Cancelled;
    }

    let guarded = AssertUnwindSafe(tier.answer(request, cancel)).catch_unwind();
    let outcome = if network {
        tokio::select! {
            () = cancel.cancelled() => return Attempt::Cancelled,
            outcome = guarded => outcome,
        }
    } else {
        guarded.await
    };

    match outcome {
        Ok(Ok(result)) if result.content.trim().is_empty() => Attempt::Failed("empty response".into()),
        Ok(Ok(result)) => Attempt::Answered(result),
        Ok(Err(e)) => {
            tracing::debug!(tier = %tier.kind(), error_kind = e.kind(), "Tier returned an error");
            Attempt::Failed(e.to_string())
        }
        Err(_) => Attempt::Failed("internal error".into()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFailure {
    pub tier: TierKind,
    pub cause: String,
}

/// Why the answer came from a lower tier. Display only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Tier that produced the answer
    pub resolved_by: TierKind,
    pub failures: Vec<TierFailure>,
}

impl Advisory {
    /// Short notice suitable for a banner above the answer
    pub fn banner(&self) -> String {
        let causes: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.tier, f.cause))
            .collect();

        format!(
            "API Request Failed ({}). Showing {} instead.",
            causes.join("; "),
            self.resolved_by
        )
    }
}

#[derive(Clone, Debug)]
pub struct Resolution {
    pub result: AnalysisResult,
    pub tier: TierKind,
    pub advisory: Option<Advisory>,
}

/// Ordered chain of tiers
pub struct TieredResolver {
    tiers: Vec<Box<dyn Tier>>,
}

impl TieredResolver {
    pub fn new(tiers: Vec<Box<dyn Tier>>) -> Self {
        Self { tiers }
    }

    /// Language model (if configured), market data, then mock
    pub fn standard(
        llm: Option<Arc<dyn LlmProvider>>,
        market: Arc<dyn MarketDataProvider>,
        character: Character,
        options: GenerationOptions,
    ) -> Self {
        let mut tiers: Vec<Box<dyn Tier>> = Vec::with_capacity(3);
        if let Some(llm) = llm {
            tiers.push(Box::new(LanguageModelTier::new(llm, character, options)));
        }
        tiers.push(Box::new(MarketDataTier::new(market)));
        tiers.push(Box::new(MockTier::new(MockGenerator::new())));
        Self::new(tiers)
    }

    pub fn tier_kinds(&self) -> Vec<TierKind> {
        self.tiers.iter().map(|t| t.kind()).collect()
    }

    /// Resolve a request to an answer. Never fails.
    ///
    /// Once `cancel` fires, remaining network tiers are abandoned and the
    /// terminal tier answers; the caller is expected to discard the result.
    pub async fn resolve(
        &self,
        request: &AnalysisRequest,
        flags: CapabilityFlags,
        cancel: &CancellationToken,
    ) -> Resolution {
        let mut failures = Vec::new();

        for tier in &self.tiers {
            let kind = tier.kind();
            match attempt_tier(tier.as_ref(), request, flags, cancel).await {
                Attempt::Answered(result) => {
                    tracing::debug!(tier = %kind, "Tier answered");
                    let advisory = (!failures.is_empty()).then(|| Advisory {
                        resolved_by: kind,
                        failures: std::mem::take(&mut failures),
                    });
                    return Resolution {
                        result,
                        tier: kind,
                        advisory,
                    };
                }
                Attempt::Skipped => {
                    tracing::debug!(tier = %kind, "Tier skipped");
                }
                Attempt::Cancelled => {
                    tracing::debug!(tier = %kind, "Tier abandoned after cancellation");
                }
                Attempt::Failed(cause) => {
                    tracing::warn!(tier = %kind, cause = %cause, "Tier failed, demoting");
                    failures.push(TierFailure { tier: kind, cause });
                }
            }
        }

        tracing::warn!("No tier produced an answer, using fallback sentence");
        let kind = TierKind::Mock;
        Resolution {
            result: AnalysisResult::new(FALLBACK_SENTENCE)
                .with_type(AnalysisType::General)
                .with_token(request.token.clone()),
            tier: kind,
            advisory: Some(Advisory {
                resolved_by: kind,
                failures,
            }),
        }
    }
}
