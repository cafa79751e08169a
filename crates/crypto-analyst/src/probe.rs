//! API Availability Probe
//!
//! Determines which upstream providers can currently be used and publishes
//! the result through a watch channel.

use std::sync::Arc;
use std::time::Duration;

use agent_core::LlmProvider;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::market::MarketDataProvider;
use crate::model::CapabilityFlags;

pub struct ApiProbe {
    llm: Option<Arc<dyn LlmProvider>>,
    market: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl ApiProbe {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        market: Arc<dyn MarketDataProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            market,
            timeout,
        }
    }

    /// Language model is usable if a well-formed credential is configured.
    /// Local check only.
    pub fn primary_available(&self) -> bool {
        self.llm.as_ref().is_some_and(|llm| llm.is_configured())
    }

    /// Flags before any network probe has run
    pub fn initial_flags(&self) -> CapabilityFlags {
        CapabilityFlags::new(self.primary_available(), false)
    }

    /// Probe both providers. Never fails; a timeout counts as unavailable.
    pub async fn probe(&self) -> CapabilityFlags {
        let primary = self.primary_available();

        let secondary = match tokio::time::timeout(self.timeout, self.market.health_check()).await {
            Ok(healthy) => healthy,
            Err(_) => {
                tracing::warn!(
                    provider = self.market.name(),
                    timeout_ms = self.timeout.as_millis(),
                    "Market data health check timed out"
                );
                false
            }
        };

        let flags = CapabilityFlags::new(primary, secondary);
        tracing::info!(
            primary = flags.primary_available,
            secondary = flags.secondary_available,
            "Capability probe complete"
        );
        flags
    }
}

/// Owns the current [`CapabilityFlags`] and replaces them wholesale on
/// every probe
pub struct CapabilityMonitor {
    probe: ApiProbe,
    flags: watch::Sender<CapabilityFlags>,
}

impl CapabilityMonitor {
    /// Seed from the local credential check; the market side starts down
    pub fn new(probe: ApiProbe) -> Self {
        let (flags, _) = watch::channel(probe.initial_flags());
        Self { probe, flags }
    }

    pub fn current(&self) -> CapabilityFlags {
        *self.flags.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CapabilityFlags> {
        self.flags.subscribe()
    }

    /// Re-probe and publish
    pub async fn refresh(&self) -> CapabilityFlags {
        let flags = self.probe.probe().await;
        self.flags.send_replace(flags);
        flags
    }

    /// Re-probe every `interval` until `shutdown` is cancelled
    pub fn spawn_periodic(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.refresh().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalystError, Result};
    use crate::market::{MockMarketData, TokenReport};
    use agent_core::{Completion, GenerationOptions, Message};
    use agent_core::provider::{ModelInfo, ProviderInfo};
    use async_trait::async_trait;

    struct StubLlm {
        configured: bool,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn info(&self) -> agent_core::Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "stub".into(),
                endpoint: String::new(),
                models: Vec::new(),
            })
        }

        async fn health_check(&self) -> agent_core::Result<bool> {
            Ok(self.configured)
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
        ) -> agent_core::Result<Completion> {
            Err(agent_core::AgentError::Other("not used".into()))
        }

        async fn list_models(&self) -> agent_core::Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    /// Health check that never answers
    struct HangingMarket;

    #[async_trait]
    impl MarketDataProvider for HangingMarket {
        async fn health_check(&self) -> bool {
            std::future::pending().await
        }

        async fn comprehensive_analysis(&self, token: &str) -> Result<TokenReport> {
            Err(AnalystError::NoData(token.into()))
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn probe(configured: bool, market: Arc<dyn MarketDataProvider>) -> ApiProbe {
        ApiProbe::new(
            Some(Arc::new(StubLlm { configured })),
            market,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_probe_both_available() {
        let flags = probe(true, Arc::new(MockMarketData::new())).probe().await;
        assert_eq!(flags, CapabilityFlags::new(true, true));
    }

    #[tokio::test]
    async fn test_network_failure_is_unavailable() {
        let flags = probe(true, Arc::new(MockMarketData::unavailable())).probe().await;
        assert_eq!(flags, CapabilityFlags::new(true, false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unavailable() {
        let flags = probe(false, Arc::new(HangingMarket)).probe().await;
        assert_eq!(flags, CapabilityFlags::offline());
    }

    #[tokio::test]
    async fn test_missing_llm_is_unavailable() {
        let probe = ApiProbe::new(None, Arc::new(MockMarketData::new()), Duration::from_secs(1));
        assert!(!probe.primary_available());
    }

    #[tokio::test]
    async fn test_monitor_seeds_then_replaces() {
        let monitor = CapabilityMonitor::new(probe(true, Arc::new(MockMarketData::new())));
        let mut rx = monitor.subscribe();

        assert_eq!(monitor.current(), CapabilityFlags::new(true, false));

        monitor.refresh().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CapabilityFlags::new(true, true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_probe_stops_on_shutdown() {
        let monitor = Arc::new(CapabilityMonitor::new(probe(
            false,
            Arc::new(MockMarketData::new()),
        )));
        let shutdown = CancellationToken::new();
        let handle = Arc::clone(&monitor).spawn_periodic(Duration::from_secs(30), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(monitor.current(), CapabilityFlags::new(false, true));

        shutdown.cancel();
        handle.await.unwrap();
    }
}
