//! Market Data Integration
//!
//! Abstractions and implementations for market-data sources.

mod coingecko;
pub mod indicators;
mod mock;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use mock::MockMarketData;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Fundamentals, MarketSnapshot, TechnicalIndicators, TxnCounts};

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each data source: CoinGecko, a mock, etc.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Check if the source is reachable
    async fn health_check(&self) -> bool;

    /// Coin data, most liquid DEX pair and recent daily closes for a token.
    ///
    /// Partial data is fine; an error means nothing usable was found.
    async fn comprehensive_analysis(&self, token: &str) -> Result<TokenReport>;

    /// Indicators over a close series
    fn technical_indicators(&self, prices: &[f64]) -> Option<TechnicalIndicators> {
        indicators::compute_indicators(prices)
    }

    /// Provider name
    fn name(&self) -> &str;
}

/// Aggregated coin listing data
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinData {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Option<Decimal>,
    pub price_change_percentage_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
    pub max_supply: Option<Decimal>,
    pub ath: Option<Decimal>,
    pub ath_change_percentage: Option<Decimal>,
    pub commit_count_4_weeks: Option<u64>,
}

/// Most liquid decentralized-exchange pair for a token
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DexPair {
    pub dex_id: String,
    pub price_usd: Option<Decimal>,
    pub liquidity_usd: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub txns_24h: Option<TxnCounts>,
}

/// Raw provider output for one token
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenReport {
    pub token: String,
    pub coin: Option<CoinData>,
    pub dex: Option<DexPair>,
    /// Daily closes, oldest first
    pub price_history: Vec<f64>,
}

impl TokenReport {
    pub const fn has_data(&self) -> bool {
        self.coin.is_some() || self.dex.is_some()
    }
}

impl MarketSnapshot {
    /// Flatten a provider report and its indicators into a snapshot
    pub fn from_report(report: &TokenReport, technicals: Option<TechnicalIndicators>) -> Self {
        let coin = report.coin.as_ref();
        let dex = report.dex.as_ref();

        let fundamentals = coin
            .map(|c| Fundamentals {
                circulating_supply: c.circulating_supply,
                total_supply: c.total_supply,
                max_supply: c.max_supply,
                ath: c.ath,
                ath_change_percentage: c.ath_change_percentage,
                commit_count_4_weeks: c.commit_count_4_weeks,
            })
            .filter(|f| !f.is_empty());

        Self {
            name: coin.map(|c| c.name.clone()),
            symbol: coin.map(|c| c.symbol.clone()),
            price: coin
                .and_then(|c| c.current_price)
                .or_else(|| dex.and_then(|d| d.price_usd)),
            change_24h: coin.and_then(|c| c.price_change_percentage_24h),
            market_cap: coin.and_then(|c| c.market_cap),
            market_cap_rank: coin.and_then(|c| c.market_cap_rank),
            volume_24h: coin.and_then(|c| c.total_volume),
            liquidity: dex.and_then(|d| d.liquidity_usd),
            dex_id: dex.map(|d| d.dex_id.clone()),
            dex_volume_24h: dex.and_then(|d| d.volume_24h),
            txns: dex.and_then(|d| d.txns_24h),
            technicals,
            fundamentals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_prefers_coin_price() {
        let report = TokenReport {
            token: "eth".into(),
            coin: Some(CoinData {
                name: "Ethereum".into(),
                symbol: "eth".into(),
                current_price: Some(dec!(3450)),
                ..CoinData::default()
            }),
            dex: Some(DexPair {
                dex_id: "uniswap".into(),
                price_usd: Some(dec!(3449.2)),
                liquidity_usd: Some(dec!(95_000_000)),
                ..DexPair::default()
            }),
            price_history: Vec::new(),
        };

        let snapshot = MarketSnapshot::from_report(&report, None);
        assert_eq!(snapshot.price, Some(dec!(3450)));
        assert_eq!(snapshot.dex_id.as_deref(), Some("uniswap"));
        assert_eq!(snapshot.liquidity, Some(dec!(95_000_000)));
        assert!(snapshot.fundamentals.is_none());
    }

    #[test]
    fn test_snapshot_dex_only() {
        let report = TokenReport {
            token: "wif".into(),
            dex: Some(DexPair {
                dex_id: "raydium".into(),
                price_usd: Some(dec!(2.1)),
                txns_24h: Some(TxnCounts { buys: 10, sells: 5 }),
                ..DexPair::default()
            }),
            ..TokenReport::default()
        };

        assert!(report.has_data());
        let snapshot = MarketSnapshot::from_report(&report, None);
        assert_eq!(snapshot.price, Some(dec!(2.1)));
        assert!(snapshot.name.is_none());
        assert_eq!(snapshot.txns, Some(TxnCounts { buys: 10, sells: 5 }));
    }

    #[test]
    fn test_empty_report_has_no_data() {
        assert!(!TokenReport::default().has_data());
    }
}
