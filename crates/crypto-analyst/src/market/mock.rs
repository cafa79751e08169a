//! Mock Market Data
//!
//! For testing and demo purposes. Returns realistic static figures and a
//! deterministic synthetic price history.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use super::{CoinData, DexPair, MarketDataProvider, TokenReport};
use crate::error::{AnalystError, Result};
use crate::extractor::canonical_ticker;
use crate::model::TxnCounts;

/// Long enough for MACD(12,26,9)
const HISTORY_DAYS: usize = 60;

struct Listing {
    ticker: &'static str,
    id: &'static str,
    name: &'static str,
    price: Decimal,
    change_24h: Decimal,
    market_cap: Decimal,
    volume: Decimal,
    rank: u32,
}

const LISTINGS: &[Listing] = &[
    Listing { ticker: "btc", id: "bitcoin", name: "Bitcoin", price: dec!(97500), change_24h: dec!(2.5), market_cap: dec!(1_930_000_000_000), volume: dec!(25_000_000_000), rank: 1 },
    Listing { ticker: "eth", id: "ethereum", name: "Ethereum", price: dec!(3450), change_24h: dec!(1.8), market_cap: dec!(415_000_000_000), volume: dec!(15_000_000_000), rank: 2 },
    Listing { ticker: "sol", id: "solana", name: "Solana", price: dec!(195), change_24h: dec!(4.2), market_cap: dec!(93_000_000_000), volume: dec!(3_000_000_000), rank: 5 },
    Listing { ticker: "ada", id: "cardano", name: "Cardano", price: dec!(0.95), change_24h: dec!(-1.2), market_cap: dec!(33_400_000_000), volume: dec!(900_000_000), rank: 9 },
    Listing { ticker: "dot", id: "polkadot", name: "Polkadot", price: dec!(7.20), change_24h: dec!(0.8), market_cap: dec!(10_900_000_000), volume: dec!(310_000_000), rank: 17 },
    Listing { ticker: "link", id: "chainlink", name: "Chainlink", price: dec!(24.50), change_24h: dec!(3.1), market_cap: dec!(15_400_000_000), volume: dec!(720_000_000), rank: 13 },
    Listing { ticker: "avax", id: "avalanche-2", name: "Avalanche", price: dec!(42.00), change_24h: dec!(5.5), market_cap: dec!(17_200_000_000), volume: dec!(650_000_000), rank: 12 },
    Listing { ticker: "matic", id: "matic-network", name: "Polygon", price: dec!(0.52), change_24h: dec!(-0.5), market_cap: dec!(4_800_000_000), volume: dec!(240_000_000), rank: 28 },
    Listing { ticker: "xrp", id: "ripple", name: "XRP", price: dec!(2.35), change_24h: dec!(0.9), market_cap: dec!(134_000_000_000), volume: dec!(6_100_000_000), rank: 4 },
    Listing { ticker: "doge", id: "dogecoin", name: "Dogecoin", price: dec!(0.38), change_24h: dec!(12.0), market_cap: dec!(56_000_000_000), volume: dec!(4_300_000_000), rank: 7 },
    Listing { ticker: "shib", id: "shiba-inu", name: "Shiba Inu", price: dec!(0.000022), change_24h: dec!(-8.0), market_cap: dec!(13_000_000_000), volume: dec!(820_000_000), rank: 15 },
    Listing { ticker: "uni", id: "uniswap", name: "Uniswap", price: dec!(14.20), change_24h: dec!(2.2), market_cap: dec!(8_500_000_000), volume: dec!(380_000_000), rank: 22 },
];

/// Mock market data with static listings
pub struct MockMarketData {
    available: bool,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    pub const fn new() -> Self {
        Self { available: true }
    }

    /// A source whose health check fails and whose lookups error
    pub const fn unavailable() -> Self {
        Self { available: false }
    }

    fn listing(token: &str) -> Option<&'static Listing> {
        let ticker = canonical_ticker(token).map_or_else(|| token.to_lowercase(), str::to_string);
        LISTINGS.iter().find(|l| l.ticker == ticker)
    }
}

/// Smooth oscillation around a drift ending at `last`, oldest first
fn synthetic_history(last: Decimal, change_24h: Decimal) -> Vec<f64> {
    let last = last.to_f64().unwrap_or_default();
    let drift = change_24h.to_f64().unwrap_or_default() / 100.0 / 3.0;

    (0..HISTORY_DAYS)
        .map(|day| {
            let back = (HISTORY_DAYS - 1 - day) as f64;
            let wave = (day as f64 * 0.9).sin() * 0.03;
            last * (1.0 - drift * back / HISTORY_DAYS as f64 + wave)
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn health_check(&self) -> bool {
        self.available
    }

    async fn comprehensive_analysis(&self, token: &str) -> Result<TokenReport> {
        if !self.available {
            return Err(AnalystError::Network("mock market data is offline".into()));
        }

        let listing = Self::listing(token).ok_or_else(|| AnalystError::NoData(token.to_string()))?;

        let coin = CoinData {
            id: listing.id.into(),
            name: listing.name.into(),
            symbol: listing.ticker.into(),
            current_price: Some(listing.price),
            price_change_percentage_24h: Some(listing.change_24h),
            market_cap: Some(listing.market_cap),
            market_cap_rank: Some(listing.rank),
            total_volume: Some(listing.volume),
            circulating_supply: Some((listing.market_cap / listing.price).round()),
            ..CoinData::default()
        };

        let dex = DexPair {
            dex_id: "uniswap".into(),
            price_usd: Some(listing.price),
            liquidity_usd: Some(listing.volume / dec!(40)),
            volume_24h: Some(listing.volume / dec!(25)),
            txns_24h: Some(TxnCounts {
                buys: 6_200,
                sells: 3_800,
            }),
        };

        Ok(TokenReport {
            token: token.to_string(),
            coin: Some(coin),
            dex: Some(dex),
            price_history: synthetic_history(listing.price, listing.change_24h),
        })
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data() {
        let market = MockMarketData::new();
        assert!(market.health_check().await);

        let report = market.comprehensive_analysis("BTC").await.unwrap();
        let coin = report.coin.unwrap();
        assert_eq!(coin.name, "Bitcoin");
        assert_eq!(coin.current_price, Some(dec!(97500)));
        assert_eq!(report.price_history.len(), HISTORY_DAYS);
        let technicals = market.technical_indicators(&report.price_history).unwrap();
        assert!(technicals.macd.is_some());
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let market = MockMarketData::new();
        let report = market.comprehensive_analysis("avalanche").await.unwrap();
        assert_eq!(report.coin.unwrap().symbol, "avax");
    }

    #[tokio::test]
    async fn test_unsupported_token() {
        let market = MockMarketData::new();
        let err = market.comprehensive_analysis("notreal").await.unwrap_err();
        assert!(matches!(err, AnalystError::NoData(_)));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let market = MockMarketData::unavailable();
        assert!(!market.health_check().await);
        assert!(market.comprehensive_analysis("btc").await.is_err());
    }

    #[test]
    fn test_history_is_deterministic_and_ends_near_price() {
        let a = synthetic_history(dec!(100), dec!(3));
        let b = synthetic_history(dec!(100), dec!(3));
        assert_eq!(a, b);
        let last = a[HISTORY_DAYS - 1];
        assert!((last - 100.0).abs() < 5.0);
    }
}
