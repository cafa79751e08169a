//! CoinGecko + DexScreener Market Data
//!
//! Coin listing, market chart and developer data come from CoinGecko; the
//! most liquid on-chain pair comes from DexScreener. Either side may fail
//! independently.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{CoinData, DexPair, MarketDataProvider, TokenReport};
use crate::error::{AnalystError, Result};
use crate::model::TxnCounts;

/// Days of daily closes requested for indicators
const CHART_DAYS: &str = "90";

#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// CoinGecko API base, without trailing slash
    pub base_url: String,

    /// DexScreener API base, without trailing slash
    pub dex_base_url: String,

    pub timeout_secs: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".into(),
            dex_base_url: "https://api.dexscreener.com".into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
}

#[derive(Deserialize)]
struct CoinResponse {
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    market_data: Option<WireMarketData>,
    developer_data: Option<WireDeveloperData>,
}

type CurrencyMap = HashMap<String, Option<f64>>;

#[derive(Deserialize)]
struct WireMarketData {
    #[serde(default)]
    current_price: CurrencyMap,
    price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    market_cap: CurrencyMap,
    #[serde(default)]
    total_volume: CurrencyMap,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    #[serde(default)]
    ath: CurrencyMap,
    #[serde(default)]
    ath_change_percentage: CurrencyMap,
}

#[derive(Deserialize)]
struct WireDeveloperData {
    commit_count_4_weeks: Option<u64>,
}

#[derive(Deserialize)]
struct MarketChart {
    /// [[timestamp_ms, price], ...]
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

#[derive(Deserialize)]
struct DexSearchResponse {
    pairs: Option<Vec<WirePair>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePair {
    dex_id: String,
    price_usd: Option<String>,
    liquidity: Option<WireLiquidity>,
    volume: Option<WireVolume>,
    txns: Option<WireTxns>,
    base_token: Option<WireBaseToken>,
}

#[derive(Deserialize)]
struct WireLiquidity {
    usd: Option<f64>,
}

#[derive(Deserialize)]
struct WireVolume {
    h24: Option<f64>,
}

#[derive(Deserialize)]
struct WireTxns {
    h24: Option<WireTxnCount>,
}

#[derive(Deserialize)]
struct WireTxnCount {
    buys: u64,
    sells: u64,
}

#[derive(Deserialize)]
struct WireBaseToken {
    symbol: String,
}

/// Live market data client
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalystError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalystError::Provider(format!("rate limited by {url}")));
        }
        if !status.is_success() {
            return Err(AnalystError::Provider(format!(
                "{url} returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(response.json().await?)
    }

    /// Resolve a ticker or name to a CoinGecko coin id
    async fn resolve_coin_id(&self, token: &str) -> Result<String> {
        let url = format!("{}/search", self.config.base_url);
        let search: SearchResponse = self.get_json(&url, &[("query", token)]).await?;

        pick_coin_id(search.coins, token).ok_or_else(|| AnalystError::NoData(token.to_string()))
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinData> {
        let url = format!("{}/coins/{id}", self.config.base_url);
        let coin: CoinResponse = self
            .get_json(
                &url,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("market_data", "true"),
                    ("community_data", "false"),
                    ("developer_data", "true"),
                    ("sparkline", "false"),
                ],
            )
            .await?;

        Ok(coin_from_wire(coin))
    }

    async fn fetch_price_history(&self, id: &str) -> Result<Vec<f64>> {
        let url = format!("{}/coins/{id}/market_chart", self.config.base_url);
        let chart: MarketChart = self
            .get_json(
                &url,
                &[("vs_currency", "usd"), ("days", CHART_DAYS), ("interval", "daily")],
            )
            .await?;

        Ok(chart.prices.into_iter().map(|(_, price)| price).collect())
    }

    /// Coin data plus history; a failed chart only drops the history
    async fn coin_side(&self, token: &str) -> Result<(CoinData, Vec<f64>)> {
        let id = self.resolve_coin_id(token).await?;
        let (coin, history) = tokio::join!(self.fetch_coin(&id), self.fetch_price_history(&id));

        let history = history.unwrap_or_else(|e| {
            tracing::warn!(coin = %id, error = %e, "Market chart unavailable");
            Vec::new()
        });
        Ok((coin?, history))
    }

    async fn fetch_dex_pair(&self, token: &str) -> Result<DexPair> {
        let url = format!("{}/latest/dex/search", self.config.dex_base_url);
        let search: DexSearchResponse = self.get_json(&url, &[("q", token)]).await?;

        most_liquid_pair(search.pairs.unwrap_or_default(), token)
            .ok_or_else(|| AnalystError::NoData(token.to_string()))
    }
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

fn usd(map: &CurrencyMap) -> Option<Decimal> {
    decimal(map.get("usd").copied().flatten())
}

/// Exact symbol match first, then the top search hit
fn pick_coin_id(coins: Vec<SearchCoin>, token: &str) -> Option<String> {
    let exact = coins
        .iter()
        .position(|c| c.symbol.eq_ignore_ascii_case(token) || c.id.eq_ignore_ascii_case(token));

    let index = exact.unwrap_or(0);
    coins.into_iter().nth(index).map(|c| c.id)
}

fn coin_from_wire(coin: CoinResponse) -> CoinData {
    let market = coin.market_data;
    let market = market.as_ref();

    CoinData {
        id: coin.id,
        name: coin.name,
        symbol: coin.symbol,
        current_price: market.and_then(|m| usd(&m.current_price)),
        price_change_percentage_24h: market.and_then(|m| decimal(m.price_change_percentage_24h)),
        market_cap: market.and_then(|m| usd(&m.market_cap)),
        market_cap_rank: coin.market_cap_rank,
        total_volume: market.and_then(|m| usd(&m.total_volume)),
        circulating_supply: market.and_then(|m| decimal(m.circulating_supply)),
        total_supply: market.and_then(|m| decimal(m.total_supply)),
        max_supply: market.and_then(|m| decimal(m.max_supply)),
        ath: market.and_then(|m| usd(&m.ath)),
        ath_change_percentage: market.and_then(|m| usd(&m.ath_change_percentage)),
        commit_count_4_weeks: coin.developer_data.and_then(|d| d.commit_count_4_weeks),
    }
}

/// Highest-liquidity pair, preferring pairs whose base token is `token`
fn most_liquid_pair(pairs: Vec<WirePair>, token: &str) -> Option<DexPair> {
    let matches_token = |p: &WirePair| {
        p.base_token
            .as_ref()
            .is_some_and(|b| b.symbol.eq_ignore_ascii_case(token))
    };
    let liquidity = |p: &WirePair| p.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);

    let any_match = pairs.iter().any(matches_token);
    let best = pairs
        .into_iter()
        .filter(|p| !any_match || matches_token(p))
        .max_by(|a, b| liquidity(a).total_cmp(&liquidity(b)))?;

    Some(DexPair {
        price_usd: best.price_usd.as_deref().and_then(|p| p.parse().ok()),
        liquidity_usd: decimal(best.liquidity.and_then(|l| l.usd)),
        volume_24h: decimal(best.volume.and_then(|v| v.h24)),
        txns_24h: best
            .txns
            .and_then(|t| t.h24)
            .map(|t| TxnCounts {
                buys: t.buys,
                sells: t.sells,
            }),
        dex_id: best.dex_id,
    })
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn health_check(&self) -> bool {
        let url = format!("{}/ping", self.config.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("CoinGecko health check failed: {}", e);
                false
            }
        }
    }

    async fn comprehensive_analysis(&self, token: &str) -> Result<TokenReport> {
        let (coin_side, dex) = tokio::join!(self.coin_side(token), self.fetch_dex_pair(token));

        let (coin, price_history, coin_err) = match coin_side {
            Ok((coin, history)) => (Some(coin), history, None),
            Err(e) => (None, Vec::new(), Some(e)),
        };
        let dex = dex
            .map_err(|e| tracing::debug!(token, error = %e, "No DEX pair"))
            .ok();

        if let (None, None, Some(err)) = (&coin, &dex, coin_err) {
            return Err(err);
        }

        Ok(TokenReport {
            token: token.to_string(),
            coin,
            dex,
            price_history,
        })
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_coin_parsing() {
        let body = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "market_cap_rank": 1,
            "market_data": {
                "current_price": {"usd": 64250.5, "eur": 59000.0},
                "price_change_percentage_24h": -1.25,
                "market_cap": {"usd": 1265000000000.0},
                "total_volume": {"usd": 31400000000.0},
                "circulating_supply": 19700000.0,
                "total_supply": 21000000.0,
                "max_supply": null,
                "ath": {"usd": 73738.0},
                "ath_change_percentage": {"usd": -12.87}
            },
            "developer_data": {"commit_count_4_weeks": 42}
        }"#;
        let coin = coin_from_wire(serde_json::from_str(body).unwrap());

        assert_eq!(coin.name, "Bitcoin");
        assert_eq!(coin.current_price, Some(dec!(64250.5)));
        assert_eq!(coin.price_change_percentage_24h, Some(dec!(-1.25)));
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.max_supply, None);
        assert_eq!(coin.ath_change_percentage, Some(dec!(-12.87)));
        assert_eq!(coin.commit_count_4_weeks, Some(42));
    }

    #[test]
    fn test_coin_without_market_data() {
        let body = r#"{"id": "pepe", "symbol": "pepe", "name": "Pepe"}"#;
        let coin = coin_from_wire(serde_json::from_str(body).unwrap());
        assert_eq!(coin.current_price, None);
        assert_eq!(coin.commit_count_4_weeks, None);
    }

    #[test]
    fn test_pick_coin_id_prefers_symbol_match() {
        let coins = vec![
            SearchCoin {
                id: "wrapped-bitcoin".into(),
                symbol: "WBTC".into(),
            },
            SearchCoin {
                id: "bitcoin".into(),
                symbol: "BTC".into(),
            },
        ];
        assert_eq!(pick_coin_id(coins, "btc").as_deref(), Some("bitcoin"));
        assert_eq!(pick_coin_id(Vec::new(), "btc"), None);
    }

    #[test]
    fn test_most_liquid_pair() {
        let body = r#"{"pairs": [
            {"dexId": "orca", "priceUsd": "2.10", "liquidity": {"usd": 400000.0},
             "baseToken": {"symbol": "WIF"}},
            {"dexId": "raydium", "priceUsd": "2.11", "liquidity": {"usd": 850000.0},
             "volume": {"h24": 1200000.0}, "txns": {"h24": {"buys": 700, "sells": 300}},
             "baseToken": {"symbol": "WIF"}},
            {"dexId": "meteora", "priceUsd": "0.01", "liquidity": {"usd": 9000000.0},
             "baseToken": {"symbol": "SOL"}}
        ]}"#;
        let search: DexSearchResponse = serde_json::from_str(body).unwrap();
        let pair = most_liquid_pair(search.pairs.unwrap(), "wif").unwrap();

        assert_eq!(pair.dex_id, "raydium");
        assert_eq!(pair.price_usd, Some(dec!(2.11)));
        assert_eq!(pair.liquidity_usd, Some(dec!(850000)));
        assert_eq!(pair.txns_24h, Some(TxnCounts { buys: 700, sells: 300 }));
    }

    #[test]
    fn test_null_pairs() {
        let search: DexSearchResponse = serde_json::from_str(r#"{"pairs": null}"#).unwrap();
        assert!(most_liquid_pair(search.pairs.unwrap_or_default(), "x").is_none());
    }

    #[test]
    fn test_market_chart_parsing() {
        let chart: MarketChart =
            serde_json::from_str(r#"{"prices": [[1700000000000, 1.5], [1700086400000, 1.6]]}"#)
                .unwrap();
        let closes: Vec<f64> = chart.prices.into_iter().map(|(_, p)| p).collect();
        assert_eq!(closes, vec![1.5, 1.6]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unhealthy() {
        let client = CoinGeckoClient::new(CoinGeckoConfig {
            base_url: "http://127.0.0.1:9".into(),
            dex_base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
        })
        .unwrap();

        assert!(!client.health_check().await);
        let err = client.comprehensive_analysis("btc").await.unwrap_err();
        assert!(matches!(err, AnalystError::Network(_)));
    }
}
