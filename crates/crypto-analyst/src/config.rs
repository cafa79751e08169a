//! Analyst Configuration
//!
//! Read once at startup from the environment.

use std::time::Duration;

use rand::Rng;

use crate::market::CoinGeckoConfig;
use crate::persona::DEFAULT_CHARACTER_ID;

/// Where market data comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarketMode {
    #[default]
    Live,
    Mock,
}

impl MarketMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "live" => Some(Self::Live),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Minimum latency before an assistant reply is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub min_delay: Duration,
    /// Upper bound of the random extra delay
    pub jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1500),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    /// No artificial delay
    pub const fn immediate() -> Self {
        Self {
            min_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Pick a delay in `[min_delay, min_delay + jitter)`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.jitter.is_zero() {
            return self.min_delay;
        }
        self.min_delay + self.jitter.mul_f64(rng.gen_range(0.0..1.0))
    }
}

#[derive(Clone, Debug)]
pub struct AnalystConfig {
    pub market_mode: MarketMode,

    pub market: CoinGeckoConfig,

    /// Bound on the market-data health probe
    pub probe_timeout: Duration,

    /// Periodic re-probe; `None` probes only on demand
    pub probe_interval: Option<Duration>,

    pub pacing: Pacing,

    /// Prior messages sent to the language model
    pub history_limit: usize,

    pub default_character: String,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            market_mode: MarketMode::default(),
            market: CoinGeckoConfig::default(),
            probe_timeout: Duration::from_secs(5),
            probe_interval: None,
            pacing: Pacing::default(),
            history_limit: 5,
            default_character: DEFAULT_CHARACTER_ID.into(),
        }
    }
}

impl AnalystConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing or unparsable values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let url = |key: &str| lookup(key).map(|u| u.trim().trim_end_matches('/').to_string());

        let market_mode = lookup("MARKET_DATA_MODE")
            .and_then(|m| MarketMode::parse(&m))
            .unwrap_or(defaults.market_mode);

        let market = CoinGeckoConfig {
            base_url: url("COINGECKO_BASE_URL").unwrap_or(defaults.market.base_url),
            dex_base_url: url("DEXSCREENER_BASE_URL").unwrap_or(defaults.market.dex_base_url),
            timeout_secs: number("MARKET_TIMEOUT_SECS").unwrap_or(defaults.market.timeout_secs),
        };

        let probe_timeout = number("PROBE_TIMEOUT_SECS")
            .map_or(defaults.probe_timeout, Duration::from_secs);
        let probe_interval = number("PROBE_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let pacing = Pacing {
            min_delay: number("REPLY_DELAY_MIN_MS")
                .map_or(defaults.pacing.min_delay, Duration::from_millis),
            jitter: number("REPLY_DELAY_JITTER_MS")
                .map_or(defaults.pacing.jitter, Duration::from_millis),
        };

        let history_limit = number("HISTORY_LIMIT")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.history_limit);

        let default_character = lookup("DEFAULT_CHARACTER")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or(defaults.default_character);

        Self {
            market_mode,
            market,
            probe_timeout,
            probe_interval,
            pacing,
            history_limit,
            default_character,
        }
    }
}
