//! Mock Generator
//!
//! Offline answers used when no upstream provider can respond. Well-known
//! assets get fixed reports; other tokens get a templated report with
//! randomized qualifiers; messages without a token get a general reply.

use rand::Rng;

use crate::DISCLAIMER;

const BITCOIN_REPORT: &str = "## Bitcoin (BTC) Analysis

**Executive Summary**: Bitcoin remains the market's reference asset, with spot ETF flows and long-term holder accumulation anchoring demand. Momentum reads neutral to mildly bullish while price holds above the $61,200 support band.

### Market Structure
- **Market Cap**: $1.26 trillion
- **24h Volume**: $38.7 billion
- **Dominance**: 49.1% of total crypto market cap
- **Liquidity**: Deep order books on every major venue

### Technical Outlook
- **RSI(14)**: 57.4 - Neutral, with room before overbought
- **MACD**: Bullish crossover developing on the daily chart
- **Key Support**: $61,200, $57,800, $52,400
- **Key Resistance**: $69,000, $72,500, $75,000

### Fundamental Assessment
Network hashrate sits near record highs and the post-halving issuance rate keeps new supply tight. On-chain data shows coins moving into long-term storage, a pattern historically associated with accumulation phases.

This analysis represents educational information based on available data, not financial advice.";

const ETHEREUM_REPORT: &str = "## Ethereum (ETH) Analysis

**Executive Summary**: Ethereum is still the leading smart contract platform by developer activity and value secured. Staking has reshaped its supply dynamics, and rollup adoption continues to push activity onto Layer-2 networks.

### Market Structure
- **Market Cap**: $418.5 billion
- **24h Volume**: $17.6 billion
- **DeFi TVL**: $61.3 billion
- **Liquidity**: Deep order books on every major venue

### Technical Outlook
- **RSI(14)**: 63.1 - Neutral, approaching overbought
- **MACD**: Positive with an expanding histogram
- **Key Support**: $3,250, $2,950, $2,700
- **Key Resistance**: $3,800, $4,100, $4,870

### Fundamental Assessment
Roughly a quarter of supply is staked, and fee burning offsets issuance during busy periods. Rollups lower transaction costs for users but also move fee revenue away from the base layer, which is the main open question for the asset's value capture.

This analysis represents educational information based on available data, not financial advice.";

const SOLANA_REPORT: &str = "## Solana (SOL) Analysis

**Executive Summary**: Solana has become the main high-throughput alternative to Ethereum, with low fees driving strong retail, DEX and NFT activity. Earlier outages still weigh on its reputation, though uptime has improved markedly.

### Market Structure
- **Market Cap**: $68.9 billion
- **24h Volume**: $3.4 billion
- **DeFi TVL**: $7.9 billion
- **Liquidity**: Good depth on major venues

### Technical Outlook
- **RSI(14)**: 47.8 - Neutral
- **MACD**: Slightly bearish, flattening toward a possible reversal
- **Key Support**: $118, $105, $92
- **Key Resistance**: $142, $158, $172

### Fundamental Assessment
Parallel transaction execution and a single global state give Solana very high throughput at low cost. Validator hardware requirements remain high, which keeps the validator set smaller than on comparable networks.

This analysis represents educational information based on available data, not financial advice.";

const HELP_RESPONSE: &str = "## How I Can Help

I'm a crypto analyst focused on clear, data-driven breakdowns of digital assets. You can ask me for:

- **Token Analysis**: A full report on any cryptocurrency (e.g. \"Analyze Bitcoin\")
- **Technical Analysis**: Trend, RSI, MACD and key price levels
- **Fundamental Analysis**: Supply, tokenomics and development activity
- **Risk Assessment**: The main risks to weigh before getting involved
- **Comparisons**: How two assets stack up against each other

Mention a token by name or ticker and I'll take it from there.";

const MARKET_RESPONSE: &str = "## Market Outlook

**Executive Summary**: The crypto market is in a consolidation phase with mixed signals across sectors. Bitcoin dominance near 49% suggests capital is concentrated in majors while altcoins trade choppily.

### Key Metrics
- **Total Market Cap**: $2.48 trillion
- **24h Volume**: $96.2 billion
- **BTC Dominance**: 49.1%
- **ETH Dominance**: 16.9%

### Sector Performance (7-Day)
- **Layer-1**: +1.9%
- **DeFi**: -0.7%
- **AI Tokens**: +6.3%
- **Memecoins**: -4.1%

### Notable Trends
Stablecoin supply keeps growing, which usually signals fresh capital waiting on the sidelines. Rotation between narratives is fast, so sector leadership has been short-lived.

This analysis represents educational information based on available data, not financial advice.";

const GREETING_RESPONSE: &str = "Hello! Good to see you. I can break down any cryptocurrency for you, covering price action, technical indicators, fundamentals and risk. Which token should we look at first?";

const DEFAULT_RESPONSE: &str = "I'm your crypto analyst. To get started, name a cryptocurrency you'd like me to look at (for example \"Analyze Bitcoin\" or \"What do you think about Ethereum?\").

I can cover technical analysis, fundamentals, risk and comparisons between assets. What would you like to explore?";

/// Fixed reports, keyed by every ticker and name that selects them
const CANONICAL_REPORTS: &[(&[&str], &str)] = &[
    (&["btc", "bitcoin"], BITCOIN_REPORT),
    (&["eth", "ethereum"], ETHEREUM_REPORT),
    (&["sol", "solana"], SOLANA_REPORT),
];

const GREETINGS: &[&str] = &["hello", "hi", "hey", "gm"];

/// Terminal answer source. Pure aside from the template RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub const fn new() -> Self {
        Self
    }

    /// Answer for `token` if present, otherwise a general reply to `message`
    pub fn generate(&self, token: Option<&str>, message: &str) -> String {
        self.generate_with(token, message, &mut rand::thread_rng())
    }

    /// Same as [`generate`](Self::generate) with an explicit RNG
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        token: Option<&str>,
        message: &str,
        rng: &mut R,
    ) -> String {
        match token {
            Some(token) => Self::canonical_report(token)
                .map_or_else(|| templated_report(token, rng), str::to_string),
            None => general_response(message).to_string(),
        }
    }

    pub fn canonical_report(token: &str) -> Option<&'static str> {
        let token = token.to_lowercase();
        CANONICAL_REPORTS
            .iter()
            .find(|(keys, _)| keys.contains(&token.as_str()))
            .map(|(_, report)| *report)
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, first: &'a str, second: &'a str) -> &'a str {
    if rng.gen_bool(0.5) { first } else { second }
}

fn templated_report<R: Rng + ?Sized>(token: &str, rng: &mut R) -> String {
    let ticker = token.to_uppercase();

    let tier = pick(rng, "smaller cap", "mid-tier");
    let volatility = pick(rng, "moderately volatile", "highly speculative");
    let adoption = pick(rng, "developing", "emerging");

    let liquidity = match rng.gen_range(0..10) {
        0..=2 => "Moderate",
        3..=5 => "Limited",
        _ => "Very thin",
    };
    let low_volume = rng.gen_range(0.5..10.0_f64);
    let high_volume = low_volume + rng.gen_range(5.0..20.0_f64);

    let trend = pick(rng, "Sideways with no confirmed direction", "Choppy, following broader market moves");
    let rsi = rng.gen_range(38.0..62.0_f64);

    format!(
        "## {ticker} Analysis

**Executive Summary**: Based on available data, {ticker} appears to be a {tier} cryptocurrency. Limited market data suggests a {volatility} asset with {adoption} ecosystem adoption.

### Market Structure
- **Liquidity**: {liquidity} across exchanges
- **24h Volume**: Fluctuating between ${low_volume:.2}M and ${high_volume:.2}M

### Technical Outlook
- **Current Trend**: {trend}
- **RSI(14)**: {rsi:.1} - Neutral
- Thin order books can exaggerate moves in either direction

### Fundamental Assessment
When evaluating smaller tokens, weigh:
- Higher volatility and liquidity risk
- Sustainability of project development
- Technological differentiation
- Team experience and commitment

Review the project's documentation, community engagement and development activity before forming a view.

{DISCLAIMER}"
    )
}

fn general_response(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let is_greeting = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| GREETINGS.contains(&word));

    if is_greeting {
        GREETING_RESPONSE
    } else if lower.contains("help") || lower.contains("what can you do") {
        HELP_RESPONSE
    } else if lower.contains("market") || lower.contains("outlook") {
        MARKET_RESPONSE
    } else {
        DEFAULT_RESPONSE
    }
}
