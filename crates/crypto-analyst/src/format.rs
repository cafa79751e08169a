//! Market Data Formatter
//!
//! Renders a [`MarketSnapshot`] as sectioned analysis text. Sections whose
//! inputs are all absent are omitted; the disclaimer is always last.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::DISCLAIMER;
use crate::model::{Fundamentals, MarketSnapshot, TechnicalIndicators};

const SCALES: &[(Decimal, &str)] = &[
    (dec!(1_000_000_000_000), "T"),
    (dec!(1_000_000_000), "B"),
    (dec!(1_000_000), "M"),
    (dec!(1_000), "K"),
];

/// Abbreviate a value with a T/B/M/K suffix, two decimals. `None` is "N/A".
pub fn format_large_number(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return "N/A".into();
    };

    let (scaled, suffix) = SCALES
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map_or((value, ""), |(threshold, suffix)| (value / *threshold, *suffix));

    let rounded = scaled.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}{suffix}")
}

/// Share of buys and sells, one decimal each, summing to 100.0.
pub fn format_buy_sell_ratio(buys: u64, sells: u64) -> Option<String> {
    let total = buys.checked_add(sells)?;
    if total == 0 {
        return None;
    }

    let buy_pct = (Decimal::from(buys) * dec!(100) / Decimal::from(total))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    let sell_pct = dec!(100) - buy_pct;

    Some(format!("{buy_pct:.1}% buys / {sell_pct:.1}% sells"))
}

/// Price with precision suited to its magnitude
pub fn format_price(price: Decimal) -> String {
    if price.abs() >= Decimal::ONE {
        format!("{:.2}", price.round_dp(2))
    } else {
        price.round_dp(8).normalize().to_string()
    }
}

fn format_level(price: f64) -> String {
    Decimal::from_f64_retain(price).map_or_else(|| format!("{price:.2}"), format_price)
}

/// Build the full analysis text for `token` from a snapshot.
pub fn format_market_analysis(token: &str, snapshot: &MarketSnapshot) -> String {
    let ticker = token.to_uppercase();
    let mut response = format!("## {ticker} Analysis\n\n");

    if let Some(summary) = executive_summary(&ticker, snapshot) {
        response.push_str(&format!("**Executive Summary**: {summary}\n\n"));
    }

    let structure = market_structure(snapshot);
    if !structure.is_empty() {
        response.push_str("### Market Structure\n");
        response.push_str(&structure);
        response.push('\n');
    }

    if let Some(technicals) = &snapshot.technicals {
        response.push_str("### Technical Outlook\n");
        response.push_str(&technical_outlook(technicals));
        response.push('\n');
    }

    if let Some(fundamentals) = snapshot.fundamentals.as_ref().filter(|f| !f.is_empty()) {
        response.push_str("### Fundamental Assessment\n");
        response.push_str(&fundamental_assessment(fundamentals));
        response.push('\n');
    }

    response.push_str(DISCLAIMER);
    response
}

fn executive_summary(ticker: &str, snapshot: &MarketSnapshot) -> Option<String> {
    let has_pair = snapshot.dex_id.is_some();
    if snapshot.price.is_none()
        && snapshot.change_24h.is_none()
        && snapshot.market_cap.is_none()
        && !has_pair
    {
        return None;
    }

    let mut sentences = Vec::new();

    if let Some(price) = snapshot.price {
        let name = snapshot.name.as_deref().unwrap_or(ticker);
        let symbol = snapshot
            .symbol
            .as_deref()
            .map_or_else(|| ticker.to_string(), str::to_uppercase);
        sentences.push(format!(
            "{name} ({symbol}) is currently trading at ${}.",
            format_price(price)
        ));
    }

    if let Some(change) = snapshot.change_24h {
        let direction = if change >= Decimal::ZERO { "up" } else { "down" };
        sentences.push(format!(
            "It's {direction} {:.2}% in the last 24 hours.",
            change.abs().round_dp(2)
        ));
    }

    if let Some(cap) = snapshot.market_cap {
        let rank = snapshot
            .market_cap_rank
            .map(|r| format!(" (rank #{r})"))
            .unwrap_or_default();
        sentences.push(format!("Market cap is ${}{rank}.", format_large_number(Some(cap))));
    }

    if let Some(dex) = &snapshot.dex_id {
        sentences.push(match snapshot.liquidity {
            Some(liquidity) => format!(
                "Most liquid trading pair is on {dex} with ${} liquidity.",
                format_large_number(Some(liquidity))
            ),
            None => format!("Most liquid trading pair is on {dex}."),
        });
    }

    Some(sentences.join(" "))
}

fn market_structure(snapshot: &MarketSnapshot) -> String {
    let mut lines = String::new();

    if let Some(cap) = snapshot.market_cap {
        lines.push_str(&format!("- **Market Cap**: ${}\n", format_large_number(Some(cap))));
    }
    if let Some(volume) = snapshot.volume_24h {
        lines.push_str(&format!("- **24h Volume**: ${}\n", format_large_number(Some(volume))));
    }
    if let Some(rank) = snapshot.market_cap_rank {
        lines.push_str(&format!("- **Market Rank**: #{rank}\n"));
    }
    if let Some(liquidity) = snapshot.liquidity {
        lines.push_str(&format!("- **Liquidity**: ${}\n", format_large_number(Some(liquidity))));
    }
    if let Some(volume) = snapshot.dex_volume_24h {
        lines.push_str(&format!(
            "- **DEX 24h Volume**: ${}\n",
            format_large_number(Some(volume))
        ));
    }
    // Only when both sides traded
    if let Some(ratio) = snapshot
        .txns
        .filter(|t| t.buys > 0 && t.sells > 0)
        .and_then(|t| format_buy_sell_ratio(t.buys, t.sells))
    {
        lines.push_str(&format!("- **Buy/Sell Ratio**: {ratio}\n"));
    }

    lines
}

fn technical_outlook(technicals: &TechnicalIndicators) -> String {
    let mut lines = format!(
        "- **Current Trend**: {}\n- **RSI(14)**: {:.2} - {}\n",
        technicals.trend, technicals.rsi.value, technicals.rsi.signal
    );

    if let Some(support) = technicals.support_resistance.support.first() {
        lines.push_str(&format!("- **Key Support**: ${}\n", format_level(support.price)));
    }
    if let Some(resistance) = technicals.support_resistance.resistance.first() {
        lines.push_str(&format!("- **Key Resistance**: ${}\n", format_level(resistance.price)));
    }
    if let Some(macd) = &technicals.macd {
        lines.push_str(&format!("- **MACD**: {} trend\n", macd.trend));
    }

    lines
}

fn fundamental_assessment(fundamentals: &Fundamentals) -> String {
    let mut lines = String::new();

    let supplies = [
        ("Circulating Supply", fundamentals.circulating_supply),
        ("Total Supply", fundamentals.total_supply),
        ("Max Supply", fundamentals.max_supply),
    ];
    for (label, supply) in supplies {
        if supply.is_some() {
            lines.push_str(&format!("- **{label}**: {}\n", format_large_number(supply)));
        }
    }

    if let Some(ath) = fundamentals.ath {
        let distance = fundamentals
            .ath_change_percentage
            .map(|p| format!(" ({:.2}% from ATH)", p.round_dp(2)))
            .unwrap_or_default();
        lines.push_str(&format!("- **All-Time High**: ${}{distance}\n", format_price(ath)));
    }

    if let Some(commits) = fundamentals.commit_count_4_weeks {
        lines.push_str(&format!(
            "- **Developer Activity**: {commits} commits in last 4 weeks\n"
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Macd, PriceLevel, Rsi, RsiSignal, SupportResistance, Trend, TxnCounts,
    };

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(Some(dec!(1234567890))), "1.23B");
        assert_eq!(format_large_number(Some(dec!(999))), "999.00");
        assert_eq!(format_large_number(None), "N/A");
        assert_eq!(format_large_number(Some(dec!(2_500_000_000_000))), "2.50T");
        assert_eq!(format_large_number(Some(dec!(1_000_000))), "1.00M");
        assert_eq!(format_large_number(Some(dec!(15_250))), "15.25K");
        assert_eq!(format_large_number(Some(dec!(0.005))), "0.01");
    }

    #[test]
    fn test_buy_sell_ratio() {
        assert_eq!(format_buy_sell_ratio(70, 30).as_deref(), Some("70.0% buys / 30.0% sells"));
        assert_eq!(format_buy_sell_ratio(1, 2).as_deref(), Some("33.3% buys / 66.7% sells"));
        assert_eq!(format_buy_sell_ratio(5, 0).as_deref(), Some("100.0% buys / 0.0% sells"));
        assert_eq!(format_buy_sell_ratio(0, 0), None);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(97500)), "97500.00");
        assert_eq!(format_price(dec!(0.000022)), "0.000022");
    }

    #[test]
    fn test_empty_snapshot_is_header_and_disclaimer() {
        let text = format_market_analysis("pepe", &MarketSnapshot::default());
        assert_eq!(text, format!("## PEPE Analysis\n\n{DISCLAIMER}"));
    }

    #[test]
    fn test_full_snapshot_sections() {
        let snapshot = MarketSnapshot {
            name: Some("Bitcoin".into()),
            symbol: Some("btc".into()),
            price: Some(dec!(64250.5)),
            change_24h: Some(dec!(-1.234)),
            market_cap: Some(dec!(1_265_000_000_000)),
            market_cap_rank: Some(1),
            volume_24h: Some(dec!(31_400_000_000)),
            liquidity: Some(dec!(12_500_000)),
            dex_id: Some("uniswap".into()),
            dex_volume_24h: Some(dec!(4_200_000)),
            txns: Some(TxnCounts { buys: 70, sells: 30 }),
            technicals: Some(TechnicalIndicators {
                trend: Trend::Bullish,
                rsi: Rsi {
                    value: 61.4,
                    signal: RsiSignal::Neutral,
                },
                support_resistance: SupportResistance {
                    support: vec![PriceLevel { price: 61200.0 }],
                    resistance: vec![PriceLevel { price: 69000.0 }],
                },
                macd: Some(Macd {
                    trend: Trend::Bullish,
                    histogram: 12.5,
                }),
            }),
            fundamentals: Some(Fundamentals {
                circulating_supply: Some(dec!(19_700_000)),
                max_supply: Some(dec!(21_000_000)),
                ath: Some(dec!(73738)),
                ath_change_percentage: Some(dec!(-12.87)),
                commit_count_4_weeks: Some(42),
                ..Fundamentals::default()
            }),
        };

        let text = format_market_analysis("btc", &snapshot);

        assert!(text.starts_with("## BTC Analysis\n\n**Executive Summary**: Bitcoin (BTC) is currently trading at $64250.50."));
        assert!(text.contains("It's down 1.23% in the last 24 hours."));
        assert!(text.contains("Market cap is $1.27T (rank #1)."));
        assert!(text.contains("Most liquid trading pair is on uniswap with $12.50M liquidity."));
        assert!(text.contains("### Market Structure\n- **Market Cap**: $1.27T\n"));
        assert!(text.contains("- **Buy/Sell Ratio**: 70.0% buys / 30.0% sells\n"));
        assert!(text.contains("- **RSI(14)**: 61.40 - Neutral\n"));
        assert!(text.contains("- **Key Support**: $61200.00\n"));
        assert!(text.contains("- **MACD**: Bullish trend\n"));
        assert!(text.contains("- **Max Supply**: 21.00M\n"));
        assert!(!text.contains("Total Supply"));
        assert!(text.contains("- **All-Time High**: $73738.00 (-12.87% from ATH)\n"));
        assert!(text.contains("42 commits in last 4 weeks"));
        assert!(text.ends_with(DISCLAIMER));
    }

    #[test]
    fn test_dex_only_snapshot() {
        let snapshot = MarketSnapshot {
            dex_id: Some("raydium".into()),
            liquidity: Some(dec!(850_000)),
            ..MarketSnapshot::default()
        };

        let text = format_market_analysis("wif", &snapshot);
        assert!(text.contains("**Executive Summary**: Most liquid trading pair is on raydium with $850.00K liquidity."));
        assert!(!text.contains("### Technical Outlook"));
        assert!(!text.contains("### Fundamental Assessment"));
    }

    #[test]
    fn test_missing_values_are_omitted() {
        let snapshot = MarketSnapshot {
            name: Some("Pepe".into()),
            market_cap: Some(dec!(4_000_000_000)),
            dex_id: Some("uniswap".into()),
            txns: Some(TxnCounts { buys: 12, sells: 0 }),
            fundamentals: Some(Fundamentals {
                ath: Some(dec!(0.000028)),
                ..Fundamentals::default()
            }),
            ..MarketSnapshot::default()
        };

        let text = format_market_analysis("pepe", &snapshot);
        assert!(!text.contains("N/A"));
        assert!(!text.contains("trading at"));
        assert!(text.contains("Most liquid trading pair is on uniswap."));
        assert!(!text.contains("Buy/Sell Ratio"));
        assert!(text.contains("- **All-Time High**: $0.000028\n"));
    }

    #[test]
    fn test_deterministic() {
        let snapshot = MarketSnapshot {
            price: Some(dec!(1.5)),
            ..MarketSnapshot::default()
        };
        assert_eq!(
            format_market_analysis("ada", &snapshot),
            format_market_analysis("ada", &snapshot)
        );
    }
}
