//! Technical Indicators
//!
//! RSI, trend, support/resistance and MACD over a daily close series.

use crate::model::{
    Macd, PriceLevel, Rsi, RsiSignal, SupportResistance, TechnicalIndicators, Trend,
};

pub const RSI_PERIOD: usize = 14;
pub const SHORT_SMA: usize = 7;
pub const LONG_SMA: usize = 25;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Below this many closes no indicators are produced
pub const MIN_POINTS: usize = RSI_PERIOD + 1;

/// Below this many closes MACD is omitted
pub const MACD_MIN_POINTS: usize = 35;

const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

/// Bars on each side a local extreme must dominate
const EXTREMA_WINDOW: usize = 2;
const MAX_LEVELS: usize = 3;

/// Compute all indicators, or `None` if the series is too short or contains
/// non-finite values.
pub fn compute_indicators(prices: &[f64]) -> Option<TechnicalIndicators> {
    if prices.len() < MIN_POINTS || prices.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let value = rsi(prices, RSI_PERIOD)?;
    let signal = if value >= OVERBOUGHT {
        RsiSignal::Overbought
    } else if value <= OVERSOLD {
        RsiSignal::Oversold
    } else {
        RsiSignal::Neutral
    };

    Some(TechnicalIndicators {
        trend: trend(prices),
        rsi: Rsi {
            value: (value * 100.0).round() / 100.0,
            signal,
        },
        support_resistance: support_resistance(prices),
        macd: macd(prices),
    })
}

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series, seeded with the SMA of the first
/// `period` values. Element `i` corresponds to input index `i + period - 1`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);
    for value in &values[period..] {
        let prev = series[series.len() - 1];
        series.push((value - prev).mul_add(k, prev));
    }
    series
}

/// Wilder-smoothed RSI of the whole series
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() <= period {
        return None;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let (first, rest) = changes.split_at(period);

    let mut avg_gain = first.iter().filter(|c| **c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = first.iter().filter(|c| **c < 0.0).map(|c| -c).sum::<f64>() / period as f64;

    let smoothing = (period - 1) as f64;
    for change in rest {
        avg_gain = avg_gain.mul_add(smoothing, change.max(0.0)) / period as f64;
        avg_loss = avg_loss.mul_add(smoothing, (-change).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Short vs long SMA, confirmed by the last close
fn trend(prices: &[f64]) -> Trend {
    let long_period = LONG_SMA.min(prices.len());
    let (Some(short), Some(long), Some(&last)) = (
        sma(prices, SHORT_SMA),
        sma(prices, long_period),
        prices.last(),
    ) else {
        return Trend::Sideways;
    };

    if short > long && last >= long {
        Trend::Bullish
    } else if short < long && last <= long {
        Trend::Bearish
    } else {
        Trend::Sideways
    }
}

/// Local minima below and maxima above the last close, nearest first
fn support_resistance(prices: &[f64]) -> SupportResistance {
    let Some(&last) = prices.last() else {
        return SupportResistance::default();
    };

    let mut support = Vec::new();
    let mut resistance = Vec::new();

    for i in EXTREMA_WINDOW..prices.len().saturating_sub(EXTREMA_WINDOW) {
        let price = prices[i];
        let neighbors = prices[i - EXTREMA_WINDOW..=i + EXTREMA_WINDOW]
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != EXTREMA_WINDOW)
            .map(|(_, p)| *p);

        let (mut is_min, mut is_max) = (true, true);
        for neighbor in neighbors {
            is_min &= price < neighbor;
            is_max &= price > neighbor;
        }

        if is_min && price < last {
            support.push(price);
        } else if is_max && price > last {
            resistance.push(price);
        }
    }

    support.sort_by(|a, b| b.total_cmp(a));
    resistance.sort_by(f64::total_cmp);
    support.dedup();
    resistance.dedup();

    SupportResistance {
        support: support.into_iter().take(MAX_LEVELS).map(|price| PriceLevel { price }).collect(),
        resistance: resistance.into_iter().take(MAX_LEVELS).map(|price| PriceLevel { price }).collect(),
    }
}

/// MACD(12, 26, 9) histogram at the last close
fn macd(prices: &[f64]) -> Option<Macd> {
    if prices.len() < MACD_MIN_POINTS {
        return None;
    }

    let fast = ema(prices, MACD_FAST);
    let slow = ema(prices, MACD_SLOW);

    // Align the fast series to the slow one's first index
    let offset = MACD_SLOW - MACD_FAST;
    let line: Vec<f64> = slow
        .iter()
        .zip(&fast[offset..])
        .map(|(s, f)| f - s)
        .collect();

    let signal = ema(&line, MACD_SIGNAL);
    let histogram = line.last()? - signal.last()?;

    let trend = if histogram > 0.0 {
        Trend::Bullish
    } else if histogram < 0.0 {
        Trend::Bearish
    } else {
        Trend::Sideways
    };

    Some(Macd { trend, histogram })
}
