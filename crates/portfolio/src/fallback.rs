//! Labelled synthetic snapshot used when live chain data is unavailable.

use chrono::{Duration, NaiveDate};
use common::types::Network;
use rand::Rng;

use crate::model::{
    BestTrade, ChartPoint, EventIcon, GainLossSummary, PortfolioSnapshot, TimelineEvent,
    TotalGainLoss, WorstTrade,
};

const BASE_VALUE: f64 = 1000.0;
const NOISE_RANGE: f64 = 500.0;
const DAILY_STEP: f64 = 10.0;

/// Fixed figures shown alongside synthetic data.
pub fn fallback_summary(symbol: &str) -> GainLossSummary {
    GainLossSummary {
        best_trade: BestTrade {
            token: symbol.to_string(),
            gain: 150.50,
            percentage: 15.05,
        },
        worst_trade: WorstTrade {
            token: symbol.to_string(),
            loss: -75.25,
            percentage: -7.53,
        },
        total_gain_loss: TotalGainLoss {
            amount: 275.80,
            percentage: 21.54,
        },
    }
}

/// `days` consecutive points ending on `today`. The value for day offset `i`
/// (counted back from today) is `1000 + U[0, 500) + 10 i`.
pub fn fallback_series<R: Rng>(rng: &mut R, today: NaiveDate, days: usize) -> Vec<ChartPoint> {
    (0..days)
        .rev()
        .map(|i| {
            let offset = i as i64;
            ChartPoint {
                date: today - Duration::days(offset),
                value: BASE_VALUE + rng.gen_range(0.0..NOISE_RANGE) + offset as f64 * DAILY_STEP,
            }
        })
        .collect()
}

fn fallback_timeline(
    network: Network,
    reason: &str,
    today: NaiveDate,
    symbol: &str,
) -> Vec<TimelineEvent> {
    vec![
        TimelineEvent::new(
            today,
            "Fallback Data",
            format!("Sei {network} REST API unavailable, showing sample data. {reason}"),
            EventIcon::Fallback,
        ),
        TimelineEvent::new(
            today - Duration::days(1),
            "Sample Transaction",
            format!("Simulated {symbol} transfer for demonstration"),
            EventIcon::Transfer,
        ),
        TimelineEvent::new(
            today - Duration::days(2),
            "Sample Health Check",
            "Placeholder entry, live data unavailable",
            EventIcon::Check,
        ),
    ]
}

pub fn generate_fallback_with<R: Rng>(
    rng: &mut R,
    address: &str,
    network: Network,
    reason: &str,
    today: NaiveDate,
    days: usize,
    symbol: &str,
) -> PortfolioSnapshot {
    PortfolioSnapshot {
        wallet_address: address.to_string(),
        network,
        chart_series: fallback_series(rng, today, days),
        timeline_events: fallback_timeline(network, reason, today, symbol),
        summary: fallback_summary(symbol),
    }
}

pub fn generate_fallback(
    address: &str,
    network: Network,
    reason: &str,
    today: NaiveDate,
    days: usize,
    symbol: &str,
) -> PortfolioSnapshot {
    generate_fallback_with(
        &mut rand::thread_rng(),
        address,
        network,
        reason,
        today,
        days,
        symbol,
    )
}
