use serde::{Deserialize, Serialize};

use crate::model::PortfolioSnapshot;

const ACTIVE_TRADER_EVENTS: usize = 20;
const CONSERVATIVE_HOLDER_EVENTS: usize = 5;
const STRONG_PERFORMANCE_PCT: f64 = 20.0;
const LOSSES_PCT: f64 = -10.0;

/// Aggregate statistics handed to the insight generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeData {
    pub total_trades: usize,
    #[serde(rename = "volumeUSD")]
    pub volume_usd: f64,
    pub net_gain_loss_percent: f64,
    pub best_token: String,
    pub worst_token: String,
    pub trading_behavior: String,
}

fn or_native(token: &str, fallback: &str) -> String {
    if token.is_empty() {
        fallback.to_string()
    } else {
        token.to_string()
    }
}

pub fn trading_behavior(total_trades: usize, net_gain_loss_percent: f64) -> String {
    let activity = if total_trades > ACTIVE_TRADER_EVENTS {
        "Active trader"
    } else if total_trades < CONSERVATIVE_HOLDER_EVENTS {
        "Conservative holder"
    } else {
        "Moderate trader"
    };
    let performance = if net_gain_loss_percent > STRONG_PERFORMANCE_PCT {
        "with strong performance"
    } else if net_gain_loss_percent < LOSSES_PCT {
        "experiencing losses"
    } else {
        "with steady performance"
    };
    format!("{activity} {performance}")
}

impl TradeData {
    /// Volume is approximated by the highest portfolio value on the chart.
    pub fn from_snapshot(snapshot: &PortfolioSnapshot, native_symbol: &str) -> Self {
        let total_trades = snapshot.timeline_events.len();
        let volume_usd = snapshot
            .chart_series
            .iter()
            .map(|p| p.value)
            .reduce(f64::max)
            .unwrap_or(0.0);
        let net_gain_loss_percent = snapshot.summary.total_gain_loss.percentage;

        Self {
            total_trades,
            volume_usd,
            net_gain_loss_percent,
            best_token: or_native(&snapshot.summary.best_trade.token, native_symbol),
            worst_token: or_native(&snapshot.summary.worst_trade.token, native_symbol),
            trading_behavior: trading_behavior(total_trades, net_gain_loss_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::generate_fallback_with;
    use chrono::NaiveDate;
    use common::types::Network;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_behavior_labels() {
        assert_eq!(trading_behavior(25, 30.0), "Active trader with strong performance");
        assert_eq!(trading_behavior(3, -12.0), "Conservative holder experiencing losses");
        assert_eq!(trading_behavior(10, 5.0), "Moderate trader with steady performance");
        assert_eq!(trading_behavior(20, 20.0), "Moderate trader with steady performance");
        assert_eq!(trading_behavior(5, -10.0), "Moderate trader with steady performance");
    }

    #[test]
    fn test_from_fallback_snapshot() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut snap = generate_fallback_with(
            &mut rng,
            "sei1x",
            Network::Mainnet,
            "down",
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            30,
            "SEI",
        );
        snap.summary.worst_trade.token = String::new();

        let data = TradeData::from_snapshot(&snap, "SEI");
        let max = snap.chart_series.iter().map(|p| p.value).fold(0.0, f64::max);
        assert_eq!(data.total_trades, 3);
        assert_eq!(data.volume_usd, max);
        assert_eq!(data.net_gain_loss_percent, 21.54);
        assert_eq!(data.worst_token, "SEI");
        assert_eq!(data.trading_behavior, "Conservative holder with strong performance");
    }

    #[test]
    fn test_wire_names() {
        let data = TradeData {
            total_trades: 7,
            volume_usd: 1234.5,
            net_gain_loss_percent: -3.2,
            best_token: "SEI".to_string(),
            worst_token: "SEI".to_string(),
            trading_behavior: "Moderate trader with steady performance".to_string(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["volumeUSD"], 1234.5);
        assert_eq!(json["totalTrades"], 7);
        assert_eq!(json["netGainLossPercent"], -3.2);
        assert_eq!(json["tradingBehavior"], "Moderate trader with steady performance");
    }
}
