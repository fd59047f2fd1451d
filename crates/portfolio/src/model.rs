//! Snapshot types returned to callers. Field names follow the JSON contract (camelCase).

use chrono::NaiveDate;
use common::types::Network;
use serde::{Deserialize, Serialize};

/// One point on the portfolio chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Glyph shown next to a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventIcon {
    #[serde(rename = "💸")]
    Transfer,
    #[serde(rename = "🔗")]
    Delegate,
    #[serde(rename = "🎁")]
    ClaimRewards,
    #[serde(rename = "⚡")]
    SmartContract,
    #[serde(rename = "📝")]
    Generic,
    #[serde(rename = "🥩")]
    Staking,
    #[serde(rename = "💰")]
    PendingRewards,
    #[serde(rename = "⚠️")]
    Fallback,
    #[serde(rename = "✅")]
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub action: String,
    pub description: String,
    pub icon: EventIcon,
}

impl TimelineEvent {
    pub fn new(
        date: NaiveDate,
        action: impl Into<String>,
        description: impl Into<String>,
        icon: EventIcon,
    ) -> Self {
        Self {
            date,
            action: action.into(),
            description: description.into(),
            icon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTrade {
    pub token: String,
    pub gain: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstTrade {
    pub token: String,
    pub loss: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalGainLoss {
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GainLossSummary {
    pub best_trade: BestTrade,
    pub worst_trade: WorstTrade,
    pub total_gain_loss: TotalGainLoss,
}

/// Result of one lookup for a wallet/network pair. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub wallet_address: String,
    pub network: Network,
    pub chart_series: Vec<ChartPoint>,
    pub timeline_events: Vec<TimelineEvent>,
    pub summary: GainLossSummary,
}

/// Wire response for a portfolio lookup: the snapshot, plus a disclosure
/// string when it was replaced by fallback data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    #[serde(flatten)]
    pub snapshot: PortfolioSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PortfolioResponse {
    pub fn live(snapshot: PortfolioSnapshot) -> Self {
        Self {
            snapshot,
            api_error: None,
            error: None,
        }
    }

    /// Upstream chain data could not be used.
    pub fn api_fallback(snapshot: PortfolioSnapshot, reason: &str) -> Self {
        Self {
            snapshot,
            api_error: Some(format!("Sei API integration failed: {reason}")),
            error: None,
        }
    }

    /// The request itself could not be processed.
    pub fn request_fallback(snapshot: PortfolioSnapshot, reason: &str) -> Self {
        Self {
            snapshot,
            api_error: None,
            error: Some(format!("Function error: {reason}")),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.api_error.is_some() || self.error.is_some()
    }
}
