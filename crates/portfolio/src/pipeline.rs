//! Fetch → parse → build, degrading to labelled fallback data.

use chrono::{DateTime, NaiveDate, Utc};
use common::config::Portfolio;
use common::types::{AccountResponse, Network};
use tracing::{debug, info, warn};

use crate::fallback::generate_fallback;
use crate::fetcher::{fetch_account_data, AccountData, ChainApi, DataSource};
use crate::model::{EventIcon, PortfolioResponse, PortfolioSnapshot, TimelineEvent};
use crate::parser::{micro_to_units, parse_transactions, ParseError, ParsedTransaction};
use crate::series::{build_series, chronological};
use crate::summary::summarize;

/// Terminal state of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Built,
    ApiFallback,
    RequestFallback,
}

impl SnapshotOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::ApiFallback => "api_fallback",
            Self::RequestFallback => "request_fallback",
        }
    }
}

fn record_outcome(outcome: SnapshotOutcome) {
    metrics::counter!("portfolio_snapshots_total", "outcome" => outcome.as_str()).increment(1);
}

fn staking_event(data: &AccountData, today: NaiveDate) -> Option<TimelineEvent> {
    let count = data.delegations.as_ref()?.delegation_responses.len();
    (count > 0).then(|| {
        TimelineEvent::new(
            today,
            "Active Staking",
            format!("{count} active delegation(s)"),
            EventIcon::Staking,
        )
    })
}

fn rewards_event(
    data: &AccountData,
    symbol: &str,
    today: NaiveDate,
) -> Result<Option<TimelineEvent>, ParseError> {
    let Some(rewards) = data.rewards.as_ref().filter(|r| !r.total.is_empty()) else {
        return Ok(None);
    };
    let mut pending = 0.0;
    for coin in &rewards.total {
        pending += micro_to_units(&coin.amount)?;
    }
    Ok(Some(TimelineEvent::new(
        today,
        "Pending Rewards",
        format!("{pending:.4} {symbol} available to claim"),
        EventIcon::PendingRewards,
    )))
}

/// Account-level events first, then one event per message; newest first,
/// capped at `max_timeline_events`.
fn assemble_timeline(
    data: &AccountData,
    transactions: &[ParsedTransaction],
    settings: &Portfolio,
    today: NaiveDate,
) -> Result<Vec<TimelineEvent>, ParseError> {
    let mut events: Vec<TimelineEvent> = rewards_event(data, &settings.display_symbol, today)?
        .into_iter()
        .chain(staking_event(data, today))
        .collect();
    events.extend(
        transactions
            .iter()
            .flat_map(|tx| tx.messages.iter().map(|m| m.event.clone())),
    );
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events.truncate(settings.max_timeline_events);
    Ok(events)
}

/// Derive a snapshot from whatever the fetcher returned. Missing slots
/// contribute nothing; a malformed amount or message is an error.
pub fn build_snapshot(
    data: &AccountData,
    address: &str,
    network: Network,
    settings: &Portfolio,
    now: DateTime<Utc>,
) -> Result<PortfolioSnapshot, ParseError> {
    let today = now.date_naive();

    if let Some(kind) = data.account.as_ref().and_then(AccountResponse::account_type) {
        debug!(wallet = address, account_type = kind, "account info fetched");
    }

    let opening = match data
        .balance
        .as_ref()
        .and_then(|b| b.find(&settings.native_denom))
    {
        Some(coin) => micro_to_units(&coin.amount)?,
        None => 0.0,
    };

    let transactions = match &data.transactions {
        Some(resp) => parse_transactions(
            resp,
            address,
            settings.max_transactions,
            &settings.display_symbol,
            now,
        )?,
        None => Vec::new(),
    };
    debug!(
        wallet = address,
        transactions = transactions.len(),
        "parsed transactions"
    );

    let samples = build_series(opening, &transactions, settings.max_chart_points, today);
    let chart_series = chronological(&samples);
    let summary = summarize(&chart_series, &settings.display_symbol);
    let timeline_events = assemble_timeline(data, &transactions, settings, today)?;

    Ok(PortfolioSnapshot {
        wallet_address: address.to_string(),
        network,
        chart_series,
        timeline_events,
        summary,
    })
}

fn fallback_snapshot(
    address: &str,
    network: Network,
    reason: &str,
    settings: &Portfolio,
    today: NaiveDate,
) -> PortfolioSnapshot {
    generate_fallback(
        address,
        network,
        reason,
        today,
        settings.fallback_days as usize,
        &settings.display_symbol,
    )
}

fn all_failed_reason(data: &AccountData) -> String {
    match data.failures.first() {
        Some((source, err)) => format!(
            "all {} requests failed ({}: {err})",
            DataSource::ALL.len(),
            source.as_str()
        ),
        None => "no data returned".to_string(),
    }
}

/// Full lookup for one wallet. Never fails: unusable upstream data turns
/// into a fallback snapshot with `apiError` set.
pub async fn fetch_portfolio<A: ChainApi + Sync>(
    api: &A,
    address: &str,
    network: Network,
    settings: &Portfolio,
    tx_limit: u32,
    now: DateTime<Utc>,
) -> PortfolioResponse {
    let data = fetch_account_data(api, address, tx_limit).await;
    info!(
        wallet = address,
        network = network.as_str(),
        succeeded = data.succeeded(),
        total = DataSource::ALL.len(),
        "Sei API data fetch complete"
    );

    let built = if data.all_failed() {
        Err(all_failed_reason(&data))
    } else {
        build_snapshot(&data, address, network, settings, now).map_err(|e| e.to_string())
    };

    match built {
        Ok(snapshot) => {
            record_outcome(SnapshotOutcome::Built);
            info!(
                wallet = address,
                points = snapshot.chart_series.len(),
                events = snapshot.timeline_events.len(),
                "portfolio snapshot built"
            );
            PortfolioResponse::live(snapshot)
        }
        Err(reason) => {
            record_outcome(SnapshotOutcome::ApiFallback);
            warn!(wallet = address, network = network.as_str(), %reason, "serving fallback portfolio");
            let snapshot = fallback_snapshot(
                address,
                network,
                &format!("API Error: {reason}"),
                settings,
                now.date_naive(),
            );
            PortfolioResponse::api_fallback(snapshot, &reason)
        }
    }
}

/// Fallback for a request that could not be processed at all.
pub fn request_fallback(
    address: &str,
    network: Network,
    reason: &str,
    settings: &Portfolio,
    now: DateTime<Utc>,
) -> PortfolioResponse {
    record_outcome(SnapshotOutcome::RequestFallback);
    warn!(wallet = address, %reason, "request failed, serving fallback portfolio");
    let snapshot = fallback_snapshot(
        address,
        network,
        &format!("Function error: {reason}"),
        settings,
        now.date_naive(),
    );
    PortfolioResponse::request_fallback(snapshot, reason)
}
