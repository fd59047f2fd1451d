//! Turns raw LCD transactions into timeline events and balance deltas.

use chrono::{DateTime, NaiveDate, Utc};
use common::types::{Coin, RawMessage, TxSearchResponse};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use crate::model::{EventIcon, TimelineEvent};

pub const MICRO_PER_UNIT: u32 = 1_000_000;

pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const MSG_DELEGATE: &str = "/cosmos.staking.v1beta1.MsgDelegate";
pub const MSG_WITHDRAW_REWARD: &str = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";
pub const MSG_EXECUTE_CONTRACT: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid amount {amount:?}: {source}")]
    InvalidAmount {
        amount: String,
        #[source]
        source: rust_decimal::Error,
    },
    #[error("amount {0:?} out of range")]
    AmountOutOfRange(String),
    #[error("malformed {type_url} message: {source}")]
    MalformedMessage {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Scale a micro-unit amount string to display units. Empty means zero.
pub fn micro_to_units(amount: &str) -> Result<f64, ParseError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let micro = match Decimal::from_str(trimmed) {
        Ok(micro) => micro,
        Err(source) => {
            return wide_amount(trimmed).ok_or(ParseError::InvalidAmount {
                amount: amount.to_string(),
                source,
            });
        }
    };
    (micro / Decimal::from(MICRO_PER_UNIT))
        .to_f64()
        .ok_or_else(|| ParseError::AmountOutOfRange(amount.to_string()))
}

/// Plain digit strings wider than `Decimal` holds (factory tokens with 18
/// decimals) are scaled in `f64` instead.
fn wide_amount(s: &str) -> Option<f64> {
    let plain = s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && s.bytes().filter(|&b| b == b'.').count() <= 1;
    if !plain {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v / f64::from(MICRO_PER_UNIT))
}

/// Token attribution is always the native unit; the first coin is used whatever its denom.
fn first_coin_units(coins: &[Coin]) -> Result<f64, ParseError> {
    coins
        .first()
        .map_or(Ok(0.0), |coin| micro_to_units(&coin.amount))
}

#[derive(Debug, Deserialize)]
struct SendFields {
    #[serde(default)]
    from_address: String,
    #[serde(default)]
    to_address: String,
    #[serde(default)]
    amount: Vec<Coin>,
}

#[derive(Debug, Deserialize)]
struct DelegateFields {
    amount: Option<Coin>,
}

/// Message kinds the timeline understands. Anything else lands in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxMessage {
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },
    Delegate {
        amount: Option<Coin>,
    },
    WithdrawReward,
    ExecuteContract,
    Unknown {
        type_url: String,
    },
}

fn decode_fields<T: DeserializeOwned>(raw: &RawMessage) -> Result<T, ParseError> {
    serde_json::from_value(serde_json::Value::Object(raw.fields.clone())).map_err(|source| {
        ParseError::MalformedMessage {
            type_url: raw.type_url.clone(),
            source,
        }
    })
}

impl TxMessage {
    pub fn decode(raw: &RawMessage) -> Result<Self, ParseError> {
        Ok(match raw.type_url.as_str() {
            MSG_SEND => {
                let f: SendFields = decode_fields(raw)?;
                Self::Send {
                    from_address: f.from_address,
                    to_address: f.to_address,
                    amount: f.amount,
                }
            }
            MSG_DELEGATE => {
                let f: DelegateFields = decode_fields(raw)?;
                Self::Delegate { amount: f.amount }
            }
            MSG_WITHDRAW_REWARD => Self::WithdrawReward,
            MSG_EXECUTE_CONTRACT => Self::ExecuteContract,
            other => Self::Unknown {
                type_url: other.to_string(),
            },
        })
    }
}

/// One message rendered for the timeline plus its effect on the running balance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub event: TimelineEvent,
    pub delta: f64,
}

fn short_address(address: &str) -> String {
    address.chars().take(8).collect()
}

/// `"/cosmos.gov.v1beta1.MsgVote"` → `"MsgVote"`.
fn type_label(type_url: &str) -> &str {
    type_url.rsplit('.').next().unwrap_or(type_url)
}

pub fn parse_message(
    msg: &TxMessage,
    owner: &str,
    date: NaiveDate,
    symbol: &str,
) -> Result<ParsedMessage, ParseError> {
    let (action, description, icon, delta) = match msg {
        TxMessage::Send {
            from_address,
            to_address,
            amount,
        } => {
            let units = first_coin_units(amount)?;
            if from_address == owner {
                (
                    "Transfer",
                    format!(
                        "Sent {units:.4} {symbol} to {}...",
                        short_address(to_address)
                    ),
                    EventIcon::Transfer,
                    -units,
                )
            } else {
                (
                    "Transfer",
                    format!(
                        "Received {units:.4} {symbol} from {}...",
                        short_address(from_address)
                    ),
                    EventIcon::Transfer,
                    units,
                )
            }
        }
        TxMessage::Delegate { amount } => {
            let units = amount
                .as_ref()
                .map_or(Ok(0.0), |c| micro_to_units(&c.amount))?;
            (
                "Delegate",
                format!("Delegated {units:.4} {symbol} to validator"),
                EventIcon::Delegate,
                0.0,
            )
        }
        TxMessage::WithdrawReward => (
            "Claim Rewards",
            "Claimed staking rewards".to_string(),
            EventIcon::ClaimRewards,
            0.0,
        ),
        TxMessage::ExecuteContract => (
            "Smart Contract",
            "Executed smart contract".to_string(),
            EventIcon::SmartContract,
            0.0,
        ),
        TxMessage::Unknown { type_url } => (
            "Transaction",
            format!("{} transaction", type_label(type_url)),
            EventIcon::Generic,
            0.0,
        ),
    };

    Ok(ParsedMessage {
        event: TimelineEvent::new(date, action, description, icon),
        delta,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub messages: Vec<ParsedMessage>,
}

impl ParsedTransaction {
    pub fn delta(&self) -> f64 {
        self.messages.iter().map(|m| m.delta).sum()
    }
}

fn parse_date(timestamp: Option<&str>, now: DateTime<Utc>) -> NaiveDate {
    match timestamp.map(DateTime::parse_from_rfc3339) {
        Some(Ok(ts)) => ts.with_timezone(&Utc).date_naive(),
        Some(Err(e)) => {
            debug!(error = %e, "unparseable transaction timestamp, using today");
            now.date_naive()
        }
        None => now.date_naive(),
    }
}

/// Parse at most `max_transactions`, in the order the API returned them.
pub fn parse_transactions(
    resp: &TxSearchResponse,
    owner: &str,
    max_transactions: usize,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ParsedTransaction>, ParseError> {
    resp.txs
        .iter()
        .take(max_transactions)
        .enumerate()
        .map(|(i, tx)| {
            let timestamp = resp
                .tx_responses
                .get(i)
                .and_then(|r| r.timestamp.as_deref())
                .or(tx.timestamp.as_deref());
            let date = parse_date(timestamp, now);
            let messages = tx
                .body
                .iter()
                .flat_map(|b| b.messages.iter())
                .map(|raw| {
                    let msg = TxMessage::decode(raw)?;
                    parse_message(&msg, owner, date, symbol)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ParsedTransaction { date, messages })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const OWNER: &str = "sei1ownerqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";
    const OTHER: &str = "sei1otherzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn raw(value: serde_json::Value) -> RawMessage {
        serde_json::from_value(value).unwrap()
    }

    fn send(from: &str, to: &str, amount: &str) -> serde_json::Value {
        json!({
            "@type": MSG_SEND,
            "from_address": from,
            "to_address": to,
            "amount": [{"denom": "usei", "amount": amount}]
        })
    }

    fn parse_one(value: serde_json::Value) -> ParsedMessage {
        let msg = TxMessage::decode(&raw(value)).unwrap();
        parse_message(&msg, OWNER, day(), "SEI").unwrap()
    }

    #[test]
    fn test_micro_to_units() {
        assert!((micro_to_units("1000000").unwrap() - 1.0).abs() < 1e-12);
        assert!((micro_to_units("2500").unwrap() - 0.0025).abs() < 1e-12);
        assert!((micro_to_units("123456.789000000000000000").unwrap() - 0.123_456_789).abs() < 1e-12);
        assert!(micro_to_units("").unwrap().abs() < f64::EPSILON);
        assert!(matches!(
            micro_to_units("12abc"),
            Err(ParseError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_amount_wider_than_decimal_still_scales() {
        let units = micro_to_units("1000000000000000000000000000000").unwrap();
        assert!((units / 1e24 - 1.0).abs() < 1e-9);
        for bad in ["abc", "NaN", "1.2.3", "-"] {
            assert!(
                matches!(micro_to_units(bad), Err(ParseError::InvalidAmount { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_outgoing_transfer_of_one_million_micro_is_minus_one() {
        let parsed = parse_one(send(OWNER, OTHER, "1000000"));
        assert!((parsed.delta - -1.0).abs() < 1e-12);
        assert_eq!(parsed.event.action, "Transfer");
        assert_eq!(parsed.event.description, "Sent 1.0000 SEI to sei1othe...");
        assert_eq!(parsed.event.icon, EventIcon::Transfer);
        assert_eq!(parsed.event.date, day());
    }

    #[test]
    fn test_incoming_transfer_is_positive() {
        let parsed = parse_one(send(OTHER, OWNER, "2500000"));
        assert!((parsed.delta - 2.5).abs() < 1e-12);
        assert_eq!(
            parsed.event.description,
            "Received 2.5000 SEI from sei1othe..."
        );
    }

    #[test]
    fn test_transfer_without_coins_is_zero() {
        let parsed = parse_one(json!({
            "@type": MSG_SEND, "from_address": OWNER, "to_address": OTHER, "amount": []
        }));
        assert!(parsed.delta.abs() < f64::EPSILON);
    }

    #[test]
    fn test_delegate_is_informational() {
        let parsed = parse_one(json!({
            "@type": MSG_DELEGATE,
            "delegator_address": OWNER,
            "validator_address": "seivaloper1xyz",
            "amount": {"denom": "usei", "amount": "5000000"}
        }));
        assert!(parsed.delta.abs() < f64::EPSILON);
        assert_eq!(parsed.event.action, "Delegate");
        assert_eq!(parsed.event.description, "Delegated 5.0000 SEI to validator");
    }

    #[test]
    fn test_claim_and_contract_labels() {
        let claim = parse_one(json!({"@type": MSG_WITHDRAW_REWARD, "delegator_address": OWNER}));
        assert_eq!(claim.event.action, "Claim Rewards");
        assert_eq!(claim.event.icon, EventIcon::ClaimRewards);
        assert!(claim.delta.abs() < f64::EPSILON);

        let exec = parse_one(json!({"@type": MSG_EXECUTE_CONTRACT, "msg": {"swap": {}}}));
        assert_eq!(exec.event.action, "Smart Contract");
        assert_eq!(exec.event.description, "Executed smart contract");
    }

    #[test]
    fn test_unknown_tag_degrades_to_generic_event() {
        let parsed = parse_one(json!({"@type": "/cosmos.gov.v1beta1.MsgVote", "option": 1}));
        assert_eq!(parsed.event.action, "Transaction");
        assert_eq!(parsed.event.description, "MsgVote transaction");
        assert_eq!(parsed.event.icon, EventIcon::Generic);
        assert!(parsed.delta.abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_known_message_is_an_error() {
        let err = TxMessage::decode(&raw(json!({"@type": MSG_SEND, "amount": "oops"}))).unwrap_err();
        assert!(matches!(err, ParseError::MalformedMessage { .. }));
    }

    #[test]
    fn test_parse_transactions_caps_and_dates() {
        let txs: Vec<_> = (0..60)
            .map(|_| json!({"body": {"messages": [send(OTHER, OWNER, "1000000")]}}))
            .collect();
        let resp: TxSearchResponse = serde_json::from_value(json!({
            "txs": txs,
            "tx_responses": [{"timestamp": "2024-05-01T23:59:59Z"}, {"timestamp": "garbage"}]
        }))
        .unwrap();

        let parsed = parse_transactions(&resp, OWNER, 50, "SEI", now()).unwrap();
        assert_eq!(parsed.len(), 50);
        assert_eq!(parsed[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(parsed[1].date, now().date_naive());
        assert_eq!(parsed[2].date, now().date_naive());
        assert!((parsed[0].delta() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_transactions_without_body_has_no_messages() {
        let resp: TxSearchResponse = serde_json::from_value(json!({
            "txs": [{"timestamp": "2024-01-02T00:00:00Z"}]
        }))
        .unwrap();
        let parsed = parse_transactions(&resp, OWNER, 50, "SEI", now()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].messages.is_empty());
        assert_eq!(parsed[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_transactions_propagates_bad_amount() {
        let resp: TxSearchResponse = serde_json::from_value(json!({
            "txs": [{"body": {"messages": [send(OWNER, OTHER, "NaN-ish")]}}]
        }))
        .unwrap();
        assert!(parse_transactions(&resp, OWNER, 50, "SEI", now()).is_err());
    }
}
