use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Sei networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Self::Mainnet, Self::Testnet, Self::Devnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNetwork(pub String);

impl fmt::Display for UnknownNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network: {}", self.0)
    }
}

impl std::error::Error for UnknownNetwork {}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| UnknownNetwork(s.to_string()))
    }
}

/// `{denom, amount}` pair. Amounts stay as strings: bank coins are integer
/// micro-units, distribution coins are 18-decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// `/cosmos/bank/v1beta1/balances/{address}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalancesResponse {
    #[serde(default)]
    pub balances: Vec<Coin>,
}

impl BalancesResponse {
    pub fn find(&self, denom: &str) -> Option<&Coin> {
        self.balances.iter().find(|c| c.denom == denom)
    }
}

/// `/cosmos/tx/v1beta1/txs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxSearchResponse {
    #[serde(default)]
    pub txs: Vec<Tx>,
    #[serde(default)]
    pub tx_responses: Vec<TxResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tx {
    pub body: Option<TxBody>,
    /// Not part of the LCD schema; some indexers inline it.
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxBody {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

/// A transaction message as returned by the LCD: a `@type` tag plus type-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxResponse {
    pub txhash: Option<String>,
    pub height: Option<String>,
    pub timestamp: Option<String>,
}

/// `/cosmos/auth/v1beta1/accounts/{address}`; the account body is polymorphic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: Option<serde_json::Value>,
}

impl AccountResponse {
    pub fn account_type(&self) -> Option<&str> {
        self.account.as_ref()?.get("@type")?.as_str()
    }
}

/// `/cosmos/staking/v1beta1/delegations/{address}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationsResponse {
    #[serde(default)]
    pub delegation_responses: Vec<DelegationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationResponse {
    pub delegation: Option<Delegation>,
    pub balance: Option<Coin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: Option<String>,
    pub validator_address: Option<String>,
    pub shares: Option<String>,
}

/// `/cosmos/distribution/v1beta1/delegators/{address}/rewards`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardsResponse {
    #[serde(default)]
    pub rewards: Vec<ValidatorReward>,
    #[serde(default)]
    pub total: Vec<Coin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorReward {
    pub validator_address: Option<String>,
    #[serde(default)]
    pub reward: Vec<Coin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_round_trips_through_str() {
        for n in Network::ALL {
            assert_eq!(n.as_str().parse::<Network>().unwrap(), n);
        }
        assert_eq!(
            "localnet".parse::<Network>().unwrap_err(),
            UnknownNetwork("localnet".to_string())
        );
    }

    #[test]
    fn test_parse_balances_response() {
        let json = r#"{"balances":[{"denom":"factory/x/y","amount":"7"},{"denom":"usei","amount":"2500000"}],"pagination":{"next_key":null,"total":"2"}}"#;
        let resp: BalancesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.find("usei").unwrap().amount, "2500000");
        assert!(resp.find("uatom").is_none());
    }

    #[test]
    fn test_parse_tx_search_response_keeps_message_fields() {
        let json = r#"{
            "txs": [{"body": {"messages": [{
                "@type": "/cosmos.bank.v1beta1.MsgSend",
                "from_address": "sei1from",
                "to_address": "sei1to",
                "amount": [{"denom": "usei", "amount": "1000000"}]
            }]}}],
            "tx_responses": [{"txhash": "ABC", "height": "10", "timestamp": "2024-03-01T12:00:00Z"}],
            "total": "1"
        }"#;
        let resp: TxSearchResponse = serde_json::from_str(json).unwrap();
        let msg = &resp.txs[0].body.as_ref().unwrap().messages[0];
        assert_eq!(msg.type_url, "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(msg.fields["from_address"], "sei1from");
        assert_eq!(
            resp.tx_responses[0].timestamp.as_deref(),
            Some("2024-03-01T12:00:00Z")
        );
    }

    #[test]
    fn test_parse_empty_objects_default_to_empty_lists() {
        let txs: TxSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(txs.txs.is_empty());
        let rewards: RewardsResponse = serde_json::from_str("{}").unwrap();
        assert!(rewards.total.is_empty());
        let delegations: DelegationsResponse = serde_json::from_str("{}").unwrap();
        assert!(delegations.delegation_responses.is_empty());
    }

    #[test]
    fn test_account_type() {
        let json = r#"{"account":{"@type":"/cosmos.auth.v1beta1.BaseAccount","address":"sei1x","sequence":"4"}}"#;
        let resp: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.account_type(),
            Some("/cosmos.auth.v1beta1.BaseAccount")
        );
    }
}
