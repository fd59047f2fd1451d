use crate::config::{Fetch, NetworkEndpoint};
use crate::types::{
    AccountResponse, BalancesResponse, DelegationsResponse, RewardsResponse, TxSearchResponse,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Coarse failure class for upstream calls, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Timeout,
    Connect,
    HttpStatus,
    Decode,
    Other,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::HttpStatus => "http_status",
            Self::Decode => "decode",
            Self::Other => "other",
        }
    }
}

/// Returned for non-2xx responses so callers can tell them apart from transport errors.
#[derive(Debug, thiserror::Error)]
#[error("Sei API error: {status} at {url}")]
pub struct HttpStatusError {
    pub status: reqwest::StatusCode,
    pub url: String,
}

pub fn classify_anyhow_api_error(err: &anyhow::Error) -> ApiErrorKind {
    if err.downcast_ref::<HttpStatusError>().is_some() {
        return ApiErrorKind::HttpStatus;
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return ApiErrorKind::Decode;
    }
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_timeout() => ApiErrorKind::Timeout,
        Some(e) if e.is_connect() => ApiErrorKind::Connect,
        Some(e) if e.is_decode() || e.is_body() => ApiErrorKind::Decode,
        _ => ApiErrorKind::Other,
    }
}

/// REST (LCD) client for one Sei network. Single attempt per request, no retries.
#[derive(Debug, Clone)]
pub struct SeiClient {
    base_url: String,
    network_name: String,
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
}

impl SeiClient {
    /// `client` is shared across networks and requests; only the endpoint differs.
    pub fn new(client: reqwest::Client, endpoint: &NetworkEndpoint, fetch: &Fetch) -> Self {
        Self {
            base_url: endpoint.lcd.trim_end_matches('/').to_string(),
            network_name: endpoint.name.clone(),
            client,
            timeout: fetch.timeout(),
            user_agent: fetch.user_agent.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    pub fn balances_url(&self, address: &str) -> String {
        format!("{}/cosmos/bank/v1beta1/balances/{address}", self.base_url)
    }

    pub fn account_url(&self, address: &str) -> String {
        format!("{}/cosmos/auth/v1beta1/accounts/{address}", self.base_url)
    }

    /// Sender or recipient of any transfer, newest first.
    pub fn transactions_url(&self, address: &str, limit: u32) -> String {
        let query = format!(
            "message.sender='{address}' OR transfer.recipient='{address}' OR transfer.sender='{address}'"
        );
        format!(
            "{}/cosmos/tx/v1beta1/txs?events={}&limit={limit}&order_by=ORDER_BY_DESC",
            self.base_url,
            urlencoding::encode(&query)
        )
    }

    pub fn delegations_url(&self, address: &str) -> String {
        format!(
            "{}/cosmos/staking/v1beta1/delegations/{address}",
            self.base_url
        )
    }

    pub fn rewards_url(&self, address: &str) -> String {
        format!(
            "{}/cosmos/distribution/v1beta1/delegators/{address}/rewards",
            self.base_url
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!(url = %url, network = %self.network_name, "fetching from Sei API");

        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HttpStatusError { status, url }.into());
        }

        let body = resp.bytes().await?;
        let parsed = serde_json::from_slice(&body)
            .with_context(|| format!("failed to decode Sei API response from {url}"))?;
        Ok(parsed)
    }

    pub async fn fetch_balances(&self, address: &str) -> Result<BalancesResponse> {
        self.get_json(self.balances_url(address)).await
    }

    pub async fn fetch_transactions(&self, address: &str, limit: u32) -> Result<TxSearchResponse> {
        self.get_json(self.transactions_url(address, limit)).await
    }

    pub async fn fetch_account(&self, address: &str) -> Result<AccountResponse> {
        self.get_json(self.account_url(address)).await
    }

    pub async fn fetch_delegations(&self, address: &str) -> Result<DelegationsResponse> {
        self.get_json(self.delegations_url(address)).await
    }

    pub async fn fetch_rewards(&self, address: &str) -> Result<RewardsResponse> {
        self.get_json(self.rewards_url(address)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDR: &str = "sei1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";

    fn fetch_settings() -> Fetch {
        Fetch {
            timeout_secs: 5,
            tx_limit: 50,
            user_agent: "Sei-Portfolio-Tracker/1.0".to_string(),
        }
    }

    fn client_for(base: &str) -> SeiClient {
        let endpoint = NetworkEndpoint {
            lcd: format!("{base}/"),
            name: "Pacific-1".to_string(),
        };
        SeiClient::new(reqwest::Client::new(), &endpoint, &fetch_settings())
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = client_for("https://rest.sei-apis.com");
        assert_eq!(
            client.balances_url(ADDR),
            format!("https://rest.sei-apis.com/cosmos/bank/v1beta1/balances/{ADDR}")
        );
        assert!(client
            .rewards_url(ADDR)
            .ends_with(&format!("/delegators/{ADDR}/rewards")));
        assert_eq!(client.network_name(), "Pacific-1");
    }

    #[test]
    fn test_transactions_url_encodes_event_query() {
        let client = client_for("https://rest.sei-apis.com");
        let url = client.transactions_url(ADDR, 50);
        assert!(url.contains("/cosmos/tx/v1beta1/txs?events="));
        assert!(url.contains("limit=50"));
        assert!(url.contains("order_by=ORDER_BY_DESC"));
        assert!(url.contains("message.sender%3D%27sei1"));
        assert!(url.contains("%20OR%20transfer.recipient"));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn test_fetch_balances_sends_headers_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/cosmos/bank/v1beta1/balances/{ADDR}")))
            .and(header("accept", "application/json"))
            .and(header("user-agent", "Sei-Portfolio-Tracker/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "balances": [{"denom": "usei", "amount": "42000000"}]
            })))
            .mount(&server)
            .await;

        let balances = client_for(&server.uri()).fetch_balances(ADDR).await.unwrap();
        assert_eq!(balances.find("usei").unwrap().amount, "42000000");
    }

    #[tokio::test]
    async fn test_fetch_transactions_passes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .and(query_param("limit", "50"))
            .and(query_param("order_by", "ORDER_BY_DESC"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"txs": []})),
            )
            .mount(&server)
            .await;

        let txs = client_for(&server.uri())
            .fetch_transactions(ADDR, 50)
            .await
            .unwrap();
        assert!(txs.txs.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .fetch_delegations(ADDR)
            .await
            .unwrap_err();
        assert_eq!(classify_anyhow_api_error(&err), ApiErrorKind::HttpStatus);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_invalid_body_is_classified_as_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .fetch_account(ADDR)
            .await
            .unwrap_err();
        assert_eq!(classify_anyhow_api_error(&err), ApiErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_refused_connection_is_classified_as_connect() {
        let err = client_for("http://127.0.0.1:9")
            .fetch_rewards(ADDR)
            .await
            .unwrap_err();
        assert_eq!(classify_anyhow_api_error(&err), ApiErrorKind::Connect);
    }
}
