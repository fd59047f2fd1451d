use anyhow::Result;
use common::sei::{classify_anyhow_api_error, SeiClient};
use common::types::{
    AccountResponse, BalancesResponse, DelegationsResponse, RewardsResponse, TxSearchResponse,
};
use std::future::Future;
use std::time::Instant;
use tracing::warn;

/// The five independent account reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Balance,
    Transactions,
    Account,
    Delegations,
    Rewards,
}

impl DataSource {
    pub const ALL: [DataSource; 5] = [
        Self::Balance,
        Self::Transactions,
        Self::Account,
        Self::Delegations,
        Self::Rewards,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Transactions => "transactions",
            Self::Account => "account",
            Self::Delegations => "delegations",
            Self::Rewards => "rewards",
        }
    }
}

pub trait ChainApi {
    fn balances(&self, address: &str) -> impl Future<Output = Result<BalancesResponse>> + Send;

    fn transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> impl Future<Output = Result<TxSearchResponse>> + Send;

    fn account(&self, address: &str) -> impl Future<Output = Result<AccountResponse>> + Send;

    fn delegations(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<DelegationsResponse>> + Send;

    fn rewards(&self, address: &str) -> impl Future<Output = Result<RewardsResponse>> + Send;
}

/// Records request count, latency and error class for one upstream call.
async fn instrumented<T>(source: DataSource, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let endpoint = source.as_str();
    let start = Instant::now();
    let res = fut.await;
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("portfolio_upstream_latency_ms", "endpoint" => endpoint).record(ms);
    match &res {
        Ok(_) => {
            metrics::counter!("portfolio_upstream_requests_total", "endpoint" => endpoint, "status" => "ok").increment(1);
        }
        Err(e) => {
            metrics::counter!("portfolio_upstream_requests_total", "endpoint" => endpoint, "status" => "error").increment(1);
            metrics::counter!(
                "portfolio_upstream_errors_total",
                "endpoint" => endpoint,
                "kind" => classify_anyhow_api_error(e).as_str()
            )
            .increment(1);
        }
    }
    res
}

impl ChainApi for SeiClient {
    async fn balances(&self, address: &str) -> Result<BalancesResponse> {
        instrumented(DataSource::Balance, self.fetch_balances(address)).await
    }

    async fn transactions(&self, address: &str, limit: u32) -> Result<TxSearchResponse> {
        instrumented(
            DataSource::Transactions,
            self.fetch_transactions(address, limit),
        )
        .await
    }

    async fn account(&self, address: &str) -> Result<AccountResponse> {
        instrumented(DataSource::Account, self.fetch_account(address)).await
    }

    async fn delegations(&self, address: &str) -> Result<DelegationsResponse> {
        instrumented(DataSource::Delegations, self.fetch_delegations(address)).await
    }

    async fn rewards(&self, address: &str) -> Result<RewardsResponse> {
        instrumented(DataSource::Rewards, self.fetch_rewards(address)).await
    }
}

/// Whatever the five reads produced. A `None` slot failed and contributes nothing.
#[derive(Debug, Clone, Default)]
pub struct AccountData {
    pub balance: Option<BalancesResponse>,
    pub transactions: Option<TxSearchResponse>,
    pub account: Option<AccountResponse>,
    pub delegations: Option<DelegationsResponse>,
    pub rewards: Option<RewardsResponse>,
    /// `(source, error message)` for each failed read.
    pub failures: Vec<(DataSource, String)>,
}

impl AccountData {
    pub fn succeeded(&self) -> usize {
        [
            self.balance.is_some(),
            self.transactions.is_some(),
            self.account.is_some(),
            self.delegations.is_some(),
            self.rewards.is_some(),
        ]
        .into_iter()
        .filter(|ok| *ok)
        .count()
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }
}

fn settle<T>(
    source: DataSource,
    res: Result<T>,
    failures: &mut Vec<(DataSource, String)>,
) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(source = source.as_str(), error = %e, "failed to fetch from Sei API");
            failures.push((source, format!("{e:#}")));
            None
        }
    }
}

/// Fire all five reads at once and keep whatever succeeds. Never fails.
pub async fn fetch_account_data<A: ChainApi + Sync>(
    api: &A,
    address: &str,
    tx_limit: u32,
) -> AccountData {
    let (balance, transactions, account, delegations, rewards) = tokio::join!(
        api.balances(address),
        api.transactions(address, tx_limit),
        api.account(address),
        api.delegations(address),
        api.rewards(address),
    );

    let mut failures = Vec::new();
    AccountData {
        balance: settle(DataSource::Balance, balance, &mut failures),
        transactions: settle(DataSource::Transactions, transactions, &mut failures),
        account: settle(DataSource::Account, account, &mut failures),
        delegations: settle(DataSource::Delegations, delegations, &mut failures),
        rewards: settle(DataSource::Rewards, rewards, &mut failures),
        failures,
    }
}
