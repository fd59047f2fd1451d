use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::types::Network;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub web: Option<Web>,
    pub fetch: Fetch,
    pub portfolio: Portfolio,
    pub llm: Llm,
    pub networks: NetworkTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

/// Upstream chain REST settings. Every read is a single attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct Fetch {
    pub timeout_secs: u64,
    pub tx_limit: u32,
    pub user_agent: String,
}

impl Fetch {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Portfolio {
    pub native_denom: String,
    pub display_symbol: String,
    pub max_transactions: usize,
    pub max_chart_points: usize,
    pub max_timeline_events: usize,
    pub fallback_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Llm {
    pub api_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Llm {
    /// API key from the environment variable named by `api_key_env`.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One chain REST (LCD) endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NetworkEndpoint {
    pub lcd: String,
    pub name: String,
}

/// Read-only table of the supported networks, handed to whoever needs to reach the chain.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkTable {
    pub mainnet: NetworkEndpoint,
    pub testnet: NetworkEndpoint,
    pub devnet: NetworkEndpoint,
}

impl NetworkTable {
    pub fn endpoint(&self, network: Network) -> &NetworkEndpoint {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
            Network::Devnet => &self.devnet,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let p = &self.portfolio;
        if p.fallback_days == 0 {
            bail!("portfolio.fallback_days must be at least 1");
        }
        if p.max_chart_points == 0 {
            bail!("portfolio.max_chart_points must be at least 1");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
