//! Provider management for HTTP RPC connections.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use tracing::debug;

/// RPC endpoint handle for chain reads.
///
/// Holds the endpoint configuration and builds providers on demand, so no
/// connection state outlives a single sweep invocation.
#[derive(Debug, Clone)]
pub struct ProviderManager {
    http_url: String,
    chain_id: u64,
}

impl ProviderManager {
    /// Create a new provider manager for the given HTTP endpoint.
    pub fn new(http_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            http_url: http_url.into(),
            chain_id,
        }
    }

    /// The configured HTTP RPC endpoint.
    pub fn http_url(&self) -> &str {
        &self.http_url
    }

    /// The configured chain identifier.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Fetch the current network gas price in wei.
    pub async fn get_gas_price(&self) -> Result<u128> {
        let provider = ProviderBuilder::new()
            .on_http(self.http_url.parse().context("invalid RPC url")?);
        let gas_price = provider
            .get_gas_price()
            .await
            .context("eth_gasPrice request failed")?;

        debug!(gas_price, "Fetched network gas price");
        Ok(gas_price)
    }
}
