//! Position store client for paging open LSA positions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle status of a position. Owned and mutated by the order-management
/// subsystem; the liquidator only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Buying,
    Bought,
    Selling,
    Sold,
}

/// An open collateralized position as stored upstream.
///
/// `lsa` is globally unique and parses to the EVM address used as the sole
/// key for on-chain liquidation calls. Monetary fields are kept as strings,
/// matching the upstream schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub lsa: String,
    pub instrument: String,
    pub insurance_amount: String,
    pub price: String,
    /// Reference index price at open.
    pub index_price: f64,
    pub order_id: String,
    pub contracts_amount: f64,
    pub status: PositionStatus,
    #[serde(default)]
    pub insurance_id_update: Option<String>,
    #[serde(default)]
    pub sell_order_id: Option<String>,
    pub selling_price: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// HTTP client for the position persistence service.
pub struct PositionClient {
    client: reqwest::Client,
    base_url: String,
}

impl PositionClient {
    /// Create a new position store client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Total number of stored positions.
    pub async fn count(&self) -> Result<u64> {
        let url = format!("{}/positions/count", self.base_url);
        let resp: CountResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("position count request failed")?
            .error_for_status()
            .context("position store returned an error status")?
            .json()
            .await
            .context("position count payload is not valid JSON")?;

        debug!(count = resp.count, "Fetched position count");
        Ok(resp.count)
    }

    /// Fetch one page of positions. Ordering is stable within a sweep.
    pub async fn page(&self, limit: u64, offset: u64) -> Result<Vec<Position>> {
        let url = format!(
            "{}/positions?limit={}&offset={}",
            self.base_url, limit, offset
        );
        let positions: Vec<Position> = self
            .client
            .get(&url)
            .send()
            .await
            .context("position page request failed")?
            .error_for_status()
            .context("position store returned an error status")?
            .json()
            .await
            .context("position page payload is not valid JSON")?;

        debug!(limit, offset, fetched = positions.len(), "Fetched position page");
        Ok(positions)
    }
}
