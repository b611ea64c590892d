//! Paged access to the position store.

use anyhow::Result;
use async_trait::async_trait;

use lsa_api::{Position, PositionClient};

/// Fixed sweep page size.
pub const PAGE_SIZE: u64 = 50;

/// Read-only, paged view of the open positions.
///
/// The store is owned by an external subsystem; this core never mutates it.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Total number of stored positions.
    async fn count(&self) -> Result<u64>;

    /// One page of positions. Ordering only needs to be stable within a
    /// single sweep.
    async fn page(&self, limit: u64, offset: u64) -> Result<Vec<Position>>;
}

#[async_trait]
impl PositionStore for PositionClient {
    async fn count(&self) -> Result<u64> {
        PositionClient::count(self).await
    }

    async fn page(&self, limit: u64, offset: u64) -> Result<Vec<Position>> {
        PositionClient::page(self, limit, offset).await
    }
}
