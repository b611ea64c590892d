//! Gas quoting with percentage markup.
//!
//! Fees are amplified above the network gas price to improve inclusion
//! probability. All arithmetic is integer; the priority fee is always one
//! quarter of the amplified fee (floor division) — a fixed design constant,
//! not a tunable.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use lsa_chain::ProviderManager;

/// Priority fee is this fraction of the amplified max fee.
const PRIORITY_FEE_DIVISOR: u128 = 4;

/// Amplify a base fee by `markup_percent` percent, floor division.
/// `amplify(a, 0) == a` exactly.
pub fn amplify(base_fee: u128, markup_percent: u128) -> u128 {
    base_fee + (base_fee * markup_percent) / 100
}

/// Fee pair for one liquidation transaction.
///
/// Quoted fresh for every liquidating position — never cached across
/// positions within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    /// Network gas price at quote time, in wei.
    pub base_fee: u128,
    /// Markup applied on top of the base fee, in percent.
    pub markup_percent: u128,
    /// `base_fee` amplified by the markup.
    pub max_fee_per_gas: u128,
    /// One quarter of the amplified fee.
    pub max_priority_fee_per_gas: u128,
}

impl GasQuote {
    /// Build a quote from a base fee and markup percentage.
    pub fn new(base_fee: u128, markup_percent: u128) -> Self {
        let max_fee_per_gas = amplify(base_fee, markup_percent);
        Self {
            base_fee,
            markup_percent,
            max_fee_per_gas,
            max_priority_fee_per_gas: max_fee_per_gas / PRIORITY_FEE_DIVISOR,
        }
    }
}

/// Source of the current network gas price.
#[async_trait]
pub trait GasOracle: Send + Sync {
    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128>;
}

#[async_trait]
impl GasOracle for ProviderManager {
    async fn gas_price(&self) -> Result<u128> {
        self.get_gas_price().await
    }
}

/// Quotes fees for liquidation transactions.
pub struct GasPricer {
    oracle: Arc<dyn GasOracle>,
    markup_percent: u128,
}

impl GasPricer {
    /// Create a pricer with a fixed markup percentage.
    pub fn new(oracle: Arc<dyn GasOracle>, markup_percent: u128) -> Self {
        Self {
            oracle,
            markup_percent,
        }
    }

    /// Fetch the current gas price and build a fresh quote.
    pub async fn quote(&self) -> Result<GasQuote> {
        let base_fee = self.oracle.gas_price().await?;
        Ok(GasQuote::new(base_fee, self.markup_percent))
    }
}
