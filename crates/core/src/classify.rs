//! Liquidation classification against live chain state.

use alloy::primitives::Address;
use anyhow::Result;
use async_trait::async_trait;

use lsa_chain::LendingPool;

/// How a position may be liquidated, decoded from the on-chain code.
/// Derived fresh every sweep pass; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationKind {
    /// Code 0: not liquidatable, skip.
    None,
    /// Code 1: close out the entire exposure.
    Full,
    /// Any other code: partial liquidation via the reduced-argument call.
    Micro,
}

impl LiquidationKind {
    /// Decode the integer code returned by the lending pool.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LiquidationKind::None,
            1 => LiquidationKind::Full,
            _ => LiquidationKind::Micro,
        }
    }

    /// Label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidationKind::None => "none",
            LiquidationKind::Full => "full",
            LiquidationKind::Micro => "micro",
        }
    }
}

/// Classifies a single position by its on-chain state.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, lsa: Address) -> Result<LiquidationKind>;
}

#[async_trait]
impl Classifier for LendingPool {
    async fn classify(&self, lsa: Address) -> Result<LiquidationKind> {
        let code = self.liquidation_type(lsa).await?;
        Ok(LiquidationKind::from_code(code))
    }
}
