//! Error taxonomy for the liquidation sweep.
//!
//! Sweep-level errors abort the whole pass; attempt-level errors abort only
//! the position they occurred on. Neither kind ever escapes
//! [`Sweeper::run`](crate::Sweeper::run) — a failed position is revisited
//! from scratch on the next scheduled sweep.

use alloy::primitives::B256;
use thiserror::Error;

/// Fatal sweep errors. Any of these terminates the pass immediately,
/// leaving all not-yet-visited positions untouched.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("could not resolve signer: {0:#}")]
    SignerResolution(#[source] anyhow::Error),

    #[error("could not fetch position count: {0:#}")]
    PositionCount(#[source] anyhow::Error),

    #[error("could not fetch position page at offset {offset}: {source:#}")]
    PositionPage {
        offset: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// Per-position errors. Logged against the offending LSA; the sweep then
/// advances to the next position.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("position id is not a valid address: {0:#}")]
    InvalidId(#[source] anyhow::Error),

    #[error("could not fetch liquidation type: {0:#}")]
    Classification(#[source] anyhow::Error),

    #[error("could not quote gas: {0:#}")]
    GasQuote(#[source] anyhow::Error),

    #[error("could not send transaction: {0:#}")]
    Submission(#[source] anyhow::Error),

    /// The transaction was broadcast but its outcome is unknown or it
    /// reverted. Deliberately not retried: the position is re-derived from
    /// live chain state on the next sweep.
    #[error("transaction {tx_hash} unconfirmed: {source:#}")]
    Confirmation {
        tx_hash: B256,
        #[source]
        source: anyhow::Error,
    },
}

impl AttemptError {
    /// Short stage label for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            AttemptError::InvalidId(_) => "id",
            AttemptError::Classification(_) => "classification",
            AttemptError::GasQuote(_) => "gas",
            AttemptError::Submission(_) => "submission",
            AttemptError::Confirmation { .. } => "confirmation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_labelled() {
        let err = AttemptError::Classification(anyhow::anyhow!("rpc down"));
        assert_eq!(err.stage(), "classification");

        let err = AttemptError::Confirmation {
            tx_hash: B256::ZERO,
            source: anyhow::anyhow!("timed out"),
        };
        assert_eq!(err.stage(), "confirmation");
    }

    #[test]
    fn page_error_carries_offset() {
        let err = SweepError::PositionPage {
            offset: 100,
            source: anyhow::anyhow!("store down"),
        };
        assert!(err.to_string().contains("offset 100"));
    }
}
