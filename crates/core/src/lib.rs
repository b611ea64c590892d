//! Liquidation sweep core.
//!
//! This crate provides the sweep engine:
//! - Paged position retrieval ([`PositionStore`])
//! - Per-position liquidation classification ([`Classifier`])
//! - Gas quoting with percentage markup ([`GasPricer`])
//! - Transaction execution and confirmation ([`LiquidationExecutor`])
//! - Sweep orchestration with per-position failure isolation ([`Sweeper`])
//!
//! Every seam is a trait so the orchestrator is fully testable against
//! in-memory fakes; production implementations bind to `lsa-chain` and
//! `lsa-api`.

mod classify;
pub mod config;
mod error;
mod executor;
mod gas;
mod store;
mod sweep;

pub use classify::{Classifier, LiquidationKind};
pub use config::SweeperConfig;
pub use error::{AttemptError, SweepError};
pub use executor::{
    ExecutionConfig, ExecutorFactory, LiquidationExecutor, OnchainExecutor, SignerBoundFactory,
};
pub use gas::{amplify, GasOracle, GasPricer, GasQuote};
pub use store::{PositionStore, PAGE_SIZE};
pub use sweep::{AttemptOutcome, LiquidationAttempt, SweepReport, Sweeper};

// Re-export the position model for consumers of the sweep report.
pub use lsa_api::{Position, PositionStatus};
