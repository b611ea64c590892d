//! Chain interaction layer for the LSA liquidator.
//!
//! This crate provides:
//! - Provider management for HTTP RPC connections
//! - Lending pool contract bindings and calldata encoders
//! - Transaction signing, submission and receipt confirmation

mod contracts;
mod provider;
mod signer;

pub use contracts::{
    encode_liquidation_call, encode_micro_liquidation_call, ILendingPool, LendingPool,
};
pub use provider::ProviderManager;
pub use signer::TransactionSender;
