//! HTTP clients for the liquidator's external collaborators.
//!
//! This crate provides:
//! - Secret provider client for fetching the executor signing key
//! - Position store client for paging open LSA positions

mod positions;
mod secrets;

pub use positions::{Position, PositionClient, PositionStatus};
pub use secrets::SecretsClient;
