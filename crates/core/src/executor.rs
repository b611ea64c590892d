//! Liquidation transaction execution.

use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::classify::LiquidationKind;
use crate::error::AttemptError;
use crate::gas::GasQuote;
use lsa_api::SecretsClient;
use lsa_chain::{
    encode_liquidation_call, encode_micro_liquidation_call, ProviderManager, TransactionSender,
};

/// Static call parameters for liquidation transactions.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Lending pool contract address.
    pub lending_pool: Address,
    /// Collateral asset passed to both call variants.
    pub collateral_asset: Address,
    /// Debt asset passed to both call variants.
    pub debt_asset: Address,
    /// Debt to cover on full liquidations. Provisional upstream placeholder
    /// pending a product decision; taken from configuration, never derived.
    pub debt_to_cover: U256,
    /// Whether full liquidations receive the derivative token instead of
    /// the underlying. Provisional upstream placeholder, like
    /// `debt_to_cover`.
    pub receive_itoken: bool,
}

/// Submits one liquidation transaction and blocks until it is confirmed.
#[async_trait]
pub trait LiquidationExecutor: Send + Sync {
    async fn execute(
        &self,
        lsa: Address,
        kind: LiquidationKind,
        quote: &GasQuote,
    ) -> Result<B256, AttemptError>;
}

/// Resolves the signing key and binds a chain-write capability.
///
/// Acquired once per sweep so no signer state leaks across invocations;
/// failure here aborts the sweep before any position is touched.
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn LiquidationExecutor>>;
}

/// Executor that submits liquidation calls to the lending pool.
pub struct OnchainExecutor {
    sender: Arc<TransactionSender>,
    config: ExecutionConfig,
}

impl OnchainExecutor {
    /// Create an executor bound to a signer.
    pub fn new(sender: Arc<TransactionSender>, config: ExecutionConfig) -> Self {
        Self { sender, config }
    }
}

#[async_trait]
impl LiquidationExecutor for OnchainExecutor {
    async fn execute(
        &self,
        lsa: Address,
        kind: LiquidationKind,
        quote: &GasQuote,
    ) -> Result<B256, AttemptError> {
        let calldata = match kind {
            LiquidationKind::Full => encode_liquidation_call(
                self.config.collateral_asset,
                self.config.debt_asset,
                lsa,
                self.config.debt_to_cover,
                self.config.receive_itoken,
            ),
            LiquidationKind::Micro => encode_micro_liquidation_call(
                self.config.collateral_asset,
                self.config.debt_asset,
                lsa,
            ),
            LiquidationKind::None => {
                return Err(AttemptError::Submission(anyhow::anyhow!(
                    "refusing to submit for a non-liquidatable position"
                )))
            }
        };

        debug!(lsa = %lsa, kind = kind.as_str(), "Submitting liquidation");

        let tx_hash = self
            .sender
            .submit(
                self.config.lending_pool,
                calldata,
                quote.max_fee_per_gas,
                quote.max_priority_fee_per_gas,
            )
            .await
            .map_err(AttemptError::Submission)?;

        self.sender
            .confirm(tx_hash)
            .await
            .map_err(|source| AttemptError::Confirmation { tx_hash, source })?;

        Ok(tx_hash)
    }
}

/// Production factory: fetches the executor key from the secret provider
/// and constructs a fresh [`TransactionSender`] per sweep.
pub struct SignerBoundFactory {
    secrets: Arc<SecretsClient>,
    secret_name: String,
    field_key: String,
    provider: ProviderManager,
    confirm_timeout: Duration,
    confirm_poll: Duration,
    execution: ExecutionConfig,
}

impl SignerBoundFactory {
    pub fn new(
        secrets: Arc<SecretsClient>,
        secret_name: impl Into<String>,
        field_key: impl Into<String>,
        provider: ProviderManager,
        confirm_timeout: Duration,
        confirm_poll: Duration,
        execution: ExecutionConfig,
    ) -> Self {
        Self {
            secrets,
            secret_name: secret_name.into(),
            field_key: field_key.into(),
            provider,
            confirm_timeout,
            confirm_poll,
            execution,
        }
    }
}

#[async_trait]
impl ExecutorFactory for SignerBoundFactory {
    async fn acquire(&self) -> Result<Arc<dyn LiquidationExecutor>> {
        let private_key = self
            .secrets
            .private_key(&self.secret_name, &self.field_key)
            .await?;

        let sender = TransactionSender::new(
            &private_key,
            self.provider.http_url(),
            self.provider.chain_id(),
        )?
        .with_confirm_timeout(self.confirm_timeout)
        .with_confirm_poll(self.confirm_poll);

        debug!(signer = %sender.address, "Executor bound to signer");

        Ok(Arc::new(OnchainExecutor::new(
            Arc::new(sender),
            self.execution.clone(),
        )))
    }
}
