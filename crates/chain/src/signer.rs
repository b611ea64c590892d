//! Transaction signing, submission and confirmation.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Gas limit applied to liquidation calls. Set explicitly so a submission
/// never depends on an extra estimation round-trip.
const LIQUIDATION_GAS_LIMIT: u64 = 800_000;

const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONFIRM_POLL: Duration = Duration::from_secs(1);

/// Signer-bound transaction sender.
///
/// Constructed fresh for every sweep invocation from the resolved private
/// key; nothing here is shared across sweeps. Submission and confirmation
/// are separate steps so callers can distinguish a transaction that was
/// never broadcast from one whose outcome is unknown.
pub struct TransactionSender {
    rpc_url: String,
    wallet: EthereumWallet,
    /// Signer address.
    pub address: Address,
    chain_id: u64,
    gas_limit: u64,
    confirm_timeout: Duration,
    confirm_poll: Duration,
}

impl TransactionSender {
    /// Create a new transaction sender from a private key.
    pub fn new(private_key: &str, rpc_url: &str, chain_id: u64) -> Result<Self> {
        let key_str = private_key.trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str.parse().context("invalid private key")?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            wallet,
            address,
            chain_id,
            gas_limit: LIQUIDATION_GAS_LIMIT,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            confirm_poll: DEFAULT_CONFIRM_POLL,
        })
    }

    /// Override the receipt wait deadline.
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Override the receipt poll interval.
    pub fn with_confirm_poll(mut self, poll: Duration) -> Self {
        self.confirm_poll = poll;
        self
    }

    /// Override the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Sign and broadcast a transaction with explicit EIP-1559 fees.
    ///
    /// Returns as soon as the transaction is accepted by the RPC node; use
    /// [`TransactionSender::confirm`] to wait for inclusion.
    pub async fn submit(
        &self,
        to: Address,
        calldata: Bytes,
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    ) -> Result<B256> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata)
            .with_chain_id(self.chain_id)
            .with_gas_limit(self.gas_limit)
            .with_max_fee_per_gas(max_fee_per_gas)
            .with_max_priority_fee_per_gas(max_priority_fee_per_gas);

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.parse().context("invalid RPC url")?);

        let pending = provider
            .send_transaction(tx)
            .await
            .context("transaction broadcast failed")?;
        let tx_hash = *pending.tx_hash();

        info!(
            to = %to,
            tx_hash = %tx_hash,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            "Transaction submitted"
        );
        Ok(tx_hash)
    }

    /// Block until a receipt for `tx_hash` is available.
    ///
    /// Polls the chain until the configured timeout so one stuck
    /// confirmation cannot stall the rest of a sweep. A reverted receipt is
    /// an error; the transaction is never resubmitted here.
    pub async fn confirm(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        let provider = ProviderBuilder::new()
            .on_http(self.rpc_url.parse().context("invalid RPC url")?);
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            let receipt = provider
                .get_transaction_receipt(tx_hash)
                .await
                .context("receipt query failed")?;

            if let Some(receipt) = receipt {
                if !receipt.status() {
                    anyhow::bail!("transaction reverted: {tx_hash}");
                }
                debug!(
                    tx_hash = %tx_hash,
                    block = receipt.block_number.unwrap_or(0),
                    gas_used = receipt.gas_used,
                    "Transaction confirmed"
                );
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                anyhow::bail!(
                    "no receipt for {tx_hash} after {:?}",
                    self.confirm_timeout
                );
            }
            sleep(self.confirm_poll).await;
        }
    }
}

impl std::fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSender")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (DO NOT USE IN PRODUCTION)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn sender_derives_signer_address() {
        let sender = TransactionSender::new(TEST_KEY, "https://mainnet.base.org", 8453).unwrap();
        assert_eq!(
            format!("{:?}", sender.address).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn sender_accepts_key_without_prefix() {
        let sender = TransactionSender::new(
            TEST_KEY.trim_start_matches("0x"),
            "https://mainnet.base.org",
            8453,
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn sender_rejects_garbage_key() {
        let sender = TransactionSender::new("not-a-key", "https://mainnet.base.org", 8453);
        assert!(sender.is_err());
    }
}
