//! LSA Liquidation Sweeper
//!
//! Periodically sweeps the position store and liquidates any LSA whose
//! on-chain state says it is eligible, one position at a time. Failures on
//! one position never block the rest of the sweep; infrastructure failures
//! abort the pass and are retried on the next tick.

use std::sync::Arc;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lsa_api::{PositionClient, SecretsClient};
use lsa_chain::{LendingPool, ProviderManager};
use lsa_core::{
    ExecutionConfig, GasPricer, SignerBoundFactory, Sweeper, SweeperConfig,
};

/// Environment variable names.
mod env {
    pub const RPC: &str = "RPC";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const ADDR_LENDING_POOL: &str = "ADDR_LENDING_POOL";
    pub const ADDR_COLLATERAL_ASSET: &str = "ADDR_COLLATERAL_ASSET";
    pub const ADDR_DEBT_ASSET: &str = "ADDR_DEBT_ASSET";
    pub const POSITIONS_URL: &str = "POSITIONS_URL";
    pub const SECRETS_URL: &str = "SECRETS_URL";
    pub const RUN_MODE: &str = "RUN_MODE";
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lsa_core=debug,lsa_chain=debug")),
        )
        .init();

    let sweeper_config = SweeperConfig::from_env();
    sweeper_config.log_config();

    let config = load_config()?;

    info!("Starting LSA liquidation sweeper");
    info!(chain_id = config.chain_id, pool = %config.lending_pool, "Target chain");

    let sweeper = initialize_sweeper(&config, &sweeper_config)?;

    let mut ticker = tokio::time::interval(sweeper_config.sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let report = sweeper.run().await;
        info!(
            scanned = report.scanned(),
            liquidated = report.liquidated(),
            failed = report.failed(),
            "Scheduled sweep done"
        );
    }
}

/// Configuration loaded from environment.
struct Config {
    rpc_url: String,
    chain_id: u64,
    lending_pool: alloy::primitives::Address,
    collateral_asset: alloy::primitives::Address,
    debt_asset: alloy::primitives::Address,
    positions_url: String,
    secrets_url: String,
    dev_mode: bool,
}

fn load_config() -> Result<Config> {
    let get_env = |name: &str| -> Result<String> {
        std::env::var(name).map_err(|_| anyhow::anyhow!("Missing env var: {}", name))
    };

    let get_address = |name: &str| -> Result<alloy::primitives::Address> {
        get_env(name)?
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address for {}: {}", name, e))
    };

    Ok(Config {
        rpc_url: get_env(env::RPC)?,
        chain_id: get_env(env::CHAIN_ID)?
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", env::CHAIN_ID, e))?,
        lending_pool: get_address(env::ADDR_LENDING_POOL)?,
        collateral_asset: get_address(env::ADDR_COLLATERAL_ASSET)?,
        debt_asset: get_address(env::ADDR_DEBT_ASSET)?,
        positions_url: get_env(env::POSITIONS_URL)?,
        secrets_url: get_env(env::SECRETS_URL)?,
        dev_mode: std::env::var(env::RUN_MODE)
            .map(|mode| mode == "development")
            .unwrap_or(false),
    })
}

fn initialize_sweeper(config: &Config, sweeper_config: &SweeperConfig) -> Result<Arc<Sweeper>> {
    let provider = ProviderManager::new(&config.rpc_url, config.chain_id);

    let positions = Arc::new(PositionClient::new(&config.positions_url));
    let secrets = Arc::new(SecretsClient::new(&config.secrets_url, config.dev_mode));
    let pool = Arc::new(LendingPool::new(config.lending_pool, provider.clone()));

    let execution = ExecutionConfig {
        lending_pool: config.lending_pool,
        collateral_asset: config.collateral_asset,
        debt_asset: config.debt_asset,
        debt_to_cover: sweeper_config
            .debt_to_cover
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid debt_to_cover: {}", e))?,
        receive_itoken: sweeper_config.receive_itoken,
    };

    let factory = Arc::new(SignerBoundFactory::new(
        secrets,
        sweeper_config.secret_name.clone(),
        sweeper_config.secret_field_key.clone(),
        provider.clone(),
        sweeper_config.confirm_timeout(),
        sweeper_config.confirm_poll(),
        execution,
    ));

    let gas = GasPricer::new(
        Arc::new(provider),
        sweeper_config.gas_markup_percent as u128,
    );

    info!("All components initialized");

    Ok(Arc::new(Sweeper::new(
        positions,
        pool,
        factory,
        gas,
        sweeper_config.page_size,
    )))
}
