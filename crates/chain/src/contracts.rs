//! Lending pool contract bindings and calldata encoders.

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};
use anyhow::{Context, Result};
use tracing::debug;

use crate::provider::ProviderManager;

// Lending pool interface used by the sweep. `checkTypeOfLiquidation` returns
// an integer code: 0 = not liquidatable, 1 = full, anything else = micro.
sol! {
    #[sol(rpc)]
    interface ILendingPool {
        function checkTypeOfLiquidation(address lsa) external view returns (uint8);

        function liquidationCall(
            address collateralAsset,
            address debtAsset,
            address lsa,
            uint256 debtToCover,
            bool receiveIToken
        ) external;

        function microLiquidationCall(bytes params) external;
    }
}

/// Encode a full liquidation call.
pub fn encode_liquidation_call(
    collateral_asset: Address,
    debt_asset: Address,
    lsa: Address,
    debt_to_cover: U256,
    receive_itoken: bool,
) -> Bytes {
    ILendingPool::liquidationCallCall {
        collateralAsset: collateral_asset,
        debtAsset: debt_asset,
        lsa,
        debtToCover: debt_to_cover,
        receiveIToken: receive_itoken,
    }
    .abi_encode()
    .into()
}

/// Encode a micro liquidation call.
///
/// The pool takes a single `bytes` argument holding the ABI-encoded
/// `(collateralAsset, debtAsset, lsa)` address tuple; no amount is passed.
pub fn encode_micro_liquidation_call(
    collateral_asset: Address,
    debt_asset: Address,
    lsa: Address,
) -> Bytes {
    let params: Bytes = (collateral_asset, debt_asset, lsa).abi_encode().into();
    ILendingPool::microLiquidationCallCall { params }
        .abi_encode()
        .into()
}

/// Read-side wrapper for a deployed lending pool.
#[derive(Debug, Clone)]
pub struct LendingPool {
    /// Pool contract address.
    pub address: Address,
    provider: ProviderManager,
}

impl LendingPool {
    /// Create a new lending pool wrapper.
    pub fn new(address: Address, provider: ProviderManager) -> Self {
        Self { address, provider }
    }

    /// Query the liquidation type code for a position.
    pub async fn liquidation_type(&self, lsa: Address) -> Result<u8> {
        let provider = ProviderBuilder::new()
            .on_http(self.provider.http_url().parse().context("invalid RPC url")?);
        let pool = ILendingPool::new(self.address, provider);

        let code = pool
            .checkTypeOfLiquidation(lsa)
            .call()
            .await
            .context("checkTypeOfLiquidation call failed")?
            ._0;

        debug!(lsa = %lsa, code, "Fetched liquidation type");
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const COLLATERAL: Address = address!("1111111111111111111111111111111111111111");
    const DEBT: Address = address!("2222222222222222222222222222222222222222");
    const LSA: Address = address!("3333333333333333333333333333333333333333");

    #[test]
    fn liquidation_call_shape() {
        let calldata =
            encode_liquidation_call(COLLATERAL, DEBT, LSA, U256::ZERO, false);

        // selector + 5 static words
        assert_eq!(calldata.len(), 4 + 5 * 32);
        assert_eq!(
            &calldata[..4],
            ILendingPool::liquidationCallCall::SELECTOR.as_slice()
        );
    }

    #[test]
    fn liquidation_call_roundtrips() {
        let calldata =
            encode_liquidation_call(COLLATERAL, DEBT, LSA, U256::from(42u64), true);
        let decoded =
            ILendingPool::liquidationCallCall::abi_decode(&calldata, true).unwrap();

        assert_eq!(decoded.collateralAsset, COLLATERAL);
        assert_eq!(decoded.debtAsset, DEBT);
        assert_eq!(decoded.lsa, LSA);
        assert_eq!(decoded.debtToCover, U256::from(42u64));
        assert!(decoded.receiveIToken);
    }

    #[test]
    fn micro_liquidation_params_are_a_three_address_tuple() {
        let calldata = encode_micro_liquidation_call(COLLATERAL, DEBT, LSA);
        let decoded =
            ILendingPool::microLiquidationCallCall::abi_decode(&calldata, true).unwrap();

        // three addresses, each padded to a 32-byte word
        assert_eq!(decoded.params.len(), 96);

        let (collateral, debt, lsa) =
            <(Address, Address, Address)>::abi_decode(&decoded.params, true).unwrap();
        assert_eq!(collateral, COLLATERAL);
        assert_eq!(debt, DEBT);
        assert_eq!(lsa, LSA);
    }
}
