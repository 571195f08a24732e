//! # Valuation Engine
//!
//! NAV is never stored. It is the deposit-asset cost of buying back the
//! whole strategy position at the AMM's current reserves, so the POD price
//! moves with pool prices and lending yield without any bookkeeping.
//!
//! ```text
//! nav   = quote_amount_in(stored, path(deposit_asset -> token_a))
//! price = nav * 10^18 / total_supply          (0 when supply is 0)
//! ```

use alloy_primitives::{Address, U256};
use dr_protocol::config::{scale, PRICE_DECIMALS};
use dr_protocol::market::Market;
use dr_protocol::math;
use serde::{Deserialize, Serialize};

use crate::error::ReserveError;
use crate::reserve::DigitalReserve;

/// A holder's slice of the reserve, in deposit-asset units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultValue {
    /// Pro-rata share of NAV before the withdrawal fee.
    pub principal: U256,
    /// What the holder can withdraw right now, after the fee.
    pub withdrawable: U256,
}

impl<M: Market> DigitalReserve<M> {
    /// The strategy position the lending protocol holds for the reserve.
    /// Zero while no strategy is set.
    pub fn total_token_stored(&self) -> U256 {
        match self.strategy {
            Some(pair) => self.market.position_of(self.address, pair.token_a),
            None => U256::ZERO,
        }
    }

    /// The AMM path from `from` to `to`, hopping through the routing asset
    /// unless either end already is it.
    pub fn swap_path(&self, from: Address, to: Address) -> Vec<Address> {
        match self.routing_asset {
            Some(routing) if from != routing && to != routing => vec![from, routing, to],
            _ => vec![from, to],
        }
    }

    /// Net asset value in deposit-asset units.
    ///
    /// # Errors
    ///
    /// Returns [`ReserveError::SwapFailed`] if the AMM cannot quote the
    /// position, e.g. because it exceeds pool depth.
    pub fn net_asset_value(&self) -> Result<U256, ReserveError> {
        let stored = self.total_token_stored();
        let Some(pair) = self.strategy else {
            return Ok(U256::ZERO);
        };
        if stored.is_zero() {
            return Ok(U256::ZERO);
        }
        let path = self.swap_path(self.deposit_asset, pair.token_a);
        self.market
            .quote_amount_in(stored, &path)
            .map_err(ReserveError::market("quote"))
    }

    /// POD price in deposit-asset raw units per whole POD. Zero before the
    /// first deposit and after the last withdrawal.
    pub fn get_proof_of_deposit_price(&self) -> Result<U256, ReserveError> {
        let supply = self.total_supply();
        if supply.is_zero() {
            return Ok(U256::ZERO);
        }
        let nav = self.net_asset_value()?;
        Ok(math::mul_div_floor(nav, scale(), supply)?)
    }

    /// Decimal places of [`get_proof_of_deposit_price`](Self::get_proof_of_deposit_price).
    pub fn price_decimals(&self) -> u8 {
        PRICE_DECIMALS
    }

    /// `user`'s principal and post-fee withdrawable value.
    pub fn get_user_vault_in_drc(&self, user: Address) -> Result<VaultValue, ReserveError> {
        let supply = self.total_supply();
        let balance = self.balance_of(user);
        if supply.is_zero() || balance.is_zero() || self.total_token_stored().is_zero() {
            return Ok(VaultValue::default());
        }
        let nav = self.net_asset_value()?;
        let principal = math::mul_div_floor(nav, balance, supply)?;
        Ok(VaultValue {
            principal,
            withdrawable: self.fee.net_of(principal)?,
        })
    }

    /// Deposit asset sitting idle in the reserve. Withdrawal fees stay here.
    pub fn retained_fees(&self) -> U256 {
        self.market.balance_of(self.deposit_asset, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserve::ReserveConfig;
    use dr_protocol::devnet::{self, devnet_market, DEPLOYER};
    use dr_protocol::market::SimulatedMarket;

    fn reserve() -> DigitalReserve<SimulatedMarket> {
        DigitalReserve::new(ReserveConfig::devnet(DEPLOYER), devnet_market(0).unwrap()).unwrap()
    }

    #[test]
    fn path_routes_through_weth() {
        let r = reserve();
        assert_eq!(r.swap_path(devnet::DRC, devnet::USDC), vec![devnet::DRC, devnet::WETH, devnet::USDC]);
        assert_eq!(r.swap_path(devnet::DRC, devnet::WETH), vec![devnet::DRC, devnet::WETH]);
        assert_eq!(r.swap_path(devnet::WETH, devnet::DAI), vec![devnet::WETH, devnet::DAI]);
    }

    #[test]
    fn direct_path_without_routing_asset() {
        let mut config = ReserveConfig::devnet(DEPLOYER);
        config.routing_asset = None;
        let r = DigitalReserve::new(config, devnet_market(0).unwrap()).unwrap();
        assert_eq!(r.swap_path(devnet::DRC, devnet::USDC), vec![devnet::DRC, devnet::USDC]);
    }

    #[test]
    fn empty_reserve_is_worth_nothing() {
        let r = reserve();
        assert_eq!(r.total_token_stored(), U256::ZERO);
        assert_eq!(r.net_asset_value().unwrap(), U256::ZERO);
        assert_eq!(r.get_proof_of_deposit_price().unwrap(), U256::ZERO);
        assert_eq!(r.get_user_vault_in_drc(DEPLOYER).unwrap(), VaultValue::default());
        assert_eq!(r.price_decimals(), 18);
    }
}
