//! # Market Module — External Collaborators
//!
//! The vault never holds a price or a position of its own. It asks the
//! outside world: an AMM router for quotes and swaps, a lending protocol for
//! supply and withdrawal, token ledgers for custody, and the chain for the
//! current block time. This module defines those seams as traits so the
//! vault engine stays a portable state machine.
//!
//! ## Architecture
//!
//! ```text
//! amm.rs        — Constant-product pool math and pool registry
//! lending.rs    — Underlying -> yield-bearing wrapper registry
//! simulated.rs  — Deterministic in-memory market implementing every trait
//! ```
//!
//! ## Contract for implementors
//!
//! Every mutating call is all-or-nothing: an `Err` return means no balance,
//! reserve or position moved.

pub mod amm;
pub mod lending;
pub mod simulated;

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::math::MathError;
use crate::token::LedgerError;

pub use amm::{ConstantProductAmm, Pool};
pub use lending::LendingMarket;
pub use simulated::SimulatedMarket;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by market collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// The caller's deadline has already passed.
    #[error("transaction expired: deadline {deadline}, now {now}")]
    Expired {
        /// The caller-supplied deadline (unix seconds).
        deadline: u64,
        /// The block time at execution.
        now: u64,
    },

    /// A swap path was shorter than two hops or repeated an asset.
    #[error("invalid swap path: {0}")]
    InvalidPath(String),

    /// No pool exists between two adjacent path assets.
    #[error("no pool for pair {token_a} / {token_b}")]
    PoolNotFound {
        /// First asset of the pair.
        token_a: Address,
        /// Second asset of the pair.
        token_b: Address,
    },

    /// A pool cannot serve the requested amount.
    #[error("insufficient liquidity in pool {token_in} -> {token_out}")]
    InsufficientLiquidity {
        /// Asset paid into the pool.
        token_in: Address,
        /// Asset taken out of the pool.
        token_out: Address,
    },

    /// An exact-input swap would return less than the caller's minimum.
    #[error("insufficient output amount: {amount_out} < minimum {amount_out_min}")]
    InsufficientOutputAmount {
        /// What the swap would deliver.
        amount_out: U256,
        /// The caller's lower bound.
        amount_out_min: U256,
    },

    /// An exact-output swap would cost more than the caller's maximum.
    #[error("excessive input amount: {amount_in} > maximum {amount_in_max}")]
    ExcessiveInputAmount {
        /// What the swap would cost.
        amount_in: U256,
        /// The caller's upper bound.
        amount_in_max: U256,
    },

    /// The asset has no reserve in the lending protocol.
    #[error("asset {0} is not listed in the lending market")]
    ReserveNotListed(Address),

    /// A withdrawal exceeded the holder's supplied position.
    #[error("insufficient position: {holder} holds {position} of {asset}, requested {requested}")]
    InsufficientPosition {
        /// The position holder.
        holder: Address,
        /// The underlying asset.
        asset: Address,
        /// The current position.
        position: U256,
        /// The amount requested.
        requested: U256,
    },

    /// The token has no ledger in this market.
    #[error("unknown token {0}")]
    UnknownToken(Address),

    /// A token ledger rejected a movement.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Pool or yield arithmetic failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

// ---------------------------------------------------------------------------
// Collaborator Traits
// ---------------------------------------------------------------------------

/// Source of the current block time.
pub trait Clock {
    /// Current time in unix seconds.
    fn now(&self) -> u64;
}

/// Custody of fungible assets.
pub trait AssetLedger {
    /// Balance of `owner` in `token`.
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    /// Amount `spender` may move out of `owner`'s `token` balance.
    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    /// Sets `spender`'s allowance over `owner`'s `token` balance.
    fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), MarketError>;

    /// Moves `amount` of `token` from `from` to `to`.
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), MarketError>;

    /// Moves `amount` of `token` from `from` to `to` using `spender`'s allowance.
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), MarketError>;
}

/// Read-only AMM pricing.
pub trait PriceQuoter {
    /// Input amount of `path[0]` required to receive exactly `amount_out` of
    /// the last path asset. Rounds up at every hop.
    fn quote_amount_in(&self, amount_out: U256, path: &[Address]) -> Result<U256, MarketError>;

    /// Output amount of the last path asset received for exactly `amount_in`
    /// of `path[0]`. Rounds down at every hop.
    fn quote_amount_out(&self, amount_in: U256, path: &[Address]) -> Result<U256, MarketError>;
}

/// AMM swap execution.
pub trait SwapRouter: PriceQuoter {
    /// Swaps exactly `amount_in` of `path[0]` held by `trader` and returns the
    /// amount of the last path asset credited to `trader`.
    fn swap_exact_in(
        &mut self,
        trader: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        deadline: u64,
    ) -> Result<U256, MarketError>;

    /// Swaps at most `amount_in_max` of `path[0]` held by `trader` for exactly
    /// `amount_out` of the last path asset and returns the input consumed.
    fn swap_exact_out(
        &mut self,
        trader: Address,
        amount_out: U256,
        amount_in_max: U256,
        path: &[Address],
        deadline: u64,
    ) -> Result<U256, MarketError>;
}

/// An external lending / yield protocol.
pub trait YieldProtocol {
    /// The yield-bearing wrapper minted for `asset`, if the asset is listed.
    fn wrapper_of(&self, asset: Address) -> Option<Address>;

    /// Deposits `amount` of `asset` from `holder` into the protocol.
    fn supply(&mut self, holder: Address, asset: Address, amount: U256) -> Result<(), MarketError>;

    /// Withdraws `amount` of `asset` back to `holder` and returns the amount
    /// received.
    fn withdraw(&mut self, holder: Address, asset: Address, amount: U256) -> Result<U256, MarketError>;

    /// The wrapper balance `holder` currently has for `asset`.
    fn position_of(&self, holder: Address, asset: Address) -> U256;
}

/// Everything the vault needs from the outside world.
///
/// `Clone` lets an operation snapshot the whole world and restore it when a
/// later step fails.
pub trait Market: Clock + AssetLedger + SwapRouter + YieldProtocol + Clone {}

impl<T> Market for T where T: Clock + AssetLedger + SwapRouter + YieldProtocol + Clone {}

/// Rejects a `path` with fewer than two assets or a hop onto the same asset.
pub fn validate_path(path: &[Address]) -> Result<(), MarketError> {
    if path.len() < 2 {
        return Err(MarketError::InvalidPath(format!(
            "expected at least 2 assets, got {}",
            path.len()
        )));
    }
    if let Some(hop) = path.windows(2).find(|hop| hop[0] == hop[1]) {
        return Err(MarketError::InvalidPath(format!("hop from {} to itself", hop[0])));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_path_rejected() {
        let err = validate_path(&[Address::repeat_byte(1)]).unwrap_err();
        assert!(matches!(err, MarketError::InvalidPath(_)));
    }

    #[test]
    fn self_hop_rejected() {
        let a = Address::repeat_byte(1);
        assert!(validate_path(&[a, a]).is_err());
    }

    #[test]
    fn two_hop_path_accepted() {
        let path = [Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3)];
        assert!(validate_path(&path).is_ok());
    }
}
