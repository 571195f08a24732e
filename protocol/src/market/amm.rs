//! Constant-product (`x * y = k`) pool math and the pool registry.
//!
//! Pricing follows Uniswap V2: the input side pays `fee_bps` before the
//! invariant is applied, `get_amount_in` rounds up by one unit and
//! `get_amount_out` rounds down, so a round trip never creates value.
//!
//! Pools hold their reserves as ordinary token balances at a derived pool
//! address; the registry only remembers which pairs exist and their fees.

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, U256};

use super::MarketError;
use crate::config::BPS_DENOMINATOR;
use crate::math::{self, MathError};

/// A registered pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    /// The lower-sorted asset.
    pub token0: Address,
    /// The higher-sorted asset.
    pub token1: Address,
    /// The account holding both reserves.
    pub address: Address,
    /// Fee charged on the input amount, in basis points.
    pub fee_bps: u64,
}

/// Orders a pair so `(a, b)` and `(b, a)` map to the same pool.
pub fn sort_pair(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Deterministic custody address for a pair.
pub fn pool_address(a: Address, b: Address) -> Address {
    let (token0, token1) = sort_pair(a, b);
    let mut preimage = Vec::with_capacity(44);
    preimage.extend_from_slice(b"pool");
    preimage.extend_from_slice(token0.as_slice());
    preimage.extend_from_slice(token1.as_slice());
    Address::from_slice(&keccak256(&preimage)[12..])
}

/// Output received for `amount_in`, given the pool reserves. Rounds down.
pub fn get_amount_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee_bps: u64,
) -> Result<U256, MathError> {
    if amount_in.is_zero() {
        return Ok(U256::ZERO);
    }
    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(BPS_DENOMINATOR - fee_bps))
        .ok_or(MathError::Overflow)?;
    let denominator = math::add(
        reserve_in
            .checked_mul(U256::from(BPS_DENOMINATOR))
            .ok_or(MathError::Overflow)?,
        amount_in_with_fee,
    )?;
    math::mul_div_floor(amount_in_with_fee, reserve_out, denominator)
}

/// Input required to receive exactly `amount_out`. Rounds up.
///
/// Returns `None` if the pool cannot pay out `amount_out` at any price.
pub fn get_amount_in(
    amount_out: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee_bps: u64,
) -> Result<Option<U256>, MathError> {
    if amount_out.is_zero() {
        return Ok(Some(U256::ZERO));
    }
    if amount_out >= reserve_out || reserve_in.is_zero() {
        return Ok(None);
    }
    let numerator = reserve_in
        .checked_mul(amount_out)
        .and_then(|v| v.checked_mul(U256::from(BPS_DENOMINATOR)))
        .ok_or(MathError::Overflow)?;
    let denominator = (reserve_out - amount_out)
        .checked_mul(U256::from(BPS_DENOMINATOR - fee_bps))
        .ok_or(MathError::Overflow)?;
    Ok(Some(math::add(numerator / denominator, U256::from(1u64))?))
}

/// Registry of constant-product pools.
#[derive(Debug, Clone, Default)]
pub struct ConstantProductAmm {
    pools: HashMap<(Address, Address), Pool>,
}

impl ConstantProductAmm {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pair `(a, b)` and returns its pool. Re-registering an
    /// existing pair updates its fee.
    pub fn create_pool(&mut self, a: Address, b: Address, fee_bps: u64) -> Pool {
        let (token0, token1) = sort_pair(a, b);
        let pool = Pool {
            token0,
            token1,
            address: pool_address(a, b),
            fee_bps: fee_bps.min(BPS_DENOMINATOR - 1),
        };
        self.pools.insert((token0, token1), pool.clone());
        pool
    }

    /// Looks up the pool for `(a, b)` in either order.
    pub fn pool(&self, a: Address, b: Address) -> Result<&Pool, MarketError> {
        self.pools
            .get(&sort_pair(a, b))
            .ok_or(MarketError::PoolNotFound { token_a: a, token_b: b })
    }

    /// Number of registered pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool is registered.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
