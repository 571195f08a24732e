//! Registry of lending reserves: which underlying asset is accepted and
//! which yield-bearing wrapper (an "aToken") it mints.
//!
//! Supplying `n` units of the underlying mints `n` units of the wrapper; the
//! wrapper balance grows as yield accrues, and withdrawing burns it 1:1.

use std::collections::HashMap;

use alloy_primitives::Address;

/// The lending protocol's listed reserves and its custody account.
#[derive(Debug, Clone)]
pub struct LendingMarket {
    address: Address,
    wrappers: HashMap<Address, Address>,
}

impl LendingMarket {
    /// Creates a market whose deposits are held at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            wrappers: HashMap::new(),
        }
    }

    /// The account holding supplied underlying.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Lists `underlying`, minting `wrapper` to suppliers.
    pub fn list_reserve(&mut self, underlying: Address, wrapper: Address) {
        self.wrappers.insert(underlying, wrapper);
    }

    /// Wrapper for `underlying`, if listed.
    pub fn wrapper_of(&self, underlying: Address) -> Option<Address> {
        self.wrappers.get(&underlying).copied()
    }
}
