//! # Fungible Token Ledger
//!
//! A balance-and-allowance book for one fungible token: `owner -> balance`,
//! `owner -> spender -> allowance`, and a total supply kept in lockstep with
//! mint and burn. The vault uses one as its POD share ledger; the simulated
//! market keeps one per listed asset.
//!
//! ## Invariants
//!
//! - The sum of all balances equals `total_supply` after every call.
//! - A failed call mutates nothing.
//! - An allowance of `U256::MAX` is treated as unlimited and never decremented.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The account does not hold enough tokens.
    #[error("insufficient balance: {owner} has {balance}, needs {amount}")]
    InsufficientBalance {
        /// The account being debited.
        owner: Address,
        /// Its current balance.
        balance: U256,
        /// The amount requested.
        amount: U256,
    },

    /// The spender has not been approved for enough tokens.
    #[error("insufficient allowance: {spender} may move {allowance} of {owner}'s tokens, needs {amount}")]
    InsufficientAllowance {
        /// The token holder.
        owner: Address,
        /// The account spending on the holder's behalf.
        spender: Address,
        /// The remaining allowance.
        allowance: U256,
        /// The amount requested.
        amount: U256,
    },

    /// Minting would push the total supply past `U256::MAX`.
    #[error("supply overflow: minting {amount} would exceed U256::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: U256,
    },

    /// The zero address cannot receive or approve tokens.
    #[error("zero address is not a valid counterparty")]
    ZeroAddress,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Balances, allowances and supply for a single fungible token.
#[derive(Debug, Clone, Default)]
pub struct FungibleLedger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<Address, HashMap<Address, U256>>,
}

impl FungibleLedger {
    /// Creates an empty ledger with zero supply.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Human-readable token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of decimal places.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Balance of `owner`; zero for unknown accounts.
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or(U256::ZERO)
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|by_spender| by_spender.get(&spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Iterates over every account with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(owner, balance)| (*owner, *balance))
    }

    /// Creates `amount` new tokens in `to`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] for the zero address and
    /// [`LedgerError::SupplyOverflow`] if the supply would overflow.
    pub fn mint(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
        if to == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount })?;
        // A balance never exceeds the supply, so this cannot overflow once
        // the supply check passed.
        let new_balance = self.balance_of(to) + amount;

        self.total_supply = new_supply;
        self.balances.insert(to, new_balance);
        Ok(())
    }

    /// Destroys `amount` tokens from `from`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `from` holds less
    /// than `amount`.
    pub fn burn(&mut self, from: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: from,
                balance,
                amount,
            });
        }
        self.balances.insert(from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] if `to` is the zero address and
    /// [`LedgerError::InsufficientBalance`] if `from` cannot cover `amount`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        if to == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: from,
                balance: from_balance,
                amount,
            });
        }
        if from == to {
            return Ok(());
        }
        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance_of(to) + amount;
        self.balances.insert(to, to_balance);
        Ok(())
    }

    /// Sets the allowance of `spender` over `owner`'s tokens to `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAddress`] if `spender` is the zero address.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<(), LedgerError> {
        if spender == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        self.allowances.entry(owner).or_default().insert(spender, amount);
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientAllowance`] if the allowance is too
    /// small, otherwise the errors of [`transfer`](Self::transfer).
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from,
                spender,
                allowance,
                amount,
            });
        }
        self.transfer(from, to, amount)?;
        if allowance != U256::MAX {
            self.allowances
                .entry(from)
                .or_default()
                .insert(spender, allowance - amount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn mint_and_burn_track_supply() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(500)).unwrap();
        ledger.mint(addr(2), u(300)).unwrap();
        assert_eq!(ledger.total_supply(), u(800));

        ledger.burn(addr(1), u(200)).unwrap();
        assert_eq!(ledger.balance_of(addr(1)), u(300));
        assert_eq!(ledger.total_supply(), u(600));
    }

    #[test]
    fn burn_more_than_balance_rejected() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(10)).unwrap();
        let err = ledger.burn(addr(1), u(11)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.total_supply(), u(10));
    }

    #[test]
    fn mint_to_zero_address_rejected() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        assert_eq!(ledger.mint(Address::ZERO, u(1)), Err(LedgerError::ZeroAddress));
    }

    #[test]
    fn transfer_moves_balance() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(100)).unwrap();
        ledger.transfer(addr(1), addr(2), u(40)).unwrap();
        assert_eq!(ledger.balance_of(addr(1)), u(60));
        assert_eq!(ledger.balance_of(addr(2)), u(40));
        assert_eq!(ledger.total_supply(), u(100));
    }

    #[test]
    fn self_transfer_is_a_no_op() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(100)).unwrap();
        ledger.transfer(addr(1), addr(1), u(100)).unwrap();
        assert_eq!(ledger.balance_of(addr(1)), u(100));
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(100)).unwrap();
        ledger.approve(addr(1), addr(9), u(70)).unwrap();

        ledger.transfer_from(addr(9), addr(1), addr(2), u(50)).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(9)), u(20));

        let err = ledger.transfer_from(addr(9), addr(1), addr(2), u(21)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
        assert_eq!(ledger.balance_of(addr(2)), u(50));
    }

    #[test]
    fn unlimited_allowance_not_decremented() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(100)).unwrap();
        ledger.approve(addr(1), addr(9), U256::MAX).unwrap();
        ledger.transfer_from(addr(9), addr(1), addr(2), u(100)).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(9)), U256::MAX);
    }

    #[test]
    fn holders_skips_empty_accounts() {
        let mut ledger = FungibleLedger::new("Test", "TST", 18);
        ledger.mint(addr(1), u(5)).unwrap();
        ledger.mint(addr(2), u(5)).unwrap();
        ledger.burn(addr(2), u(5)).unwrap();
        let holders: Vec<_> = ledger.holders().collect();
        assert_eq!(holders, vec![(addr(1), u(5))]);
    }
}
