//! # Simulated Market
//!
//! A deterministic, in-memory stand-in for the chain the vault lives on:
//! one token ledger per asset, constant-product pools, a lending protocol
//! and a settable block clock. It implements every collaborator trait, so
//! the vault engine runs against it unchanged in tests, benches and the
//! devnet node.
//!
//! Every mutating call validates first and moves balances last, so an `Err`
//! never leaves a half-applied swap or supply behind.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::debug;

use super::amm::{self, ConstantProductAmm, Pool};
use super::lending::LendingMarket;
use super::{
    validate_path, AssetLedger, Clock, MarketError, PriceQuoter, SwapRouter, YieldProtocol,
};
use crate::config::BPS_DENOMINATOR;
use crate::math;
use crate::token::FungibleLedger;

/// Token ledgers, pools, a lending protocol and a clock.
#[derive(Debug, Clone)]
pub struct SimulatedMarket {
    now: u64,
    tokens: HashMap<Address, FungibleLedger>,
    amm: ConstantProductAmm,
    lending: LendingMarket,
}

impl SimulatedMarket {
    /// Creates an empty market at block time `now`, with the lending
    /// protocol holding deposits at `lending_address`.
    pub fn new(now: u64, lending_address: Address) -> Self {
        Self {
            now,
            tokens: HashMap::new(),
            amm: ConstantProductAmm::new(),
            lending: LendingMarket::new(lending_address),
        }
    }

    // -- Setup -------------------------------------------------------------

    /// Adds a ledger for `token`. Re-registering keeps existing balances.
    pub fn register_token(&mut self, token: Address, name: &str, symbol: &str, decimals: u8) {
        self.tokens
            .entry(token)
            .or_insert_with(|| FungibleLedger::new(name, symbol, decimals));
    }

    /// Credits `amount` of freshly minted `token` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownToken`] for an unregistered token.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<(), MarketError> {
        self.ledger_mut(token)?.mint(to, amount)?;
        Ok(())
    }

    /// Creates the pool `(a, b)` seeded with the given reserves.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownToken`] if either asset is unregistered.
    pub fn create_pool(
        &mut self,
        a: Address,
        reserve_a: U256,
        b: Address,
        reserve_b: U256,
        fee_bps: u64,
    ) -> Result<Pool, MarketError> {
        self.ledger(a)?;
        self.ledger(b)?;
        let pool = self.amm.create_pool(a, b, fee_bps);
        self.mint(a, pool.address, reserve_a)?;
        self.mint(b, pool.address, reserve_b)?;
        debug!(%a, %b, pool = %pool.address, fee_bps, "pool created");
        Ok(pool)
    }

    /// Lists `underlying` in the lending protocol, minting `wrapper`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownToken`] if either asset is unregistered.
    pub fn list_lending_reserve(&mut self, underlying: Address, wrapper: Address) -> Result<(), MarketError> {
        self.ledger(underlying)?;
        self.ledger(wrapper)?;
        self.lending.list_reserve(underlying, wrapper);
        Ok(())
    }

    /// Pays `bps` of yield to every holder of `underlying`'s wrapper. The
    /// matching underlying is minted into the lending protocol so withdrawals
    /// stay fully backed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ReserveNotListed`] if `underlying` is unlisted.
    pub fn accrue_yield(&mut self, underlying: Address, bps: u64) -> Result<U256, MarketError> {
        let wrapper = self
            .lending
            .wrapper_of(underlying)
            .ok_or(MarketError::ReserveNotListed(underlying))?;
        let payouts = self
            .ledger(wrapper)?
            .holders()
            .map(|(holder, balance)| {
                math::mul_div_floor(balance, U256::from(bps), U256::from(BPS_DENOMINATOR))
                    .map(|interest| (holder, interest))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut total = U256::ZERO;
        for (holder, interest) in payouts {
            self.ledger_mut(wrapper)?.mint(holder, interest)?;
            total = math::add(total, interest)?;
        }
        let lending = self.lending.address();
        self.mint(underlying, lending, total)?;
        debug!(%underlying, bps, %total, "lending yield accrued");
        Ok(total)
    }

    /// Adds `amount` of `token` to the reserves of the pool `(token, other)`
    /// without taking anything out, making `token` cheaper against `other`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::PoolNotFound`] if the pair has no pool.
    pub fn donate_to_pool(&mut self, token: Address, other: Address, amount: U256) -> Result<(), MarketError> {
        let pool = self.amm.pool(token, other)?.address;
        self.mint(token, pool, amount)?;
        debug!(%token, %other, %amount, "pool reserves moved");
        Ok(())
    }

    /// Sets the block time.
    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Moves the block time forward by `secs`.
    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    // -- Inspection --------------------------------------------------------

    /// Current reserves of the pool `(token_in, token_out)`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::PoolNotFound`] if the pair has no pool.
    pub fn reserves(&self, token_in: Address, token_out: Address) -> Result<(U256, U256), MarketError> {
        let pool = self.amm.pool(token_in, token_out)?;
        Ok((
            self.balance_of(token_in, pool.address),
            self.balance_of(token_out, pool.address),
        ))
    }

    /// Ledger for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownToken`] for an unregistered token.
    pub fn ledger(&self, token: Address) -> Result<&FungibleLedger, MarketError> {
        self.tokens.get(&token).ok_or(MarketError::UnknownToken(token))
    }

    fn ledger_mut(&mut self, token: Address) -> Result<&mut FungibleLedger, MarketError> {
        self.tokens.get_mut(&token).ok_or(MarketError::UnknownToken(token))
    }

    fn check_deadline(&self, deadline: u64) -> Result<(), MarketError> {
        if self.now > deadline {
            return Err(MarketError::Expired {
                deadline,
                now: self.now,
            });
        }
        Ok(())
    }

    fn amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>, MarketError> {
        validate_path(path)?;
        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        for hop in path.windows(2) {
            let pool = self.amm.pool(hop[0], hop[1])?;
            let (reserve_in, reserve_out) = self.reserves(hop[0], hop[1])?;
            let last = amounts[amounts.len() - 1];
            amounts.push(amm::get_amount_out(last, reserve_in, reserve_out, pool.fee_bps)?);
        }
        Ok(amounts)
    }

    fn amounts_in(&self, amount_out: U256, path: &[Address]) -> Result<Vec<U256>, MarketError> {
        validate_path(path)?;
        let mut amounts = vec![U256::ZERO; path.len()];
        amounts[path.len() - 1] = amount_out;
        for i in (1..path.len()).rev() {
            let pool = self.amm.pool(path[i - 1], path[i])?;
            let (reserve_in, reserve_out) = self.reserves(path[i - 1], path[i])?;
            amounts[i - 1] = amm::get_amount_in(amounts[i], reserve_in, reserve_out, pool.fee_bps)?
                .ok_or(MarketError::InsufficientLiquidity {
                    token_in: path[i - 1],
                    token_out: path[i],
                })?;
        }
        Ok(amounts)
    }

    /// Moves tokens along `path` according to precomputed hop `amounts`.
    ///
    /// Only the first transfer can fail (the trader's balance); every later
    /// hop pays out of a pool whose reserve was checked while pricing.
    fn execute_swap(&mut self, trader: Address, path: &[Address], amounts: &[U256]) -> Result<(), MarketError> {
        let first_pool = self.amm.pool(path[0], path[1])?.address;
        self.ledger_mut(path[0])?.transfer(trader, first_pool, amounts[0])?;

        for i in 0..path.len() - 1 {
            let from = self.amm.pool(path[i], path[i + 1])?.address;
            let to = if i + 2 < path.len() {
                self.amm.pool(path[i + 1], path[i + 2])?.address
            } else {
                trader
            };
            self.ledger_mut(path[i + 1])?.transfer(from, to, amounts[i + 1])?;
        }
        debug!(
            %trader,
            token_in = %path[0],
            token_out = %path[path.len() - 1],
            amount_in = %amounts[0],
            amount_out = %amounts[amounts.len() - 1],
            hops = path.len() - 1,
            "swap executed"
        );
        Ok(())
    }

    fn ensure_balance(&self, token: Address, owner: Address, amount: U256) -> Result<(), MarketError> {
        let balance = self.balance_of(token, owner);
        if balance < amount {
            return Err(MarketError::Ledger(crate::token::LedgerError::InsufficientBalance {
                owner,
                balance,
                amount,
            }));
        }
        Ok(())
    }
}

impl Clock for SimulatedMarket {
    fn now(&self) -> u64 {
        self.now
    }
}

impl AssetLedger for SimulatedMarket {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.tokens
            .get(&token)
            .map(|ledger| ledger.balance_of(owner))
            .unwrap_or(U256::ZERO)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.tokens
            .get(&token)
            .map(|ledger| ledger.allowance(owner, spender))
            .unwrap_or(U256::ZERO)
    }

    fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), MarketError> {
        self.ledger_mut(token)?.approve(owner, spender, amount)?;
        Ok(())
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), MarketError> {
        self.ledger_mut(token)?.transfer(from, to, amount)?;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), MarketError> {
        self.ledger_mut(token)?.transfer_from(spender, from, to, amount)?;
        Ok(())
    }
}

impl PriceQuoter for SimulatedMarket {
    fn quote_amount_in(&self, amount_out: U256, path: &[Address]) -> Result<U256, MarketError> {
        Ok(self.amounts_in(amount_out, path)?[0])
    }

    fn quote_amount_out(&self, amount_in: U256, path: &[Address]) -> Result<U256, MarketError> {
        let amounts = self.amounts_out(amount_in, path)?;
        Ok(amounts[amounts.len() - 1])
    }
}

impl SwapRouter for SimulatedMarket {
    fn swap_exact_in(
        &mut self,
        trader: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        deadline: u64,
    ) -> Result<U256, MarketError> {
        self.check_deadline(deadline)?;
        let amounts = self.amounts_out(amount_in, path)?;
        let amount_out = amounts[amounts.len() - 1];
        if amount_out < amount_out_min {
            return Err(MarketError::InsufficientOutputAmount {
                amount_out,
                amount_out_min,
            });
        }
        self.ensure_balance(path[0], trader, amount_in)?;
        self.execute_swap(trader, path, &amounts)?;
        Ok(amount_out)
    }

    fn swap_exact_out(
        &mut self,
        trader: Address,
        amount_out: U256,
        amount_in_max: U256,
        path: &[Address],
        deadline: u64,
    ) -> Result<U256, MarketError> {
        self.check_deadline(deadline)?;
        let amounts = self.amounts_in(amount_out, path)?;
        let amount_in = amounts[0];
        if amount_in > amount_in_max {
            return Err(MarketError::ExcessiveInputAmount {
                amount_in,
                amount_in_max,
            });
        }
        self.ensure_balance(path[0], trader, amount_in)?;
        self.execute_swap(trader, path, &amounts)?;
        Ok(amount_in)
    }
}

impl YieldProtocol for SimulatedMarket {
    fn wrapper_of(&self, asset: Address) -> Option<Address> {
        self.lending.wrapper_of(asset)
    }

    fn supply(&mut self, holder: Address, asset: Address, amount: U256) -> Result<(), MarketError> {
        let wrapper = self
            .lending
            .wrapper_of(asset)
            .ok_or(MarketError::ReserveNotListed(asset))?;
        self.ensure_balance(asset, holder, amount)?;
        self.ledger(wrapper)?
            .total_supply()
            .checked_add(amount)
            .ok_or(crate::math::MathError::Overflow)?;

        let lending = self.lending.address();
        self.ledger_mut(asset)?.transfer(holder, lending, amount)?;
        self.ledger_mut(wrapper)?.mint(holder, amount)?;
        debug!(%holder, %asset, %amount, "supplied to lending market");
        Ok(())
    }

    fn withdraw(&mut self, holder: Address, asset: Address, amount: U256) -> Result<U256, MarketError> {
        let wrapper = self
            .lending
            .wrapper_of(asset)
            .ok_or(MarketError::ReserveNotListed(asset))?;
        let position = self.balance_of(wrapper, holder);
        if position < amount {
            return Err(MarketError::InsufficientPosition {
                holder,
                asset,
                position,
                requested: amount,
            });
        }
        let lending = self.lending.address();
        self.ensure_balance(asset, lending, amount)?;

        self.ledger_mut(wrapper)?.burn(holder, amount)?;
        self.ledger_mut(asset)?.transfer(lending, holder, amount)?;
        debug!(%holder, %asset, %amount, "withdrawn from lending market");
        Ok(amount)
    }

    fn position_of(&self, holder: Address, asset: Address) -> U256 {
        self.lending
            .wrapper_of(asset)
            .map(|wrapper| self.balance_of(wrapper, holder))
            .unwrap_or(U256::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units;

    const NOW: u64 = 1_700_000_000;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    /// DRC / WETH / USDC with a lending reserve for USDC, 1 DRC ~ 1 USDC.
    fn market() -> SimulatedMarket {
        let (drc, weth, usdc, ausdc) = (addr(0xD1), addr(0xE1), addr(0xC1), addr(0xCA));
        let mut m = SimulatedMarket::new(NOW, addr(0x99));
        m.register_token(drc, "Digital Reserve Currency", "DRC", 18);
        m.register_token(weth, "Wrapped Ether", "WETH", 18);
        m.register_token(usdc, "USD Coin", "USDC", 18);
        m.register_token(ausdc, "Aave USDC", "aUSDC", 18);
        m.create_pool(drc, units(1_000_000), weth, units(500), 30).unwrap();
        m.create_pool(weth, units(500), usdc, units(1_000_000), 30).unwrap();
        m.list_lending_reserve(usdc, ausdc).unwrap();
        m
    }

    #[test]
    fn multi_hop_swap_moves_balances() {
        let mut m = market();
        let trader = addr(0x01);
        m.mint(addr(0xD1), trader, units(1_000)).unwrap();

        let path = [addr(0xD1), addr(0xE1), addr(0xC1)];
        let quoted = m.quote_amount_out(units(1_000), &path).unwrap();
        let out = m.swap_exact_in(trader, units(1_000), quoted, &path, NOW + 60).unwrap();

        assert_eq!(out, quoted);
        assert_eq!(m.balance_of(addr(0xD1), trader), U256::ZERO);
        assert_eq!(m.balance_of(addr(0xC1), trader), out);
        // Two 30 bps hops plus a little price impact.
        assert!(out < units(1_000) && out > units(990));
    }

    #[test]
    fn expired_swap_has_no_effect() {
        let mut m = market();
        let trader = addr(0x01);
        m.mint(addr(0xD1), trader, units(10)).unwrap();
        m.advance(120);

        let path = [addr(0xD1), addr(0xE1)];
        let err = m.swap_exact_in(trader, units(10), U256::ZERO, &path, NOW + 60).unwrap_err();
        assert!(matches!(err, MarketError::Expired { .. }));
        assert_eq!(m.balance_of(addr(0xD1), trader), units(10));
    }

    #[test]
    fn exact_out_respects_input_cap() {
        let mut m = market();
        let trader = addr(0x01);
        m.mint(addr(0xD1), trader, units(10_000)).unwrap();
        let path = [addr(0xD1), addr(0xE1), addr(0xC1)];

        let needed = m.quote_amount_in(units(500), &path).unwrap();
        let err = m
            .swap_exact_out(trader, units(500), needed - U256::from(1u64), &path, NOW)
            .unwrap_err();
        assert!(matches!(err, MarketError::ExcessiveInputAmount { .. }));

        let spent = m.swap_exact_out(trader, units(500), needed, &path, NOW).unwrap();
        assert_eq!(spent, needed);
        assert_eq!(m.balance_of(addr(0xC1), trader), units(500));
    }

    #[test]
    fn swap_without_balance_rejected_cleanly() {
        let mut m = market();
        let path = [addr(0xD1), addr(0xE1)];
        let before = m.reserves(addr(0xD1), addr(0xE1)).unwrap();
        assert!(m.swap_exact_in(addr(0x02), units(1), U256::ZERO, &path, NOW).is_err());
        assert_eq!(m.reserves(addr(0xD1), addr(0xE1)).unwrap(), before);
    }

    #[test]
    fn donation_moves_price() {
        let mut m = market();
        let path = [addr(0xD1), addr(0xE1)];
        let before = m.quote_amount_out(units(1), &path).unwrap();
        m.donate_to_pool(addr(0xD1), addr(0xE1), units(1_000_000)).unwrap();
        let after = m.quote_amount_out(units(1), &path).unwrap();
        assert!(after < before);
    }

    #[test]
    fn supply_and_withdraw_round_trip() {
        let mut m = market();
        let holder = addr(0x03);
        m.mint(addr(0xC1), holder, units(100)).unwrap();

        m.supply(holder, addr(0xC1), units(100)).unwrap();
        assert_eq!(m.position_of(holder, addr(0xC1)), units(100));
        assert_eq!(m.balance_of(addr(0xC1), holder), U256::ZERO);

        let err = m.withdraw(holder, addr(0xC1), units(101)).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientPosition { .. }));

        m.withdraw(holder, addr(0xC1), units(100)).unwrap();
        assert_eq!(m.position_of(holder, addr(0xC1)), U256::ZERO);
        assert_eq!(m.balance_of(addr(0xC1), holder), units(100));
    }

    #[test]
    fn unlisted_asset_cannot_be_supplied() {
        let mut m = market();
        let err = m.supply(addr(0x03), addr(0xD1), units(1)).unwrap_err();
        assert_eq!(err, MarketError::ReserveNotListed(addr(0xD1)));
    }

    #[test]
    fn yield_accrues_to_wrapper_holders() {
        let mut m = market();
        let holder = addr(0x03);
        m.mint(addr(0xC1), holder, units(1_000)).unwrap();
        m.supply(holder, addr(0xC1), units(1_000)).unwrap();

        let paid = m.accrue_yield(addr(0xC1), 250).unwrap();
        assert_eq!(paid, units(25));
        assert_eq!(m.position_of(holder, addr(0xC1)), units(1_025));

        // Fully backed: the whole grown position can be withdrawn.
        m.withdraw(holder, addr(0xC1), units(1_025)).unwrap();
        assert_eq!(m.balance_of(addr(0xC1), holder), units(1_025));
    }
}
