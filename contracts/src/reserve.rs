//! # Digital Reserve
//!
//! The vault's singleton state and the plumbing every pipeline shares:
//! configuration, the POD share ledger, the audit log, deadline checks and
//! the all-or-nothing transaction wrapper.
//!
//! The reserve owns the market it trades against. An operation snapshots
//! the reserve together with the market, runs its steps, and on any error
//! restores the snapshot, so a failure halfway through a swap sequence
//! leaves nothing behind.

use alloy_primitives::{Address, U256};
use dr_protocol::config::{
    DEFAULT_WITHDRAWAL_FEE_BASE, DEFAULT_WITHDRAWAL_FEE_FRACTION, POD_DECIMALS, POD_NAME,
    POD_SYMBOL,
};
use dr_protocol::devnet;
use dr_protocol::market::Market;
use dr_protocol::math;
use dr_protocol::token::FungibleLedger;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReserveError;
use crate::events::{OwnershipTransferredRecord, ReserveEvent};

// ---------------------------------------------------------------------------
// Configuration Types
// ---------------------------------------------------------------------------

/// Withdrawal fee as the rational `fraction / base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalFee {
    pub fraction: u64,
    pub base: u64,
}

impl WithdrawalFee {
    /// Validates `fraction <= base` and `base > 0`.
    ///
    /// # Errors
    ///
    /// Returns [`ReserveError::InvalidFee`] otherwise.
    pub fn new(fraction: u64, base: u64) -> Result<Self, ReserveError> {
        if base == 0 || fraction > base {
            return Err(ReserveError::InvalidFee { fraction, base });
        }
        Ok(Self { fraction, base })
    }

    /// `gross * (1 - fee)`, rounded down.
    pub fn net_of(&self, gross: U256) -> Result<U256, ReserveError> {
        Ok(math::mul_div_floor(
            gross,
            U256::from(self.base - self.fraction),
            U256::from(self.base),
        )?)
    }

    /// The smallest gross amount whose post-fee value is at least `net`:
    /// `net / (1 - fee)`, rounded up.
    pub fn gross_for(&self, net: U256) -> Result<U256, ReserveError> {
        Ok(math::mul_div_ceil(
            net,
            U256::from(self.base),
            U256::from(self.base - self.fraction),
        )?)
    }
}

impl Default for WithdrawalFee {
    fn default() -> Self {
        Self {
            fraction: DEFAULT_WITHDRAWAL_FEE_FRACTION,
            base: DEFAULT_WITHDRAWAL_FEE_BASE,
        }
    }
}

/// The strategy asset and the yield-bearing wrapper it is held as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPair {
    pub token_a: Address,
    pub token_b: Address,
}

/// Deployment parameters of a reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// The reserve's own account in the market.
    pub address: Address,
    /// The asset deposits and withdrawals are denominated in. Immutable.
    pub deposit_asset: Address,
    /// Intermediate hop for swaps that touch neither side of it.
    pub routing_asset: Option<Address>,
    /// Initial owner.
    pub owner: Address,
    pub fee: WithdrawalFee,
    pub deposit_enabled: bool,
    pub share_name: String,
    pub share_symbol: String,
}

impl ReserveConfig {
    /// Configuration matching the devnet market, owned by `owner`.
    pub fn devnet(owner: Address) -> Self {
        Self {
            address: devnet::RESERVE,
            deposit_asset: devnet::DRC,
            routing_asset: Some(devnet::WETH),
            owner,
            fee: WithdrawalFee::default(),
            deposit_enabled: false,
            share_name: POD_NAME.to_string(),
            share_symbol: POD_SYMBOL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reserve
// ---------------------------------------------------------------------------

/// A single-asset reserve vault issuing POD shares against its NAV.
///
/// Operations live in sibling modules: [`valuation`](crate::valuation),
/// [`deposit`](crate::deposit), [`withdraw`](crate::withdraw),
/// [`strategy`](crate::strategy) and [`admin`](crate::admin).
#[derive(Debug, Clone)]
pub struct DigitalReserve<M> {
    pub(crate) address: Address,
    pub(crate) deposit_asset: Address,
    pub(crate) routing_asset: Option<Address>,
    pub(crate) strategy: Option<StrategyPair>,
    pub(crate) deposit_enabled: bool,
    pub(crate) fee: WithdrawalFee,
    pub(crate) owner: Option<Address>,
    pub(crate) shares: FungibleLedger,
    pub(crate) events: Vec<ReserveEvent>,
    pub(crate) market: M,
}

impl<M: Market> DigitalReserve<M> {
    /// Deploys a reserve over `market`. No strategy is set; the owner must
    /// pick one with `set_token_address` before deposits can succeed.
    ///
    /// # Errors
    ///
    /// Returns [`ReserveError::InvalidFee`] for a malformed fee and
    /// [`ReserveError::InvalidOwner`] for a zero owner.
    pub fn new(config: ReserveConfig, market: M) -> Result<Self, ReserveError> {
        let fee = WithdrawalFee::new(config.fee.fraction, config.fee.base)?;
        if config.owner == Address::ZERO {
            return Err(ReserveError::InvalidOwner);
        }
        Ok(Self {
            address: config.address,
            deposit_asset: config.deposit_asset,
            routing_asset: config.routing_asset,
            strategy: None,
            deposit_enabled: config.deposit_enabled,
            fee,
            owner: Some(config.owner),
            shares: FungibleLedger::new(config.share_name, config.share_symbol, POD_DECIMALS),
            events: vec![ReserveEvent::OwnershipTransferred(OwnershipTransferredRecord {
                previous_owner: None,
                new_owner: Some(config.owner),
            })],
            market,
        })
    }

    // -- Accessors ---------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn deposit_asset(&self) -> Address {
        self.deposit_asset
    }

    pub fn routing_asset(&self) -> Option<Address> {
        self.routing_asset
    }

    /// The configured strategy pair, if any.
    pub fn strategy(&self) -> Option<StrategyPair> {
        self.strategy
    }

    pub fn is_deposit_enabled(&self) -> bool {
        self.deposit_enabled
    }

    /// Every committed operation, oldest first.
    pub fn events(&self) -> &[ReserveEvent] {
        &self.events
    }

    /// The market the reserve trades against.
    pub fn market(&self) -> &M {
        &self.market
    }

    /// Mutable access to the market, for moving the clock or funding
    /// accounts from outside the reserve.
    pub fn market_mut(&mut self) -> &mut M {
        &mut self.market
    }

    // -- Share ledger ------------------------------------------------------

    /// The POD ledger.
    pub fn shares(&self) -> &FungibleLedger {
        &self.shares
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.shares.balance_of(holder)
    }

    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.shares.allowance(owner, spender)
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<(), ReserveError> {
        Ok(self.shares.approve(owner, spender, amount)?)
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), ReserveError> {
        Ok(self.shares.transfer(from, to, amount)?)
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ReserveError> {
        Ok(self.shares.transfer_from(spender, from, to, amount)?)
    }

    // -- Internals ---------------------------------------------------------

    /// Runs `op` against the reserve, restoring the market, the share
    /// ledger, the strategy and the audit log if it fails.
    ///
    /// The audit log is append-only, so it is rolled back by length rather
    /// than copied.
    pub(crate) fn transact<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, ReserveError>,
    ) -> Result<T, ReserveError> {
        let market = self.market.clone();
        let shares = self.shares.clone();
        let strategy = self.strategy;
        let logged = self.events.len();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.market = market;
                self.shares = shares;
                self.strategy = strategy;
                self.events.truncate(logged);
                warn!(operation, error = %err, "operation rolled back");
                Err(err)
            }
        }
    }

    /// Rejects a `deadline` that is not strictly in the future.
    pub(crate) fn check_deadline(&self, deadline: u64) -> Result<(), ReserveError> {
        let now = self.market.now();
        if deadline <= now {
            return Err(ReserveError::Expired { deadline, now });
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: ReserveEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_protocol::config::units;
    use dr_protocol::devnet::{devnet_market, DEPLOYER};
    use dr_protocol::market::Clock;

    fn reserve() -> DigitalReserve<dr_protocol::market::SimulatedMarket> {
        DigitalReserve::new(ReserveConfig::devnet(DEPLOYER), devnet_market(1_000).unwrap()).unwrap()
    }

    #[test]
    fn fee_validation() {
        assert!(WithdrawalFee::new(1, 100).is_ok());
        assert!(WithdrawalFee::new(100, 100).is_ok());
        assert_eq!(
            WithdrawalFee::new(101, 100),
            Err(ReserveError::InvalidFee { fraction: 101, base: 100 })
        );
        assert!(WithdrawalFee::new(0, 0).is_err());
    }

    #[test]
    fn gross_for_inverts_net_of() {
        let fee = WithdrawalFee::default();
        let net = units(990);
        let gross = fee.gross_for(net).unwrap();
        assert_eq!(gross, units(1_000));
        assert!(fee.net_of(gross).unwrap() >= net);
    }

    #[test]
    fn fresh_reserve_defaults() {
        let r = reserve();
        assert!(!r.is_deposit_enabled());
        assert_eq!(r.strategy(), None);
        assert_eq!(r.total_supply(), U256::ZERO);
        assert_eq!(r.shares().symbol(), POD_SYMBOL);
        assert_eq!(r.events().len(), 1);
    }

    #[test]
    fn zero_owner_rejected() {
        let market = devnet_market(0).unwrap();
        let err = DigitalReserve::new(ReserveConfig::devnet(Address::ZERO), market).unwrap_err();
        assert_eq!(err, ReserveError::InvalidOwner);
    }

    #[test]
    fn deadline_must_be_in_the_future() {
        let r = reserve();
        assert!(r.check_deadline(1_001).is_ok());
        assert_eq!(
            r.check_deadline(1_000),
            Err(ReserveError::Expired { deadline: 1_000, now: 1_000 })
        );
    }

    #[test]
    fn failed_transaction_restores_state() {
        let mut r = reserve();
        r.transact("commit", |r| {
            r.emit(ReserveEvent::OwnershipTransferred(OwnershipTransferredRecord {
                previous_owner: Some(DEPLOYER),
                new_owner: Some(DEPLOYER),
            }));
            Ok(())
        })
        .unwrap();
        assert_eq!(r.events().len(), 2);

        let result: Result<(), _> = r.transact("test", |r| {
            r.strategy = Some(StrategyPair {
                token_a: devnet::USDC,
                token_b: devnet::AUSDC,
            });
            r.shares.mint(DEPLOYER, U256::from(5u64))?;
            r.market.set_now(5_000);
            r.emit(ReserveEvent::OwnershipTransferred(OwnershipTransferredRecord {
                previous_owner: Some(DEPLOYER),
                new_owner: None,
            }));
            Err(ReserveError::NoOp)
        });
        assert_eq!(result, Err(ReserveError::NoOp));
        assert_eq!(r.strategy(), None);
        assert_eq!(r.total_supply(), U256::ZERO);
        assert_eq!(r.market().now(), 1_000);
        assert_eq!(r.events().len(), 2);
    }
}
