//! # Deposit Pipeline
//!
//! `Idle -> AssetPulled -> Swapped -> Supplied -> SharesMinted -> Idle`
//!
//! The depositor is priced against the NAV snapshotted before their own
//! swap moves the pool, so their slippage is theirs alone and never
//! dilutes existing holders.

use alloy_primitives::{Address, U256};
use dr_protocol::market::Market;
use dr_protocol::math;
use tracing::info;

use crate::error::ReserveError;
use crate::events::{DepositRecord, ReserveEvent};
use crate::reserve::{DigitalReserve, StrategyPair};

impl<M: Market> DigitalReserve<M> {
    /// Deposits `amount` of the deposit asset from `user` and mints POD.
    ///
    /// The reserve pulls the deposit through its allowance, swaps it into the
    /// strategy asset, supplies it to the lending protocol and mints
    /// `amount * supply / nav` shares, or `amount` for the first deposit.
    ///
    /// # Errors
    ///
    /// - [`ReserveError::DepositDisabled`] when deposits are off.
    /// - [`ReserveError::Expired`] when `deadline` is not in the future.
    /// - [`ReserveError::NoOp`] for a zero amount or a deposit too small to
    ///   mint a single raw share.
    /// - [`ReserveError::StrategyNotSet`] before a strategy is chosen.
    /// - [`ReserveError::InsufficientFunds`] when balance or allowance is short.
    /// - [`ReserveError::SwapFailed`] when the swap or supply fails.
    pub fn deposit_drc(
        &mut self,
        user: Address,
        amount: U256,
        deadline: u64,
    ) -> Result<DepositRecord, ReserveError> {
        if !self.deposit_enabled {
            return Err(ReserveError::DepositDisabled);
        }
        self.check_deadline(deadline)?;
        if amount.is_zero() {
            return Err(ReserveError::NoOp);
        }
        let pair = self.strategy.ok_or(ReserveError::StrategyNotSet)?;

        let balance = self.market.balance_of(self.deposit_asset, user);
        let allowance = self.market.allowance(self.deposit_asset, user, self.address);
        if balance < amount || allowance < amount {
            return Err(ReserveError::InsufficientFunds {
                required: amount,
                balance,
                allowance,
            });
        }

        self.transact("deposit", |reserve| reserve.run_deposit(user, amount, deadline, pair))
    }

    fn run_deposit(
        &mut self,
        user: Address,
        amount: U256,
        deadline: u64,
        pair: StrategyPair,
    ) -> Result<DepositRecord, ReserveError> {
        let supply_before = self.total_supply();
        let nav_before = self.net_asset_value()?;

        self.market
            .transfer_from(self.deposit_asset, self.address, user, self.address, amount)
            .map_err(ReserveError::market("pull deposit"))?;

        let path = self.swap_path(self.deposit_asset, pair.token_a);
        let min_out = self
            .market
            .quote_amount_out(amount, &path)
            .map_err(ReserveError::market("quote"))?;
        let acquired = self
            .market
            .swap_exact_in(self.address, amount, min_out, &path, deadline)
            .map_err(ReserveError::market("swap"))?;
        self.market
            .supply(self.address, pair.token_a, acquired)
            .map_err(ReserveError::market("supply"))?;

        let minted = if supply_before.is_zero() {
            amount
        } else if nav_before.is_zero() {
            return Err(ReserveError::Arithmetic(
                "shares outstanding against a zero NAV".into(),
            ));
        } else {
            math::mul_div_floor(amount, supply_before, nav_before)?
        };
        if minted.is_zero() {
            return Err(ReserveError::NoOp);
        }
        self.shares.mint(user, minted)?;

        let record = DepositRecord {
            user,
            amount,
            pod_minted: minted,
            pod_total_supply: self.total_supply(),
            tokens_stored: self.total_token_stored(),
        };
        info!(
            %user,
            %amount,
            pod_minted = %record.pod_minted,
            pod_total_supply = %record.pod_total_supply,
            tokens_stored = %record.tokens_stored,
            "deposit committed"
        );
        self.emit(ReserveEvent::Deposit(record.clone()));
        Ok(record)
    }
}
