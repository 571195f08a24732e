//! # Withdraw Pipeline
//!
//! Two entry points share one core. A holder asks for a net `amount`; the
//! reserve grosses it up by the fee, burns the shares that gross amount is
//! worth at the current price, liquidates the same fraction of the position
//! and pays `amount` out. Whatever the liquidation yields above `amount`
//! stays in the reserve as the fee.
//!
//! NAV is the buy-back cost of the position, so a sale returns less than it
//! by the pool's round-trip spread. When the fee does not cover that spread,
//! a partial exit tops the payout up from the idle deposit asset the reserve
//! already holds and fails only if that is not enough. A full exit never
//! fails on a shortfall: it pays out everything it realizes, up to `amount`.
//!
//! ```text
//! gross   = ceil(amount * base / (base - fraction))
//! burned  = min(ceil(gross * supply / nav), balance)    balance on a full exit
//! tokens  = floor(stored * burned / supply)             stored when burned == supply
//! ```

use alloy_primitives::{Address, U256};
use dr_protocol::config::MAX_WITHDRAW_PERCENTAGE;
use dr_protocol::market::Market;
use dr_protocol::math;
use tracing::{info, warn};

use crate::error::ReserveError;
use crate::events::{ReserveEvent, WithdrawRecord};
use crate::reserve::DigitalReserve;
use crate::valuation::VaultValue;

impl<M: Market> DigitalReserve<M> {
    /// Withdraws exactly `amount` of the deposit asset, net of fee, to `user`.
    ///
    /// Asking for the full withdrawable value is a full exit: every share the
    /// holder owns is burned, and if they were the last holder the whole
    /// position is swept.
    ///
    /// # Errors
    ///
    /// - [`ReserveError::Expired`] when `deadline` is not in the future.
    /// - [`ReserveError::NoOp`] for a zero amount.
    /// - [`ReserveError::InsufficientShareValue`] above the holder's entitlement.
    /// - [`ReserveError::SwapFailed`] when a partial exit's liquidation plus
    ///   the idle deposit asset falls short of `amount`, or any collaborator
    ///   call fails.
    pub fn withdraw_drc(
        &mut self,
        user: Address,
        amount: U256,
        deadline: u64,
    ) -> Result<WithdrawRecord, ReserveError> {
        self.check_deadline(deadline)?;
        if amount.is_zero() {
            return Err(ReserveError::NoOp);
        }
        let value = self.get_user_vault_in_drc(user)?;
        if amount > value.withdrawable {
            return Err(ReserveError::InsufficientShareValue {
                requested: amount,
                available: value.withdrawable,
            });
        }

        self.transact("withdraw", |reserve| reserve.run_withdraw(user, amount, deadline, value))
    }

    /// Withdraws `pct` percent of `user`'s withdrawable value.
    ///
    /// # Errors
    ///
    /// [`ReserveError::InvalidPercentage`] above 100, [`ReserveError::NoOp`]
    /// for zero or when the slice rounds to nothing, otherwise as
    /// [`withdraw_drc`](Self::withdraw_drc).
    pub fn withdraw_percentage(
        &mut self,
        user: Address,
        pct: u8,
        deadline: u64,
    ) -> Result<WithdrawRecord, ReserveError> {
        if pct > MAX_WITHDRAW_PERCENTAGE {
            return Err(ReserveError::InvalidPercentage(pct));
        }
        if pct == 0 {
            return Err(ReserveError::NoOp);
        }
        self.check_deadline(deadline)?;
        let value = self.get_user_vault_in_drc(user)?;
        let amount = if pct == MAX_WITHDRAW_PERCENTAGE {
            value.withdrawable
        } else {
            math::mul_div_floor(
                value.withdrawable,
                U256::from(pct),
                U256::from(MAX_WITHDRAW_PERCENTAGE),
            )?
        };
        self.withdraw_drc(user, amount, deadline)
    }

    fn run_withdraw(
        &mut self,
        user: Address,
        amount: U256,
        deadline: u64,
        value: VaultValue,
    ) -> Result<WithdrawRecord, ReserveError> {
        let pair = self.strategy.ok_or(ReserveError::StrategyNotSet)?;
        let supply = self.total_supply();
        let balance = self.balance_of(user);
        let stored = self.total_token_stored();

        let burned = if amount == value.withdrawable {
            balance
        } else {
            let gross = self.fee.gross_for(amount)?;
            let nav = self.net_asset_value()?;
            math::mul_div_ceil(gross, supply, nav)?.min(balance)
        };
        let tokens = if burned == supply {
            stored
        } else {
            math::mul_div_floor(stored, burned, supply)?
        };

        let retained = self.retained_fees();
        let min_out = if burned == balance {
            U256::ZERO
        } else {
            amount.saturating_sub(retained)
        };

        let withdrawn = self
            .market
            .withdraw(self.address, pair.token_a, tokens)
            .map_err(ReserveError::market("liquidate"))?;
        let path = self.swap_path(pair.token_a, self.deposit_asset);
        let proceeds = self
            .market
            .swap_exact_in(self.address, withdrawn, min_out, &path, deadline)
            .map_err(ReserveError::market("swap"))?;
        let payout = amount.min(math::add(proceeds, retained)?);
        let fees = proceeds.saturating_sub(payout);
        if payout < amount {
            warn!(%user, requested = %amount, %payout, "full exit short of requested amount");
        }

        self.shares.burn(user, burned)?;
        self.market
            .transfer(self.deposit_asset, self.address, user, payout)
            .map_err(ReserveError::market("payout"))?;

        let record = WithdrawRecord {
            user,
            amount: payout,
            fees,
            pod_burned: burned,
            pod_total_supply: self.total_supply(),
            tokens_stored: self.total_token_stored(),
        };
        info!(
            %user,
            amount = %record.amount,
            fees = %record.fees,
            pod_burned = %record.pod_burned,
            pod_total_supply = %record.pod_total_supply,
            tokens_stored = %record.tokens_stored,
            "withdrawal committed"
        );
        self.emit(ReserveEvent::Withdraw(record.clone()));
        Ok(record)
    }
}
