//! # Strategy Switch
//!
//! Moves the whole position from one strategy asset to another in a single
//! all-or-nothing step: withdraw everything from the lending protocol, swap
//! it into the new asset, supply that. The wrapper for the new asset comes
//! from the lending protocol's own mapping.

use alloy_primitives::Address;
use dr_protocol::devnet;
use dr_protocol::market::Market;
use tracing::info;

use crate::error::ReserveError;
use crate::events::{ReserveEvent, SetTokenRecord};
use crate::reserve::{DigitalReserve, StrategyPair};

impl<M: Market> DigitalReserve<M> {
    /// Switches the strategy to `new_token_a`, migrating any held position.
    ///
    /// With nothing stored only the configuration changes. The first call on
    /// a fresh reserve is how the owner picks the initial strategy.
    ///
    /// # Errors
    ///
    /// - [`ReserveError::NotAuthorized`] unless `caller` is the owner.
    /// - [`ReserveError::Expired`] when `deadline` is not in the future.
    /// - [`ReserveError::UnsupportedStrategyAsset`] when the lending protocol
    ///   has no wrapper for `new_token_a`.
    /// - [`ReserveError::NoOp`] when `new_token_a` is already the strategy.
    /// - [`ReserveError::SwapFailed`] when migration fails; the old pair and
    ///   position are left untouched.
    pub fn set_token_address(
        &mut self,
        caller: Address,
        new_token_a: Address,
        deadline: u64,
    ) -> Result<SetTokenRecord, ReserveError> {
        self.only_owner(caller)?;
        self.check_deadline(deadline)?;
        let new_token_b = self
            .market
            .wrapper_of(new_token_a)
            .ok_or(ReserveError::UnsupportedStrategyAsset(new_token_a))?;
        if self.strategy.map(|pair| pair.token_a) == Some(new_token_a) {
            return Err(ReserveError::NoOp);
        }
        let new_pair = StrategyPair {
            token_a: new_token_a,
            token_b: new_token_b,
        };

        self.transact("set_token_address", |reserve| reserve.run_switch(new_pair, deadline))
    }

    fn run_switch(&mut self, new_pair: StrategyPair, deadline: u64) -> Result<SetTokenRecord, ReserveError> {
        let old = self.strategy;
        let stored = self.total_token_stored();

        if let Some(old_pair) = old.filter(|_| !stored.is_zero()) {
            let withdrawn = self
                .market
                .withdraw(self.address, old_pair.token_a, stored)
                .map_err(ReserveError::market("liquidate"))?;
            let path = self.swap_path(old_pair.token_a, new_pair.token_a);
            let min_out = self
                .market
                .quote_amount_out(withdrawn, &path)
                .map_err(ReserveError::market("quote"))?;
            let acquired = self
                .market
                .swap_exact_in(self.address, withdrawn, min_out, &path, deadline)
                .map_err(ReserveError::market("swap"))?;
            self.market
                .supply(self.address, new_pair.token_a, acquired)
                .map_err(ReserveError::market("supply"))?;
        }
        self.strategy = Some(new_pair);

        let record = SetTokenRecord {
            old_token_a: old.map(|pair| pair.token_a),
            old_token_b: old.map(|pair| pair.token_b),
            new_token_a: new_pair.token_a,
            new_token_b: new_pair.token_b,
            tokens_stored: self.total_token_stored(),
        };
        info!(
            old_token_a = ?record.old_token_a,
            new_token_a = %record.new_token_a,
            symbol = devnet::symbol_of(record.new_token_a).unwrap_or("unknown"),
            new_token_b = %record.new_token_b,
            migrated = %stored,
            tokens_stored = %record.tokens_stored,
            "strategy switched"
        );
        self.emit(ReserveEvent::SetToken(record.clone()));
        Ok(record)
    }
}
