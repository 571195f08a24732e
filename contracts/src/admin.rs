//! # Admin / Access Gate
//!
//! A single owner may toggle deposits, change the withdrawal fee, switch
//! strategy and hand over or renounce ownership. Once renounced, every
//! gated call fails for good.

use alloy_primitives::Address;
use dr_protocol::market::Market;
use tracing::info;

use crate::error::ReserveError;
use crate::events::{OwnershipTransferredRecord, ReserveEvent};
use crate::reserve::{DigitalReserve, WithdrawalFee};

impl<M: Market> DigitalReserve<M> {
    /// The current owner, `None` after renouncement.
    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// The withdrawal fee as `fraction / base`.
    pub fn withdrawal_fee(&self) -> WithdrawalFee {
        self.fee
    }

    pub(crate) fn only_owner(&self, caller: Address) -> Result<(), ReserveError> {
        match self.owner {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(ReserveError::NotAuthorized { caller }),
        }
    }

    /// Turns deposits on or off. Withdrawals are never gated.
    pub fn change_deposit_status(&mut self, caller: Address, enabled: bool) -> Result<(), ReserveError> {
        self.only_owner(caller)?;
        self.deposit_enabled = enabled;
        info!(enabled, "deposit status changed");
        Ok(())
    }

    /// Sets the withdrawal fee to `fraction / base`.
    ///
    /// # Errors
    ///
    /// [`ReserveError::NotAuthorized`] for a non-owner and
    /// [`ReserveError::InvalidFee`] unless `fraction <= base` and `base > 0`.
    pub fn change_fee(&mut self, caller: Address, fraction: u64, base: u64) -> Result<(), ReserveError> {
        self.only_owner(caller)?;
        self.fee = WithdrawalFee::new(fraction, base)?;
        info!(fraction, base, "withdrawal fee changed");
        Ok(())
    }

    /// Hands ownership to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), ReserveError> {
        self.only_owner(caller)?;
        if new_owner == Address::ZERO {
            return Err(ReserveError::InvalidOwner);
        }
        self.set_owner(Some(new_owner));
        Ok(())
    }

    /// Leaves the reserve without an owner.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), ReserveError> {
        self.only_owner(caller)?;
        self.set_owner(None);
        Ok(())
    }

    fn set_owner(&mut self, new_owner: Option<Address>) {
        let previous_owner = self.owner;
        self.owner = new_owner;
        info!(?previous_owner, ?new_owner, "ownership transferred");
        self.emit(ReserveEvent::OwnershipTransferred(OwnershipTransferredRecord {
            previous_owner,
            new_owner,
        }));
    }
}
