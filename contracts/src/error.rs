//! Errors returned by the reserve.
//!
//! Every variant aborts the whole operation: when a `ReserveError` comes
//! back, neither the share ledger nor the market has moved.

use alloy_primitives::{Address, U256};
use dr_protocol::market::MarketError;
use dr_protocol::math::MathError;
use dr_protocol::token::LedgerError;
use thiserror::Error;

/// Errors that can occur during reserve operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReserveError {
    /// The caller's deadline passed before an irreversible step.
    #[error("transaction expired: deadline {deadline}, now {now}")]
    Expired {
        /// The caller-supplied deadline (unix seconds).
        deadline: u64,
        /// The block time at execution.
        now: u64,
    },

    /// Deposits are switched off by the owner.
    #[error("deposits are disabled")]
    DepositDisabled,

    /// The depositor has not approved or does not hold enough deposit asset.
    #[error("insufficient funds: need {required}, balance {balance}, allowance {allowance}")]
    InsufficientFunds {
        /// The deposit amount.
        required: U256,
        /// The depositor's deposit-asset balance.
        balance: U256,
        /// What the reserve may pull on the depositor's behalf.
        allowance: U256,
    },

    /// The withdrawal exceeds the caller's post-fee entitlement.
    #[error("insufficient share value: requested {requested}, withdrawable {available}")]
    InsufficientShareValue {
        /// The requested net amount.
        requested: U256,
        /// The caller's withdrawable value.
        available: U256,
    },

    /// An AMM or lending call failed or breached its slippage bound.
    #[error("{stage} failed: {source}")]
    SwapFailed {
        /// The pipeline step that failed.
        stage: &'static str,
        /// The collaborator error.
        #[source]
        source: MarketError,
    },

    /// The fee is not a fraction in `[0, 1]` with a non-zero base.
    #[error("invalid fee {fraction}/{base}")]
    InvalidFee {
        /// Fee numerator.
        fraction: u64,
        /// Fee denominator.
        base: u64,
    },

    /// The caller is not the owner.
    #[error("caller {caller} is not the owner")]
    NotAuthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// The operation would not change anything.
    #[error("operation has no effect")]
    NoOp,

    /// No strategy pair has been configured yet.
    #[error("no strategy asset configured")]
    StrategyNotSet,

    /// The asset has no yield-bearing wrapper in the lending protocol.
    #[error("asset {0} has no yield-bearing wrapper")]
    UnsupportedStrategyAsset(Address),

    /// The zero address cannot own the reserve.
    #[error("new owner is the zero address")]
    InvalidOwner,

    /// Withdrawal percentage above 100.
    #[error("invalid withdrawal percentage {0}, expected 0..=100")]
    InvalidPercentage(u8),

    /// Share or price arithmetic overflowed or divided by zero.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// The share ledger rejected a mint, burn or transfer.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<MathError> for ReserveError {
    fn from(err: MathError) -> Self {
        ReserveError::Arithmetic(err.to_string())
    }
}

impl ReserveError {
    /// Classifies a collaborator failure raised during `stage`. Expiry keeps
    /// its own variant; everything else is a swap failure.
    pub(crate) fn market(stage: &'static str) -> impl FnOnce(MarketError) -> ReserveError {
        move |source| match source {
            MarketError::Expired { deadline, now } => ReserveError::Expired { deadline, now },
            source => ReserveError::SwapFailed { stage, source },
        }
    }
}
