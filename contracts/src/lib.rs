//! # Digital Reserve Vault Engine
//!
//! A single-asset reserve: it accepts one deposit asset, holds it as a
//! yield-bearing strategy position in an external lending protocol, and
//! issues Proof-of-Deposit (POD) shares whose price tracks the reserve's
//! net asset value as quoted live by an AMM.
//!
//! - **Valuation** — NAV, POD price and per-holder value.
//! - **Deposit** — pull, swap, supply, mint.
//! - **Withdraw** — burn, liquidate, swap back, pay out net of fee.
//! - **Strategy** — owner-driven migration to a new strategy asset.
//! - **Admin** — deposit toggle, fee, ownership.
//!
//! ## Design Principles
//!
//! 1. Every operation is all-or-nothing. The reserve snapshots itself and
//!    the market it owns, and restores both on any error.
//! 2. Every multiply-then-divide rounds in the reserve's favour: mint down,
//!    burn up, liquidate down.
//! 3. Each committed operation returns its record and appends it to an
//!    ordered audit log.
//! 4. The reserve is generic over [`Market`](dr_protocol::market::Market),
//!    so the same engine runs against the simulated market and any other
//!    implementation of the collaborator traits.

pub mod admin;
pub mod deposit;
pub mod error;
pub mod events;
pub mod reserve;
pub mod strategy;
pub mod valuation;
pub mod withdraw;

pub use error::ReserveError;
pub use events::{DepositRecord, OwnershipTransferredRecord, ReserveEvent, SetTokenRecord, WithdrawRecord};
pub use reserve::{DigitalReserve, ReserveConfig, StrategyPair, WithdrawalFee};
pub use valuation::VaultValue;
