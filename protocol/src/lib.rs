// Copyright (c) 2026 Digital Reserve Contributors. MIT License.
// See LICENSE for details.

//! # Digital Reserve — Protocol Library
//!
//! Everything the vault engine needs that is not the vault itself: the
//! amount and address types, checked fixed-point math, protocol constants,
//! a fungible-token ledger, and the external collaborators the vault calls
//! into (an AMM router, a lending protocol, token ledgers and a block clock).
//!
//! ## Architecture
//!
//! - **config** — Protocol constants: decimals, default fee, deadlines, ports.
//! - **math** — `mul_div` with explicit floor/ceil rounding over `U256`.
//! - **token** — Balance/allowance ledger with mint and burn primitives.
//! - **market** — Collaborator traits plus a deterministic in-memory market.
//! - **devnet** — Well-known addresses and a pre-seeded simulated market.
//!
//! ## Design Philosophy
//!
//! 1. Integers only. Amounts are raw 18-decimal units in a `U256`; nothing
//!    is ever a float until it reaches a metrics gauge.
//! 2. Every multiply-then-divide states its rounding direction.
//! 3. A failed external call leaves no trace in the market.

pub mod config;
pub mod devnet;
pub mod market;
pub mod math;
pub mod token;

pub use alloy_primitives::{Address, U256};
