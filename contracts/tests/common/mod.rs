//! Shared fixtures for the reserve integration tests.

#![allow(dead_code)]

use alloy_primitives::{address, Address, U256};
use dr_contracts::{DigitalReserve, ReserveConfig};
use dr_protocol::config::{units, DEFAULT_DEADLINE_WINDOW_SECS};
use dr_protocol::devnet::{self, devnet_market, DEPLOYER};
use dr_protocol::market::{AssetLedger, SimulatedMarket};

pub type Reserve = DigitalReserve<SimulatedMarket>;

pub const NOW: u64 = 1_700_000_000;
pub const ALICE: Address = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");
pub const CAROL: Address = address!("c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0");
pub const BOB: Address = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");

/// A deadline inside the default window.
pub fn deadline() -> u64 {
    NOW + DEFAULT_DEADLINE_WINDOW_SECS
}

/// A fresh devnet reserve: deposits off, no strategy.
pub fn fresh_reserve() -> Reserve {
    DigitalReserve::new(ReserveConfig::devnet(DEPLOYER), devnet_market(NOW).unwrap()).unwrap()
}

/// A devnet reserve with deposits on and USDC as the strategy asset.
pub fn live_reserve() -> Reserve {
    let mut reserve = fresh_reserve();
    reserve.change_deposit_status(DEPLOYER, true).unwrap();
    reserve.set_token_address(DEPLOYER, devnet::USDC, deadline()).unwrap();
    reserve
}

/// Credits `whole` DRC to `user` and approves the reserve for all of it.
pub fn fund(reserve: &mut Reserve, user: Address, whole: u64) -> U256 {
    let spender = reserve.address();
    let market = reserve.market_mut();
    devnet::faucet(market, user, whole).unwrap();
    market.approve(devnet::DRC, user, spender, U256::MAX).unwrap();
    units(whole)
}

/// Funds `user` and deposits `whole` DRC.
pub fn deposit(reserve: &mut Reserve, user: Address, whole: u64) -> dr_contracts::DepositRecord {
    let amount = fund(reserve, user, whole);
    reserve.deposit_drc(user, amount, deadline()).unwrap()
}

pub fn drc_balance(reserve: &Reserve, user: Address) -> U256 {
    reserve.market().balance_of(devnet::DRC, user)
}
