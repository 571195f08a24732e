//! # Devnet
//!
//! Well-known asset addresses and a pre-seeded [`SimulatedMarket`] that
//! mirrors the mainnet deployment the vault was built for: DRC as the
//! deposit asset, WETH as the routing asset, and USDC / DAI as strategy
//! assets held in a lending protocol as aUSDC / aDAI.
//!
//! Pool depths are chosen so one DRC trades for roughly one USDC and a
//! full deposit-then-withdraw round trip costs less than the default 1%
//! withdrawal fee.

use alloy_primitives::{address, Address, U256};

use crate::config::{units, DEFAULT_POOL_FEE_BPS};
use crate::market::{MarketError, SimulatedMarket};

/// Digital Reserve Currency, the deposit asset.
pub const DRC: Address = address!("a150Db9b1Fa65b44799d4dD949D922c0a33Ee606");
/// Wrapped Ether, the routing asset.
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
/// USD Coin.
pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
/// Lending wrapper for USDC.
pub const AUSDC: Address = address!("Bcca60bB61934080951369a648Fb03DF4F96263C");
/// Dai stablecoin.
pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
/// Lending wrapper for DAI.
pub const ADAI: Address = address!("028171bCA77440897B824Ca71D1c56caC55b68A3");
/// Where the lending protocol holds supplied assets.
pub const LENDING_POOL: Address = address!("B53C1a33016B2DC2fF3653530bfF1848a515c8c5");
/// The vault's own account.
pub const RESERVE: Address = address!("00000000000000000000000000000000000D1e5e");
/// Default deployer and owner of the devnet vault.
pub const DEPLOYER: Address = address!("00000000000000000000000000000000000De901");

/// DRC / WETH pool fee.
pub const DRC_POOL_FEE_BPS: u64 = DEFAULT_POOL_FEE_BPS;
/// WETH / stablecoin pool fee.
pub const STABLE_POOL_FEE_BPS: u64 = 5;

/// Pool seed amounts, in whole tokens.
const DRC_DEPTH: u64 = 1_000_000_000;
const WETH_DEPTH: u64 = 500_000;
const STABLE_DEPTH: u64 = 1_000_000_000;

/// Builds the devnet market at block time `now`.
///
/// # Errors
///
/// Only fails if the seed amounts overflow a ledger, which they do not.
pub fn devnet_market(now: u64) -> Result<SimulatedMarket, MarketError> {
    let mut market = SimulatedMarket::new(now, LENDING_POOL);
    market.register_token(DRC, "Digital Reserve Currency", "DRC", 18);
    market.register_token(WETH, "Wrapped Ether", "WETH", 18);
    market.register_token(USDC, "USD Coin", "USDC", 18);
    market.register_token(AUSDC, "Aave interest bearing USDC", "aUSDC", 18);
    market.register_token(DAI, "Dai Stablecoin", "DAI", 18);
    market.register_token(ADAI, "Aave interest bearing DAI", "aDAI", 18);

    market.create_pool(DRC, units(DRC_DEPTH), WETH, units(WETH_DEPTH), DRC_POOL_FEE_BPS)?;
    market.create_pool(WETH, units(WETH_DEPTH), USDC, units(STABLE_DEPTH), STABLE_POOL_FEE_BPS)?;
    market.create_pool(WETH, units(WETH_DEPTH), DAI, units(STABLE_DEPTH), STABLE_POOL_FEE_BPS)?;

    market.list_lending_reserve(USDC, AUSDC)?;
    market.list_lending_reserve(DAI, ADAI)?;
    Ok(market)
}

/// Symbol of a devnet asset, for logs and API output.
pub fn symbol_of(token: Address) -> Option<&'static str> {
    match token {
        t if t == DRC => Some("DRC"),
        t if t == WETH => Some("WETH"),
        t if t == USDC => Some("USDC"),
        t if t == AUSDC => Some("aUSDC"),
        t if t == DAI => Some("DAI"),
        t if t == ADAI => Some("aDAI"),
        _ => None,
    }
}

/// Resolves a devnet asset by symbol, case-insensitively.
pub fn token_by_symbol(symbol: &str) -> Option<Address> {
    match symbol.to_ascii_uppercase().as_str() {
        "DRC" => Some(DRC),
        "WETH" => Some(WETH),
        "USDC" => Some(USDC),
        "AUSDC" => Some(AUSDC),
        "DAI" => Some(DAI),
        "ADAI" => Some(ADAI),
        _ => None,
    }
}

/// Credits `whole` DRC to `account`.
pub fn faucet(market: &mut SimulatedMarket, account: Address, whole: u64) -> Result<U256, MarketError> {
    let amount = units(whole);
    market.mint(DRC, account, amount)?;
    Ok(amount)
}
