//! # Protocol Configuration & Constants
//!
//! Every magic number in the reserve lives here. The vault, the node and
//! the tests all read from this module so that a fee or a decimal change
//! happens in exactly one place.

use alloy_primitives::U256;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The protocol version string reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Share Token (POD)
// ---------------------------------------------------------------------------

/// Human-readable name of the share token.
pub const POD_NAME: &str = "Digital Reserve";

/// Ticker of the share token.
pub const POD_SYMBOL: &str = "DR-POD";

/// Decimal places of the share token. One whole POD is `10^18` raw units.
pub const POD_DECIMALS: u8 = 18;

/// Decimal places of the POD price. The price is quoted in raw deposit-asset
/// units per whole POD, which is 18-decimal fixed point for an 18-decimal
/// deposit asset.
pub const PRICE_DECIMALS: u8 = 18;

/// Fixed-point scale, `10^18`.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// [`SCALE`] as a `U256`.
pub fn scale() -> U256 {
    U256::from(SCALE)
}

/// Converts whole tokens into raw 18-decimal units.
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * scale()
}

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Default withdrawal fee numerator. Together with the base: 1%.
pub const DEFAULT_WITHDRAWAL_FEE_FRACTION: u64 = 1;

/// Default withdrawal fee denominator.
pub const DEFAULT_WITHDRAWAL_FEE_BASE: u64 = 100;

/// Upper bound accepted by `withdraw_percentage`.
pub const MAX_WITHDRAW_PERCENTAGE: u8 = 100;

// ---------------------------------------------------------------------------
// Market Parameters
// ---------------------------------------------------------------------------

/// Basis-point denominator used by pool fees and lending yield.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default constant-product pool fee: 30 bps, the Uniswap V2 rate.
pub const DEFAULT_POOL_FEE_BPS: u64 = 30;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Default validity window for a caller-supplied deadline, in seconds.
pub const DEFAULT_DEADLINE_WINDOW_SECS: u64 = 600;

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_matches_decimals() {
        assert_eq!(scale(), U256::from(10u64).pow(U256::from(POD_DECIMALS)));
    }

    #[test]
    fn test_units_scales_whole_tokens() {
        assert_eq!(units(0), U256::ZERO);
        assert_eq!(units(3), U256::from(3u64) * scale());
    }

    #[test]
    fn test_default_fee_is_valid_fraction() {
        assert!(DEFAULT_WITHDRAWAL_FEE_BASE > 0);
        assert!(DEFAULT_WITHDRAWAL_FEE_FRACTION <= DEFAULT_WITHDRAWAL_FEE_BASE);
    }

    #[test]
    fn test_pool_fee_below_denominator() {
        assert!(DEFAULT_POOL_FEE_BPS < BPS_DENOMINATOR);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}
