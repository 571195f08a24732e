//! Property tests for share issuance.

mod common;

use alloy_primitives::U256;
use common::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Shares minted for two deposits stay in the ratio of the deposits.
    #[test]
    fn minted_shares_are_proportional(a in 1u64..1_000_000, b in 1u64..1_000_000) {
        let mut reserve = live_reserve();
        let first = deposit(&mut reserve, ALICE, a);
        let second = deposit(&mut reserve, BOB, b);

        // minted_b / minted_a within 1% of b / a.
        let lhs = second.pod_minted * U256::from(a);
        let rhs = first.pod_minted * U256::from(b);
        let diff = if lhs > rhs { lhs - rhs } else { rhs - lhs };
        prop_assert!(diff * U256::from(100u64) <= rhs);
    }

    /// Depositing into a live reserve never lowers the POD price.
    #[test]
    fn deposits_never_lower_price(
        seed in 1u64..1_000_000,
        deposits in proptest::collection::vec(1u64..500_000, 1..6),
    ) {
        let mut reserve = live_reserve();
        deposit(&mut reserve, ALICE, seed);

        for (i, whole) in deposits.into_iter().enumerate() {
            let before = reserve.get_proof_of_deposit_price().unwrap();
            let user = if i % 2 == 0 { BOB } else { CAROL };
            deposit(&mut reserve, user, whole);
            prop_assert!(reserve.get_proof_of_deposit_price().unwrap() >= before);
        }
    }

    /// A partial withdrawal burns exactly what the supply loses and pays
    /// exactly what was asked. Sizes stay well inside pool depth so the
    /// round-trip spread is covered by the 1% fee.
    #[test]
    fn withdrawal_conserves_supply(whole in 1_000u64..100_000, pct in 1u8..100) {
        let mut reserve = live_reserve();
        deposit(&mut reserve, ALICE, whole);
        deposit(&mut reserve, BOB, whole);

        let supply = reserve.total_supply();
        let paid_before = drc_balance(&reserve, ALICE);
        let record = reserve.withdraw_percentage(ALICE, pct, deadline()).unwrap();

        prop_assert_eq!(record.pod_total_supply, supply - record.pod_burned);
        prop_assert_eq!(drc_balance(&reserve, ALICE), paid_before + record.amount);
    }
}
