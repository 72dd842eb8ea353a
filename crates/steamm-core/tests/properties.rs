//! Property-based checks of the quoting and utilisation invariants

use proptest::prelude::*;
use steamm_core::bank::{effective_utilisation_bps, needs_lending_action};
use steamm_core::cpmm::{check_invariance, k, quote_swap};
use steamm_core::fees::compute_fee;
use steamm_core::{FeeConfig, LendingAction, Pool, SwapFeeConfig};

struct TokenA;
struct TokenB;

prop_compose! {
    fn reserves_strategy()(
        reserve_a in 1_000u64..1_000_000_000_000u64,
        reserve_b in 1_000u64..1_000_000_000_000u64,
        offset in prop_oneof![Just(0u64), 1u64..1_000_000_000u64],
    ) -> (u64, u64, u64) {
        (reserve_a, reserve_b, offset)
    }
}

prop_compose! {
    fn swap_fees_strategy()(
        fee_bps in 0u64..1_000u64,
        min_fee in 0u64..10u64,
        protocol_share_bps in 0u16..=10_000u16,
    ) -> SwapFeeConfig {
        let fee = FeeConfig::from_bps(fee_bps, min_fee).unwrap();
        SwapFeeConfig::new(fee, protocol_share_bps).unwrap()
    }
}

prop_compose! {
    fn band_strategy()(target in 0u16..=10_000u16)(
        target in Just(target),
        buffer in 0u16..=target,
    ) -> (u16, u16) {
        (target, buffer)
    }
}

prop_compose! {
    fn redemption_fee_strategy()(
        fee_bps in prop_oneof![Just(0u64), 1u64..500u64],
        min_fee in 0u64..100u64,
    ) -> FeeConfig {
        FeeConfig::from_bps(fee_bps, min_fee).unwrap()
    }
}

proptest! {
    #[test]
    fn prop_swap_never_decreases_k(
        (reserve_a, reserve_b, offset) in reserves_strategy(),
        fees in swap_fees_strategy(),
        amount_in in 1u64..10_000_000_000u64,
        a2b in any::<bool>(),
    ) {
        if let Ok(quote) = quote_swap(reserve_a, reserve_b, amount_in, offset, a2b, &fees) {
            let k0 = k(reserve_a, reserve_b, offset).unwrap();
            let net_in = quote.amount_in_net().unwrap();
            let (new_a, new_b) = if a2b {
                (reserve_a + net_in, reserve_b - quote.amount_out)
            } else {
                (reserve_a - quote.amount_out, reserve_b + net_in)
            };
            prop_assert!(check_invariance(k0, new_a, new_b, offset).is_ok());
        }
    }

    #[test]
    fn prop_swap_never_drains_output(
        (reserve_a, reserve_b, offset) in reserves_strategy(),
        fees in swap_fees_strategy(),
        amount_in in 1u64..u64::MAX / 2,
        a2b in any::<bool>(),
    ) {
        if let Ok(quote) = quote_swap(reserve_a, reserve_b, amount_in, offset, a2b, &fees) {
            let reserve_out = if a2b { reserve_b } else { reserve_a };
            prop_assert!(quote.amount_out > 0);
            prop_assert!(quote.amount_out < reserve_out);
            prop_assert_eq!(quote.total_fees(), fees.pool_fee.compute_fee(amount_in).unwrap());
        }
    }

    #[test]
    fn prop_fee_is_ceiling(
        amount in 1u64..u64::MAX,
        fee_numerator in 0u64..10_000u64,
    ) {
        let config = FeeConfig::new(fee_numerator, 10_000, 0).unwrap();
        let fee = compute_fee(&config, amount).unwrap() as u128;
        let exact = amount as u128 * fee_numerator as u128;
        prop_assert!(fee * 10_000 >= exact);
        prop_assert!(fee == 0 || (fee - 1) * 10_000 < exact);
    }

    #[test]
    fn prop_deposit_then_redeem_returns_at_most_deposit(
        initial_a in 100_000u64..1_000_000_000u64,
        initial_b in 100_000u64..1_000_000_000u64,
        max_a in 1u64..1_000_000_000u64,
        max_b in 1u64..1_000_000_000u64,
        redemption_fee in redemption_fee_strategy(),
    ) {
        let swap_fees = SwapFeeConfig::new(FeeConfig::zero(), 0).unwrap();
        let mut pool: Pool<TokenA, TokenB> = Pool::new(swap_fees, redemption_fee, 0, 0).unwrap();
        pool.deposit(initial_a, initial_b, 0).unwrap();

        if let Ok(deposit) = pool.deposit(max_a, max_b, 0) {
            let redeem = pool.redeem(deposit.mint_lp, 0, 0).unwrap();
            prop_assert!(redeem.withdraw_a <= deposit.deposit_a);
            prop_assert!(redeem.withdraw_b <= deposit.deposit_b);
            // Fees never exceed the gross share and stay in the fee balance
            prop_assert!(redeem.gross_a() <= deposit.deposit_a);
            prop_assert!(redeem.gross_b() <= deposit.deposit_b);
            prop_assert_eq!(pool.redemption_fees().balances(), (redeem.fees_a, redeem.fees_b));
        }
    }

    #[test]
    fn prop_band_partitions_utilisation(
        available in 0u64..1_000_000_000u64,
        deployed in 0u64..1_000_000_000u64,
        (target, buffer) in band_strategy(),
    ) {
        let action = needs_lending_action(available, deployed, target, buffer, 0, true).unwrap();
        let effective = effective_utilisation_bps(available, deployed);
        let lower = (target - buffer) as u64;
        let upper = target as u64 + buffer as u64;

        let expected = if effective < lower {
            LendingAction::Recall
        } else if effective > upper {
            LendingAction::Lend
        } else {
            LendingAction::None
        };
        prop_assert_eq!(action, expected);

        // Pure decision: asking again changes nothing
        let again = needs_lending_action(available, deployed, target, buffer, 0, true).unwrap();
        prop_assert_eq!(action, again);
    }

    #[test]
    fn prop_shortfall_always_recalls(
        available in 0u64..1_000_000u64,
        deployed in 0u64..1_000_000u64,
        excess in 1u64..1_000_000u64,
        (target, buffer) in band_strategy(),
    ) {
        let action =
            needs_lending_action(available, deployed, target, buffer, available + excess, false).unwrap();
        prop_assert_eq!(action, LendingAction::Recall);
    }
}
