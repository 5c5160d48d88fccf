//! Ledger invariants over arbitrary placement sequences

use proptest::prelude::*;
use roulette_sim::gaming::{BetKind, BetLedger, BetTarget, TableLimits};

fn target_strategy() -> impl Strategy<Value = BetTarget> {
    prop_oneof![
        (0u8..=36).prop_map(|n| BetTarget::straight(n).unwrap()),
        (1usize..13).prop_map(|i| BetTarget::outside(BetKind::ALL[i]).unwrap()),
    ]
}

fn limits() -> TableLimits {
    TableLimits {
        min_bet: 100,
        max_bet: 10_000,
    }
}

proptest! {
    #[test]
    fn balance_tracks_accepted_stakes(
        start in 0u64..60_000,
        placements in prop::collection::vec((target_strategy(), 0u64..12_000), 0..40),
    ) {
        let mut ledger = BetLedger::new(limits());
        let mut balance = start;
        let mut accepted = 0u64;

        for (target, amount) in placements {
            let before_balance = balance;
            let before_bets = ledger.active().clone();
            match ledger.place(&mut balance, target, amount) {
                Ok(()) => accepted += amount,
                Err(_) => {
                    prop_assert_eq!(balance, before_balance);
                    prop_assert_eq!(ledger.active(), &before_bets);
                }
            }
            prop_assert!(ledger.total_active() <= limits().max_bet);
        }

        prop_assert_eq!(balance, start - accepted);
        prop_assert_eq!(ledger.total_active(), accepted);
    }

    #[test]
    fn clear_restores_balance(
        start in 10_000u64..60_000,
        placements in prop::collection::vec((target_strategy(), 100u64..2_000), 1..10),
    ) {
        let mut ledger = BetLedger::new(limits());
        let mut balance = start;
        for (target, amount) in placements {
            let _ = ledger.place(&mut balance, target, amount);
        }
        ledger.clear(&mut balance);
        prop_assert_eq!(balance, start);
        prop_assert!(ledger.active().is_empty());
    }

    #[test]
    fn failed_repeat_changes_nothing(
        previous in prop::collection::vec((target_strategy(), 100u64..3_000), 1..6),
        current in prop::collection::vec((target_strategy(), 100u64..3_000), 0..6),
        balance_after_round in 0u64..20_000,
    ) {
        let mut ledger = BetLedger::new(limits());
        let mut balance = 1_000_000u64;
        for (target, amount) in previous {
            let _ = ledger.place(&mut balance, target, amount);
        }
        ledger.close_round();

        let mut balance = balance_after_round;
        for (target, amount) in current {
            let _ = ledger.place(&mut balance, target, amount);
        }

        let before_balance = balance;
        let before_bets = ledger.active().clone();
        match ledger.repeat_last(&mut balance) {
            Ok(()) => {
                prop_assert_eq!(balance, before_balance - ledger.last().total());
            }
            Err(_) => {
                prop_assert_eq!(balance, before_balance);
                prop_assert_eq!(ledger.active(), &before_bets);
            }
        }
    }
}
