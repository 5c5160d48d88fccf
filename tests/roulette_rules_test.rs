//! Win predicate against European single-zero semantics for every pocket and bet kind

use roulette_sim::gaming::{roulette_rules, BetKind, BetTarget, Color, Outcome, WHEEL};

const REDS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

fn expected(kind: BetKind, straight_on: u8, n: u8) -> bool {
    let nonzero = n != 0;
    match kind {
        BetKind::Straight => n == straight_on,
        BetKind::Red => REDS.contains(&n),
        BetKind::Black => nonzero && !REDS.contains(&n),
        BetKind::Odd => nonzero && n % 2 == 1,
        BetKind::Even => nonzero && n % 2 == 0,
        BetKind::Low => (1..=18).contains(&n),
        BetKind::High => (19..=36).contains(&n),
        BetKind::Dozen1 => (1..=12).contains(&n),
        BetKind::Dozen2 => (13..=24).contains(&n),
        BetKind::Dozen3 => (25..=36).contains(&n),
        BetKind::Column1 => nonzero && n % 3 == 1,
        BetKind::Column2 => nonzero && n % 3 == 2,
        BetKind::Column3 => nonzero && n % 3 == 0,
    }
}

#[test]
fn test_predicate_grid() {
    for n in 0..=36u8 {
        let outcome = Outcome::from_number(n).unwrap();
        for kind in BetKind::ALL {
            if kind.is_straight() {
                for target_number in 0..=36u8 {
                    let target = BetTarget::straight(target_number).unwrap();
                    assert_eq!(
                        roulette_rules::wins(&target, &outcome),
                        expected(kind, target_number, n),
                        "straight {} on {}",
                        target_number,
                        n
                    );
                }
            } else {
                let target = BetTarget::outside(kind).unwrap();
                assert_eq!(
                    roulette_rules::wins(&target, &outcome),
                    expected(kind, 0, n),
                    "{:?} on {}",
                    kind,
                    n
                );
            }
        }
    }
}

#[test]
fn test_wheel_table() {
    assert_eq!(WHEEL.len(), 37);
    let mut numbers: Vec<u8> = WHEEL.iter().map(|o| o.number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (0..=36).collect::<Vec<u8>>());

    for pocket in WHEEL.iter() {
        let color = if pocket.number == 0 {
            Color::Green
        } else if REDS.contains(&pocket.number) {
            Color::Red
        } else {
            Color::Black
        };
        assert_eq!(pocket.color, color, "pocket {}", pocket.number);
    }
    assert_eq!(WHEEL[0].number, 0);
}

#[test]
fn test_payouts() {
    let expected = [
        (BetKind::Straight, 35),
        (BetKind::Red, 1),
        (BetKind::Black, 1),
        (BetKind::Odd, 1),
        (BetKind::Even, 1),
        (BetKind::Low, 1),
        (BetKind::High, 1),
        (BetKind::Dozen1, 2),
        (BetKind::Dozen2, 2),
        (BetKind::Dozen3, 2),
        (BetKind::Column1, 2),
        (BetKind::Column2, 2),
        (BetKind::Column3, 2),
    ];
    for (kind, payout) in expected {
        assert_eq!(kind.payout(), payout, "{:?}", kind);
    }
}

#[test]
fn test_target_construction_is_checked() {
    assert!(BetTarget::straight(37).is_err());
    assert!(BetTarget::new(BetKind::Straight, None).is_err());
    assert!(BetTarget::new(BetKind::Red, Some(3)).is_err());
    assert!(BetTarget::outside(BetKind::Straight).is_err());
}
