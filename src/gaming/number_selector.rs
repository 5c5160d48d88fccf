//! Number selection - turns a control directive into a concrete pocket
//!
//! Candidate pools are always built from a freshly shuffled copy of the
//! wheel, so ties and equal weights never favor a wheel position. Steered
//! picks are further damped by how often a number, its color and its third
//! of the layout showed up in recent history.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::cmp::Ordering;

use super::bet_ledger::BetSet;
use super::outcome_policy::Directive;
use super::roulette_rules::{Outcome, POCKET_COUNT, WHEEL};
use crate::config::SelectionConfig;

/// Smallest total return among pockets that pay at least one bet
pub fn minimum_winning_return(bets: &BetSet) -> Option<u64> {
    WHEEL
        .iter()
        .filter(|o| bets.any_wins(o))
        .map(|o| bets.return_for(o))
        .min()
}

/// Realizes directives against the active bets
#[derive(Debug, Clone)]
pub struct NumberSelector {
    config: SelectionConfig,
}

impl NumberSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Fair draw over all 37 pockets
    pub fn uniform(&self, rng: &mut dyn RngCore) -> Outcome {
        WHEEL[rng.gen_range(0..POCKET_COUNT)]
    }

    /// Pick the pocket the wheel will land on for `directive`
    pub fn realize(
        &self,
        directive: Directive,
        bets: &BetSet,
        history: &[Outcome],
        balance: u64,
        rng: &mut dyn RngCore,
    ) -> Outcome {
        match directive {
            Directive::Random => self.uniform(rng),
            Directive::ForceWin => self
                .pick_winner(bets, history, balance, self.config.top_fraction, rng)
                .unwrap_or_else(|| self.uniform(rng)),
            Directive::FavorWin => self
                .pick_winner(bets, history, balance, 1.0, rng)
                .unwrap_or_else(|| self.uniform(rng)),
            Directive::ForceWinMinimum => self
                .pick_minimum_win(bets, rng)
                .unwrap_or_else(|| self.pick_loser(bets, history, rng)),
            Directive::ForceLose | Directive::ForceLoseHard | Directive::ForceLoseAlways => {
                self.pick_loser(bets, history, rng)
            }
        }
    }

    /// Damping factor in `[min_weight_factor, 1]` for repeats in recent history
    pub fn history_factor(&self, candidate: &Outcome, history: &[Outcome]) -> f64 {
        let window = &history[..history.len().min(self.config.history_window)];
        if window.is_empty() {
            return 1.0;
        }
        let len = window.len() as f64;
        let same_number = window.iter().filter(|o| o.number == candidate.number).count() as f64;
        let same_color = window.iter().filter(|o| o.color == candidate.color).count() as f64;
        let same_third = window.iter().filter(|o| o.third() == candidate.third()).count() as f64;

        let factor = 1.0 / (1.0 + same_number * self.config.number_repeat_penalty)
            * (1.0 - self.config.color_repeat_penalty * same_color / len)
            * (1.0 - self.config.third_repeat_penalty * same_third / len);
        factor.clamp(self.config.min_weight_factor, 1.0)
    }

    fn shuffled_wheel(rng: &mut dyn RngCore) -> Vec<Outcome> {
        let mut pool = WHEEL.to_vec();
        pool.shuffle(rng);
        pool
    }

    /// Weighted pick among winning pockets, restricted to the top `fraction` by weight
    fn pick_winner(
        &self,
        bets: &BetSet,
        history: &[Outcome],
        balance: u64,
        fraction: f64,
        rng: &mut dyn RngCore,
    ) -> Option<Outcome> {
        let boost_straights = balance > self.config.straight_boost_balance;
        let mut candidates: Vec<(Outcome, f64)> = Self::shuffled_wheel(rng)
            .into_iter()
            .filter_map(|outcome| {
                let weight: f64 = bets
                    .iter()
                    .filter(|b| b.wins(&outcome))
                    .map(|b| {
                        let base = b.payout as f64 * b.amount as f64;
                        if boost_straights && b.kind().is_straight() {
                            base * self.config.straight_boost
                        } else {
                            base
                        }
                    })
                    .sum();
                (weight > 0.0).then(|| (outcome, weight * self.history_factor(&outcome, history)))
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        // Stable sort keeps the shuffled order among equal weights
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let keep = ((candidates.len() as f64 * fraction).ceil() as usize).clamp(1, candidates.len());
        candidates.truncate(keep);

        weighted_choice(&candidates, rng)
    }

    /// Pocket that pays nothing, damped by history; cheapest pocket if every pocket pays
    fn pick_loser(&self, bets: &BetSet, history: &[Outcome], rng: &mut dyn RngCore) -> Outcome {
        let losers: Vec<(Outcome, f64)> = Self::shuffled_wheel(rng)
            .into_iter()
            .filter(|o| !bets.any_wins(o))
            .map(|o| (o, self.history_factor(&o, history)))
            .collect();

        weighted_choice(&losers, rng).unwrap_or_else(|| self.cheapest(bets, rng))
    }

    /// Winning pocket with the smallest total return
    fn pick_minimum_win(&self, bets: &BetSet, rng: &mut dyn RngCore) -> Option<Outcome> {
        Self::shuffled_wheel(rng)
            .into_iter()
            .filter(|o| bets.any_wins(o))
            .min_by_key(|o| bets.return_for(o))
    }

    fn cheapest(&self, bets: &BetSet, rng: &mut dyn RngCore) -> Outcome {
        Self::shuffled_wheel(rng)
            .into_iter()
            .min_by_key(|o| bets.return_for(o))
            .unwrap_or(WHEEL[0])
    }
}

fn weighted_choice(items: &[(Outcome, f64)], rng: &mut dyn RngCore) -> Option<Outcome> {
    match WeightedIndex::new(items.iter().map(|(_, w)| *w)) {
        Ok(dist) => items.get(dist.sample(rng)).map(|(o, _)| *o),
        Err(_) => items.choose(rng).map(|(o, _)| *o),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaming::bet_ledger::{BetLedger, TableLimits};
    use crate::gaming::roulette_rules::{BetKind, BetTarget};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bets(items: &[(BetTarget, u64)]) -> BetSet {
        let mut ledger = BetLedger::new(TableLimits {
            min_bet: 1,
            max_bet: 1_000_000,
        });
        let mut balance = 10_000_000;
        for (target, amount) in items {
            ledger.place(&mut balance, *target, *amount).unwrap();
        }
        ledger.close_round()
    }

    fn selector() -> NumberSelector {
        NumberSelector::new(SelectionConfig::default())
    }

    #[test]
    fn test_force_lose_never_pays() {
        let set = bets(&[
            (BetTarget::outside(BetKind::Red).unwrap(), 1_000),
            (BetTarget::straight(0).unwrap(), 100),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let o = selector().realize(Directive::ForceLose, &set, &[], 50_000, &mut rng);
            assert!(!set.any_wins(&o), "{} should lose", o);
        }
    }

    #[test]
    fn test_force_win_always_pays() {
        let set = bets(&[
            (BetTarget::straight(4).unwrap(), 100),
            (BetTarget::straight(21).unwrap(), 100),
            (BetTarget::outside(BetKind::Column3).unwrap(), 200),
        ]);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let o = selector().realize(Directive::ForceWin, &set, &[], 50_000, &mut rng);
            assert!(set.any_wins(&o));
        }
    }

    #[test]
    fn test_force_win_keeps_randomness_within_top_fraction() {
        let set = bets(&[(BetTarget::outside(BetKind::Dozen1).unwrap(), 1_000)]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            seen.insert(selector().realize(Directive::ForceWin, &set, &[], 50_000, &mut rng).number);
        }
        // Twelve equal-weight winners, top half kept per draw: never a single fixed number
        assert!(seen.len() > 1);
        assert!(seen.iter().all(|n| (1..=12).contains(n)));
    }

    #[test]
    fn test_minimum_win_picks_cheapest_winner() {
        let set = bets(&[
            (BetTarget::straight(17).unwrap(), 100),
            (BetTarget::outside(BetKind::Black).unwrap(), 500),
        ]);
        assert_eq!(minimum_winning_return(&set), Some(1_000));

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let o = selector().realize(Directive::ForceWinMinimum, &set, &[], 50_000, &mut rng);
            assert_eq!(set.return_for(&o), 1_000);
            assert_ne!(o.number, 17);
        }
    }

    #[test]
    fn test_full_coverage_falls_back_to_cheapest() {
        let mut items: Vec<(BetTarget, u64)> = (0..=36)
            .map(|n| (BetTarget::straight(n).unwrap(), 100))
            .collect();
        items[9].1 = 50;
        let set = bets(&items);

        let mut rng = StdRng::seed_from_u64(9);
        let o = selector().realize(Directive::ForceLoseAlways, &set, &[], 50_000, &mut rng);
        assert_eq!(o.number, 9);
    }

    #[test]
    fn test_history_factor_damps_repeats() {
        let s = selector();
        let seven = Outcome::from_number(7).unwrap();
        let eight = Outcome::from_number(8).unwrap();
        let history = vec![seven, seven, Outcome::from_number(9).unwrap()];

        let repeat = s.history_factor(&seven, &history);
        let fresh = s.history_factor(&eight, &history);
        assert!(repeat < fresh);
        assert!(repeat >= SelectionConfig::default().min_weight_factor);
        assert_eq!(s.history_factor(&seven, &[]), 1.0);
    }

    #[test]
    fn test_empty_table_is_uniform() {
        let set = BetSet::new();
        let mut rng = StdRng::seed_from_u64(1);
        let o = selector().realize(Directive::ForceWin, &set, &[], 50_000, &mut rng);
        assert!(o.number <= 36);
    }
}
