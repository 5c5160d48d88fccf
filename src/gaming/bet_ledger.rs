//! Bet Ledger - placement validation and the active/last bet maps
//!
//! The ledger validates every placement against the table limits before it
//! touches anything, so a rejected call leaves balance and bets exactly as
//! they were. The table cap is the same ceiling as a single maximum bet: the
//! *total* across all positions may never exceed `max_bet`.

use serde::{Deserialize, Serialize};

use super::roulette_rules::{Bet, BetTarget, Outcome};
use crate::config::GameConfig;
use crate::error::{BetRejection, Result};

/// Bets keyed by target, kept in placement order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSet {
    bets: Vec<Bet>,
}

impl BetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &BetTarget) -> Option<&Bet> {
        self.bets.iter().find(|b| b.target == *target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bet> {
        self.bets.iter()
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Sum of all stakes
    pub fn total(&self) -> u64 {
        self.bets.iter().map(|b| b.amount).sum()
    }

    pub fn straight_count(&self) -> usize {
        self.bets.iter().filter(|b| b.kind().is_straight()).count()
    }

    /// Amount already staked on `target`
    pub fn amount_on(&self, target: &BetTarget) -> u64 {
        self.get(target).map(|b| b.amount).unwrap_or(0)
    }

    /// Total returned (stakes included) if the ball lands on `outcome`
    pub fn return_for(&self, outcome: &Outcome) -> u64 {
        self.bets
            .iter()
            .filter(|b| b.wins(outcome))
            .map(|b| b.win_amount())
            .sum()
    }

    /// Whether at least one bet wins on `outcome`
    pub fn any_wins(&self, outcome: &Outcome) -> bool {
        self.bets.iter().any(|b| b.wins(outcome))
    }

    /// Add `amount` to the bet on `target`, creating it if needed
    fn add(&mut self, target: BetTarget, amount: u64) {
        match self.bets.iter_mut().find(|b| b.target == target) {
            Some(existing) => existing.amount += amount,
            None => self.bets.push(Bet::new(target, amount)),
        }
    }

    fn clear(&mut self) {
        self.bets.clear();
    }
}

impl<'a> IntoIterator for &'a BetSet {
    type Item = &'a Bet;
    type IntoIter = std::slice::Iter<'a, Bet>;

    fn into_iter(self) -> Self::IntoIter {
        self.bets.iter()
    }
}

impl FromIterator<Bet> for BetSet {
    fn from_iter<I: IntoIterator<Item = Bet>>(iter: I) -> Self {
        let mut set = BetSet::new();
        for bet in iter {
            set.add(bet.target, bet.amount);
        }
        set
    }
}

/// Stake limits enforced by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLimits {
    pub min_bet: u64,
    pub max_bet: u64,
}

impl From<&GameConfig> for TableLimits {
    fn from(config: &GameConfig) -> Self {
        Self {
            min_bet: config.min_bet,
            max_bet: config.max_bet,
        }
    }
}

/// Active bets for the coming spin plus the snapshot of the last settled round
#[derive(Debug, Clone)]
pub struct BetLedger {
    limits: TableLimits,
    active: BetSet,
    last: BetSet,
}

impl BetLedger {
    pub fn new(limits: TableLimits) -> Self {
        Self {
            limits,
            active: BetSet::new(),
            last: BetSet::new(),
        }
    }

    pub fn limits(&self) -> TableLimits {
        self.limits
    }

    pub fn active(&self) -> &BetSet {
        &self.active
    }

    pub fn last(&self) -> &BetSet {
        &self.last
    }

    pub fn total_active(&self) -> u64 {
        self.active.total()
    }

    /// How much more can be staked given the table cap and `balance`
    pub fn remaining_capacity(&self, balance: u64) -> u64 {
        self.limits
            .max_bet
            .saturating_sub(self.active.total())
            .min(balance)
    }

    /// Check a single placement without applying it
    pub fn check_placement(&self, balance: u64, target: &BetTarget, amount: u64) -> Result<()> {
        let TableLimits { min_bet, max_bet } = self.limits;

        if balance < amount {
            return Err(BetRejection::InsufficientBalance {
                required: amount,
                available: balance,
            }
            .into());
        }
        if amount < min_bet {
            return Err(BetRejection::BelowMinimum { amount, min_bet }.into());
        }
        if amount > max_bet {
            return Err(BetRejection::AbovePerBetCap { amount, max_bet }.into());
        }

        let total = self.active.total() + amount;
        if total > max_bet {
            return Err(BetRejection::AboveTableCap { total, max_bet }.into());
        }

        let position_total = self.active.amount_on(target) + amount;
        if position_total > max_bet {
            return Err(BetRejection::AbovePositionCap {
                position_total,
                max_bet,
            }
            .into());
        }

        Ok(())
    }

    /// Place a bet, debiting `balance` on success
    pub fn place(&mut self, balance: &mut u64, target: BetTarget, amount: u64) -> Result<()> {
        self.check_placement(*balance, &target, amount)?;
        self.active.add(target, amount);
        *balance -= amount;
        Ok(())
    }

    /// Re-apply the last settled round as new active bets, all or nothing
    pub fn repeat_last(&mut self, balance: &mut u64) -> Result<()> {
        if self.last.is_empty() {
            return Err(BetRejection::NothingToRepeat.into());
        }

        let TableLimits { min_bet, max_bet } = self.limits;
        let snapshot_total = self.last.total();

        if *balance < snapshot_total {
            return Err(BetRejection::InsufficientBalance {
                required: snapshot_total,
                available: *balance,
            }
            .into());
        }
        if let Some(small) = self.last.iter().find(|b| b.amount < min_bet) {
            return Err(BetRejection::BelowMinimum {
                amount: small.amount,
                min_bet,
            }
            .into());
        }

        let total = self.active.total() + snapshot_total;
        if total > max_bet {
            return Err(BetRejection::AboveTableCap { total, max_bet }.into());
        }
        for bet in self.last.iter() {
            let position_total = self.active.amount_on(&bet.target) + bet.amount;
            if position_total > max_bet {
                return Err(BetRejection::AbovePositionCap {
                    position_total,
                    max_bet,
                }
                .into());
            }
        }

        for bet in self.last.bets.iter() {
            self.active.add(bet.target, bet.amount);
        }
        *balance -= snapshot_total;
        Ok(())
    }

    /// Refund every active bet; returns the refunded amount
    pub fn clear(&mut self, balance: &mut u64) -> u64 {
        let refund = self.active.total();
        *balance += refund;
        self.active.clear();
        refund
    }

    /// Move the active bets into the last-round snapshot and hand them out for settlement
    pub fn close_round(&mut self) -> BetSet {
        let round = std::mem::take(&mut self.active);
        self.last = round.clone();
        round
    }

    /// Drop everything, including the repeat snapshot
    pub fn reset(&mut self) {
        self.active.clear();
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gaming::roulette_rules::BetKind;

    fn ledger() -> BetLedger {
        BetLedger::new(TableLimits {
            min_bet: 100,
            max_bet: 10_000,
        })
    }

    fn rejection(result: Result<()>) -> BetRejection {
        match result {
            Err(Error::BetRejected(reason)) => reason,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_place_accumulates_on_same_target() {
        let mut ledger = ledger();
        let mut balance = 50_000;
        let red = BetTarget::outside(BetKind::Red).unwrap();

        ledger.place(&mut balance, red, 500).unwrap();
        ledger.place(&mut balance, red, 700).unwrap();
        ledger.place(&mut balance, BetTarget::straight(17).unwrap(), 100).unwrap();

        assert_eq!(balance, 50_000 - 1_300);
        assert_eq!(ledger.active().len(), 2);
        assert_eq!(ledger.active().amount_on(&red), 1_200);
        assert_eq!(ledger.total_active(), 1_300);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut ledger = ledger();
        let mut balance = 5_000;
        let red = BetTarget::outside(BetKind::Red).unwrap();
        ledger.place(&mut balance, red, 4_000).unwrap();
        let before = ledger.active().clone();

        assert!(matches!(
            rejection(ledger.place(&mut balance, red, 1_500)),
            BetRejection::InsufficientBalance { .. }
        ));
        assert!(matches!(
            rejection(ledger.place(&mut balance, red, 50)),
            BetRejection::BelowMinimum { .. }
        ));
        assert_eq!(balance, 1_000);
        assert_eq!(ledger.active(), &before);
    }

    #[test]
    fn test_table_cap_spans_positions() {
        let mut ledger = ledger();
        let mut balance = 100_000;
        ledger.place(&mut balance, BetTarget::outside(BetKind::Red).unwrap(), 6_000).unwrap();

        let result = ledger.place(&mut balance, BetTarget::outside(BetKind::Odd).unwrap(), 5_000);
        assert_eq!(
            rejection(result),
            BetRejection::AboveTableCap {
                total: 11_000,
                max_bet: 10_000
            }
        );
        assert!(matches!(
            rejection(ledger.place(&mut balance, BetTarget::straight(3).unwrap(), 10_001)),
            BetRejection::AbovePerBetCap { .. }
        ));
        assert_eq!(ledger.remaining_capacity(balance), 4_000);
    }

    #[test]
    fn test_repeat_is_all_or_nothing() {
        let mut ledger = ledger();
        let mut balance = 20_000;
        ledger.place(&mut balance, BetTarget::straight(7).unwrap(), 3_000).unwrap();
        ledger.place(&mut balance, BetTarget::outside(BetKind::Even).unwrap(), 3_000).unwrap();
        let round = ledger.close_round();
        assert_eq!(round.total(), 6_000);
        assert!(ledger.active().is_empty());

        ledger.place(&mut balance, BetTarget::outside(BetKind::High).unwrap(), 5_000).unwrap();
        let before_balance = balance;
        let before_active = ledger.active().clone();
        assert!(matches!(
            rejection(ledger.repeat_last(&mut balance)),
            BetRejection::AboveTableCap { .. }
        ));
        assert_eq!(balance, before_balance);
        assert_eq!(ledger.active(), &before_active);

        ledger.clear(&mut balance);
        ledger.repeat_last(&mut balance).unwrap();
        assert_eq!(ledger.active(), ledger.last());
        assert_eq!(balance, 20_000 - 6_000 - 6_000);
    }

    #[test]
    fn test_repeat_requires_snapshot() {
        let mut ledger = ledger();
        let mut balance = 1_000;
        assert_eq!(
            rejection(ledger.repeat_last(&mut balance)),
            BetRejection::NothingToRepeat
        );
    }

    #[test]
    fn test_clear_refunds() {
        let mut ledger = ledger();
        let mut balance = 10_000;
        ledger.place(&mut balance, BetTarget::outside(BetKind::Column2).unwrap(), 2_000).unwrap();
        assert_eq!(ledger.clear(&mut balance), 2_000);
        assert_eq!(balance, 10_000);
        assert!(ledger.active().is_empty());
    }
}
