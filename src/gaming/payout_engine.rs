//! Payout Calculation Engine - settlement of a round against one outcome
//!
//! This module implements:
//! - Per-bet win/loss resolution
//! - Payout of `amount * (payout + 1)` per winning bet
//! - The absolute balance ceiling: any excess above it is simply not paid

use serde::{Deserialize, Serialize};

use super::bet_ledger::BetSet;
use super::roulette_rules::{Bet, Outcome};

/// Resolution of a single bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSettlement {
    pub bet: Bet,
    pub won: bool,
    /// Amount actually paid, stake included
    pub win_amount: u64,
}

/// Result of settling one spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub outcome: Outcome,
    pub total_staked: u64,
    pub total_winnings: u64,
    pub per_bet: Vec<BetSettlement>,
    /// `total_winnings - total_staked`
    pub net_profit: i64,
    /// Winnings withheld because of the balance ceiling
    pub withheld: u64,
    /// Credit added by the anti-zero floor after payout
    pub padding_credit: u64,
    pub balance_before: u64,
    pub balance_after: u64,
    pub limit_reached: bool,
}

impl SettlementResult {
    pub fn winning_bets(&self) -> impl Iterator<Item = &BetSettlement> {
        self.per_bet.iter().filter(|s| s.won)
    }

    pub fn losing_bets(&self) -> impl Iterator<Item = &BetSettlement> {
        self.per_bet.iter().filter(|s| !s.won)
    }

    /// Whether anything was paid out
    pub fn is_win(&self) -> bool {
        self.total_winnings > 0
    }
}

/// Settlement calculator bound to the table's balance ceiling
#[derive(Debug, Clone, Copy)]
pub struct PayoutEngine {
    absolute_max_balance: u64,
}

impl PayoutEngine {
    pub fn new(absolute_max_balance: u64) -> Self {
        Self {
            absolute_max_balance,
        }
    }

    pub fn absolute_max_balance(&self) -> u64 {
        self.absolute_max_balance
    }

    /// Settle `bets` against `outcome` for a player holding `balance`.
    ///
    /// Bets are paid in placement order; once the ceiling is reached the
    /// remainder of each later win is withheld.
    pub fn settle(&self, bets: &BetSet, outcome: &Outcome, balance: u64) -> SettlementResult {
        let total_staked = bets.total();
        let mut headroom = self.absolute_max_balance.saturating_sub(balance);
        let mut total_winnings = 0u64;
        let mut withheld = 0u64;
        let mut per_bet = Vec::with_capacity(bets.len());

        for bet in bets {
            let won = bet.wins(outcome);
            let win_amount = if won {
                let full = bet.win_amount();
                let paid = full.min(headroom);
                headroom -= paid;
                withheld += full - paid;
                paid
            } else {
                0
            };
            total_winnings += win_amount;
            per_bet.push(BetSettlement {
                bet: *bet,
                won,
                win_amount,
            });
        }

        let balance_after = balance + total_winnings;
        SettlementResult {
            outcome: *outcome,
            total_staked,
            total_winnings,
            per_bet,
            net_profit: total_winnings as i64 - total_staked as i64,
            withheld,
            padding_credit: 0,
            balance_before: balance,
            balance_after,
            limit_reached: balance_after >= self.absolute_max_balance,
        }
    }
}
