//! Roulette Session - the aggregate root of a single player's game
//!
//! A session owns the balance, the bet ledger, the last outcomes, running
//! statistics and the streak state that feeds outcome control. A spin is two
//! steps so that a caller can show the result before paying it out:
//!
//! 1. [`RouletteSession::decide_outcome`] consults the policy, realizes the
//!    directive as a pocket and records it in history.
//! 2. [`RouletteSession::calculate_winnings`] settles the active bets against
//!    that pocket.
//!
//! Reaching the absolute balance ceiling is a terminal state: betting and
//! spinning are refused until [`RouletteSession::restart`].

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::bet_ledger::{BetLedger, BetSet, TableLimits};
use super::number_selector::NumberSelector;
use super::outcome_policy::{Decision, OutcomePolicy, PolicyContext, StreakState};
use super::payout_engine::{PayoutEngine, SettlementResult};
use super::roulette_rules::{Bet, BetKind, BetTarget, Outcome};
use crate::config::Config;
use crate::error::{Error, Result};

/// Running totals since start or restart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_spins: u64,
    pub total_wins: u64,
    pub total_profit: i64,
}

/// The pocket chosen for a spin and why
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinDecision {
    pub outcome: Outcome,
    pub decision: Decision,
    /// 1-based spin number since start or restart
    pub spin_number: u32,
}

/// Read-only view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub balance: u64,
    pub active_bets: Vec<Bet>,
    pub total_bet: u64,
    pub history: Vec<Outcome>,
    pub statistics: SessionStatistics,
    pub remaining_capacity: u64,
    pub spin_count: u32,
    pub limit_reached: bool,
    /// Chip denominations the table offers
    #[serde(default)]
    pub chip_values: Vec<u64>,
    /// Set by the orchestrator while an animation is running
    #[serde(default)]
    pub spin_in_flight: bool,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Single-player roulette session
#[derive(Debug)]
pub struct RouletteSession {
    id: Uuid,
    config: Config,
    balance: u64,
    ledger: BetLedger,
    /// Most recent first
    history: Vec<Outcome>,
    statistics: SessionStatistics,
    streak: StreakState,
    spin_counter: u32,
    limit_reached: bool,
    policy: OutcomePolicy,
    selector: NumberSelector,
    payout: PayoutEngine,
    rng: ChaCha20Rng,
}

impl RouletteSession {
    /// Create a session seeded from OS entropy
    pub fn new(config: Config) -> Result<Self> {
        Self::with_rng(config, ChaCha20Rng::from_entropy())
    }

    /// Create a session with a deterministic random source
    pub fn with_seed(config: Config, seed: u64) -> Result<Self> {
        Self::with_rng(config, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: ChaCha20Rng) -> Result<Self> {
        config.validate()?;
        let session = Self {
            id: Uuid::new_v4(),
            balance: config.game.initial_balance,
            ledger: BetLedger::new(TableLimits::from(&config.game)),
            history: Vec::with_capacity(config.game.history_len),
            statistics: SessionStatistics::default(),
            streak: StreakState::default(),
            spin_counter: 0,
            limit_reached: false,
            policy: OutcomePolicy::from_config(&config),
            selector: NumberSelector::new(config.policy.selection.clone()),
            payout: PayoutEngine::new(config.game.absolute_max_balance),
            rng,
            config,
        };
        info!(
            session_id = %session.id,
            balance = session.balance,
            policy_enabled = session.policy.is_enabled(),
            "Roulette session started"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn active_bets(&self) -> &BetSet {
        self.ledger.active()
    }

    pub fn last_bets(&self) -> &BetSet {
        self.ledger.last()
    }

    pub fn total_bet(&self) -> u64 {
        self.ledger.total_active()
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.ledger.remaining_capacity(self.balance)
    }

    /// Last outcomes, most recent first
    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.statistics
    }

    pub fn streak(&self) -> StreakState {
        self.streak
    }

    /// Spins decided since start or restart
    pub fn spin_count(&self) -> u32 {
        self.spin_counter
    }

    /// Whether balance-banded steering has been switched off for the session
    pub fn is_normalized(&self) -> bool {
        self.spin_counter >= self.config.policy.normalization_spins
    }

    pub fn is_limit_reached(&self) -> bool {
        self.limit_reached
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            balance: self.balance,
            active_bets: self.ledger.active().iter().copied().collect(),
            total_bet: self.total_bet(),
            history: self.history.clone(),
            statistics: self.statistics,
            remaining_capacity: self.remaining_capacity(),
            spin_count: self.spin_counter,
            limit_reached: self.limit_reached,
            chip_values: self.config.game.chip_values.clone(),
            spin_in_flight: false,
        }
    }

    fn ensure_playable(&self) -> Result<()> {
        if self.limit_reached {
            return Err(Error::LimitReached(self.config.game.absolute_max_balance));
        }
        Ok(())
    }

    /// Place a bet. `number` is required for straight bets and refused otherwise.
    pub fn place_bet(&mut self, kind: BetKind, amount: u64, number: Option<u8>) -> Result<()> {
        self.ensure_playable()?;
        let target = BetTarget::new(kind, number)?;
        match self.ledger.place(&mut self.balance, target, amount) {
            Ok(()) => {
                debug!(session_id = %self.id, %target, amount, balance = self.balance, "Bet placed");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, %target, amount, error = %e, "Bet rejected");
                Err(e)
            }
        }
    }

    /// Re-place the whole previous round, or nothing
    pub fn repeat_last_bets(&mut self) -> Result<()> {
        self.ensure_playable()?;
        self.ledger.repeat_last(&mut self.balance).map_err(|e| {
            warn!(session_id = %self.id, error = %e, "Repeat rejected");
            e
        })?;
        debug!(
            session_id = %self.id,
            total = self.ledger.total_active(),
            balance = self.balance,
            "Previous round repeated"
        );
        Ok(())
    }

    /// Refund and remove every active bet; returns the refunded amount
    pub fn clear_bets(&mut self) -> u64 {
        let refunded = self.ledger.clear(&mut self.balance);
        debug!(session_id = %self.id, refunded, "Bets cleared");
        refunded
    }

    /// Decide where the ball lands for the active bets
    pub fn decide_outcome(&mut self) -> Result<SpinDecision> {
        self.ensure_playable()?;
        if self.ledger.active().is_empty() {
            return Err(Error::NoActiveBets);
        }

        let bets = self.ledger.active();
        let ctx = PolicyContext {
            balance: self.balance,
            starting_balance: self.config.game.initial_balance,
            spin_count: self.spin_counter,
            streak: &self.streak,
            bets,
        };
        let decision = self.policy.decide(&ctx, &mut self.rng);
        let outcome = self.selector.realize(
            decision.directive,
            bets,
            &self.history,
            self.balance,
            &mut self.rng,
        );
        self.streak.apply(decision.effect);

        debug!(
            session_id = %self.id,
            rule = %decision.rule,
            directive = ?decision.directive,
            balance = self.balance,
            spin_count = self.spin_counter,
            outcome = outcome.number,
            "Outcome decided"
        );

        Ok(self.record_spin(outcome, decision))
    }

    /// Land on a fixed pocket without consulting the policy
    pub fn land_on(&mut self, number: u8) -> Result<SpinDecision> {
        self.ensure_playable()?;
        if self.ledger.active().is_empty() {
            return Err(Error::NoActiveBets);
        }
        let outcome = Outcome::from_number(number)?;
        Ok(self.record_spin(outcome, Decision::random()))
    }

    fn record_spin(&mut self, outcome: Outcome, decision: Decision) -> SpinDecision {
        self.spin_counter = self.spin_counter.saturating_add(1);
        self.history.insert(0, outcome);
        self.history.truncate(self.config.game.history_len);
        if self.spin_counter == self.config.policy.normalization_spins {
            info!(session_id = %self.id, spins = self.spin_counter, "Balance steering normalized");
        }
        SpinDecision {
            outcome,
            decision,
            spin_number: self.spin_counter,
        }
    }

    /// Settle the active bets against `outcome`
    pub fn calculate_winnings(&mut self, outcome: &Outcome) -> Result<SettlementResult> {
        if self.ledger.active().is_empty() {
            return Err(Error::NoActiveBets);
        }

        let round = self.ledger.close_round();
        let mut result = self.payout.settle(&round, outcome, self.balance);
        self.balance = result.balance_after;

        let padding = &self.config.policy.padding;
        if self.config.policy.enabled && padding.enabled {
            if let Some(floor) = padding.balance_floor {
                if self.balance < floor {
                    result.padding_credit = floor - self.balance;
                    self.balance = floor;
                    result.balance_after = floor;
                }
            }
        }

        self.statistics.total_spins += 1;
        if result.is_win() {
            self.statistics.total_wins += 1;
        }
        self.statistics.total_profit += result.net_profit;
        self.streak.record_result(result.is_win());

        info!(
            session_id = %self.id,
            outcome = %outcome,
            staked = result.total_staked,
            winnings = result.total_winnings,
            net = result.net_profit,
            balance = self.balance,
            "Round settled"
        );

        if result.limit_reached {
            self.limit_reached = true;
            info!(
                session_id = %self.id,
                limit = self.payout.absolute_max_balance(),
                "Balance limit reached; session closed until restart"
            );
        }

        Ok(result)
    }

    /// Decide and settle in one call, for hosts without an animation step
    pub fn spin(&mut self) -> Result<(SpinDecision, SettlementResult)> {
        let decision = self.decide_outcome()?;
        let settlement = self.calculate_winnings(&decision.outcome)?;
        Ok((decision, settlement))
    }

    /// Reset every field to its starting value. The random source continues.
    pub fn restart(&mut self) {
        self.balance = self.config.game.initial_balance;
        self.ledger.reset();
        self.history.clear();
        self.statistics = SessionStatistics::default();
        self.streak = StreakState::default();
        self.spin_counter = 0;
        self.limit_reached = false;
        self.id = Uuid::new_v4();
        info!(session_id = %self.id, balance = self.balance, "Session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::gaming::roulette_rules::Color;

    fn fair_session() -> RouletteSession {
        let config = Config {
            policy: PolicyConfig::disabled(),
            ..Config::default()
        };
        RouletteSession::with_seed(config, 17).unwrap()
    }

    #[test]
    fn test_straight_win_scenario() {
        let mut session = fair_session();
        session.place_bet(BetKind::Straight, 1_000, Some(17)).unwrap();
        assert_eq!(session.balance(), 49_000);

        let spin = session.land_on(17).unwrap();
        assert_eq!(spin.outcome.color, Color::Black);
        let result = session.calculate_winnings(&spin.outcome).unwrap();

        assert_eq!(result.total_winnings, 1_000 * 36);
        assert_eq!(session.balance(), 49_000 + 36_000);
        assert!(session.active_bets().is_empty());
        let repeated = session.last_bets().get(&BetTarget::straight(17).unwrap()).unwrap();
        assert_eq!(repeated.amount, 1_000);
        assert_eq!(session.statistics().total_spins, 1);
        assert_eq!(session.statistics().total_wins, 1);
        assert_eq!(session.statistics().total_profit, 35_000);
    }

    #[test]
    fn test_history_is_bounded_and_recent_first() {
        let mut session = fair_session();
        for n in 0..15u8 {
            session.place_bet(BetKind::Red, 100, None).unwrap();
            let spin = session.land_on(n).unwrap();
            session.calculate_winnings(&spin.outcome).unwrap();
        }
        let numbers: Vec<u8> = session.history().iter().map(|o| o.number).collect();
        assert_eq!(numbers, vec![14, 13, 12, 11, 10, 9, 8, 7, 6, 5]);
        assert_eq!(session.spin_count(), 15);
    }

    #[test]
    fn test_spin_requires_bets() {
        let mut session = fair_session();
        assert!(matches!(session.decide_outcome(), Err(Error::NoActiveBets)));
        let zero = Outcome::from_number(0).unwrap();
        assert!(matches!(session.calculate_winnings(&zero), Err(Error::NoActiveBets)));
    }

    #[test]
    fn test_straight_bet_needs_number() {
        let mut session = fair_session();
        let err = session.place_bet(BetKind::Straight, 500, None).unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(crate::error::BetRejection::MissingStraightNumber)
        );
        assert_eq!(session.balance(), 50_000);
    }

    #[test]
    fn test_limit_reached_blocks_until_restart() {
        let mut config = Config {
            policy: PolicyConfig::disabled(),
            ..Config::default()
        };
        config.game.initial_balance = 990_000;
        let mut session = RouletteSession::with_seed(config, 1).unwrap();

        session.place_bet(BetKind::Straight, 1_000, Some(3)).unwrap();
        let spin = session.land_on(3).unwrap();
        let result = session.calculate_winnings(&spin.outcome).unwrap();
        assert!(result.limit_reached);
        assert_eq!(session.balance(), 1_000_000);
        assert!(session.is_limit_reached());

        assert!(matches!(
            session.place_bet(BetKind::Red, 100, None),
            Err(Error::LimitReached(1_000_000))
        ));

        session.restart();
        assert!(!session.is_limit_reached());
        assert_eq!(session.balance(), 990_000);
        assert_eq!(session.statistics(), SessionStatistics::default());
        assert!(session.history().is_empty());
        assert!(session.last_bets().is_empty());
    }

    #[test]
    fn test_padding_floor_tops_up() {
        let mut config = Config::default();
        config.game.initial_balance = 600;
        let mut session = RouletteSession::with_seed(config, 2).unwrap();

        session.place_bet(BetKind::Straight, 500, Some(9)).unwrap();
        let spin = session.land_on(10).unwrap();
        let result = session.calculate_winnings(&spin.outcome).unwrap();

        assert_eq!(result.total_winnings, 0);
        assert_eq!(result.padding_credit, 400);
        assert_eq!(session.balance(), 500);
        assert_eq!(result.balance_after, result.balance_before + result.padding_credit);
    }

    #[test]
    fn test_padding_floor_cannot_lift_balance_past_ceiling() {
        let mut config = Config::default();
        config.game.absolute_max_balance = 60_000;
        config.policy.padding.balance_floor = Some(80_000);
        assert!(matches!(
            RouletteSession::with_seed(config, 3),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_snapshot_json() {
        let mut session = fair_session();
        session.place_bet(BetKind::Dozen2, 300, None).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.total_bet, 300);
        assert_eq!(snapshot.remaining_capacity, 9_700);
        assert_eq!(snapshot.chip_values, vec![100, 500, 2_500, 10_000]);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"dozen2\""));
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
