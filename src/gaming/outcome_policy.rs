//! Outcome Control Policy - decides whether a spin is steered, and which way
//!
//! The policy is an ordered list of named rules. Each rule either returns a
//! [`Decision`] or abstains; the first rule with an opinion wins and later
//! rules are not consulted. The order is part of the contract:
//!
//! 1. Absolute restriction (lone straight bet at a restricted stake)
//! 2. Anti-strategy detection (wide straight-number coverage)
//! 3. Padding (keeps the balance off zero)
//! 4. Early minimum-win shaping (first spins of a session)
//! 5. Balance bands (until the normalization spin count)
//! 6. Streak relief (luck streaks, long win/loss runs)
//! 7. Hard balance clamps
//! 8. Default: uniform draw
//!
//! Rules 4 to 6 only speak while the balance sits strictly inside the clamp
//! range, so the clamps at the edges hold with certainty.
//!
//! [`OutcomePolicy::decide`] is pure: it reads a [`PolicyContext`], draws from
//! the injected random source and returns the decision plus any streak
//! bookkeeping for the session to apply.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::bet_ledger::BetSet;
use super::number_selector::minimum_winning_return;
use crate::config::{
    AntiStrategyConfig, BalanceBandConfig, Config, EarlyShapingConfig, PaddingConfig,
    StreakConfig,
};

/// How the next outcome is to be chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    /// Uniform draw over the wheel
    Random,
    /// Win, sampled from the top-weighted winning pockets
    ForceWin,
    /// Win, sampled from every winning pocket
    FavorWin,
    /// The winning pocket that pays the least
    ForceWinMinimum,
    ForceLose,
    /// Loss issued against coverage strategies
    ForceLoseHard,
    /// Loss issued by the absolute restriction
    ForceLoseAlways,
}

impl Directive {
    pub fn is_win_forcing(&self) -> bool {
        matches!(
            self,
            Directive::ForceWin | Directive::FavorWin | Directive::ForceWinMinimum
        )
    }

    pub fn is_loss_forcing(&self) -> bool {
        matches!(
            self,
            Directive::ForceLose | Directive::ForceLoseHard | Directive::ForceLoseAlways
        )
    }
}

/// Names of the policy rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    AbsoluteRestriction,
    AntiStrategy,
    Padding,
    EarlyShaping,
    BalanceBands,
    StreakRelief,
    BalanceClamp,
    Default,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::AbsoluteRestriction => "absolute_restriction",
            RuleKind::AntiStrategy => "anti_strategy",
            RuleKind::Padding => "padding",
            RuleKind::EarlyShaping => "early_shaping",
            RuleKind::BalanceBands => "balance_bands",
            RuleKind::StreakRelief => "streak_relief",
            RuleKind::BalanceClamp => "balance_clamp",
            RuleKind::Default => "default",
        };
        f.write_str(name)
    }
}

/// Streak bookkeeping a decision asks the session to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreakEffect {
    #[default]
    None,
    /// A luck streak starts; `remaining` forced wins follow this one
    StartLuckStreak { remaining: u32 },
    ConsumeLuckStreak,
    ConsumeForcedLoss,
}

/// Win/loss runs and pending streak directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    pub forced_loss_pending: bool,
    pub luck_streak_remaining: u32,
}

impl StreakState {
    /// Record a settled spin
    pub fn record_result(&mut self, won: bool) {
        if won {
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
        }
    }

    /// Apply the bookkeeping carried by a decision. An expiring luck streak
    /// leaves a forced loss pending.
    pub fn apply(&mut self, effect: StreakEffect) {
        match effect {
            StreakEffect::None => {}
            StreakEffect::StartLuckStreak { remaining } => {
                self.luck_streak_remaining = remaining;
                if remaining == 0 {
                    self.forced_loss_pending = true;
                }
            }
            StreakEffect::ConsumeLuckStreak => {
                self.luck_streak_remaining = self.luck_streak_remaining.saturating_sub(1);
                if self.luck_streak_remaining == 0 {
                    self.forced_loss_pending = true;
                }
            }
            StreakEffect::ConsumeForcedLoss => self.forced_loss_pending = false,
        }
    }
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub directive: Directive,
    pub rule: RuleKind,
    pub effect: StreakEffect,
}

impl Decision {
    pub fn new(rule: RuleKind, directive: Directive) -> Self {
        Self {
            directive,
            rule,
            effect: StreakEffect::None,
        }
    }

    pub fn random() -> Self {
        Self::new(RuleKind::Default, Directive::Random)
    }

    pub fn with_effect(mut self, effect: StreakEffect) -> Self {
        self.effect = effect;
        self
    }
}

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// Balance after the active bets were debited
    pub balance: u64,
    pub starting_balance: u64,
    /// Spins completed before this one since start or restart
    pub spin_count: u32,
    pub streak: &'a StreakState,
    pub bets: &'a BetSet,
}

/// Balance range, exclusive at both ends, where the soft rules may steer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingRange {
    pub low: u64,
    pub high: u64,
}

impl OperatingRange {
    pub fn from_config(config: &Config) -> Self {
        Self {
            low: config.policy.clamps.min_balance,
            high: config.policy.clamps.max_balance.min(config.near_max_line()),
        }
    }

    pub fn contains(&self, balance: u64) -> bool {
        balance > self.low && balance < self.high
    }
}

/// One named step of the policy
pub trait PolicyRule: Send + Sync + fmt::Debug {
    fn kind(&self) -> RuleKind;

    /// Return a decision, or `None` to let the next rule speak
    fn evaluate(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Option<Decision>;
}

#[derive(Debug)]
struct AbsoluteRestriction {
    stakes: Vec<u64>,
}

impl PolicyRule for AbsoluteRestriction {
    fn kind(&self) -> RuleKind {
        RuleKind::AbsoluteRestriction
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        if ctx.bets.len() != 1 {
            return None;
        }
        let bet = ctx.bets.iter().next()?;
        (bet.kind().is_straight() && self.stakes.contains(&bet.amount))
            .then(|| Decision::new(self.kind(), Directive::ForceLoseAlways))
    }
}

#[derive(Debug)]
struct AntiStrategy {
    config: AntiStrategyConfig,
}

impl PolicyRule for AntiStrategy {
    fn kind(&self) -> RuleKind {
        RuleKind::AntiStrategy
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Option<Decision> {
        let count = ctx.bets.len();
        if count == 0 || count < self.config.min_bet_count {
            return None;
        }
        let straight_share = ctx.bets.straight_count() as f64 / count as f64;
        if straight_share < self.config.min_straight_share
            || ctx.bets.total() < self.config.min_total_amount
        {
            return None;
        }
        rng.gen_bool(self.config.lose_probability)
            .then(|| Decision::new(self.kind(), Directive::ForceLoseHard))
    }
}

#[derive(Debug)]
struct Padding {
    config: PaddingConfig,
}

impl PolicyRule for Padding {
    fn kind(&self) -> RuleKind {
        RuleKind::Padding
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Option<Decision> {
        if !self.config.enabled {
            return None;
        }
        if ctx.balance <= self.config.hard_floor {
            return Some(Decision::new(self.kind(), Directive::ForceWin));
        }
        if ctx.balance <= self.config.trigger_balance && rng.gen_bool(self.config.favor_probability) {
            return Some(Decision::new(self.kind(), Directive::FavorWin));
        }
        None
    }
}

#[derive(Debug)]
struct EarlyShaping {
    config: EarlyShapingConfig,
    range: OperatingRange,
}

impl PolicyRule for EarlyShaping {
    fn kind(&self) -> RuleKind {
        RuleKind::EarlyShaping
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        if !self.config.enabled
            || ctx.spin_count >= self.config.spins
            || !self.range.contains(ctx.balance)
        {
            return None;
        }

        let staked = ctx.bets.total() as f64;
        let directive = match minimum_winning_return(ctx.bets) {
            None => Directive::ForceLose,
            Some(min_win) if min_win as f64 > staked * self.config.generous_ratio => {
                Directive::ForceLose
            }
            Some(_) => Directive::ForceWinMinimum,
        };
        Some(Decision::new(self.kind(), directive))
    }
}

#[derive(Debug)]
struct BalanceBands {
    config: BalanceBandConfig,
    normalization_spins: u32,
    range: OperatingRange,
}

impl BalanceBands {
    /// Win chance of the deepest low band the balance sits in
    fn low_band(&self, balance: u64) -> Option<f64> {
        self.config
            .low
            .iter()
            .filter(|band| balance < band.threshold)
            .min_by_key(|band| band.threshold)
            .map(|band| band.probability)
    }

    /// Loss chance of the highest high band the balance sits in
    fn high_band(&self, balance: u64) -> Option<f64> {
        self.config
            .high
            .iter()
            .filter(|band| balance > band.threshold)
            .max_by_key(|band| band.threshold)
            .map(|band| band.probability)
    }
}

impl PolicyRule for BalanceBands {
    fn kind(&self) -> RuleKind {
        RuleKind::BalanceBands
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Option<Decision> {
        if ctx.spin_count >= self.normalization_spins || !self.range.contains(ctx.balance) {
            return None;
        }

        if let Some(win_chance) = self.low_band(ctx.balance) {
            let directive = if rng.gen_bool(win_chance) {
                Directive::ForceWin
            } else {
                Directive::ForceLose
            };
            return Some(Decision::new(self.kind(), directive));
        }

        if let Some(loss_chance) = self.high_band(ctx.balance) {
            let directive = if rng.gen_bool(loss_chance) {
                Directive::ForceLose
            } else {
                Directive::ForceWin
            };
            return Some(Decision::new(self.kind(), directive));
        }

        None
    }
}

#[derive(Debug)]
struct StreakRelief {
    config: StreakConfig,
    range: OperatingRange,
}

impl StreakRelief {
    fn run_probability(&self, run: u32) -> f64 {
        let extra = run.saturating_sub(self.config.run_length) as f64;
        (self.config.run_base_probability + self.config.run_step_probability * extra)
            .min(self.config.run_max_probability)
    }
}

impl PolicyRule for StreakRelief {
    fn kind(&self) -> RuleKind {
        RuleKind::StreakRelief
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Option<Decision> {
        if !self.range.contains(ctx.balance) {
            return None;
        }
        let streak = ctx.streak;

        if streak.forced_loss_pending {
            return Some(
                Decision::new(self.kind(), Directive::ForceLose)
                    .with_effect(StreakEffect::ConsumeForcedLoss),
            );
        }
        if streak.luck_streak_remaining > 0 {
            return Some(
                Decision::new(self.kind(), Directive::ForceWin)
                    .with_effect(StreakEffect::ConsumeLuckStreak),
            );
        }

        let run_length = self.config.run_length;
        if streak.consecutive_wins >= run_length
            && ctx.balance > ctx.starting_balance
            && rng.gen_bool(self.run_probability(streak.consecutive_wins))
        {
            return Some(Decision::new(self.kind(), Directive::ForceLose));
        }
        if streak.consecutive_losses >= run_length
            && ctx.balance < ctx.starting_balance
            && rng.gen_bool(self.run_probability(streak.consecutive_losses))
        {
            return Some(Decision::new(self.kind(), Directive::ForceWin));
        }

        let in_luck_range =
            (self.config.luck_range_min..=self.config.luck_range_max).contains(&ctx.balance);
        if self.config.luck_streak_length > 0
            && in_luck_range
            && rng.gen_bool(self.config.luck_trigger_probability)
        {
            return Some(
                Decision::new(self.kind(), Directive::ForceWin).with_effect(
                    StreakEffect::StartLuckStreak {
                        remaining: self.config.luck_streak_length - 1,
                    },
                ),
            );
        }

        None
    }
}

#[derive(Debug)]
struct BalanceClamp {
    min_balance: u64,
    max_balance: u64,
    near_max_line: u64,
}

impl PolicyRule for BalanceClamp {
    fn kind(&self) -> RuleKind {
        RuleKind::BalanceClamp
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>, _rng: &mut dyn RngCore) -> Option<Decision> {
        if ctx.balance >= self.near_max_line {
            return Some(Decision::new(self.kind(), Directive::ForceLose));
        }
        if ctx.balance <= self.min_balance {
            return Some(Decision::new(self.kind(), Directive::ForceWin));
        }
        if ctx.balance >= self.max_balance {
            return Some(Decision::new(self.kind(), Directive::ForceLose));
        }
        None
    }
}

/// The ordered rule list
#[derive(Debug)]
pub struct OutcomePolicy {
    enabled: bool,
    rules: Vec<Box<dyn PolicyRule>>,
}

impl OutcomePolicy {
    pub fn from_config(config: &Config) -> Self {
        let policy = &config.policy;
        let range = OperatingRange::from_config(config);

        let rules: Vec<Box<dyn PolicyRule>> = vec![
            Box::new(AbsoluteRestriction {
                stakes: policy.restricted_straight_stakes.clone(),
            }),
            Box::new(AntiStrategy {
                config: policy.anti_strategy.clone(),
            }),
            Box::new(Padding {
                config: policy.padding.clone(),
            }),
            Box::new(EarlyShaping {
                config: policy.early_shaping.clone(),
                range,
            }),
            Box::new(BalanceBands {
                config: policy.balance_bands.clone(),
                normalization_spins: policy.normalization_spins,
                range,
            }),
            Box::new(StreakRelief {
                config: policy.streaks.clone(),
                range,
            }),
            Box::new(BalanceClamp {
                min_balance: policy.clamps.min_balance,
                max_balance: policy.clamps.max_balance,
                near_max_line: config.near_max_line(),
            }),
        ];

        Self {
            enabled: policy.enabled,
            rules,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Rule names in evaluation order
    pub fn rule_order(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    /// First rule with an opinion decides; an empty table or a disabled
    /// policy always draws uniformly.
    pub fn decide(&self, ctx: &PolicyContext<'_>, rng: &mut dyn RngCore) -> Decision {
        if !self.enabled || ctx.bets.is_empty() {
            return Decision::random();
        }
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(ctx, rng))
            .unwrap_or_else(Decision::random)
    }
}
