//! Gaming Module for the single-player roulette table
//!
//! ## Table
//! - European wheel (single zero, 37 pockets) and the thirteen bet kinds
//! - Bet ledger with per-bet, per-position and table-wide caps
//! - Settlement with an absolute balance ceiling
//!
//! ## Outcome Control
//! - Ordered, named policy rules producing a spin directive
//! - Directive realization against the active bets, damped by recent history
//!
//! ## Session
//! - `RouletteSession` aggregate with statistics, streaks and restart
//! - `GameOrchestrator` for presentation hosts: spin guard, animation, events

pub mod bet_ledger;
pub mod game_orchestrator;
pub mod number_selector;
pub mod outcome_policy;
pub mod payout_engine;
pub mod roulette_rules;
pub mod session;

pub use bet_ledger::{BetLedger, BetSet, TableLimits};
pub use game_orchestrator::{
    GameOrchestrator, InstantAnimator, OrchestratorConfig, OrchestratorEvent, OrchestratorStats,
    PendingSpin, TimedAnimator, WheelAnimator,
};
pub use number_selector::{minimum_winning_return, NumberSelector};
pub use outcome_policy::{
    Decision, Directive, OperatingRange, OutcomePolicy, PolicyContext, PolicyRule, RuleKind,
    StreakEffect, StreakState,
};
pub use payout_engine::{BetSettlement, PayoutEngine, SettlementResult};
pub use roulette_rules::{
    color_of, Bet, BetKind, BetTarget, Color, Outcome, Third,
    MAX_NUMBER, POCKET_COUNT, WHEEL,
};
pub use session::{RouletteSession, SessionSnapshot, SessionStatistics, SpinDecision};
