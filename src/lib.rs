//! Roulette Sim - a single-player European roulette engine with outcome control
//!
//! Think of the crate as a casino table split into stations:
//! - gaming: the felt, the wheel and the croupier (rules, ledger, settlement,
//!   outcome control, the session and its orchestrator)
//! - config: the house rules card, fixed when the session opens
//! - error: every reason the croupier can refuse a request
//! - logging: the pit boss's notebook
//!
//! The engine is synchronous; only the orchestrator awaits, and only for the
//! wheel animation between deciding an outcome and paying it out.

pub mod config;
pub mod error;
pub mod gaming;
pub mod logging;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{Config, GameConfig, PolicyConfig};
pub use error::{BetRejection, Error, Result};
pub use gaming::{
    Bet, BetKind, BetTarget, Color, Decision, Directive, GameOrchestrator, Outcome,
    OrchestratorEvent, RouletteSession, RuleKind, SessionSnapshot, SessionStatistics,
    SettlementResult, TimedAnimator, WheelAnimator,
};
pub use logging::{init_logging, LogLevel, LoggingConfig};
