//! Game Orchestrator - coordinates a session with its presentation layer
//!
//! This module implements:
//! - The spin re-entrancy guard (one spin in flight, no betting meanwhile)
//! - Decide, animate, settle ordering around an injected [`WheelAnimator`]
//! - A two-phase spin API for hosts that drive the animation themselves
//! - Presentation events over a broadcast channel
//!
//! The session lock is never held across an `.await`: the outcome is fixed
//! and recorded before the animation starts and settlement only happens once
//! the animation has resolved. The in-flight flag is only set, cleared and
//! checked while the session lock is held.

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::payout_engine::SettlementResult;
use super::roulette_rules::{Bet, BetKind, BetTarget, Outcome};
use super::session::{RouletteSession, SessionSnapshot, SessionStatistics, SpinDecision};
use crate::config::GameConfig;
use crate::error::{BetRejection, Error, Result};

/// Collaborator that shows the wheel converging on a decided outcome
#[async_trait]
pub trait WheelAnimator: Send + Sync {
    /// Must resolve only after the wheel visibly rests on `outcome`
    async fn animate(&self, outcome: &Outcome, duration: Duration);
}

/// Animator that waits out the nominal spin duration
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedAnimator;

#[async_trait]
impl WheelAnimator for TimedAnimator {
    async fn animate(&self, _outcome: &Outcome, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Animator for headless hosts; resolves immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantAnimator;

#[async_trait]
impl WheelAnimator for InstantAnimator {
    async fn animate(&self, _outcome: &Outcome, _duration: Duration) {}
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub spin_duration: Duration,
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            spin_duration: Duration::from_secs(4),
            event_capacity: 256,
        }
    }
}

impl From<&GameConfig> for OrchestratorConfig {
    fn from(game: &GameConfig) -> Self {
        Self {
            spin_duration: game.spin_duration,
            ..Self::default()
        }
    }
}

/// Events emitted to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    BetPlaced {
        target: BetTarget,
        amount: u64,
        balance: u64,
    },
    BetRejected {
        reason: BetRejection,
    },
    BetsRepeated {
        total: u64,
        balance: u64,
    },
    BetsCleared {
        refunded: u64,
        balance: u64,
    },
    SpinStarted {
        spin_number: u32,
        outcome: Outcome,
        #[serde(with = "humantime_serde")]
        duration: Duration,
    },
    SpinSettled {
        result: SettlementResult,
    },
    LimitReached {
        balance: u64,
    },
    SessionRestarted {
        balance: u64,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub bets_accepted: u64,
    pub bets_rejected: u64,
    pub spins_started: u64,
    pub spins_settled: u64,
    pub spins_rejected: u64,
}

/// A decided spin awaiting settlement.
///
/// The in-flight guard stays set until the spin is settled. Dropping a pending
/// spin settles it, since its outcome is already in the history.
#[must_use = "a pending spin holds the spin guard until it is completed"]
pub struct PendingSpin {
    decision: Option<SpinDecision>,
    duration: Duration,
    session: Arc<Mutex<RouletteSession>>,
    spinning: Arc<AtomicBool>,
    event_tx: broadcast::Sender<OrchestratorEvent>,
    stats: Arc<Mutex<OrchestratorStats>>,
}

impl PendingSpin {
    pub fn outcome(&self) -> Option<Outcome> {
        self.decision.map(|d| d.outcome)
    }

    pub fn decision(&self) -> Option<SpinDecision> {
        self.decision
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn settle(&mut self) -> Result<SettlementResult> {
        let decision = self
            .decision
            .take()
            .ok_or_else(|| Error::InvalidState("spin already settled".to_string()))?;

        let settled = {
            let mut session = self.session.lock();
            let settled = session
                .calculate_winnings(&decision.outcome)
                .map(|result| (result, session.balance()));
            self.spinning.store(false, Ordering::Release);
            settled
        };

        let (result, balance) = settled?;
        self.stats.lock().spins_settled += 1;
        let _ = self.event_tx.send(OrchestratorEvent::SpinSettled {
            result: result.clone(),
        });
        if result.limit_reached {
            let _ = self.event_tx.send(OrchestratorEvent::LimitReached { balance });
        }
        Ok(result)
    }
}

impl Drop for PendingSpin {
    fn drop(&mut self) {
        if self.decision.is_some() {
            warn!("Pending spin dropped before completion; settling now");
            if let Err(e) = self.settle() {
                warn!(error = %e, "Settlement of dropped spin failed");
            }
        }
    }
}

impl std::fmt::Debug for PendingSpin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSpin")
            .field("decision", &self.decision)
            .field("duration", &self.duration)
            .finish()
    }
}

/// Orchestrates one session for its presentation layer
#[derive(Clone)]
pub struct GameOrchestrator {
    session: Arc<Mutex<RouletteSession>>,
    spinning: Arc<AtomicBool>,
    event_tx: broadcast::Sender<OrchestratorEvent>,
    config: OrchestratorConfig,
    stats: Arc<Mutex<OrchestratorStats>>,
}

impl GameOrchestrator {
    /// Create an orchestrator around `session`, using the session's spin duration
    pub fn new(session: RouletteSession) -> (Self, broadcast::Receiver<OrchestratorEvent>) {
        let config = OrchestratorConfig::from(&session.config().game);
        Self::with_config(session, config)
    }

    pub fn with_config(
        session: RouletteSession,
        config: OrchestratorConfig,
    ) -> (Self, broadcast::Receiver<OrchestratorEvent>) {
        let (event_tx, event_rx) = broadcast::channel(config.event_capacity.max(1));
        let orchestrator = Self {
            session: Arc::new(Mutex::new(session)),
            spinning: Arc::new(AtomicBool::new(false)),
            event_tx,
            config,
            stats: Arc::new(Mutex::new(OrchestratorStats::default())),
        };
        (orchestrator, event_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    fn emit(&self, event: OrchestratorEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Lock the session, refusing if a spin is in flight
    fn lock_idle(&self) -> Result<MutexGuard<'_, RouletteSession>> {
        let session = self.session.lock();
        if self.is_spinning() {
            return Err(Error::SpinInFlight);
        }
        Ok(session)
    }

    fn record_bet_outcome(&self, result: &Result<()>) {
        let mut stats = self.stats.lock();
        match result {
            Ok(()) => stats.bets_accepted += 1,
            Err(_) => stats.bets_rejected += 1,
        }
    }

    /// Place a bet on behalf of the player.
    ///
    /// `Err` carries the reason to show: a [`BetRejection`], a spin in flight
    /// or the terminal limit state.
    pub fn on_bet_request(&self, kind: BetKind, amount: u64, number: Option<u8>) -> Result<()> {
        let result = self.lock_idle().and_then(|mut session| {
            session.place_bet(kind, amount, number)?;
            let target = BetTarget::new(kind, number)?;
            Ok((target, session.balance()))
        });

        let result = match result {
            Ok((target, balance)) => {
                self.emit(OrchestratorEvent::BetPlaced {
                    target,
                    amount,
                    balance,
                });
                Ok(())
            }
            Err(e) => {
                if let Some(reason) = e.rejection() {
                    self.emit(OrchestratorEvent::BetRejected { reason });
                }
                Err(e)
            }
        };
        self.record_bet_outcome(&result);
        result
    }

    pub fn on_repeat_request(&self) -> Result<()> {
        let result = self.lock_idle().and_then(|mut session| {
            session.repeat_last_bets()?;
            Ok((session.total_bet(), session.balance()))
        });

        match result {
            Ok((total, balance)) => {
                self.emit(OrchestratorEvent::BetsRepeated { total, balance });
                Ok(())
            }
            Err(e) => {
                if let Some(reason) = e.rejection() {
                    self.emit(OrchestratorEvent::BetRejected { reason });
                }
                Err(e)
            }
        }
    }

    /// Refund the active bets; returns the refunded amount
    pub fn on_clear_request(&self) -> Result<u64> {
        let (refunded, balance) = {
            let mut session = self.lock_idle()?;
            let refunded = session.clear_bets();
            (refunded, session.balance())
        };
        self.emit(OrchestratorEvent::BetsCleared { refunded, balance });
        Ok(refunded)
    }

    /// Take the spin guard and decide the outcome.
    ///
    /// The returned [`PendingSpin`] must be passed to
    /// [`complete_spin`](Self::complete_spin) once the wheel has stopped.
    pub fn begin_spin(&self) -> Result<PendingSpin> {
        let decided = {
            let mut session = self.session.lock();
            if self
                .spinning
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                Err(Error::SpinInFlight)
            } else {
                let decided = session.decide_outcome();
                if decided.is_err() {
                    self.spinning.store(false, Ordering::Release);
                }
                decided
            }
        };
        let decision = match decided {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "Spin rejected");
                self.stats.lock().spins_rejected += 1;
                return Err(e);
            }
        };

        self.stats.lock().spins_started += 1;
        debug!(
            spin = decision.spin_number,
            outcome = %decision.outcome,
            "Spin started"
        );
        self.emit(OrchestratorEvent::SpinStarted {
            spin_number: decision.spin_number,
            outcome: decision.outcome,
            duration: self.config.spin_duration,
        });

        Ok(PendingSpin {
            decision: Some(decision),
            duration: self.config.spin_duration,
            session: Arc::clone(&self.session),
            spinning: Arc::clone(&self.spinning),
            event_tx: self.event_tx.clone(),
            stats: Arc::clone(&self.stats),
        })
    }

    /// Settle a pending spin and release the guard
    pub fn complete_spin(&self, mut pending: PendingSpin) -> Result<SettlementResult> {
        pending.settle()
    }

    /// Decide, animate, then settle
    pub async fn on_spin_request(&self, animator: &dyn WheelAnimator) -> Result<SettlementResult> {
        let pending = self.begin_spin()?;
        if let Some(outcome) = pending.outcome() {
            animator.animate(&outcome, pending.duration()).await;
        }
        let result = self.complete_spin(pending)?;
        info!(
            outcome = %result.outcome,
            net = result.net_profit,
            balance = result.balance_after,
            "Spin complete"
        );
        Ok(result)
    }

    /// Restart the session; refused while a spin is in flight
    pub fn restart(&self) -> Result<()> {
        let balance = {
            let mut session = self.lock_idle()?;
            session.restart();
            session.balance()
        };
        self.emit(OrchestratorEvent::SessionRestarted { balance });
        Ok(())
    }

    pub fn balance(&self) -> u64 {
        self.session.lock().balance()
    }

    pub fn active_bets(&self) -> Vec<Bet> {
        self.session.lock().active_bets().iter().copied().collect()
    }

    pub fn total_bet(&self) -> u64 {
        self.session.lock().total_bet()
    }

    pub fn history(&self) -> Vec<Outcome> {
        self.session.lock().history().to_vec()
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.session.lock().statistics()
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.session.lock().remaining_capacity()
    }

    pub fn is_limit_reached(&self) -> bool {
        self.session.lock().is_limit_reached()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        let mut snapshot = session.snapshot();
        snapshot.spin_in_flight = self.is_spinning();
        snapshot
    }

    pub fn stats(&self) -> OrchestratorStats {
        *self.stats.lock()
    }
}

impl std::fmt::Debug for GameOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameOrchestrator")
            .field("spinning", &self.is_spinning())
            .field("config", &self.config)
            .finish()
    }
}
