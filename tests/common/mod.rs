#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roulette_sim::config::{Config, PolicyConfig};
use roulette_sim::gaming::{Outcome, RouletteSession, WheelAnimator};
use std::time::Duration;

/// Stock table with outcome control switched off
pub fn fair_config() -> Config {
    Config {
        policy: PolicyConfig::disabled(),
        ..Config::default()
    }
}

/// Stock table, outcome control on, starting at `balance`
pub fn rigged_config(balance: u64) -> Config {
    let mut config = Config::default();
    config.game.initial_balance = balance;
    config
}

pub fn seeded(config: Config, seed: u64) -> RouletteSession {
    RouletteSession::with_seed(config, seed).expect("valid test config")
}

/// Animator that records what it was asked to show
#[derive(Default)]
pub struct RecordingAnimator {
    pub shown: Mutex<Vec<(Outcome, Duration)>>,
}

#[async_trait]
impl WheelAnimator for RecordingAnimator {
    async fn animate(&self, outcome: &Outcome, duration: Duration) {
        self.shown.lock().push((*outcome, duration));
        tokio::task::yield_now().await;
    }
}
