//! Browser bindings for the roulette table
//!
//! The browser drives the wheel animation itself, so this facade exposes the
//! orchestrator's two-phase spin: `begin_spin` returns the pocket to animate
//! to, `complete_spin` settles once the animation has finished. Structured
//! values cross the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::config::Config;
use crate::error::Error;
use crate::gaming::{BetKind, GameOrchestrator, PendingSpin, RouletteSession};

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&format!("{} ({})", err, err.code()))
}

fn to_amount(value: f64) -> Result<u64, JsValue> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(JsValue::from_str("amount must be a non-negative whole number"));
    }
    Ok(value as u64)
}

/// JavaScript handle to one roulette session
#[wasm_bindgen]
pub struct RouletteTable {
    orchestrator: GameOrchestrator,
    pending: Option<PendingSpin>,
}

#[wasm_bindgen]
impl RouletteTable {
    /// Create a table from optional TOML configuration
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<RouletteTable, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_toml {
            Some(contents) => Config::from_toml_str(&contents).map_err(to_js)?,
            None => Config::default(),
        };
        let session = RouletteSession::new(config).map_err(to_js)?;
        let (orchestrator, _events) = GameOrchestrator::new(session);

        Ok(RouletteTable {
            orchestrator,
            pending: None,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn balance(&self) -> f64 {
        self.orchestrator.balance() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn spinning(&self) -> bool {
        self.orchestrator.is_spinning()
    }

    #[wasm_bindgen(getter)]
    pub fn spin_duration_ms(&self) -> f64 {
        self.orchestrator.config().spin_duration.as_millis() as f64
    }

    /// Chip denominations offered by the table
    #[wasm_bindgen(getter)]
    pub fn chip_values(&self) -> Vec<f64> {
        self.orchestrator
            .snapshot()
            .chip_values
            .into_iter()
            .map(|chip| chip as f64)
            .collect()
    }

    pub fn place_bet(&self, kind: &str, amount: f64, number: Option<u8>) -> Result<(), JsValue> {
        let kind: BetKind = kind.parse().map_err(to_js)?;
        self.orchestrator
            .on_bet_request(kind, to_amount(amount)?, number)
            .map_err(to_js)
    }

    pub fn repeat_last_bets(&self) -> Result<(), JsValue> {
        self.orchestrator.on_repeat_request().map_err(to_js)
    }

    pub fn clear_bets(&self) -> Result<f64, JsValue> {
        self.orchestrator
            .on_clear_request()
            .map(|refunded| refunded as f64)
            .map_err(to_js)
    }

    /// Decide the outcome; returns the number the wheel must stop on
    pub fn begin_spin(&mut self) -> Result<u8, JsValue> {
        let pending = self.orchestrator.begin_spin().map_err(to_js)?;
        let number = pending
            .outcome()
            .map(|o| o.number)
            .ok_or_else(|| JsValue::from_str("spin has no outcome"))?;
        self.pending = Some(pending);
        Ok(number)
    }

    /// Settle the spin started by `begin_spin`; returns the settlement as JSON
    pub fn complete_spin(&mut self) -> Result<String, JsValue> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| JsValue::from_str("no spin in progress"))?;
        let result = self.orchestrator.complete_spin(pending).map_err(to_js)?;
        serde_json::to_string(&result).map_err(|e| to_js(e.into()))
    }

    pub fn restart(&self) -> Result<(), JsValue> {
        self.orchestrator.restart().map_err(to_js)
    }

    /// Balance, bets, history and statistics as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.orchestrator.snapshot().to_json().map_err(to_js)
    }
}
