//! Engine configuration
//!
//! Table limits and every threshold, probability and cap used by outcome
//! control live here instead of inside the policy code. A [`Config`] is fixed
//! when a session is constructed:
//! - `Config::default()` for the stock table
//! - `Config::from_toml_str` / `Config::load_from_file` for tuned tables
//!
//! Every loader runs [`Config::validate`] before handing the value out.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub policy: PolicyConfig,
}

/// Table limits and session lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_balance: u64,
    pub min_bet: u64,
    /// Per-transaction cap; also caps the total staked across the table
    pub max_bet: u64,
    /// Reaching this balance ends the session until restart
    pub absolute_max_balance: u64,
    pub history_len: usize,
    pub chip_values: Vec<u64>,
    #[serde(with = "humantime_serde")]
    pub spin_duration: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_balance: 50_000,
            min_bet: 100,
            max_bet: 10_000,
            absolute_max_balance: 1_000_000,
            history_len: 10,
            chip_values: vec![100, 500, 2_500, 10_000],
            spin_duration: Duration::from_millis(4_000),
        }
    }
}

/// Outcome-control policy tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Master switch; when off every spin is drawn uniformly
    pub enabled: bool,
    /// Spins after which balance-banded steering stops for the session
    pub normalization_spins: u32,
    /// A lone straight bet at one of these stakes can never win
    pub restricted_straight_stakes: Vec<u64>,
    pub anti_strategy: AntiStrategyConfig,
    pub padding: PaddingConfig,
    pub early_shaping: EarlyShapingConfig,
    pub balance_bands: BalanceBandConfig,
    pub streaks: StreakConfig,
    pub clamps: ClampConfig,
    pub selection: SelectionConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normalization_spins: 20,
            restricted_straight_stakes: vec![2_500, 5_000, 10_000],
            anti_strategy: AntiStrategyConfig::default(),
            padding: PaddingConfig::default(),
            early_shaping: EarlyShapingConfig::default(),
            balance_bands: BalanceBandConfig::default(),
            streaks: StreakConfig::default(),
            clamps: ClampConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

impl PolicyConfig {
    /// A policy that never steers; every spin takes the uniform path
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Detection of many-straight-bet coverage strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiStrategyConfig {
    /// Share of active bets (by count) that must be straight
    pub min_straight_share: f64,
    pub min_bet_count: usize,
    pub min_total_amount: u64,
    pub lose_probability: f64,
}

impl Default for AntiStrategyConfig {
    fn default() -> Self {
        Self {
            min_straight_share: 0.8,
            min_bet_count: 8,
            min_total_amount: 5_000,
            lose_probability: 0.85,
        }
    }
}

/// Anti-zero-balance padding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddingConfig {
    pub enabled: bool,
    /// At or below this balance a win is favored with `favor_probability`
    pub trigger_balance: u64,
    /// At or below this balance a win is forced
    pub hard_floor: u64,
    pub favor_probability: f64,
    /// Settlement tops the balance up to this value
    pub balance_floor: Option<u64>,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_balance: 5_000,
            hard_floor: 2_000,
            favor_probability: 0.7,
            balance_floor: Some(500),
        }
    }
}

/// Minimum-win shaping over the first spins of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyShapingConfig {
    pub enabled: bool,
    pub spins: u32,
    /// A minimum win above `staked * generous_ratio` is suppressed
    pub generous_ratio: f64,
}

impl Default for EarlyShapingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spins: 5,
            generous_ratio: 3.0,
        }
    }
}

/// One balance band: crossing `threshold` applies `probability`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceBand {
    pub threshold: u64,
    pub probability: f64,
}

/// Balance-driven win/loss bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceBandConfig {
    /// Balance below `threshold`: win chance `probability`
    pub low: Vec<BalanceBand>,
    /// Balance above `threshold`: loss chance `probability`
    pub high: Vec<BalanceBand>,
}

impl Default for BalanceBandConfig {
    fn default() -> Self {
        Self {
            low: vec![
                BalanceBand { threshold: 30_000, probability: 0.6 },
                BalanceBand { threshold: 15_000, probability: 0.7 },
                BalanceBand { threshold: 8_000, probability: 0.8 },
            ],
            high: vec![
                BalanceBand { threshold: 100_000, probability: 0.55 },
                BalanceBand { threshold: 200_000, probability: 0.65 },
                BalanceBand { threshold: 350_000, probability: 0.75 },
            ],
        }
    }
}

/// Luck streaks and win/loss run relief
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    pub luck_range_min: u64,
    pub luck_range_max: u64,
    pub luck_trigger_probability: f64,
    pub luck_streak_length: u32,
    /// Consecutive wins/losses before relief applies
    pub run_length: u32,
    pub run_base_probability: f64,
    /// Added per spin beyond `run_length`
    pub run_step_probability: f64,
    pub run_max_probability: f64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            luck_range_min: 50_000,
            luck_range_max: 150_000,
            luck_trigger_probability: 0.05,
            luck_streak_length: 3,
            run_length: 3,
            run_base_probability: 0.3,
            run_step_probability: 0.1,
            run_max_probability: 0.8,
        }
    }
}

/// Hard balance clamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampConfig {
    pub min_balance: u64,
    pub max_balance: u64,
    /// Within this distance of the absolute maximum every spin loses
    pub near_max_margin: u64,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            min_balance: 2_000,
            max_balance: 500_000,
            near_max_margin: 50_000,
        }
    }
}

/// Candidate weighting used when a directive is realized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Share of the winning pool, by weight rank, that a forced win samples from
    pub top_fraction: f64,
    pub straight_boost: f64,
    /// Balance above which straight bets get `straight_boost`
    pub straight_boost_balance: u64,
    /// Recent spins considered for repeat damping
    pub history_window: usize,
    pub number_repeat_penalty: f64,
    pub color_repeat_penalty: f64,
    pub third_repeat_penalty: f64,
    /// Floor for the combined damping factor
    pub min_weight_factor: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_fraction: 0.5,
            straight_boost: 1.5,
            straight_boost_balance: 100_000,
            history_window: 10,
            number_repeat_penalty: 0.6,
            color_repeat_penalty: 0.15,
            third_repeat_penalty: 0.1,
            min_weight_factor: 0.2,
        }
    }
}

fn check_probability(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::config_invalid(
            field,
            format!("probability {} outside [0, 1]", value),
        ));
    }
    Ok(())
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        if game.min_bet == 0 {
            return Err(Error::config_invalid("game.min_bet", "must be positive"));
        }
        if game.min_bet > game.max_bet {
            return Err(Error::config_invalid("game.min_bet", "must not exceed max_bet"));
        }
        if game.initial_balance > game.absolute_max_balance {
            return Err(Error::config_invalid(
                "game.initial_balance",
                "must not exceed absolute_max_balance",
            ));
        }
        if game.history_len == 0 {
            return Err(Error::config_invalid("game.history_len", "must be positive"));
        }
        if game.chip_values.is_empty() {
            return Err(Error::config_invalid("game.chip_values", "must not be empty"));
        }
        if let Some(chip) = game
            .chip_values
            .iter()
            .find(|chip| !(game.min_bet..=game.max_bet).contains(chip))
        {
            return Err(Error::config_invalid(
                "game.chip_values",
                format!("chip {} outside [{}, {}]", chip, game.min_bet, game.max_bet),
            ));
        }

        let policy = &self.policy;
        check_probability("policy.anti_strategy.min_straight_share", policy.anti_strategy.min_straight_share)?;
        check_probability("policy.anti_strategy.lose_probability", policy.anti_strategy.lose_probability)?;
        check_probability("policy.padding.favor_probability", policy.padding.favor_probability)?;
        check_probability("policy.streaks.luck_trigger_probability", policy.streaks.luck_trigger_probability)?;
        check_probability("policy.streaks.run_base_probability", policy.streaks.run_base_probability)?;
        check_probability("policy.streaks.run_step_probability", policy.streaks.run_step_probability)?;
        check_probability("policy.streaks.run_max_probability", policy.streaks.run_max_probability)?;
        for band in policy.balance_bands.low.iter().chain(policy.balance_bands.high.iter()) {
            check_probability("policy.balance_bands", band.probability)?;
        }

        if policy.padding.hard_floor > policy.padding.trigger_balance {
            return Err(Error::config_invalid(
                "policy.padding.hard_floor",
                "must not exceed trigger_balance",
            ));
        }
        if let Some(floor) = policy.padding.balance_floor {
            // The top-up runs after the ceiling check, so it must stay below it
            if floor >= game.absolute_max_balance {
                return Err(Error::config_invalid(
                    "policy.padding.balance_floor",
                    "must be below absolute_max_balance",
                ));
            }
            if floor > game.initial_balance {
                return Err(Error::config_invalid(
                    "policy.padding.balance_floor",
                    "must not exceed initial_balance",
                ));
            }
        }
        if policy.clamps.min_balance >= policy.clamps.max_balance {
            return Err(Error::config_invalid(
                "policy.clamps.min_balance",
                "must be below max_balance",
            ));
        }
        if policy.early_shaping.generous_ratio <= 0.0 {
            return Err(Error::config_invalid(
                "policy.early_shaping.generous_ratio",
                "must be positive",
            ));
        }

        let selection = &policy.selection;
        if !(selection.top_fraction > 0.0 && selection.top_fraction <= 1.0) {
            return Err(Error::config_invalid(
                "policy.selection.top_fraction",
                "must be in (0, 1]",
            ));
        }
        if selection.straight_boost <= 0.0 {
            return Err(Error::config_invalid(
                "policy.selection.straight_boost",
                "must be positive",
            ));
        }
        if !(selection.min_weight_factor > 0.0 && selection.min_weight_factor <= 1.0) {
            return Err(Error::config_invalid(
                "policy.selection.min_weight_factor",
                "must be in (0, 1]",
            ));
        }
        for (field, penalty) in [
            ("policy.selection.number_repeat_penalty", selection.number_repeat_penalty),
            ("policy.selection.color_repeat_penalty", selection.color_repeat_penalty),
            ("policy.selection.third_repeat_penalty", selection.third_repeat_penalty),
        ] {
            if penalty < 0.0 {
                return Err(Error::config_invalid(field, "must not be negative"));
            }
        }

        Ok(())
    }

    /// Balance at or above which every spin is steered to a loss
    pub fn near_max_line(&self) -> u64 {
        self.game
            .absolute_max_balance
            .saturating_sub(self.policy.clamps.near_max_margin)
    }
}
