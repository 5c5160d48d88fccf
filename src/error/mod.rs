//! Error types and handling for the roulette engine
//!
//! Every fallible engine operation returns [`Result`]. Rejections never mutate
//! session state, so the error value is the only signal of *why* a call failed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for roulette engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bet placement and table-limit rejections
    Betting,
    /// Spin lifecycle errors (re-entrancy, empty table, terminal state)
    Gaming,
    /// Configuration and setup errors
    Configuration,
    /// Serialization and IO errors
    Internal,
    /// User input validation errors
    Validation,
}

impl ErrorCategory {
    /// Get the monitoring severity level for this category
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Internal => ErrorSeverity::High,
            Self::Configuration => ErrorSeverity::Medium,
            Self::Gaming => ErrorSeverity::Low,
            Self::Betting | Self::Validation => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

/// Why a bet placement (or repeat) was refused.
///
/// The presentation layer maps these to user feedback; the ledger guarantees
/// that a refused placement left balance and bets untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetRejection {
    /// Balance does not cover the stake
    InsufficientBalance { required: u64, available: u64 },
    /// Stake is under the table minimum
    BelowMinimum { amount: u64, min_bet: u64 },
    /// Single transaction exceeds the per-bet cap
    AbovePerBetCap { amount: u64, max_bet: u64 },
    /// Total staked across all positions would exceed the table cap
    AboveTableCap { total: u64, max_bet: u64 },
    /// Accumulated stake on one position would exceed the cap
    AbovePositionCap { position_total: u64, max_bet: u64 },
    /// Straight bet placed without a target number
    MissingStraightNumber,
    /// Outside bet placed with a target number
    UnexpectedNumber,
    /// Straight target outside 0..=36
    NumberOutOfRange(u8),
    /// Repeat requested but no previous round exists
    NothingToRepeat,
}

impl fmt::Display for BetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBalance { required, available } => write!(
                f,
                "insufficient balance: required {}, available {}",
                required, available
            ),
            Self::BelowMinimum { amount, min_bet } => {
                write!(f, "bet of {} is below the minimum of {}", amount, min_bet)
            }
            Self::AbovePerBetCap { amount, max_bet } => {
                write!(f, "bet of {} exceeds the per-bet cap of {}", amount, max_bet)
            }
            Self::AboveTableCap { total, max_bet } => write!(
                f,
                "total staked {} would exceed the table cap of {}",
                total, max_bet
            ),
            Self::AbovePositionCap {
                position_total,
                max_bet,
            } => write!(
                f,
                "position total {} would exceed the cap of {}",
                position_total, max_bet
            ),
            Self::MissingStraightNumber => write!(f, "straight bet requires a target number"),
            Self::UnexpectedNumber => write!(f, "only straight bets take a target number"),
            Self::NumberOutOfRange(n) => write!(f, "number {} is not on the wheel", n),
            Self::NothingToRepeat => write!(f, "no previous bets to repeat"),
        }
    }
}

/// Roulette engine error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Bet rejected: {0}")]
    BetRejected(BetRejection),

    #[error("A spin is already in progress")]
    SpinInFlight,

    #[error("No active bets on the table")]
    NoActiveBets,

    #[error("Balance limit of {0} reached; restart required")]
    LimitReached(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<BetRejection> for Error {
    fn from(rejection: BetRejection) -> Self {
        Error::BetRejected(rejection)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config: {}", err))
    }
}

impl Error {
    /// Get a stable error code for telemetry
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E001",
            Self::Serialization(_) => "E002",
            Self::BetRejected(_) => "E014",
            Self::SpinInFlight => "E020",
            Self::NoActiveBets => "E021",
            Self::LimitReached(_) => "E022",
            Self::InvalidInput(_) => "E036",
            Self::InvalidState(_) => "E037",
            Self::Config(_) => "E024",
        }
    }

    /// Get the error category for monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Internal,
            Self::BetRejected(_) => ErrorCategory::Betting,
            Self::SpinInFlight | Self::NoActiveBets | Self::LimitReached(_) => {
                ErrorCategory::Gaming
            }
            Self::InvalidInput(_) | Self::InvalidState(_) => ErrorCategory::Validation,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Get the error severity for alerting
    pub fn severity(&self) -> ErrorSeverity {
        self.category().severity()
    }

    /// The bet rejection reason, if this error is one
    pub fn rejection(&self) -> Option<BetRejection> {
        match self {
            Self::BetRejected(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Create a configuration validation error with field details
    pub fn config_invalid(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Error::Config(format!(
            "Validation failed for field '{}': {}",
            field.into(),
            constraint.into()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::SpinInFlight;
        assert_eq!(err.code(), "E020");
        assert_eq!(err.category(), ErrorCategory::Gaming);
    }

    #[test]
    fn test_rejection_roundtrip() {
        let err: Error = BetRejection::BelowMinimum {
            amount: 5,
            min_bet: 100,
        }
        .into();
        assert_eq!(err.code(), "E014");
        assert_eq!(
            err.rejection(),
            Some(BetRejection::BelowMinimum {
                amount: 5,
                min_bet: 100
            })
        );
        assert!(err.to_string().contains("below the minimum"));
    }

    #[test]
    fn test_helper_functions() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "roulette.toml").into();
        assert_eq!(err.code(), "E001");
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = Error::config_invalid("game.min_bet", "must be positive");
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("game.min_bet"));
    }
}
