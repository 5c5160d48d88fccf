//! European Roulette Rules
//!
//! This module holds the static rules of single-zero roulette:
//! - The 37-pocket wheel table in physical wheel order
//! - Straight and outside bet kinds with their payouts
//! - The win predicate used by settlement and by outcome control

use crate::error::{BetRejection, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of pockets on a single-zero wheel
pub const POCKET_COUNT: usize = 37;

/// Highest number on the wheel
pub const MAX_NUMBER: u8 = 36;

/// Pocket color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

/// A winning pocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    pub number: u8,
    pub color: Color,
}

impl Outcome {
    /// Look up the pocket for `number` on the wheel table
    pub fn from_number(number: u8) -> Result<Self> {
        if number > MAX_NUMBER {
            return Err(BetRejection::NumberOutOfRange(number).into());
        }
        Ok(Self {
            number,
            color: color_of(number),
        })
    }

    /// Which third of the layout the number sits in; zero has its own range
    pub fn third(&self) -> Third {
        Third::of(self.number)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.number, self.color)
    }
}

/// Numeric third of the layout, used for history balancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Third {
    Zero,
    First,
    Second,
    Third,
}

impl Third {
    pub fn of(number: u8) -> Self {
        match number {
            0 => Third::Zero,
            1..=12 => Third::First,
            13..=24 => Third::Second,
            _ => Third::Third,
        }
    }
}

const fn pocket(number: u8, color: Color) -> Outcome {
    Outcome { number, color }
}

/// The wheel in physical pocket order, starting at zero
pub const WHEEL: [Outcome; POCKET_COUNT] = [
    pocket(0, Color::Green),
    pocket(32, Color::Red),
    pocket(15, Color::Black),
    pocket(19, Color::Red),
    pocket(4, Color::Black),
    pocket(21, Color::Red),
    pocket(2, Color::Black),
    pocket(25, Color::Red),
    pocket(17, Color::Black),
    pocket(34, Color::Red),
    pocket(6, Color::Black),
    pocket(27, Color::Red),
    pocket(13, Color::Black),
    pocket(36, Color::Red),
    pocket(11, Color::Black),
    pocket(30, Color::Red),
    pocket(8, Color::Black),
    pocket(23, Color::Red),
    pocket(10, Color::Black),
    pocket(5, Color::Red),
    pocket(24, Color::Black),
    pocket(16, Color::Red),
    pocket(33, Color::Black),
    pocket(1, Color::Red),
    pocket(20, Color::Black),
    pocket(14, Color::Red),
    pocket(31, Color::Black),
    pocket(9, Color::Red),
    pocket(22, Color::Black),
    pocket(18, Color::Red),
    pocket(29, Color::Black),
    pocket(7, Color::Red),
    pocket(28, Color::Black),
    pocket(12, Color::Red),
    pocket(35, Color::Black),
    pocket(3, Color::Red),
    pocket(26, Color::Black),
];

const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Color of a number under the standard European layout
pub fn color_of(number: u8) -> Color {
    if number == 0 {
        Color::Green
    } else if RED_NUMBERS.contains(&number) {
        Color::Red
    } else {
        Color::Black
    }
}

/// Bet kinds offered on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetKind {
    Straight,
    Red,
    Black,
    Odd,
    Even,
    Low,
    High,
    Dozen1,
    Dozen2,
    Dozen3,
    Column1,
    Column2,
    Column3,
}

impl BetKind {
    pub const ALL: [BetKind; 13] = [
        BetKind::Straight,
        BetKind::Red,
        BetKind::Black,
        BetKind::Odd,
        BetKind::Even,
        BetKind::Low,
        BetKind::High,
        BetKind::Dozen1,
        BetKind::Dozen2,
        BetKind::Dozen3,
        BetKind::Column1,
        BetKind::Column2,
        BetKind::Column3,
    ];

    /// Payout odds (x to 1)
    pub fn payout(&self) -> u64 {
        match self {
            BetKind::Straight => 35,
            BetKind::Red | BetKind::Black | BetKind::Odd | BetKind::Even => 1,
            BetKind::Low | BetKind::High => 1,
            BetKind::Dozen1 | BetKind::Dozen2 | BetKind::Dozen3 => 2,
            BetKind::Column1 | BetKind::Column2 | BetKind::Column3 => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BetKind::Straight => "Straight",
            BetKind::Red => "Red",
            BetKind::Black => "Black",
            BetKind::Odd => "Odd",
            BetKind::Even => "Even",
            BetKind::Low => "1-18",
            BetKind::High => "19-36",
            BetKind::Dozen1 => "1st Dozen",
            BetKind::Dozen2 => "2nd Dozen",
            BetKind::Dozen3 => "3rd Dozen",
            BetKind::Column1 => "1st Column",
            BetKind::Column2 => "2nd Column",
            BetKind::Column3 => "3rd Column",
        }
    }

    pub fn is_straight(&self) -> bool {
        matches!(self, BetKind::Straight)
    }
}

impl std::str::FromStr for BetKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "straight" => BetKind::Straight,
            "red" => BetKind::Red,
            "black" => BetKind::Black,
            "odd" => BetKind::Odd,
            "even" => BetKind::Even,
            "low" => BetKind::Low,
            "high" => BetKind::High,
            "dozen1" => BetKind::Dozen1,
            "dozen2" => BetKind::Dozen2,
            "dozen3" => BetKind::Dozen3,
            "column1" => BetKind::Column1,
            "column2" => BetKind::Column2,
            "column3" => BetKind::Column3,
            other => {
                return Err(crate::error::Error::InvalidInput(format!(
                    "unknown bet kind '{}'",
                    other
                )))
            }
        };
        Ok(kind)
    }
}

/// Where a bet sits on the layout; one ledger entry per distinct target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BetTarget {
    pub kind: BetKind,
    pub number: Option<u8>,
}

impl BetTarget {
    /// Build a validated target. Straight bets need a number; outside bets must not have one.
    pub fn new(kind: BetKind, number: Option<u8>) -> Result<Self> {
        match (kind, number) {
            (BetKind::Straight, None) => Err(BetRejection::MissingStraightNumber.into()),
            (BetKind::Straight, Some(n)) if n > MAX_NUMBER => {
                Err(BetRejection::NumberOutOfRange(n).into())
            }
            (BetKind::Straight, Some(_)) => Ok(Self { kind, number }),
            (_, Some(_)) => Err(BetRejection::UnexpectedNumber.into()),
            (_, None) => Ok(Self { kind, number: None }),
        }
    }

    pub fn straight(number: u8) -> Result<Self> {
        Self::new(BetKind::Straight, Some(number))
    }

    pub fn outside(kind: BetKind) -> Result<Self> {
        Self::new(kind, None)
    }
}

impl fmt::Display for BetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "{} {}", self.kind.display_name(), n),
            None => write!(f, "{}", self.kind.display_name()),
        }
    }
}

/// A stake on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub target: BetTarget,
    pub amount: u64,
    pub payout: u64,
}

impl Bet {
    pub fn new(target: BetTarget, amount: u64) -> Self {
        Self {
            target,
            amount,
            payout: target.kind.payout(),
        }
    }

    pub fn kind(&self) -> BetKind {
        self.target.kind
    }

    /// Total returned on a win, stake included
    pub fn win_amount(&self) -> u64 {
        self.amount.saturating_mul(self.payout + 1)
    }

    pub fn wins(&self, outcome: &Outcome) -> bool {
        wins(&self.target, outcome)
    }
}

/// Whether a bet on `target` wins when the ball lands on `outcome`
pub fn wins(target: &BetTarget, outcome: &Outcome) -> bool {
    let n = outcome.number;
    match target.kind {
        BetKind::Straight => target.number == Some(n),
        BetKind::Red => outcome.color == Color::Red,
        BetKind::Black => outcome.color == Color::Black,
        BetKind::Odd => n != 0 && n % 2 == 1,
        BetKind::Even => n != 0 && n % 2 == 0,
        BetKind::Low => (1..=18).contains(&n),
        BetKind::High => (19..=36).contains(&n),
        BetKind::Dozen1 => (1..=12).contains(&n),
        BetKind::Dozen2 => (13..=24).contains(&n),
        BetKind::Dozen3 => (25..=36).contains(&n),
        BetKind::Column1 => n != 0 && n % 3 == 1,
        BetKind::Column2 => n != 0 && n % 3 == 2,
        BetKind::Column3 => n != 0 && n % 3 == 0,
    }
}
