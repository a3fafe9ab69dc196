//! Signal enumerations and the per-bar signal record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directional bias of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Call,
    Put,
    None,
}

impl Direction {
    /// True for `Call` and `Put`.
    pub fn is_directional(self) -> bool {
        !matches!(self, Direction::None)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Call => write!(f, "CALL"),
            Direction::Put => write!(f, "PUT"),
            Direction::None => write!(f, "NONE"),
        }
    }
}

/// Confidence grade. Totally ordered: `None < Low < Medium < High`.
///
/// The numeric scale used by the time-of-day multiplier maps
/// `Low = 1, Medium = 2, High = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Ordering value: `None = 0` through `High = 3`.
    #[inline]
    pub fn rank(self) -> u8 {
        match self {
            Confidence::None => 0,
            Confidence::Low => 1,
            Confidence::Medium => 2,
            Confidence::High => 3,
        }
    }

    /// Inverse of [`rank`](Self::rank); values above 3 clamp to `High`.
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Confidence::None,
            1 => Confidence::Low,
            2 => Confidence::Medium,
            _ => Confidence::High,
        }
    }

    /// Grade from the number of matched scoring conditions:
    /// 4 conditions give `High`, 3 `Medium`, 2 `Low`, fewer `None`.
    pub fn from_matches(count: usize) -> Self {
        match count {
            4.. => Confidence::High,
            3 => Confidence::Medium,
            2 => Confidence::Low,
            _ => Confidence::None,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::None => write!(f, "NONE"),
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

/// Same-day (0DTE) trading permission from the daily regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Favorable,
    Caution,
    Avoid,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Favorable => write!(f, "FAVORABLE"),
            Permission::Caution => write!(f, "CAUTION"),
            Permission::Avoid => write!(f, "AVOID"),
        }
    }
}

/// Daily-timeframe trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Intraday micro-trend from EMAs and VWAP position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MicroTrend {
    Up,
    Down,
    Neutral,
}

/// One signal per intraday bar.
///
/// A pure function of the day's regime snapshot, the intraday snapshot, the
/// chop score, the volatility context, and static configuration. No hidden
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ts: DateTime<Utc>,
    pub direction: Direction,
    pub confidence: Confidence,
    pub permission: Permission,
    /// Matched condition names and adjustment notes, in evaluation order.
    pub rationale: Vec<String>,
    /// False marks a discretionary signal: still emitted, but callers must
    /// not trade it. Entry gating branches on this flag, not on confidence.
    pub tradeable: bool,
}

impl Signal {
    /// A non-directional signal carrying the given note.
    pub fn flat(ts: DateTime<Utc>, permission: Permission, note: impl Into<String>) -> Self {
        Signal {
            ts,
            direction: Direction::None,
            confidence: Confidence::None,
            permission,
            rationale: vec![note.into()],
            tradeable: false,
        }
    }
}
