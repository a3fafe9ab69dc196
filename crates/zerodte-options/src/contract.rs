//! Contract selection helpers: option kind, ATM strike, and the 0DTE
//! expiry clock.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use zerodte_models::Direction;

/// Call or Put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// The contract leg for a directional signal; `Direction::None` has no
    /// leg.
    pub fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Call => Some(OptionKind::Call),
            Direction::Put => Some(OptionKind::Put),
            Direction::None => None,
        }
    }
}

/// ATM-or-slightly-ITM strike on the given spacing grid: calls round down,
/// puts round up.
pub fn atm_strike(price: f64, kind: OptionKind, spacing: f64) -> f64 {
    match kind {
        OptionKind::Call => (price / spacing).floor() * spacing,
        OptionKind::Put => (price / spacing).ceil() * spacing,
    }
}

/// Hours in a regular session, used to convert wall-clock time to trading
/// years.
const SESSION_HOURS: f64 = 6.5;
const SESSIONS_PER_YEAR: f64 = 252.0;

/// Year fraction until the 16:00 same-day expiry, measured in trading time
/// (252 sessions of 6.5 hours). At or after the close this is 0.0, which
/// prices the contract at intrinsic value.
pub fn time_to_expiry_0dte(t: NaiveTime) -> f64 {
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
    if t >= close {
        return 0.0;
    }
    let hours = (close - t).num_seconds() as f64 / 3600.0;
    hours / (SESSIONS_PER_YEAR * SESSION_HOURS)
}
