//! Completed-trade records produced by the backtester.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::{Confidence, Direction, Permission};

/// Why a simulated trade closed. Exactly one reason per trade, evaluated in
/// the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Time,
    EndOfDay,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "TP"),
            ExitReason::StopLoss => write!(f, "SL"),
            ExitReason::Time => write!(f, "TIME"),
            ExitReason::EndOfDay => write!(f, "EOD"),
        }
    }
}

/// Immutable record of one completed simulated trade.
///
/// The ordered sequence of these records is the canonical regression
/// artifact: identical bars and configuration must reproduce it
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub direction: Direction,
    /// Signal confidence at entry.
    pub confidence: Confidence,
    /// Regime permission at entry.
    pub permission: Permission,
    pub entry_underlying: f64,
    pub exit_underlying: f64,
    /// Premium paid per unit at entry, spread and slippage included.
    pub entry_option_price: f64,
    /// Premium received per unit at exit, slippage included.
    pub exit_option_price: f64,
    pub strike: f64,
    pub contracts: u32,
    /// Net of commissions and slippage.
    pub pnl: f64,
    /// PnL normalized by the initial premium at risk under the stop.
    pub r_multiple: f64,
    pub exit_reason: ExitReason,
    /// Total commissions charged across entry and exit.
    pub commissions: f64,
    /// Total price impact of slippage across entry and exit, in dollars.
    pub slippage: f64,
}

impl TradeRecord {
    /// True when the trade closed profitably.
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_reason_labels() {
        assert_eq!(ExitReason::TakeProfit.to_string(), "TP");
        assert_eq!(ExitReason::StopLoss.to_string(), "SL");
        assert_eq!(ExitReason::Time.to_string(), "TIME");
        assert_eq!(ExitReason::EndOfDay.to_string(), "EOD");
    }

    #[test]
    fn exit_reason_serde_round_trip() {
        let json = serde_json::to_string(&ExitReason::StopLoss).unwrap();
        let back: ExitReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExitReason::StopLoss);
    }
}
