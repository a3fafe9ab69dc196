//! Daily regime: trend, gap, range, and the 0DTE permission decision tree.
//!
//! The snapshot is derived once per trading day from daily bars plus the
//! session's opening stats, then reused unchanged for every intraday bar of
//! that day.

use serde::{Deserialize, Serialize};
use zerodte_models::{Bar, Error, Permission, Trend};

use crate::config::RegimeConfig;

/// Price aggregates for the session under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    pub yesterday_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

impl SessionStats {
    /// Aggregate a day's bars: first open, running high/low.
    pub fn from_bars(yesterday_close: f64, bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        Some(Self {
            yesterday_close,
            open: first.open,
            high,
            low,
        })
    }
}

/// Session range relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeClass {
    Low,
    Normal,
    High,
}

/// Daily-timeframe snapshot. Immutable for the trading day it was computed
/// for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    pub trend: Trend,
    pub ma_short: f64,
    pub ma_long: f64,
    /// Close of the most recent completed daily bar.
    pub latest_close: f64,
    /// Open gap versus the prior close, in percent (signed).
    pub gap_pct: f64,
    /// Session range as percent of the open.
    pub range_pct: f64,
    pub range_class: RangeClass,
    pub permission: Permission,
    pub permission_reason: String,
}

/// Classifies the daily regime and decides same-day option permission.
#[derive(Debug, Clone)]
pub struct RegimeEngine {
    config: RegimeConfig,
}

impl RegimeEngine {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    /// Build the day's snapshot from completed daily bars (through the prior
    /// session), the current session's stats, and an optional VIX level.
    ///
    /// Fewer daily bars than the MA periods degrade gracefully to the mean
    /// of what exists; an empty history is a data gap.
    pub fn analyze(
        &self,
        daily: &[Bar],
        today: &SessionStats,
        vix_level: Option<f64>,
    ) -> Result<RegimeSnapshot, Error> {
        if daily.is_empty() {
            return Err(Error::DataGap {
                context: "daily history",
                have: 0,
                need: 1,
            });
        }

        let ma_short = tail_mean(daily, self.config.ma_short);
        let ma_long = tail_mean(daily, self.config.ma_long);
        let latest_close = daily[daily.len() - 1].close;

        let trend = if latest_close > ma_short && latest_close > ma_long {
            Trend::Bullish
        } else if latest_close < ma_short {
            Trend::Bearish
        } else {
            Trend::Neutral
        };

        let gap_pct = if today.yesterday_close > 0.0 {
            (today.open - today.yesterday_close) / today.yesterday_close * 100.0
        } else {
            0.0
        };
        let range_pct = if today.open > 0.0 {
            (today.high - today.low) / today.open * 100.0
        } else {
            0.0
        };

        let range_class = if range_pct < self.config.range_low_pct {
            RangeClass::Low
        } else if range_pct > self.config.range_high_pct {
            RangeClass::High
        } else {
            RangeClass::Normal
        };

        let (permission, permission_reason) = self.decide_permission(gap_pct, range_pct, vix_level);

        Ok(RegimeSnapshot {
            trend,
            ma_short,
            ma_long,
            latest_close,
            gap_pct,
            range_pct,
            range_class,
            permission,
            permission_reason,
        })
    }

    /// Permission decision tree, evaluated in this exact priority order:
    ///
    /// 1. VIX known and at or below the floor: `Avoid` (hard deck).
    /// 2. Small gap and low range: `Avoid` (likely chop).
    /// 3. High range: `Favorable` (volatile day, directional OK).
    /// 4. Otherwise: `Caution`.
    ///
    /// An unknown VIX skips rule 1; it is not a failure.
    pub fn decide_permission(
        &self,
        gap_pct: f64,
        range_pct: f64,
        vix_level: Option<f64>,
    ) -> (Permission, String) {
        if let Some(vix) = vix_level {
            if vix <= self.config.vix_floor {
                return (
                    Permission::Avoid,
                    format!(
                        "VIX {:.1} at or below {:.0}: too calm for same-day options",
                        vix, self.config.vix_floor
                    ),
                );
            }
        }

        if gap_pct.abs() < self.config.gap_small_pct && range_pct < self.config.range_low_pct {
            return (
                Permission::Avoid,
                "small gap and low range: likely chop".to_string(),
            );
        }

        if range_pct > self.config.range_high_pct {
            return (
                Permission::Favorable,
                "volatile day: directional trades OK".to_string(),
            );
        }

        (Permission::Caution, "mixed conditions".to_string())
    }
}

/// Mean close of the last `period` bars, or of all bars when fewer exist.
fn tail_mean(daily: &[Bar], period: usize) -> f64 {
    let start = daily.len().saturating_sub(period);
    let window = &daily[start..];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|b| b.close).sum::<f64>() / window.len() as f64
}
