//! Signal pipeline configuration.
//!
//! Every threshold the pipeline consults lives here. Configuration is
//! supplied externally at construction and never mutated by the pipeline;
//! there is no global lookup.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use zerodte_models::Error;

/// Daily regime thresholds.
///
/// Gap and range thresholds are in percent of the reference price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Short moving-average period in trading days.
    pub ma_short: usize,
    /// Long moving-average period in trading days.
    pub ma_long: usize,
    /// Gaps smaller than this (percent) count as "no gap".
    pub gap_small_pct: f64,
    /// Ranges below this (percent of open) mark a quiet day.
    pub range_low_pct: f64,
    /// Ranges above this (percent of open) mark a volatile day.
    pub range_high_pct: f64,
    /// VIX at or below this level vetoes same-day option entries outright.
    pub vix_floor: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            ma_short: 20,
            ma_long: 50,
            gap_small_pct: 0.2,
            range_low_pct: 0.5,
            range_high_pct: 1.5,
            vix_floor: 15.0,
        }
    }
}

/// Intraday indicator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntradayConfig {
    /// Fast EMA period in bars.
    pub ema_fast: usize,
    /// Slow EMA period in bars.
    pub ema_slow: usize,
    /// Bars used for the realized-volatility window.
    pub vol_lookback: usize,
    /// Bars per regular session, used to annualize realized volatility
    /// (78 five-minute bars for a 6.5 hour session).
    pub bars_per_day: usize,
}

impl Default for IntradayConfig {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            vol_lookback: 20,
            bars_per_day: 78,
        }
    }
}

/// Chop detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChopConfig {
    /// Trailing window in bars (12 five-minute bars is one hour).
    pub lookback_bars: usize,
    /// VWAP crosses at or above this count mark chop.
    pub vwap_cross_threshold: u32,
    /// EMA slope (fractional change over the window) below which both EMAs
    /// count as flat.
    pub ema_flat_threshold: f64,
    /// ATR averaging period in bars.
    pub atr_period: usize,
    /// ATR as a fraction of price below which the tape counts as dead.
    pub atr_min_pct: f64,
}

impl Default for ChopConfig {
    fn default() -> Self {
        Self {
            lookback_bars: 12,
            vwap_cross_threshold: 3,
            ema_flat_threshold: 0.001,
            atr_period: 14,
            atr_min_pct: 0.002,
        }
    }
}

/// Time-of-day windows and their confidence multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeFilterConfig {
    /// First bar of the evaluated session.
    pub session_start: NaiveTime,
    /// Minutes after the open during which confidence is cut.
    pub open_caution_minutes: i64,
    pub open_caution_multiplier: f64,
    /// Lunch window bounds (start inclusive, end exclusive).
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub lunch_multiplier: f64,
    /// From here to the entry cutoff confidence is boosted.
    pub power_hour_start: NaiveTime,
    pub power_hour_multiplier: f64,
    /// No new entries at or after this time; exits continue.
    pub entry_cutoff: NaiveTime,
}

impl Default for TimeFilterConfig {
    fn default() -> Self {
        Self {
            session_start: NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            open_caution_minutes: 10,
            open_caution_multiplier: 0.5,
            lunch_start: NaiveTime::from_hms_opt(11, 45, 0).unwrap(),
            lunch_end: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            lunch_multiplier: 0.6,
            power_hour_start: NaiveTime::from_hms_opt(14, 15, 0).unwrap(),
            power_hour_multiplier: 1.2,
            entry_cutoff: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        }
    }
}

/// Volatility-context confidence adjustment thresholds.
///
/// ATM IV values are in percent, VIX in index points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolAdjustConfig {
    /// Below both of these the market counts as calm and Medium demotes to
    /// Low.
    pub calm_iv: f64,
    pub calm_vix: f64,
    /// Above either of these the market counts as elevated and Medium
    /// promotes to High.
    pub elevated_iv: f64,
    pub elevated_vix: f64,
}

impl Default for VolAdjustConfig {
    fn default() -> Self {
        Self {
            calm_iv: 15.0,
            calm_vix: 15.0,
            elevated_iv: 20.0,
            elevated_vix: 20.0,
        }
    }
}

/// Hard requirements for a tradeable signal in strict options mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictModeConfig {
    /// Minimum absolute 5-bar return, in percent.
    pub min_move_pct: f64,
    /// Minimum ATM implied volatility, in percent. An unknown IV fails
    /// this requirement.
    pub min_atm_iv: f64,
}

impl Default for StrictModeConfig {
    fn default() -> Self {
        Self {
            min_move_pct: 1.0,
            min_atm_iv: 12.0,
        }
    }
}

/// Full signal pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub regime: RegimeConfig,
    pub intraday: IntradayConfig,
    pub chop: ChopConfig,
    pub time: TimeFilterConfig,
    pub vol_adjust: VolAdjustConfig,
    pub strict: StrictModeConfig,
}

impl SignalConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.regime.ma_short == 0 || self.regime.ma_long == 0 {
            return Err(Error::config("moving-average periods must be positive"));
        }
        if self.intraday.ema_fast == 0 || self.intraday.ema_slow == 0 {
            return Err(Error::config("EMA periods must be positive"));
        }
        if self.intraday.ema_fast >= self.intraday.ema_slow {
            return Err(Error::config(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.intraday.ema_fast, self.intraday.ema_slow
            )));
        }
        if self.intraday.bars_per_day == 0 {
            return Err(Error::config("bars_per_day must be positive"));
        }
        if self.chop.lookback_bars < 2 || self.chop.atr_period == 0 {
            return Err(Error::config("chop windows must cover at least two bars"));
        }
        if self.regime.gap_small_pct < 0.0
            || self.regime.range_low_pct < 0.0
            || self.regime.range_high_pct < 0.0
            || self.chop.ema_flat_threshold < 0.0
            || self.chop.atr_min_pct < 0.0
        {
            return Err(Error::config("thresholds must be non-negative"));
        }
        if self.time.lunch_start >= self.time.lunch_end {
            return Err(Error::config("lunch window is inverted"));
        }
        if self.time.session_start >= self.time.entry_cutoff {
            return Err(Error::config("entry cutoff precedes the session start"));
        }
        if self.time.open_caution_multiplier < 0.0
            || self.time.lunch_multiplier < 0.0
            || self.time.power_hour_multiplier < 0.0
        {
            return Err(Error::config("confidence multipliers must be non-negative"));
        }
        if self.strict.min_move_pct < 0.0 || self.strict.min_atm_iv < 0.0 {
            return Err(Error::config("strict-mode minimums must be non-negative"));
        }
        Ok(())
    }
}
