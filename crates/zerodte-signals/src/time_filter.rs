//! Time-of-day gating and confidence multipliers.
//!
//! Bar timestamps are expected to carry the exchange session's wall clock;
//! only the time component is consulted.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use zerodte_models::Confidence;

use crate::config::TimeFilterConfig;

/// Resolved window for one wall-clock instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    /// False vetoes entry unconditionally; exits are unaffected.
    pub allow_trade: bool,
    pub confidence_multiplier: f64,
    pub label: &'static str,
}

/// Maps wall-clock time to trade permission and a confidence multiplier.
#[derive(Debug, Clone)]
pub struct TimeFilter {
    config: TimeFilterConfig,
}

impl TimeFilter {
    pub fn new(config: TimeFilterConfig) -> Self {
        Self { config }
    }

    /// Resolve the window for `t`, checked in priority order: entry cutoff,
    /// lunch, the post-open caution window, power hour, normal session.
    pub fn window(&self, t: NaiveTime) -> TimeWindow {
        let cfg = &self.config;

        if t >= cfg.entry_cutoff {
            return TimeWindow {
                allow_trade: false,
                confidence_multiplier: 0.0,
                label: "entry window closed",
            };
        }
        if t >= cfg.lunch_start && t < cfg.lunch_end {
            return TimeWindow {
                allow_trade: true,
                confidence_multiplier: cfg.lunch_multiplier,
                label: "lunch chop window",
            };
        }
        let since_open = t.signed_duration_since(cfg.session_start).num_minutes();
        if (0..=cfg.open_caution_minutes).contains(&since_open) {
            return TimeWindow {
                allow_trade: true,
                confidence_multiplier: cfg.open_caution_multiplier,
                label: "first minutes after open",
            };
        }
        if t >= cfg.power_hour_start {
            return TimeWindow {
                allow_trade: true,
                confidence_multiplier: cfg.power_hour_multiplier,
                label: "power hour",
            };
        }
        TimeWindow {
            allow_trade: true,
            confidence_multiplier: 1.0,
            label: "normal session",
        }
    }

    /// Scale a confidence grade by a window multiplier.
    ///
    /// The grade maps to its numeric rank (Low 1, Medium 2, High 3), is
    /// multiplied, truncated toward zero, and clamped back to [1, 3]. The
    /// truncation makes sub-1.0 multipliers one-directional: 0.7 applied to
    /// High yields 2.1 and lands on Medium, never a partial state, while a
    /// multiplier of 1.0 or more can never lower the grade. `None` passes
    /// through untouched.
    pub fn apply_multiplier(confidence: Confidence, multiplier: f64) -> Confidence {
        if confidence == Confidence::None {
            return Confidence::None;
        }
        let scaled = (confidence.rank() as f64 * multiplier).trunc() as i64;
        Confidence::from_rank(scaled.clamp(1, 3) as u8)
    }
}
