//! Chop detection: VWAP-cross frequency, EMA flatness, and an ATR floor
//! over a trailing window.

use serde::{Deserialize, Serialize};
use zerodte_models::Bar;

use crate::config::ChopConfig;

/// Choppiness score for the current bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChopScore {
    /// Sign changes of `close > vwap` over the trailing window.
    pub vwap_crosses_per_hour: u32,
    /// The larger of the fast and slow EMA slopes over the window, as a
    /// fraction of the starting level. Both EMAs are flat exactly when this
    /// is below the flatness threshold.
    pub ema_flatness: f64,
    /// ATR as a fraction of the last close.
    pub atr_pct: f64,
    pub is_choppy: bool,
    /// Which conditions fired, for the signal rationale.
    pub reasons: Vec<String>,
}

impl ChopScore {
    /// Neutral score used when the window is not yet filled.
    pub fn quiet() -> Self {
        Self {
            vwap_crosses_per_hour: 0,
            ema_flatness: 0.0,
            atr_pct: 0.0,
            is_choppy: false,
            reasons: Vec::new(),
        }
    }
}

/// Scores choppiness from the intraday indicator series.
#[derive(Debug, Clone)]
pub struct ChopDetector {
    config: ChopConfig,
}

impl ChopDetector {
    pub fn new(config: ChopConfig) -> Self {
        Self { config }
    }

    /// Score the session so far. The series must be index-aligned with
    /// `bars`. Sessions shorter than the trailing window score quiet.
    pub fn score(
        &self,
        bars: &[Bar],
        vwap: &[f64],
        ema_fast: &[f64],
        ema_slow: &[f64],
    ) -> ChopScore {
        let n = bars.len();
        if n < self.config.lookback_bars || vwap.len() != n {
            return ChopScore::quiet();
        }

        let window = self.config.lookback_bars;
        let crosses = vwap_crosses(&bars[n - window..], &vwap[n - window..]);
        let flat_fast = window_slope(&ema_fast[n - window..]);
        let flat_slow = window_slope(&ema_slow[n - window..]);
        let ema_flatness = flat_fast.max(flat_slow);
        let atr_pct = atr_fraction(bars, self.config.atr_period);

        let mut reasons = Vec::new();
        if crosses >= self.config.vwap_cross_threshold {
            reasons.push(format!("VWAP crossed {} times in the last hour", crosses));
        }
        if ema_flatness < self.config.ema_flat_threshold {
            reasons.push("EMAs flat, no trend".to_string());
        }
        if atr_pct < self.config.atr_min_pct {
            reasons.push(format!(
                "ATR {:.2}% below the {:.2}% floor",
                atr_pct * 100.0,
                self.config.atr_min_pct * 100.0
            ));
        }

        ChopScore {
            vwap_crosses_per_hour: crosses,
            ema_flatness,
            atr_pct,
            is_choppy: !reasons.is_empty(),
            reasons,
        }
    }
}

/// Count sign changes of `close > vwap` within the window.
fn vwap_crosses(bars: &[Bar], vwap: &[f64]) -> u32 {
    let mut crosses = 0;
    let mut prev_above: Option<bool> = None;
    for (b, &v) in bars.iter().zip(vwap) {
        let above = b.close > v;
        if let Some(p) = prev_above {
            if p != above {
                crosses += 1;
            }
        }
        prev_above = Some(above);
    }
    crosses
}

/// Absolute fractional change across the window; 0.0 on a zero start level.
fn window_slope(series: &[f64]) -> f64 {
    match (series.first(), series.last()) {
        (Some(&start), Some(&end)) if start > 0.0 => ((end - start) / start).abs(),
        _ => 0.0,
    }
}

/// Rolling-mean true range over the last `period` bars, as a fraction of
/// the last close.
fn atr_fraction(bars: &[Bar], period: usize) -> f64 {
    if bars.len() < 2 {
        return 0.0;
    }
    let mut trs = Vec::new();
    for i in 1..bars.len() {
        let prev_close = bars[i - 1].close;
        let b = &bars[i];
        let tr = (b.high - b.low)
            .max((b.high - prev_close).abs())
            .max((b.low - prev_close).abs());
        trs.push(tr);
    }
    let start = trs.len().saturating_sub(period);
    let window = &trs[start..];
    let atr = window.iter().sum::<f64>() / window.len() as f64;
    let last_close = bars[bars.len() - 1].close;
    if last_close > 0.0 {
        atr / last_close
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar_at(i: usize, close: f64, spread: f64) -> Bar {
        Bar {
            ts: Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap() + Duration::minutes(5 * i as i64),
            open: close,
            high: close + spread,
            low: close - spread,
            close,
            volume: 1_000.0,
        }
    }

    fn detector() -> ChopDetector {
        ChopDetector::new(ChopConfig::default())
    }

    #[test]
    fn short_window_scores_quiet() {
        let bars: Vec<Bar> = (0..5).map(|i| bar_at(i, 100.0, 0.5)).collect();
        let vwap = vec![100.0; 5];
        let score = detector().score(&bars, &vwap, &vwap, &vwap);
        assert!(!score.is_choppy);
        assert!(score.reasons.is_empty());
    }

    #[test]
    fn oscillation_around_vwap_is_choppy() {
        // Closes alternate above/below a flat VWAP: 11 crosses in 12 bars.
        let bars: Vec<Bar> = (0..12)
            .map(|i| bar_at(i, if i % 2 == 0 { 100.4 } else { 99.6 }, 0.5))
            .collect();
        let vwap = vec![100.0; 12];
        let ema = vec![100.0; 12];
        let score = detector().score(&bars, &vwap, &ema, &ema);
        assert!(score.vwap_crosses_per_hour >= 3);
        assert!(score.is_choppy);
    }

    #[test]
    fn flat_emas_are_choppy_even_without_crosses() {
        let bars: Vec<Bar> = (0..12).map(|i| bar_at(i, 100.5, 0.5)).collect();
        let vwap = vec![100.0; 12];
        // EMAs move 0.01% across the window: flat.
        let ema: Vec<f64> = (0..12).map(|i| 100.0 + i as f64 * 0.0008).collect();
        let score = detector().score(&bars, &vwap, &ema, &ema);
        assert!(score.vwap_crosses_per_hour < 3);
        assert!(score.is_choppy);
        assert!(score.reasons.iter().any(|r| r.contains("EMAs flat")));
    }

    #[test]
    fn dead_tape_is_choppy_on_atr() {
        // Tight bars: ATR well below 0.2% of price.
        let bars: Vec<Bar> = (0..12)
            .map(|i| bar_at(i, 100.0 + i as f64 * 0.05, 0.02))
            .collect();
        let vwap = vec![99.0; 12];
        let ema: Vec<f64> = (0..12).map(|i| 100.0 + i as f64 * 0.05).collect();
        let score = detector().score(&bars, &vwap, &ema, &ema);
        assert!(score.atr_pct < 0.002);
        assert!(score.is_choppy);
    }

    #[test]
    fn trending_tape_with_real_range_is_not_choppy() {
        // Steady one-sided trend, wide bars, moving EMAs.
        let bars: Vec<Bar> = (0..12)
            .map(|i| bar_at(i, 100.0 + i as f64 * 0.5, 0.3))
            .collect();
        let vwap: Vec<f64> = (0..12).map(|i| 99.5 + i as f64 * 0.25).collect();
        let ema: Vec<f64> = (0..12).map(|i| 99.8 + i as f64 * 0.4).collect();
        let score = detector().score(&bars, &vwap, &ema, &ema);
        assert_eq!(score.vwap_crosses_per_hour, 0);
        assert!(score.ema_flatness >= 0.001);
        assert!(score.atr_pct >= 0.002);
        assert!(!score.is_choppy);
    }
}
