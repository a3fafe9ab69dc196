//! Intraday indicators: session VWAP, EMAs, returns, realized volatility,
//! and the micro-trend classification.

use serde::{Deserialize, Serialize};
use zerodte_models::{Bar, Error, MicroTrend};

use crate::config::IntradayConfig;

/// Latest-bar snapshot of the intraday state. Recomputed per intraday bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntradaySnapshot {
    pub price: f64,
    pub vwap: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    /// 1-bar simple return, in percent.
    pub return_1: f64,
    /// 5-bar simple return, in percent.
    pub return_5: f64,
    /// Annualized standard deviation of 1-bar returns, in percent.
    pub realized_vol: f64,
    pub distance_from_vwap_pct: f64,
    pub micro_trend: MicroTrend,
}

/// Snapshot plus the per-bar indicator series the chop detector consumes.
#[derive(Debug, Clone)]
pub struct IntradayView {
    pub snapshot: IntradaySnapshot,
    pub vwap: Vec<f64>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
}

/// Closing EMA levels of a session, used to seed the next session's first
/// bar.
#[derive(Debug, Clone, Copy)]
pub struct EmaSeed {
    pub fast: f64,
    pub slow: f64,
}

/// Computes intraday indicators over a single session's bars.
#[derive(Debug, Clone)]
pub struct IntradayEngine {
    config: IntradayConfig,
}

impl IntradayEngine {
    pub fn new(config: IntradayConfig) -> Self {
        Self { config }
    }

    /// Analyze the session's bars so far. `seed` carries the prior session's
    /// closing EMA levels; without it the first bar's close seeds the EMAs.
    pub fn analyze(&self, bars: &[Bar], seed: Option<EmaSeed>) -> Result<IntradayView, Error> {
        if bars.is_empty() {
            return Err(Error::DataGap {
                context: "intraday session",
                have: 0,
                need: 1,
            });
        }

        let vwap = session_vwap(bars);
        let ema_fast = ema_series(bars, self.config.ema_fast, seed.map(|s| s.fast));
        let ema_slow = ema_series(bars, self.config.ema_slow, seed.map(|s| s.slow));

        let last = bars.len() - 1;
        let price = bars[last].close;
        let last_vwap = vwap[last];

        let return_1 = pct_return(bars, last, 1);
        let return_5 = pct_return(bars, last, 5);
        let realized_vol = realized_vol(bars, self.config.vol_lookback, self.config.bars_per_day);

        let distance_from_vwap_pct = if last_vwap > 0.0 {
            (price - last_vwap) / last_vwap * 100.0
        } else {
            0.0
        };

        let micro_trend = micro_trend(price, ema_fast[last], ema_slow[last], last_vwap);

        Ok(IntradayView {
            snapshot: IntradaySnapshot {
                price,
                vwap: last_vwap,
                ema_fast: ema_fast[last],
                ema_slow: ema_slow[last],
                return_1,
                return_5,
                realized_vol,
                distance_from_vwap_pct,
                micro_trend,
            },
            vwap,
            ema_fast,
            ema_slow,
        })
    }
}

/// Session-cumulative VWAP over typical price. Resets with each session
/// because the input covers a single session. With no volume traded yet the
/// bar's typical price stands in.
fn session_vwap(bars: &[Bar]) -> Vec<f64> {
    let mut cum_pv = 0.0;
    let mut cum_v = 0.0;
    bars.iter()
        .map(|b| {
            cum_pv += b.typical_price() * b.volume;
            cum_v += b.volume;
            if cum_v > 0.0 {
                cum_pv / cum_v
            } else {
                b.typical_price()
            }
        })
        .collect()
}

/// EMA with smoothing `alpha = 2 / (period + 1)`.
///
/// The first bar of a session seeds from the prior session when available:
/// `ema_0 = alpha * open_0 + (1 - alpha) * seed`. Otherwise the first close
/// is the seed.
fn ema_series(bars: &[Bar], period: usize, seed: Option<f64>) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(bars.len());
    let mut prev = match seed {
        Some(prior) => alpha * bars[0].open + (1.0 - alpha) * prior,
        None => bars[0].close,
    };
    out.push(prev);
    for b in &bars[1..] {
        prev = alpha * b.close + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Simple percentage return over `lag` bars ending at `idx`; 0.0 when the
/// window or denominator is unavailable.
fn pct_return(bars: &[Bar], idx: usize, lag: usize) -> f64 {
    if idx < lag {
        return 0.0;
    }
    let base = bars[idx - lag].close;
    if base <= 0.0 {
        return 0.0;
    }
    (bars[idx].close - base) / base * 100.0
}

/// Annualized standard deviation of trailing 1-bar returns, in percent.
/// Returns 0.0 with fewer than two observations.
fn realized_vol(bars: &[Bar], lookback: usize, bars_per_day: usize) -> f64 {
    let mut returns: Vec<f64> = Vec::new();
    let start = bars.len().saturating_sub(lookback + 1);
    for i in (start + 1)..bars.len() {
        returns.push(pct_return(bars, i, 1));
    }
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    var.sqrt() * ((bars_per_day * 252) as f64).sqrt()
}

/// Up when both EMAs and VWAP agree with price; Down on the mirror image;
/// Neutral otherwise.
fn micro_trend(price: f64, ema_fast: f64, ema_slow: f64, vwap: f64) -> MicroTrend {
    if ema_fast > ema_slow && price > vwap {
        MicroTrend::Up
    } else if ema_fast < ema_slow && price < vwap {
        MicroTrend::Down
    } else {
        MicroTrend::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[f64], volume: f64) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                ts: start + Duration::minutes(5 * i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume,
            })
            .collect()
    }

    fn engine() -> IntradayEngine {
        IntradayEngine::new(IntradayConfig::default())
    }

    #[test]
    fn vwap_is_volume_weighted() {
        // Flat H=L=C bars make typical price equal close.
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        let series = vec![
            Bar {
                ts: start,
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 100.0,
            },
            Bar {
                ts: start + Duration::minutes(5),
                open: 20.0,
                high: 20.0,
                low: 20.0,
                close: 20.0,
                volume: 300.0,
            },
        ];
        let vwap = session_vwap(&series);
        assert!((vwap[0] - 10.0).abs() < 1e-12);
        assert!((vwap[1] - (10.0 * 100.0 + 20.0 * 300.0) / 400.0).abs() < 1e-12);
    }

    #[test]
    fn vwap_without_volume_falls_back_to_typical_price() {
        let series = bars(&[50.0, 51.0], 0.0);
        let vwap = session_vwap(&series);
        assert!((vwap[0] - 50.0).abs() < 1e-12);
        assert!((vwap[1] - 51.0).abs() < 1e-12);
    }

    #[test]
    fn ema_seeds_from_prior_session() {
        let series = bars(&[100.0, 101.0], 1.0);
        // alpha = 2/(9+1) = 0.2
        let unseeded = ema_series(&series, 9, None);
        assert!((unseeded[0] - 100.0).abs() < 1e-12);

        let seeded = ema_series(&series, 9, Some(98.0));
        let expected0 = 0.2 * 100.0 + 0.8 * 98.0;
        assert!((seeded[0] - expected0).abs() < 1e-12);
        let expected1 = 0.2 * 101.0 + 0.8 * expected0;
        assert!((seeded[1] - expected1).abs() < 1e-12);
    }

    #[test]
    fn returns_need_a_full_window() {
        let series = bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 1.0);
        assert_eq!(pct_return(&series, 3, 5), 0.0);
        assert!((pct_return(&series, 5, 5) - 5.0).abs() < 1e-9);
        assert!((pct_return(&series, 5, 1) - (105.0 / 104.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn constant_closes_have_zero_realized_vol() {
        let series = bars(&[100.0; 30], 1.0);
        assert_eq!(realized_vol(&series, 20, 78), 0.0);
    }

    #[test]
    fn micro_trend_branches() {
        assert_eq!(micro_trend(101.0, 100.5, 100.0, 100.8), MicroTrend::Up);
        assert_eq!(micro_trend(99.0, 99.5, 100.0, 99.8), MicroTrend::Down);
        assert_eq!(micro_trend(101.0, 99.5, 100.0, 100.8), MicroTrend::Neutral);
    }

    #[test]
    fn snapshot_micro_trend_on_rising_session() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.2).collect();
        let view = engine().analyze(&bars(&closes, 1_000.0), None).unwrap();
        assert_eq!(view.snapshot.micro_trend, MicroTrend::Up);
        assert!(view.snapshot.return_5 > 0.0);
        assert!(view.snapshot.distance_from_vwap_pct > 0.0);
        assert_eq!(view.vwap.len(), 30);
    }

    #[test]
    fn empty_session_is_a_data_gap() {
        assert!(matches!(
            engine().analyze(&[], None),
            Err(Error::DataGap { .. })
        ));
    }
}
