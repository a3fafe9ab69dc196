//! Signal synthesis: condition scoring plus the fixed adjustment ladder.

use chrono::{DateTime, Utc};
use tracing::debug;
use zerodte_models::{Confidence, Direction, MicroTrend, Permission, Signal, Trend};

use crate::chop::ChopScore;
use crate::config::SignalConfig;
use crate::intraday::IntradaySnapshot;
use crate::regime::RegimeSnapshot;
use crate::time_filter::TimeFilter;
use crate::vol_context::VolContext;

/// Combines the regime, intraday, chop, time, and volatility inputs into
/// one signal per bar.
///
/// Adjustments run in a fixed order: base condition scoring, the chop cap,
/// the time-of-day multiplier, the permission adjustment, then the
/// volatility adjustment. Strict options mode is a final hard filter that
/// only flips the tradeable flag; it never suppresses the signal itself.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: SignalConfig,
    time_filter: TimeFilter,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        let time_filter = TimeFilter::new(config.time.clone());
        Self {
            config,
            time_filter,
        }
    }

    /// Evaluate one bar.
    pub fn evaluate(
        &self,
        ts: DateTime<Utc>,
        regime: &RegimeSnapshot,
        intraday: &IntradaySnapshot,
        chop: &ChopScore,
        vol: &VolContext,
        strict: bool,
    ) -> Signal {
        let permission = regime.permission;

        // Base scoring: four binary conditions per side.
        let mut call_conditions: Vec<&'static str> = Vec::new();
        if regime.trend == Trend::Bullish {
            call_conditions.push("bullish daily trend");
        }
        if intraday.micro_trend == MicroTrend::Up {
            call_conditions.push("micro trend up");
        }
        if intraday.price > intraday.vwap {
            call_conditions.push("price above VWAP");
        }
        if intraday.return_5 > 0.0 {
            call_conditions.push("positive 5-bar return");
        }

        let mut put_conditions: Vec<&'static str> = Vec::new();
        if regime.trend == Trend::Bearish {
            put_conditions.push("bearish daily trend");
        }
        if intraday.micro_trend == MicroTrend::Down {
            put_conditions.push("micro trend down");
        }
        if intraday.price < intraday.vwap {
            put_conditions.push("price below VWAP");
        }
        if intraday.return_5 < 0.0 {
            put_conditions.push("negative 5-bar return");
        }

        let call_score = call_conditions.len();
        let put_score = put_conditions.len();

        let (direction, matched) = if call_score > put_score && call_score >= 2 {
            (Direction::Call, call_conditions)
        } else if put_score > call_score && put_score >= 2 {
            (Direction::Put, put_conditions)
        } else {
            (Direction::None, Vec::new())
        };

        if direction == Direction::None {
            return Signal::flat(ts, permission, "mixed conditions, no directional edge");
        }

        let mut confidence = Confidence::from_matches(matched.len());
        let mut rationale: Vec<String> = matched.iter().map(|s| s.to_string()).collect();

        // 1. Chop cap: a choppy tape holds confidence at or below Medium.
        if chop.is_choppy {
            if confidence > Confidence::Medium {
                confidence = Confidence::Medium;
            }
            rationale.extend(chop.reasons.iter().cloned());
        }

        // 2. Time-of-day multiplier. A closed entry window empties the
        //    signal; a deep cut on an already weak signal does the same.
        let window = self.time_filter.window(ts.time());
        if !window.allow_trade {
            return Signal::flat(ts, permission, window.label);
        }
        if window.confidence_multiplier < 0.6 && confidence == Confidence::Low {
            return Signal::flat(ts, permission, window.label);
        }
        if (window.confidence_multiplier - 1.0).abs() > f64::EPSILON {
            confidence = TimeFilter::apply_multiplier(confidence, window.confidence_multiplier);
            rationale.push(window.label.to_string());
        }

        // 3. Permission adjustment.
        match permission {
            Permission::Avoid => {
                if confidence > Confidence::Low {
                    confidence = Confidence::Low;
                }
                rationale.push("regime says avoid same-day entries".to_string());
            }
            Permission::Favorable => {
                if confidence == Confidence::Medium {
                    confidence = Confidence::High;
                    rationale.push("favorable regime upgrade".to_string());
                }
            }
            Permission::Caution => {}
        }

        // 4. Volatility adjustment, only when both sides are known.
        if let (Some(iv), Some(vix)) = (vol.atm_iv, vol.vix_level) {
            let cfg = &self.config.vol_adjust;
            if iv < cfg.calm_iv && vix < cfg.calm_vix {
                if confidence == Confidence::Medium {
                    confidence = Confidence::Low;
                    rationale.push("calm volatility demotion".to_string());
                }
            } else if iv > cfg.elevated_iv || vix > cfg.elevated_vix {
                if confidence == Confidence::Medium {
                    confidence = Confidence::High;
                }
                rationale.push("elevated volatility".to_string());
            }
        }

        // Final tradeable grading. Strict mode requires everything at once;
        // any miss flags the signal discretionary instead of dropping it.
        let tradeable = if strict {
            let mut misses: Vec<&str> = Vec::new();
            if permission != Permission::Favorable {
                misses.push("permission not favorable");
            }
            if confidence != Confidence::High {
                misses.push("confidence below high");
            }
            if intraday.return_5.abs() < self.config.strict.min_move_pct {
                misses.push("5-bar move too small");
            }
            match vol.atm_iv {
                Some(iv) if iv >= self.config.strict.min_atm_iv => {}
                _ => misses.push("ATM IV below minimum"),
            }
            if misses.is_empty() {
                true
            } else {
                rationale.push(format!("discretionary: {}", misses.join(", ")));
                false
            }
        } else {
            confidence >= Confidence::Medium
        };

        let signal = Signal {
            ts,
            direction,
            confidence,
            permission,
            rationale,
            tradeable,
        };
        debug!(
            ts = %signal.ts,
            direction = %signal.direction,
            confidence = %signal.confidence,
            permission = %signal.permission,
            tradeable = signal.tradeable,
            "signal"
        );
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::RangeClass;
    use crate::vol_context::VolSource;
    use chrono::TimeZone;

    fn ts_at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, m, 0).unwrap()
    }

    fn regime(trend: Trend, permission: Permission) -> RegimeSnapshot {
        RegimeSnapshot {
            trend,
            ma_short: 100.0,
            ma_long: 98.0,
            latest_close: 102.0,
            gap_pct: 0.5,
            range_pct: 2.0,
            range_class: RangeClass::High,
            permission,
            permission_reason: String::new(),
        }
    }

    /// Snapshot with `n` bullish conditions matched and the rest pinned
    /// neutral so the put side scores zero.
    fn bullish_snapshot(n: usize) -> (RegimeSnapshot, IntradaySnapshot) {
        let trend = if n >= 1 { Trend::Bullish } else { Trend::Neutral };
        let micro = if n >= 2 {
            MicroTrend::Up
        } else {
            MicroTrend::Neutral
        };
        let (price, vwap) = if n >= 3 { (101.0, 100.0) } else { (100.0, 100.0) };
        let return_5 = if n >= 4 { 1.5 } else { 0.0 };
        (
            regime(trend, Permission::Caution),
            IntradaySnapshot {
                price,
                vwap,
                ema_fast: 100.5,
                ema_slow: 100.0,
                return_1: 0.1,
                return_5,
                realized_vol: 12.0,
                distance_from_vwap_pct: (price - vwap) / vwap * 100.0,
                micro_trend: micro,
            },
        )
    }

    fn engine() -> SignalEngine {
        SignalEngine::new(SignalConfig::default())
    }

    #[test]
    fn confidence_is_monotone_in_matched_conditions() {
        let e = engine();
        let expectations = [
            (0, Direction::None, Confidence::None),
            (1, Direction::None, Confidence::None),
            (2, Direction::Call, Confidence::Low),
            (3, Direction::Call, Confidence::Medium),
            (4, Direction::Call, Confidence::High),
        ];
        for (n, dir, conf) in expectations {
            let (reg, intra) = bullish_snapshot(n);
            let sig = e.evaluate(
                ts_at(10, 30),
                &reg,
                &intra,
                &ChopScore::quiet(),
                &VolContext::unavailable(),
                false,
            );
            assert_eq!(sig.direction, dir, "n = {}", n);
            assert_eq!(sig.confidence, conf, "n = {}", n);
        }
    }

    #[test]
    fn opposing_conditions_tie_to_flat() {
        let e = engine();
        // Bullish trend and price above VWAP versus micro down and a
        // negative 5-bar return: two against two.
        let reg = regime(Trend::Bullish, Permission::Caution);
        let intra = IntradaySnapshot {
            price: 101.0,
            vwap: 100.0,
            ema_fast: 99.0,
            ema_slow: 100.0,
            return_1: -0.1,
            return_5: -0.5,
            realized_vol: 12.0,
            distance_from_vwap_pct: 1.0,
            micro_trend: MicroTrend::Down,
        };
        let sig = e.evaluate(
            ts_at(10, 30),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.direction, Direction::None);
        assert!(!sig.tradeable);
    }

    #[test]
    fn chop_caps_confidence_at_medium() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(4);
        let chop = ChopScore {
            vwap_crosses_per_hour: 5,
            ema_flatness: 0.0,
            atr_pct: 0.001,
            is_choppy: true,
            reasons: vec!["VWAP crossed 5 times in the last hour".to_string()],
        };
        let sig = e.evaluate(
            ts_at(10, 30),
            &reg,
            &intra,
            &chop,
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.confidence, Confidence::Medium);
    }

    #[test]
    fn closed_entry_window_empties_the_signal() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(4);
        let sig = e.evaluate(
            ts_at(14, 45),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.direction, Direction::None);
        assert!(!sig.tradeable);
    }

    #[test]
    fn early_session_cut_downgrades_high_to_low() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(4);
        // 09:50 sits in the post-open caution window: 3 x 0.5 = 1.5 -> Low.
        let sig = e.evaluate(
            ts_at(9, 50),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.confidence, Confidence::Low);
        assert!(!sig.tradeable);
    }

    #[test]
    fn deep_cut_on_low_confidence_empties_the_signal() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(2);
        let sig = e.evaluate(
            ts_at(9, 50),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.direction, Direction::None);
    }

    #[test]
    fn avoid_regime_forces_low_confidence() {
        let e = engine();
        let (mut reg, intra) = bullish_snapshot(4);
        reg.permission = Permission::Avoid;
        let sig = e.evaluate(
            ts_at(10, 30),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.direction, Direction::Call);
        assert_eq!(sig.confidence, Confidence::Low);
        assert!(!sig.tradeable);
    }

    #[test]
    fn favorable_regime_upgrades_medium_to_high() {
        let e = engine();
        let (mut reg, intra) = bullish_snapshot(3);
        reg.permission = Permission::Favorable;
        let sig = e.evaluate(
            ts_at(10, 30),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &VolContext::unavailable(),
            false,
        );
        assert_eq!(sig.confidence, Confidence::High);
    }

    #[test]
    fn calm_volatility_demotes_medium() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(3);
        let vol = VolContext {
            atm_iv: Some(12.0),
            vix_level: Some(13.0),
            vix_rank: Some(0.1),
            vix_percentile: Some(0.1),
            source: VolSource::Live,
        };
        let sig = e.evaluate(ts_at(10, 30), &reg, &intra, &ChopScore::quiet(), &vol, false);
        assert_eq!(sig.confidence, Confidence::Low);
    }

    #[test]
    fn elevated_volatility_promotes_medium() {
        let e = engine();
        let (reg, intra) = bullish_snapshot(3);
        let vol = VolContext {
            atm_iv: Some(25.0),
            vix_level: Some(24.0),
            vix_rank: Some(0.9),
            vix_percentile: Some(0.9),
            source: VolSource::Live,
        };
        let sig = e.evaluate(ts_at(10, 30), &reg, &intra, &ChopScore::quiet(), &vol, false);
        assert_eq!(sig.confidence, Confidence::High);
    }

    #[test]
    fn strict_mode_requires_everything_at_once() {
        let e = engine();
        let (mut reg, intra) = bullish_snapshot(4);
        reg.permission = Permission::Favorable;
        let vol = VolContext {
            atm_iv: Some(18.0),
            vix_level: Some(22.0),
            vix_rank: Some(0.6),
            vix_percentile: Some(0.6),
            source: VolSource::Live,
        };
        let sig = e.evaluate(ts_at(10, 30), &reg, &intra, &ChopScore::quiet(), &vol, true);
        assert!(sig.tradeable);

        // Missing ATM IV alone demotes the signal to discretionary.
        let no_iv = VolContext {
            atm_iv: None,
            ..vol.clone()
        };
        let sig = e.evaluate(
            ts_at(10, 30),
            &reg,
            &intra,
            &ChopScore::quiet(),
            &no_iv,
            true,
        );
        assert_eq!(sig.direction, Direction::Call);
        assert_eq!(sig.confidence, Confidence::High);
        assert!(!sig.tradeable);
        assert!(sig
            .rationale
            .iter()
            .any(|r| r.contains("discretionary")));
    }

    #[test]
    fn strict_mode_rejects_small_moves() {
        let e = engine();
        let (mut reg, mut intra) = bullish_snapshot(4);
        reg.permission = Permission::Favorable;
        intra.return_5 = 0.4;
        let vol = VolContext {
            atm_iv: Some(18.0),
            vix_level: Some(22.0),
            vix_rank: Some(0.6),
            vix_percentile: Some(0.6),
            source: VolSource::Live,
        };
        let sig = e.evaluate(ts_at(10, 30), &reg, &intra, &ChopScore::quiet(), &vol, true);
        assert!(!sig.tradeable);
    }
}
