//! Optional implied-volatility and VIX context.
//!
//! The volatility collaborator may fail partially or completely; this type
//! makes every field independently optional so downstream logic proceeds
//! without the missing adjustment instead of failing.

use serde::{Deserialize, Serialize};

/// Where the context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolSource {
    /// VIX history (and possibly a live ATM IV) was available.
    Live,
    /// No VIX data; the ATM IV stands in for the level.
    Proxy,
    /// Nothing could be obtained.
    Unavailable,
}

/// Volatility context for one trading day.
///
/// `atm_iv` is in percent, `vix_level` in index points, rank and percentile
/// in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolContext {
    pub atm_iv: Option<f64>,
    pub vix_level: Option<f64>,
    pub vix_rank: Option<f64>,
    pub vix_percentile: Option<f64>,
    pub source: VolSource,
}

impl VolContext {
    /// Context with nothing in it. Consumers skip every volatility
    /// adjustment.
    pub fn unavailable() -> Self {
        Self {
            atm_iv: None,
            vix_level: None,
            vix_rank: None,
            vix_percentile: None,
            source: VolSource::Unavailable,
        }
    }

    /// Build from a VIX close history, most recent last. Non-positive
    /// closes are discarded. The last valid close becomes the level;
    /// rank is `(level - min) / (max - min)` over the history and
    /// percentile the fraction of closes at or below the level.
    ///
    /// With no usable history but a positive ATM IV, the IV proxies the
    /// level with rank and percentile pinned to the middle of the range.
    pub fn from_vix_history(closes: &[f64], atm_iv: Option<f64>) -> Self {
        let valid: Vec<f64> = closes.iter().copied().filter(|&c| c > 0.0).collect();

        if let Some(&level) = valid.last() {
            let min = valid.iter().copied().fold(f64::MAX, f64::min);
            let max = valid.iter().copied().fold(f64::MIN, f64::max);
            let rank = if max > min {
                Some((level - min) / (max - min))
            } else {
                None
            };
            let percentile =
                valid.iter().filter(|&&c| c <= level).count() as f64 / valid.len() as f64;
            return Self {
                atm_iv,
                vix_level: Some(level),
                vix_rank: rank,
                vix_percentile: Some(percentile),
                source: VolSource::Live,
            };
        }

        match atm_iv {
            Some(iv) if iv > 0.0 => Self {
                atm_iv: Some(iv),
                vix_level: Some(iv),
                vix_rank: Some(0.5),
                vix_percentile: Some(0.5),
                source: VolSource::Proxy,
            },
            _ => Self::unavailable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_rank_and_percentile() {
        let ctx = VolContext::from_vix_history(&[10.0, 30.0, 20.0], None);
        assert_eq!(ctx.source, VolSource::Live);
        assert_eq!(ctx.vix_level, Some(20.0));
        assert!((ctx.vix_rank.unwrap() - 0.5).abs() < 1e-12);
        assert!((ctx.vix_percentile.unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_closes_are_discarded() {
        let ctx = VolContext::from_vix_history(&[0.0, -1.0, 18.0], None);
        assert_eq!(ctx.vix_level, Some(18.0));
        // A single valid close has no spread to rank against.
        assert_eq!(ctx.vix_rank, None);
    }

    #[test]
    fn atm_iv_proxies_a_missing_vix() {
        let ctx = VolContext::from_vix_history(&[], Some(22.0));
        assert_eq!(ctx.source, VolSource::Proxy);
        assert_eq!(ctx.vix_level, Some(22.0));
        assert_eq!(ctx.vix_rank, Some(0.5));
    }

    #[test]
    fn nothing_yields_unavailable() {
        let ctx = VolContext::from_vix_history(&[], None);
        assert_eq!(ctx.source, VolSource::Unavailable);
        assert_eq!(ctx.vix_level, None);
        assert_eq!(ctx, VolContext::unavailable());
    }
}
