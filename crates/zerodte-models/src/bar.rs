//! OHLCV bar primitives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped OHLCV sample at a fixed interval (daily or intraday).
///
/// Bars are immutable once fetched. A series is expected to be ordered by
/// timestamp and unique per timestamp; a missing session in a series is
/// treated as "no signal" by consumers, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Typical price (H + L + C) / 3, the VWAP numerator component.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// True if the series is strictly increasing in timestamp (ordered, no
/// duplicates).
pub fn is_strictly_ordered(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].ts < w[1].ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(secs: i64) -> Bar {
        Bar {
            ts: Utc.timestamp_opt(secs, 0).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1_000.0,
        }
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        let b = bar(0);
        assert!((b.typical_price() - (101.0 + 99.0 + 100.5) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn ordering_check_rejects_duplicates() {
        assert!(is_strictly_ordered(&[bar(0), bar(60), bar(120)]));
        assert!(!is_strictly_ordered(&[bar(0), bar(60), bar(60)]));
        assert!(!is_strictly_ordered(&[bar(60), bar(0)]));
    }
}
