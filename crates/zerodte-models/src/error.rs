//! Failure taxonomy for the signal pipeline and backtester.

use thiserror::Error;

/// Core error type.
///
/// Only [`Error::Configuration`] is fatal: it aborts a run before any bar is
/// simulated, leaving no partial trade log. The remaining variants are
/// recoverable and are converted to neutral values at the component
/// boundary where they arise, so one bad bar never aborts a backtest.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or insufficient bars for a computation. Recoverable: the
    /// caller emits a flat signal or skips the bar/day.
    #[error("data gap in {context}: have {have} bars, need {need}")]
    DataGap {
        context: &'static str,
        have: usize,
        need: usize,
    },

    /// No implied-volatility or VIX context could be obtained. Recoverable:
    /// downstream logic proceeds without the volatility adjustment.
    #[error("volatility context unavailable")]
    VolatilityUnavailable,

    /// A computation hit a zero denominator or a non-positive time or
    /// volatility input. Recoverable: the computation yields its documented
    /// neutral or intrinsic-value fallback instead.
    #[error("degenerate input: {0}")]
    DegenerateMath(&'static str),

    /// Missing or invalid required configuration. Fatal.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Shorthand for a configuration failure.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
