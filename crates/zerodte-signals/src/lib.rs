//! # Intraday Signal Pipeline
//!
//! Classifies intraday market state into a directional trade signal with a
//! confidence grade. Leaves first:
//!
//! - [`regime`]: daily-timeframe trend/gap/range classification and the
//!   0DTE permission decision tree
//! - [`intraday`]: session VWAP, EMAs, returns, realized volatility
//! - [`chop`]: choppiness scoring from VWAP crosses, EMA flatness, and ATR
//! - [`time_filter`]: wall-clock trade gate and confidence multipliers
//! - [`vol_context`]: optional ATM IV / VIX context with proxy fallback
//! - [`engine`]: combines the above into the final signal, applying the
//!   adjustment ladder and the strict options-mode filter
//!
//! Data flows one way through the modules above; nothing here holds state
//! across bars beyond what the caller passes back in.

pub mod chop;
pub mod config;
pub mod engine;
pub mod intraday;
pub mod regime;
pub mod time_filter;
pub mod vol_context;

pub use chop::{ChopDetector, ChopScore};
pub use config::{
    ChopConfig, IntradayConfig, RegimeConfig, SignalConfig, StrictModeConfig, TimeFilterConfig,
    VolAdjustConfig,
};
pub use engine::SignalEngine;
pub use intraday::{EmaSeed, IntradayEngine, IntradaySnapshot, IntradayView};
pub use regime::{RangeClass, RegimeEngine, RegimeSnapshot, SessionStats};
pub use time_filter::{TimeFilter, TimeWindow};
pub use vol_context::{VolContext, VolSource};
