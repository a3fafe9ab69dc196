//! # Core Data Model
//!
//! Closed data types shared by the signal pipeline and the backtester:
//! OHLCV bars, the direction/confidence/permission enumerations, emitted
//! signals, completed trade records, and the failure taxonomy.
//!
//! Everything here is plain data: `Serialize`/`Deserialize` on every public
//! type so that fixtures, config files, and result artifacts round-trip
//! through JSON without adapter code.

pub mod bar;
pub mod error;
pub mod signal;
pub mod trade;

pub use bar::{is_strictly_ordered, Bar};
pub use error::Error;
pub use signal::{Confidence, Direction, MicroTrend, Permission, Signal, Trend};
pub use trade::{ExitReason, TradeRecord};
