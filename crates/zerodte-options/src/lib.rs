//! # Option Pricing
//!
//! Closed-form European option pricing for same-day (0DTE) contracts:
//! Black-Scholes premium with intrinsic-value fallbacks for degenerate
//! inputs, ATM strike selection, and the session expiry clock.
//!
//! The same pricing function serves entry and exit so that premium changes
//! are attributable solely to underlying price, time, and volatility.

pub mod contract;
pub mod pricing;

pub use contract::{atm_strike, time_to_expiry_0dte, OptionKind};
pub use pricing::{black_scholes, intrinsic};
