//! Black-Scholes premium with intrinsic-value fallbacks.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::contract::OptionKind;

/// Standard normal CDF.
fn norm_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).unwrap().cdf(x)
}

/// Intrinsic value of the contract.
pub fn intrinsic(spot: f64, strike: f64, kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}

/// Theoretical premium of a European option.
///
/// Degenerate inputs (non-positive time to expiry, volatility, spot, or
/// strike) fall back to intrinsic value rather than producing NaN, and the
/// result is floored at zero.
pub fn black_scholes(
    spot: f64,
    strike: f64,
    t_years: f64,
    rate: f64,
    sigma: f64,
    kind: OptionKind,
) -> f64 {
    if t_years <= 0.0 || sigma <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return intrinsic(spot, strike, kind);
    }

    let sqrt_t = t_years.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * t_years) / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;
    let discount = (-rate * t_years).exp();

    let price = match kind {
        OptionKind::Call => spot * norm_cdf(d1) - strike * discount * norm_cdf(d2),
        OptionKind::Put => strike * discount * norm_cdf(-d2) - spot * norm_cdf(-d1),
    };
    price.max(0.0)
}
