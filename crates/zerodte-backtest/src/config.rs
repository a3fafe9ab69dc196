//! Backtest run configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use zerodte_models::{Confidence, Error};
use zerodte_signals::SignalConfig;

/// Full configuration for one backtest run. Supplied externally, validated
/// up front, and never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub symbol: String,
    pub starting_equity: f64,
    /// Contracts per trade; each contract controls 100 units of the
    /// underlying.
    pub contracts: u32,
    pub contract_multiplier: f64,
    /// Take profit as a fraction of the entry premium.
    pub tp_pct: f64,
    /// Stop loss as a fraction of the entry premium.
    pub sl_pct: f64,
    /// Minutes after a stop-loss exit during which no new entry may open.
    pub cooldown_minutes: i64,
    /// Stop-loss exits in a row that trip the circuit breaker for the rest
    /// of the day.
    pub max_consecutive_losses: u32,
    pub commission_per_contract: f64,
    /// Proportional slippage applied against the trade on both fills.
    pub slippage_pct: f64,
    /// Entry is vetoed when the simulated spread fraction exceeds this.
    pub max_spread_pct: f64,
    /// Annualized risk-free rate for option pricing.
    pub risk_free_rate: f64,
    /// Pricing volatility when no VIX level is available for the day.
    pub default_entry_iv: f64,
    /// Strike grid of the underlying's option chain.
    pub strike_spacing: f64,
    /// First bar of the evaluated session.
    pub session_start: NaiveTime,
    /// No new entries at or after this time.
    pub entry_cutoff: NaiveTime,
    /// Open positions close at the first bar at or after this time.
    pub time_exit: NaiveTime,
    /// Bars after this time are ignored entirely.
    pub session_end: NaiveTime,
    /// Apply the strict options-mode signal filter.
    pub strict_signals: bool,
    /// Minimum signal confidence for an entry.
    pub min_confidence: Confidence,
    pub signals: SignalConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            starting_equity: 10_000.0,
            contracts: 1,
            contract_multiplier: 100.0,
            tp_pct: 0.80,
            sl_pct: 0.40,
            cooldown_minutes: 30,
            max_consecutive_losses: 2,
            commission_per_contract: 1.25,
            slippage_pct: 0.005,
            max_spread_pct: 0.12,
            risk_free_rate: 0.045,
            default_entry_iv: 0.20,
            strike_spacing: 1.0,
            session_start: NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            entry_cutoff: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            time_exit: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            session_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            strict_signals: true,
            min_confidence: Confidence::Medium,
            signals: SignalConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Load from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read config file {}: {}", path, e))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("could not parse config file {}: {}", path, e))?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with. A failure here
    /// aborts the run before any bar is simulated.
    pub fn validate(&self) -> Result<(), Error> {
        if self.starting_equity <= 0.0 {
            return Err(Error::config("starting_equity must be positive"));
        }
        if self.contracts == 0 {
            return Err(Error::config("contracts must be at least 1"));
        }
        if self.contract_multiplier <= 0.0 {
            return Err(Error::config("contract_multiplier must be positive"));
        }
        if self.tp_pct <= 0.0 {
            return Err(Error::config("tp_pct must be positive"));
        }
        if self.sl_pct <= 0.0 || self.sl_pct >= 1.0 {
            return Err(Error::config("sl_pct must be in (0, 1)"));
        }
        if self.cooldown_minutes < 0 {
            return Err(Error::config("cooldown_minutes must be non-negative"));
        }
        if self.max_consecutive_losses == 0 {
            return Err(Error::config("max_consecutive_losses must be at least 1"));
        }
        if self.commission_per_contract < 0.0 || self.slippage_pct < 0.0 {
            return Err(Error::config("costs must be non-negative"));
        }
        if self.slippage_pct >= 1.0 {
            return Err(Error::config("slippage_pct must be below 1"));
        }
        if self.max_spread_pct <= 0.0 {
            return Err(Error::config("max_spread_pct must be positive"));
        }
        if self.default_entry_iv <= 0.0 {
            return Err(Error::config("default_entry_iv must be positive"));
        }
        if self.strike_spacing <= 0.0 {
            return Err(Error::config("strike_spacing must be positive"));
        }
        if !(self.session_start < self.entry_cutoff
            && self.entry_cutoff <= self.time_exit
            && self.time_exit <= self.session_end)
        {
            return Err(Error::config(
                "session times must satisfy start < entry_cutoff <= time_exit <= session_end",
            ));
        }
        if self.min_confidence == Confidence::None {
            return Err(Error::config("min_confidence must be at least LOW"));
        }
        self.signals.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_tp_is_rejected() {
        let cfg = BacktestConfig {
            tp_pct: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("tp_pct"));
    }

    #[test]
    fn inverted_session_times_rejected() {
        let cfg = BacktestConfig {
            time_exit: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backtest.toml");
        std::fs::write(
            &path,
            r#"
symbol = "QQQ"
tp_pct = 0.5
strict_signals = false

[signals.regime]
vix_floor = 14.0
"#,
        )
        .unwrap();

        let cfg = BacktestConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.symbol, "QQQ");
        assert!((cfg.tp_pct - 0.5).abs() < 1e-12);
        assert!(!cfg.strict_signals);
        assert!((cfg.signals.regime.vix_floor - 14.0).abs() < 1e-12);
        // Untouched keys keep their defaults.
        assert!((cfg.sl_pct - 0.40).abs() < 1e-12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(BacktestConfig::load("/nonexistent/backtest.toml").is_err());
    }
}
