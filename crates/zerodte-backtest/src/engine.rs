//! Sequential trade simulator.
//!
//! Walks intraday bars strictly in timestamp order, one trading day at a
//! time. Per day the state machine is
//! `IDLE -> ENTERED -> {TP | SL | TIME | EOD} -> IDLE`, with a cooldown
//! after stop-loss exits and a consecutive-loss circuit breaker that halts
//! new entries for the rest of the day.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};
use zerodte_models::{Bar, Confidence, Direction, Error, ExitReason, Permission, TradeRecord};
use zerodte_options::{atm_strike, black_scholes, time_to_expiry_0dte, OptionKind};
use zerodte_signals::{
    ChopDetector, EmaSeed, IntradayEngine, RegimeEngine, RegimeSnapshot, SessionStats,
    SignalEngine, VolContext,
};

use crate::config::BacktestConfig;
use crate::costs::CostModel;
use crate::report::{BacktestReport, EquityPoint, Summary};

/// An open simulated position. At most one exists at any simulated instant;
/// there is no pyramiding.
#[derive(Debug, Clone)]
struct Position {
    direction: Direction,
    kind: OptionKind,
    entry_time: DateTime<Utc>,
    entry_underlying: f64,
    /// Premium paid per unit, spread and slippage included.
    entry_price: f64,
    /// Per-unit price impact of the entry fill versus the quoted offer.
    entry_slippage: f64,
    strike: f64,
    contracts: u32,
    /// Pricing volatility fixed at entry.
    sigma: f64,
    /// Premium level that triggers the stop loss.
    stop_price: f64,
    /// Premium level that triggers the take profit.
    target_price: f64,
    confidence: Confidence,
    permission: Permission,
}

/// Mutable state scoped to one run.
struct RunState {
    equity: f64,
    position: Option<Position>,
    cooldown_until: Option<DateTime<Utc>>,
    consecutive_losses_today: u32,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
}

/// Deterministic backtest engine. Stateless across runs; all inputs are
/// resident in memory before a run starts.
pub struct BacktestEngine {
    config: BacktestConfig,
    costs: CostModel,
    regime: RegimeEngine,
    intraday: IntradayEngine,
    chop: ChopDetector,
    signals: SignalEngine,
}

impl BacktestEngine {
    /// Build the engine, validating the configuration. A configuration
    /// error fails here, before any simulation starts.
    pub fn new(config: BacktestConfig) -> Result<Self, Error> {
        config.validate()?;
        let costs = CostModel {
            commission_per_contract: config.commission_per_contract,
            slippage_pct: config.slippage_pct,
            max_spread_pct: config.max_spread_pct,
        };
        let regime = RegimeEngine::new(config.signals.regime.clone());
        let intraday = IntradayEngine::new(config.signals.intraday.clone());
        let chop = ChopDetector::new(config.signals.chop.clone());
        let signals = SignalEngine::new(config.signals.clone());
        Ok(Self {
            config,
            costs,
            regime,
            intraday,
            chop,
            signals,
        })
    }

    /// Replay the signal pipeline over the bar history and simulate trades.
    ///
    /// `daily` is the completed daily series, `intraday` the bar history to
    /// simulate (any span; grouped by calendar day internally), and
    /// `vol_by_day` an optional per-day volatility context. Days missing
    /// from the intraday series produce no signals; a day whose regime
    /// cannot be computed is skipped with a warning.
    pub fn run(
        &self,
        daily: &[Bar],
        intraday: &[Bar],
        vol_by_day: &BTreeMap<NaiveDate, VolContext>,
    ) -> Result<BacktestReport, Error> {
        let cfg = &self.config;

        let mut days: BTreeMap<NaiveDate, Vec<Bar>> = BTreeMap::new();
        for bar in intraday {
            let t = bar.ts.time();
            if t < cfg.session_start || t > cfg.session_end {
                continue;
            }
            days.entry(bar.ts.date_naive()).or_default().push(*bar);
        }

        let mut state = RunState {
            equity: cfg.starting_equity,
            position: None,
            cooldown_until: None,
            consecutive_losses_today: 0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        };
        let mut prev_seed: Option<EmaSeed> = None;

        for (&day, sess) in &days {
            state.consecutive_losses_today = 0;

            let hist_end = daily.partition_point(|b| b.ts.date_naive() < day);
            let daily_hist = &daily[..hist_end];
            let yesterday_close = daily_hist.last().map(|b| b.close).unwrap_or(sess[0].open);

            let stats = match daily.get(hist_end).filter(|b| b.ts.date_naive() == day) {
                Some(today_daily) => SessionStats {
                    yesterday_close,
                    open: today_daily.open,
                    high: today_daily.high,
                    low: today_daily.low,
                },
                None => match SessionStats::from_bars(yesterday_close, sess) {
                    Some(s) => s,
                    None => continue,
                },
            };

            let vol = vol_by_day
                .get(&day)
                .cloned()
                .unwrap_or_else(VolContext::unavailable);

            let regime = match self.regime.analyze(daily_hist, &stats, vol.vix_level) {
                Ok(r) => r,
                Err(e) => {
                    warn!(%day, error = %e, "skipping day");
                    continue;
                }
            };

            let entry_sigma = vol
                .vix_level
                .map(|v| v / 100.0)
                .unwrap_or(cfg.default_entry_iv);

            self.run_day(&mut state, sess, &regime, &vol, entry_sigma, prev_seed);

            if let Ok(view) = self.intraday.analyze(sess, prev_seed) {
                if let (Some(&fast), Some(&slow)) =
                    (view.ema_fast.last(), view.ema_slow.last())
                {
                    prev_seed = Some(EmaSeed { fast, slow });
                }
            }
        }

        let summary = Summary::compute(&state.trades, &state.equity_curve, cfg.starting_equity);
        Ok(BacktestReport {
            trades: state.trades,
            equity_curve: state.equity_curve,
            summary,
        })
    }

    /// Simulate one session.
    fn run_day(
        &self,
        state: &mut RunState,
        sess: &[Bar],
        regime: &RegimeSnapshot,
        vol: &VolContext,
        entry_sigma: f64,
        prev_seed: Option<EmaSeed>,
    ) {
        let cfg = &self.config;

        for (i, bar) in sess.iter().enumerate() {
            let t = bar.ts.time();
            let last_bar = i + 1 == sess.len();

            // Exit checks run first so a position never survives past its
            // trigger bar. Exactly one reason fires, in priority order.
            let mut exit: Option<(f64, ExitReason)> = None;
            if let Some(pos) = &state.position {
                let tte = time_to_expiry_0dte(t);
                let theo = black_scholes(
                    bar.close,
                    pos.strike,
                    tte,
                    cfg.risk_free_rate,
                    pos.sigma,
                    pos.kind,
                );
                let reason = if theo >= pos.target_price {
                    Some(ExitReason::TakeProfit)
                } else if theo <= pos.stop_price {
                    Some(ExitReason::StopLoss)
                } else if t >= cfg.time_exit {
                    Some(ExitReason::Time)
                } else if last_bar {
                    Some(ExitReason::EndOfDay)
                } else {
                    None
                };
                if let Some(r) = reason {
                    exit = Some((theo, r));
                }
            }
            if let Some((theo, reason)) = exit {
                if let Some(pos) = state.position.take() {
                    self.close_trade(state, pos, bar, theo, reason);
                }
            }

            if state.position.is_none() && t < cfg.entry_cutoff {
                self.consider_entry(state, &sess[..=i], bar, regime, vol, entry_sigma, prev_seed);
            }

            state.equity_curve.push(EquityPoint {
                ts: bar.ts,
                equity: state.equity,
            });
        }

        // A position opened on the day's final bar has seen no exit check;
        // liquidate it there rather than carry it overnight.
        if let Some(pos) = state.position.take() {
            if let Some(bar) = sess.last() {
                let tte = time_to_expiry_0dte(bar.ts.time());
                let theo = black_scholes(
                    bar.close,
                    pos.strike,
                    tte,
                    cfg.risk_free_rate,
                    pos.sigma,
                    pos.kind,
                );
                self.close_trade(state, pos, bar, theo, ExitReason::EndOfDay);
                if let Some(point) = state.equity_curve.last_mut() {
                    point.equity = state.equity;
                }
            }
        }
    }

    /// Evaluate the signal for this bar and open a position when every gate
    /// passes.
    #[allow(clippy::too_many_arguments)]
    fn consider_entry(
        &self,
        state: &mut RunState,
        session_so_far: &[Bar],
        bar: &Bar,
        regime: &RegimeSnapshot,
        vol: &VolContext,
        entry_sigma: f64,
        prev_seed: Option<EmaSeed>,
    ) {
        let cfg = &self.config;

        let view = match self.intraday.analyze(session_so_far, prev_seed) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "no intraday view for bar");
                return;
            }
        };
        let chop = self
            .chop
            .score(session_so_far, &view.vwap, &view.ema_fast, &view.ema_slow);
        let signal = self.signals.evaluate(
            bar.ts,
            regime,
            &view.snapshot,
            &chop,
            vol,
            cfg.strict_signals,
        );

        if !signal.tradeable || signal.confidence < cfg.min_confidence {
            return;
        }
        if state.consecutive_losses_today >= cfg.max_consecutive_losses {
            debug!(ts = %bar.ts, "circuit breaker active, entry suppressed");
            return;
        }
        if let Some(until) = state.cooldown_until {
            if bar.ts < until {
                debug!(ts = %bar.ts, %until, "cooldown active, entry suppressed");
                return;
            }
        }

        let kind = match OptionKind::from_direction(signal.direction) {
            Some(k) => k,
            None => return,
        };
        let tte = time_to_expiry_0dte(bar.ts.time());
        if tte <= 0.0 {
            return;
        }
        let strike = atm_strike(bar.close, kind, cfg.strike_spacing);
        let theo = black_scholes(bar.close, strike, tte, cfg.risk_free_rate, entry_sigma, kind);
        if theo <= 0.0 {
            debug!(ts = %bar.ts, "worthless theoretical premium, entry skipped");
            return;
        }

        // The spread filter fires before any position exists, so a veto
        // creates no trade and charges no cost.
        let quote = self.costs.quote(theo);
        if !self.costs.spread_ok(&quote) {
            debug!(
                ts = %bar.ts,
                spread = quote.spread_frac(),
                "spread above ceiling, entry vetoed"
            );
            return;
        }

        let entry_price = self.costs.buy_fill(&quote);
        state.position = Some(Position {
            direction: signal.direction,
            kind,
            entry_time: bar.ts,
            entry_underlying: bar.close,
            entry_price,
            entry_slippage: entry_price - quote.ask,
            strike,
            contracts: cfg.contracts,
            sigma: entry_sigma,
            stop_price: entry_price * (1.0 - cfg.sl_pct),
            target_price: entry_price * (1.0 + cfg.tp_pct),
            confidence: signal.confidence,
            permission: signal.permission,
        });
        debug!(
            ts = %bar.ts,
            direction = %signal.direction,
            strike,
            premium = entry_price,
            "entered position"
        );
    }

    /// Close `pos` at this bar's theoretical premium, book the trade, and
    /// update cooldown and loss-streak state.
    fn close_trade(
        &self,
        state: &mut RunState,
        pos: Position,
        bar: &Bar,
        theoretical: f64,
        reason: ExitReason,
    ) {
        let cfg = &self.config;
        let units = cfg.contract_multiplier * pos.contracts as f64;

        let exit_price = self.costs.sell_fill(theoretical);
        let commissions = 2.0 * self.costs.commission(pos.contracts);
        let slippage = (pos.entry_slippage + (theoretical - exit_price)) * units;
        let pnl = (exit_price - pos.entry_price) * units - commissions;
        let risk = (pos.entry_price * cfg.sl_pct * units).max(1e-9);
        let r_multiple = pnl / risk;

        state.equity += pnl;
        match reason {
            ExitReason::StopLoss => {
                state.consecutive_losses_today += 1;
                state.cooldown_until = Some(bar.ts + Duration::minutes(cfg.cooldown_minutes));
            }
            ExitReason::TakeProfit => state.consecutive_losses_today = 0,
            ExitReason::Time | ExitReason::EndOfDay => {}
        }

        debug!(
            entry = %pos.entry_time,
            exit = %bar.ts,
            reason = %reason,
            pnl,
            "closed position"
        );
        state.trades.push(TradeRecord {
            entry_time: pos.entry_time,
            exit_time: bar.ts,
            direction: pos.direction,
            confidence: pos.confidence,
            permission: pos.permission,
            entry_underlying: pos.entry_underlying,
            exit_underlying: bar.close,
            entry_option_price: pos.entry_price,
            exit_option_price: exit_price,
            strike: pos.strike,
            contracts: pos.contracts,
            pnl,
            r_multiple,
            exit_reason: reason,
            commissions,
            slippage,
        });
    }
}
