//! Run results: trade log, equity curve, and summary metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zerodte_models::TradeRecord;

/// One point on the running equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub ts: DateTime<Utc>,
    pub equity: f64,
}

/// Aggregate performance metrics over a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub num_trades: usize,
    /// Fraction of trades with positive PnL.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_r_multiple: f64,
    /// Absolute value of the deepest peak-to-trough equity drawdown.
    pub max_drawdown: f64,
    /// Gross profit over gross loss.
    pub profit_factor: f64,
    pub total_commissions: f64,
    pub ending_equity: f64,
}

impl Summary {
    /// Compute metrics from the closed trades and the equity curve.
    pub fn compute(trades: &[TradeRecord], curve: &[EquityPoint], starting_equity: f64) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p <= 0.0).collect();

        let win_rate = if pnls.is_empty() {
            0.0
        } else {
            wins.len() as f64 / pnls.len() as f64
        };
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let avg_r_multiple = mean(&trades.iter().map(|t| t.r_multiple).collect::<Vec<_>>());

        let gross_win: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().map(|p| p.abs()).sum();
        let profit_factor = if gross_loss == 0.0 {
            if gross_win > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            gross_win / gross_loss
        };

        let mut peak = starting_equity;
        let mut max_drawdown = 0.0f64;
        let mut ending_equity = starting_equity;
        for point in curve {
            if point.equity > peak {
                peak = point.equity;
            }
            if peak > 0.0 {
                let dd = (peak - point.equity) / peak;
                if dd > max_drawdown {
                    max_drawdown = dd;
                }
            }
            ending_equity = point.equity;
        }

        Summary {
            num_trades: trades.len(),
            win_rate,
            total_pnl: pnls.iter().sum(),
            avg_win,
            avg_loss,
            avg_r_multiple,
            max_drawdown,
            profit_factor,
            total_commissions: trades.iter().map(|t| t.commissions).sum(),
            ending_equity,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Trades:            {}", self.num_trades)?;
        writeln!(f, "Win rate:          {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Total P/L:         {:+.2}", self.total_pnl)?;
        writeln!(f, "Avg win / loss:    {:+.2} / {:+.2}", self.avg_win, self.avg_loss)?;
        writeln!(f, "Avg R multiple:    {:+.2}", self.avg_r_multiple)?;
        writeln!(f, "Max drawdown:      {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Profit factor:     {:.2}", self.profit_factor)?;
        writeln!(f, "Commissions:       {:.2}", self.total_commissions)?;
        write!(f, "Ending equity:     {:.2}", self.ending_equity)
    }
}

/// Complete result of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: Summary,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zerodte_models::{Confidence, Direction, ExitReason, Permission};

    fn trade(pnl: f64) -> TradeRecord {
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 15, 0, 0).unwrap();
        TradeRecord {
            entry_time: ts,
            exit_time: ts,
            direction: Direction::Call,
            confidence: Confidence::High,
            permission: Permission::Favorable,
            entry_underlying: 100.0,
            exit_underlying: 101.0,
            entry_option_price: 1.0,
            exit_option_price: 1.0 + pnl / 100.0,
            strike: 100.0,
            contracts: 1,
            pnl,
            r_multiple: pnl / 40.0,
            exit_reason: if pnl > 0.0 {
                ExitReason::TakeProfit
            } else {
                ExitReason::StopLoss
            },
            commissions: 2.5,
            slippage: 0.5,
        }
    }

    fn curve(equities: &[f64]) -> Vec<EquityPoint> {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 45, 0).unwrap();
        equities
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                ts: start + chrono::Duration::minutes(5 * i as i64),
                equity,
            })
            .collect()
    }

    #[test]
    fn win_rate_and_profit_factor() {
        let trades = vec![trade(30.0), trade(-10.0), trade(20.0), trade(-15.0)];
        let summary = Summary::compute(&trades, &curve(&[10_000.0]), 10_000.0);
        assert!((summary.win_rate - 0.5).abs() < 1e-12);
        assert!((summary.profit_factor - 2.0).abs() < 1e-12);
        assert!((summary.total_pnl - 25.0).abs() < 1e-12);
        assert!((summary.avg_win - 25.0).abs() < 1e-12);
        assert!((summary.avg_loss - (-12.5)).abs() < 1e-12);
        assert!((summary.total_commissions - 10.0).abs() < 1e-12);
    }

    #[test]
    fn drawdown_tracks_the_peak() {
        let summary = Summary::compute(
            &[],
            &curve(&[10_000.0, 11_000.0, 10_450.0, 11_500.0, 10_350.0]),
            10_000.0,
        );
        assert!((summary.max_drawdown - (11_500.0 - 10_350.0) / 11_500.0).abs() < 1e-12);
        assert!((summary.ending_equity - 10_350.0).abs() < 1e-12);
    }

    #[test]
    fn no_losses_yields_infinite_profit_factor() {
        let summary = Summary::compute(&[trade(10.0)], &curve(&[10_010.0]), 10_000.0);
        assert!(summary.profit_factor.is_infinite());
    }

    #[test]
    fn empty_run_is_all_zeros() {
        let summary = Summary::compute(&[], &[], 10_000.0);
        assert_eq!(summary.num_trades, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        assert_eq!(summary.profit_factor, 0.0);
    }
}
