//! Backtest runner.
//!
//! Loads a TOML configuration plus JSONL bar fixtures, replays the signal
//! pipeline, and prints the aggregate results. Optionally writes the
//! report and trade log as JSON artifacts.

use anyhow::{Context, Result};
use clap::Parser;

use zerodte_backtest::data::{load_bars_jsonl, load_vix_jsonl, vol_contexts};
use zerodte_backtest::{BacktestConfig, BacktestEngine};

#[derive(Parser)]
#[command(name = "run-backtest")]
#[command(about = "Replay the signal pipeline over historical bars and simulate option trades")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<String>,

    /// Daily bars, JSONL.
    #[arg(long)]
    daily: String,

    /// Intraday bars, JSONL.
    #[arg(long)]
    intraday: String,

    /// Daily VIX closes, JSONL (optional).
    #[arg(long)]
    vix: Option<String>,

    /// Trailing days for VIX rank/percentile.
    #[arg(long, default_value = "252")]
    vix_lookback: usize,

    /// Directory to write report.json and trades.json into (optional).
    #[arg(long)]
    out: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BacktestConfig::load(path)?,
        None => BacktestConfig::default(),
    };
    let engine = BacktestEngine::new(config.clone()).context("invalid configuration")?;

    let daily = load_bars_jsonl(&args.daily)?;
    let intraday = load_bars_jsonl(&args.intraday)?;
    let vol_by_day = match &args.vix {
        Some(path) => vol_contexts(&load_vix_jsonl(path)?, args.vix_lookback),
        None => Default::default(),
    };

    println!("=== {} backtest ===", config.symbol);
    println!("Daily bars:    {}", daily.len());
    println!("Intraday bars: {}", intraday.len());
    println!("VIX days:      {}", vol_by_day.len());
    println!();

    let report = engine.run(&daily, &intraday, &vol_by_day)?;

    println!("=== RESULTS ===");
    println!("{}", report.summary);
    println!();
    for trade in &report.trades {
        println!(
            "{} -> {}  {:<4} strike {:>8.2}  {:>4}  P/L {:+9.2}  R {:+5.2}",
            trade.entry_time.format("%Y-%m-%d %H:%M"),
            trade.exit_time.format("%H:%M"),
            trade.direction.to_string(),
            trade.strike,
            trade.exit_reason.to_string(),
            trade.pnl,
            trade.r_multiple,
        );
    }

    if let Some(out) = &args.out {
        std::fs::create_dir_all(out).with_context(|| format!("create output dir {}", out))?;
        std::fs::write(
            format!("{}/report.json", out),
            serde_json::to_string_pretty(&report)?,
        )?;
        std::fs::write(
            format!("{}/trades.json", out),
            serde_json::to_string_pretty(&report.trades)?,
        )?;
        println!("\nResults written to {}/", out);
    }

    Ok(())
}
