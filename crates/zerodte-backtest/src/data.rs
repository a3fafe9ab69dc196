//! Fixture loading: JSONL bar files and daily VIX closes.
//!
//! The data-fetch collaborator delivers ordered bar series; these loaders
//! only parse and sanity-check ordering. Gaps in the series are tolerated
//! downstream.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use zerodte_models::{is_strictly_ordered, Bar};
use zerodte_signals::VolContext;

/// One daily VIX close.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VixDay {
    pub date: NaiveDate,
    pub close: f64,
}

/// Load a JSONL file of [`Bar`] records, one JSON object per line. Blank
/// lines are skipped.
pub fn load_bars_jsonl(path: &str) -> Result<Vec<Bar>> {
    let file = std::fs::File::open(path).with_context(|| format!("open bars file {}", path))?;
    let reader = BufReader::new(file);

    let mut bars = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let bar: Bar = serde_json::from_str(&line)
            .with_context(|| format!("parse bar at {}:{}", path, i + 1))?;
        bars.push(bar);
    }

    if !is_strictly_ordered(&bars) {
        anyhow::bail!("bars in {} are not strictly ordered by timestamp", path);
    }
    Ok(bars)
}

/// Load a JSONL file of [`VixDay`] records.
pub fn load_vix_jsonl(path: &str) -> Result<Vec<VixDay>> {
    let file = std::fs::File::open(path).with_context(|| format!("open VIX file {}", path))?;
    let reader = BufReader::new(file);

    let mut days = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let day: VixDay = serde_json::from_str(&line)
            .with_context(|| format!("parse VIX close at {}:{}", path, i + 1))?;
        days.push(day);
    }
    Ok(days)
}

/// Build per-day volatility contexts from a VIX close history.
///
/// Each day's context uses the trailing `lookback` closes through that day.
/// Historical runs have no live option chain, so the VIX level stands in
/// for the ATM IV.
pub fn vol_contexts(vix: &[VixDay], lookback: usize) -> BTreeMap<NaiveDate, VolContext> {
    let mut sorted: Vec<VixDay> = vix.to_vec();
    sorted.sort_by_key(|d| d.date);

    let mut out = BTreeMap::new();
    for (i, day) in sorted.iter().enumerate() {
        let start = (i + 1).saturating_sub(lookback);
        let closes: Vec<f64> = sorted[start..=i].iter().map(|d| d.close).collect();
        let mut ctx = VolContext::from_vix_history(&closes, None);
        if ctx.atm_iv.is_none() {
            ctx.atm_iv = ctx.vix_level;
        }
        out.insert(day.date, ctx);
    }
    out
}
