//! Run a strategy over a bar series.
//!
//! Setup (range slice, indicators, signals) happens once up front; every
//! setup failure is fatal and reported before the first bar is simulated.

use super::diagnostics::Diagnostic;
use super::simulator::{Simulator, SimulatorConfig};
use super::EngineError;
use crate::domain::{BarError, BarSeries, Fill, PortfolioSnapshot, Position, Trade};
use crate::indicators::IndicatorError;
use crate::signals::{SignalError, SignalSeries};
use crate::sizers::Sizer;
use crate::strategy::Strategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info_span;

/// Any failure that stops a backtest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Bars(#[from] BarError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Run-level settings that are not part of the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_equity: f64,
    /// Currency handed to the sizer per entry.
    pub allocation: f64,
    /// Inclusive date range; `None` leaves that side open.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl BacktestConfig {
    pub fn new(initial_equity: f64, allocation: f64) -> Self {
        Self {
            initial_equity,
            allocation,
            start: None,
            end: None,
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::new(100_000.0, 10_000.0)
    }
}

/// Output of a single backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub snapshots: Vec<PortfolioSnapshot>,
    pub diagnostics: Vec<Diagnostic>,
    /// Entry signal series followed by exit signal series.
    pub signals: Vec<SignalSeries>,
    pub warmup_bars: usize,
    pub bar_count: usize,
    pub initial_equity: f64,
    pub final_cash: f64,
    pub final_position: Position,
}

impl RunResult {
    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn final_equity(&self) -> f64 {
        self.snapshots
            .last()
            .map(|s| s.equity)
            .unwrap_or(self.initial_equity)
    }

    pub fn equity_curve(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.equity).collect()
    }
}

/// Run `strategy` over `bars` with `sizer` resolving entry quantities.
pub fn run_backtest(
    bars: &BarSeries,
    strategy: &Strategy,
    config: &BacktestConfig,
    sizer: &dyn Sizer,
) -> Result<RunResult, BacktestError> {
    let _span = info_span!(
        "backtest",
        strategy = strategy.name(),
        sizer = sizer.name(),
        bars = bars.len()
    )
    .entered();

    let bars = bars.between(config.start, config.end);
    let signals = strategy.evaluate(bars.bars())?;
    let warmup_bars = strategy.warmup();
    if warmup_bars >= bars.len() {
        tracing::warn!(
            warmup = warmup_bars,
            bars = bars.len(),
            "series shorter than indicator warmup; no rule can fire"
        );
    }

    let sim_config = SimulatorConfig::new(config.initial_equity, config.allocation)
        .with_entry_policy(strategy.entry_policy());
    let mut sim = Simulator::new(sim_config, sizer);

    let n = bars.len();
    for (i, bar) in bars.iter().enumerate() {
        sim.on_bar(i, bar, signals.entry_at(i), signals.exit_at(i), i + 1 < n)?;
    }
    let out = sim.finish();

    tracing::info!(
        trades = out.trades.len(),
        fills = out.fills.len(),
        diagnostics = out.diagnostics.len(),
        final_cash = out.final_cash,
        "backtest complete"
    );

    let mut series = signals.entries;
    series.extend(signals.exits);

    Ok(RunResult {
        trades: out.trades,
        fills: out.fills,
        snapshots: out.snapshots,
        diagnostics: out.diagnostics,
        signals: series,
        warmup_bars,
        bar_count: n,
        initial_equity: config.initial_equity,
        final_cash: out.final_cash,
        final_position: out.final_position,
    })
}
