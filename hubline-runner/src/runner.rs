//! Backtest runner — wires together config, strategy, engine, and metrics.
//!
//! Two entry points:
//! - `run_from_config()`: reference strategy and fixed-allocation sizer from a `RunConfig`.
//! - `run_with_strategy()`: caller-supplied strategy and sizer, config for capital and range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubline_core::domain::{Bar, BarSeries, Fill, PortfolioSnapshot, Trade};
use hubline_core::engine::Diagnostic;
use hubline_core::sizers::Sizer;
use hubline_core::{reference_strategy, run_backtest, BacktestError, Strategy};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::metrics::TradeStats;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub config: RunConfig,
    pub stats: TradeStats,
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<PortfolioSnapshot>,
    pub diagnostics: Vec<Diagnostic>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Validate raw bars, then run the configured reference strategy.
pub fn run_from_bars(bars: Vec<Bar>, config: &RunConfig) -> Result<BacktestResult, RunError> {
    let series = BarSeries::new(bars).map_err(BacktestError::from)?;
    run_from_config(&series, config)
}

/// Run the reference strategy with the config's parameters and sizer.
pub fn run_from_config(bars: &BarSeries, config: &RunConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let strategy = reference_strategy(&config.reference_params()).map_err(BacktestError::from)?;
    run_with_strategy(bars, &strategy, &config.sizer(), config)
}

/// Run an arbitrary strategy; `config` supplies capital, date range and allocation.
pub fn run_with_strategy(
    bars: &BarSeries,
    strategy: &Strategy,
    sizer: &dyn Sizer,
    config: &RunConfig,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id()?;
    let backtest_config = config.backtest_config();
    let result = run_backtest(bars, strategy, &backtest_config, sizer)?;

    let stats = TradeStats::compute(
        &result.trades,
        &result.fills,
        &result.snapshots,
        result.initial_equity,
    );
    tracing::info!(
        run_id = %run_id,
        round_trips = stats.round_trips,
        net_pnl = stats.net_pnl,
        sharpe = stats.annualized_sharpe,
        "run summarized"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: strategy.name().to_string(),
        config: config.clone(),
        stats,
        start_date: result.snapshots.first().map(|s| s.date),
        end_date: result.snapshots.last().map(|s| s.date),
        bar_count: result.bar_count,
        warmup_bars: result.warmup_bars,
        trades: result.trades,
        fills: result.fills,
        equity_curve: result.snapshots,
        diagnostics: result.diagnostics,
    })
}
