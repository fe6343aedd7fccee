//! Hubline Core — single-asset, long-only, event-driven backtest engine.
//!
//! Data flows strictly forward:
//! bars → indicators → signals → orders → portfolio state → trade log.
//!
//! - Domain types (bars, orders, fills, positions, trades, snapshots)
//! - Indicator engine (SMA, Wilder RSI) with typed series handles
//! - Signal expressions (compare, threshold, formula, cross-only)
//! - Pluggable order sizing
//! - FLAT/LONG simulator with next-open fills and recoverable diagnostics

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;
pub mod sizers;
pub mod strategy;

pub use engine::{run_backtest, BacktestConfig, BacktestError, RunResult};
pub use strategy::{reference_strategy, EntryPolicy, ReferenceParams, Strategy};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: run inputs and outputs can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::PortfolioSnapshot>();
        require_sync::<domain::PortfolioSnapshot>();

        // Indicators and signals
        require_send::<indicators::IndicatorSet>();
        require_sync::<indicators::IndicatorSet>();
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
        require_send::<signals::SignalExpr>();
        require_sync::<signals::SignalExpr>();
        require_send::<signals::SignalSeries>();
        require_sync::<signals::SignalSeries>();

        // Strategy and engine
        require_send::<Strategy>();
        require_sync::<Strategy>();
        require_send::<RunResult>();
        require_sync::<RunResult>();
        require_send::<engine::Simulator<'static>>();
        require_sync::<engine::Simulator<'static>>();
        require_send::<engine::Diagnostic>();
        require_sync::<engine::Diagnostic>();
    }

    #[test]
    fn reference_strategy_runs_on_short_history() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<domain::Bar> = (0..50)
            .map(|i| {
                let px = 2.0 + (i as f64 * 0.3).sin();
                domain::Bar::new(date + chrono::Duration::days(i), px, px + 0.1, px - 0.1, px, 100)
            })
            .collect();
        let series = domain::BarSeries::new(bars).unwrap();
        let strategy = reference_strategy(&ReferenceParams::default()).unwrap();
        let result = run_backtest(
            &series,
            &strategy,
            &BacktestConfig::default(),
            &sizers::FixedAllocation::new(),
        )
        .unwrap();
        assert!(result.trades.is_empty());
        assert!(result.fills.is_empty());
        assert_eq!(result.snapshots.len(), 50);
    }
}
