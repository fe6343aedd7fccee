//! Hubline Runner — backtest orchestration and reporting.
//!
//! This crate builds on `hubline-core` to provide:
//! - TOML run configuration with validation and content-addressed run IDs
//! - Single-backtest runner producing a serializable `BacktestResult`
//! - Trade statistics and equity metrics
//! - Tracing subscriber setup

pub mod config;
pub mod logging;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, RunConfig, RunId};
pub use logging::{init_tracing, LogError, LogFormat};
pub use metrics::TradeStats;
pub use runner::{
    run_from_bars, run_from_config, run_with_strategy, BacktestResult, RunError, SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn trade_stats_is_send_sync() {
        assert_send::<TradeStats>();
        assert_sync::<TradeStats>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn run_config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }
}
