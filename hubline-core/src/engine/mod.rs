//! Engine — the simulator and the end-to-end backtest entry point.

pub mod backtest;
pub mod diagnostics;
pub mod simulator;

pub use backtest::{run_backtest, BacktestConfig, BacktestError, RunResult};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use simulator::{PositionState, SimulationOutput, Simulator, SimulatorConfig};

use crate::domain::OrderSide;
use thiserror::Error;

/// Fatal simulation errors. Abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid {side:?} order size at bar {bar_index}: {quantity}")]
    InvalidOrderSize {
        bar_index: usize,
        side: OrderSide,
        quantity: f64,
    },
}
