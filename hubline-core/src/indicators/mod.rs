//! Indicator engine.
//!
//! Indicators are pure functions: bar history in, aligned numeric series
//! out. They are computed once before the bar loop through an
//! [`IndicatorSet`], which hands out typed [`SeriesHandle`]s used by the
//! signal expressions. Undefined (warmup) entries are `None`.

pub mod rsi;
pub mod set;
pub mod sma;

pub use rsi::{rsi, Rsi};
pub use set::{IndicatorFrame, IndicatorSet, SeriesHandle};
pub use sma::{sma, Sma};

use crate::domain::Bar;
use serde::Serialize;
use thiserror::Error;

/// Bad indicator parameters. Fatal: aborts setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("invalid window for {indicator}: {window} (must be >= 1)")]
    InvalidWindow {
        indicator: &'static str,
        window: usize,
    },
}

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No output value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "rsi_3").
    fn name(&self) -> &str;

    /// Number of leading bars whose output is undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a series of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> IndicatorSeries;
}

/// A named numeric series aligned 1:1 with the bar sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Value at `index`; `None` if undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }

    pub fn is_all_undefined(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close (or close for the first bar),
/// high = max(open, close) + 0.1, low = min(open, close) - 0.1.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.1,
                low: open.min(close) - 0.1,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
