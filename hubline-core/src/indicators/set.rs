//! Indicator registration and precomputation.
//!
//! Registering an indicator returns a [`SeriesHandle`]; signal expressions
//! refer to indicator output only through handles, never by name.

use super::{Indicator, IndicatorSeries};
use crate::domain::Bar;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Typed reference to one registered indicator's output series.
///
/// A handle is bound to the set that issued it; frames and strategies built
/// from any other set reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesHandle {
    set: u64,
    index: usize,
}

impl SeriesHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The indicators a strategy needs, in registration order.
pub struct IndicatorSet {
    id: u64,
    indicators: Vec<Box<dyn Indicator>>,
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            indicators: Vec::new(),
        }
    }
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator and get the handle to its output.
    pub fn add(&mut self, indicator: impl Indicator + 'static) -> SeriesHandle {
        self.indicators.push(Box::new(indicator));
        SeriesHandle {
            set: self.id,
            index: self.indicators.len() - 1,
        }
    }

    /// True if `handle` was issued by this set.
    pub fn owns(&self, handle: SeriesHandle) -> bool {
        handle.set == self.id && handle.index < self.indicators.len()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn name(&self, handle: SeriesHandle) -> Option<&str> {
        if !self.owns(handle) {
            return None;
        }
        self.indicators.get(handle.index).map(|i| i.name())
    }

    /// Warmup length: the maximum lookback across all indicators.
    pub fn warmup(&self) -> usize {
        self.indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    /// Compute every registered indicator once over the full bar series.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorFrame {
        let series = self
            .indicators
            .iter()
            .map(|indicator| {
                let s = indicator.compute(bars);
                debug_assert_eq!(
                    s.len(),
                    bars.len(),
                    "indicator '{}' produced {} values for {} bars",
                    indicator.name(),
                    s.len(),
                    bars.len()
                );
                s
            })
            .collect();
        IndicatorFrame {
            set: self.id,
            series,
            bar_count: bars.len(),
        }
    }
}

impl fmt::Debug for IndicatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.indicators.iter().map(|i| i.name()))
            .finish()
    }
}

/// Precomputed indicator output, indexed by handle. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    set: u64,
    series: Vec<IndicatorSeries>,
    bar_count: usize,
}

impl IndicatorFrame {
    /// Series for `handle`; `None` if it was issued by a different set.
    pub fn get(&self, handle: SeriesHandle) -> Option<&IndicatorSeries> {
        if handle.set != self.set {
            return None;
        }
        self.series.get(handle.index)
    }

    /// Value of `handle` at `bar_index`; `None` if undefined or unknown.
    pub fn value(&self, handle: SeriesHandle, bar_index: usize) -> Option<f64> {
        self.get(handle).and_then(|s| s.get(bar_index))
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn series(&self) -> &[IndicatorSeries] {
        &self.series
    }
}
