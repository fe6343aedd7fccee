//! Signal evaluator — boolean series from typed indicator/price rules.
//!
//! Expressions are evaluated once over the whole bar series before the
//! simulator runs. Undefined inputs propagate as "does not fire": a strategy
//! never acts on incomplete information.

pub mod evaluate;
pub mod expr;

pub use evaluate::crossings;
pub use expr::{Operand, Relation, SignalExpr};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("signal references indicator #{handle}, which is not registered")]
    UnknownSeries { handle: usize },
    #[error("indicator frame covers {indicators} bars but the series has {bars}")]
    LengthMismatch { bars: usize, indicators: usize },
}

/// A named boolean series aligned with the bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSeries {
    pub name: String,
    pub values: Vec<Option<bool>>,
}

impl SignalSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True only where the signal is defined and true.
    pub fn fires(&self, bar_index: usize) -> bool {
        matches!(self.values.get(bar_index), Some(Some(true)))
    }

    /// Indices of every bar on which the signal fires.
    pub fn firing_bars(&self) -> Vec<usize> {
        (0..self.values.len()).filter(|&i| self.fires(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
