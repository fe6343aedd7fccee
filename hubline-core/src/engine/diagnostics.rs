//! Recoverable conditions met during a run.
//!
//! None of these abort the simulation: the order is dropped or clipped and a
//! diagnostic is kept on the result so callers can audit what happened.

use crate::domain::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Order created on the final bar; there is no next open to fill at.
    NoFillWindow { side: OrderSide },
    /// Sell asked for more than was held; clipped to the holding.
    OversizedExit { requested: f64, held: f64 },
    /// The resolved quantity was zero; nothing to fill.
    ZeroQuantity { side: OrderSide },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub kind: DiagnosticKind,
    pub rule: Option<String>,
}

impl Diagnostic {
    pub fn new(bar_index: usize, date: NaiveDate, kind: DiagnosticKind) -> Self {
        Self {
            bar_index,
            date,
            kind,
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: Option<String>) -> Self {
        self.rule = rule;
        self
    }

    pub fn is_no_fill_window(&self) -> bool {
        matches!(self.kind, DiagnosticKind::NoFillWindow { .. })
    }

    pub fn is_oversized_exit(&self) -> bool {
        matches!(self.kind, DiagnosticKind::OversizedExit { .. })
    }

    pub(crate) fn log(&self) {
        tracing::warn!(
            bar = self.bar_index,
            date = %self.date,
            rule = self.rule.as_deref().unwrap_or("-"),
            "{}",
            self.kind
        );
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::NoFillWindow { side } => {
                write!(f, "no fill window: {side:?} order on final bar dropped")
            }
            DiagnosticKind::OversizedExit { requested, held } => {
                write!(f, "oversized exit: requested {requested}, held {held}; clipped")
            }
            DiagnosticKind::ZeroQuantity { side } => {
                write!(f, "zero quantity: {side:?} order dropped")
            }
        }
    }
}
