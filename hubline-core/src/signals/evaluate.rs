//! Reduce a signal expression to a boolean series over the bars.

use super::expr::{Operand, SignalExpr};
use super::{SignalError, SignalSeries};
use crate::domain::Bar;
use crate::indicators::IndicatorFrame;

impl SignalExpr {
    /// Evaluate over every bar.
    ///
    /// Entry `i` is `Some(cond)` where all inputs are defined at `i`, and
    /// `None` otherwise. An undefined entry never fires.
    pub fn evaluate(
        &self,
        bars: &[Bar],
        frame: &IndicatorFrame,
    ) -> Result<Vec<Option<bool>>, SignalError> {
        if frame.bar_count() != bars.len() {
            return Err(SignalError::LengthMismatch {
                bars: bars.len(),
                indicators: frame.bar_count(),
            });
        }

        let raw: Vec<Option<bool>> = match self {
            SignalExpr::Compare { a, b, rel, .. } => {
                let a = operand_values(a, bars, frame)?;
                let b = operand_values(b, bars, frame)?;
                a.iter()
                    .zip(&b)
                    .map(|(x, y)| match (x, y) {
                        (Some(x), Some(y)) => Some(rel.holds(*x, *y)),
                        _ => None,
                    })
                    .collect()
            }
            SignalExpr::Threshold {
                series, value, rel, ..
            } => operand_values(series, bars, frame)?
                .iter()
                .map(|x| x.map(|x| rel.holds(x, *value)))
                .collect(),
            SignalExpr::Formula { a, b, .. } => {
                let a = a.evaluate(bars, frame)?;
                let b = b.evaluate(bars, frame)?;
                a.iter()
                    .zip(&b)
                    .map(|(x, y)| match (x, y) {
                        (Some(x), Some(y)) => Some(*x && *y),
                        _ => None,
                    })
                    .collect()
            }
        };

        Ok(if self.is_cross_only() {
            crossings(&raw)
        } else {
            raw
        })
    }

    /// Evaluate and wrap the result as a named signal series.
    pub fn evaluate_named(
        &self,
        name: impl Into<String>,
        bars: &[Bar],
        frame: &IndicatorFrame,
    ) -> Result<SignalSeries, SignalError> {
        Ok(SignalSeries::new(name, self.evaluate(bars, frame)?))
    }
}

/// Keep only false/undefined → true transitions.
///
/// The first bar where the condition is defined and true counts as a
/// transition, since the bar before it was undefined.
pub fn crossings(raw: &[Option<bool>]) -> Vec<Option<bool>> {
    raw.iter()
        .enumerate()
        .map(|(i, cur)| match cur {
            Some(true) => {
                let was_true = i > 0 && raw[i - 1] == Some(true);
                Some(!was_true)
            }
            other => *other,
        })
        .collect()
}

fn operand_values(
    op: &Operand,
    bars: &[Bar],
    frame: &IndicatorFrame,
) -> Result<Vec<Option<f64>>, SignalError> {
    match op {
        Operand::Series(handle) => frame
            .get(*handle)
            .map(|s| s.values.clone())
            .ok_or(SignalError::UnknownSeries {
                handle: handle.index(),
            }),
        Operand::Price(field) => Ok(bars.iter().map(|b| Some(b.price(*field))).collect()),
    }
}
