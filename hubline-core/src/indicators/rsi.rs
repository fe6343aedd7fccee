//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! Changes d[i] = x[i] - x[i-1]. The first average gain/loss is the simple
//! mean of d[1..=n]; afterwards each average is updated as
//! `x * (1/n) + avg * (1 - 1/n)`.
//! RSI = 100 * avg_gain / (avg_gain + avg_loss).
//! Lookback: period (first value at index n, i.e. n+1 observations).
//! Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; both zero → undefined.

use super::{Indicator, IndicatorError, IndicatorSeries};
use crate::domain::{Bar, PriceField};

/// Wilder RSI of `values` over `period`.
///
/// A non-finite input leaves the series undefined from that change onwards,
/// because the smoothed averages cannot recover from a missing observation.
pub fn rsi(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidWindow {
            indicator: "rsi",
            window: period,
        });
    }

    let n = values.len();
    let mut result = vec![None; n];
    if n < period + 1 {
        return Ok(result);
    }

    let change = |i: usize| -> Option<f64> {
        let d = values[i] - values[i - 1];
        d.is_finite().then_some(d)
    };

    // Seed: simple average over the first `period` changes.
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let Some(d) = change(i) else {
            return Ok(result);
        };
        if d > 0.0 {
            avg_gain += d;
        } else {
            avg_loss -= d;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let Some(d) = change(i) else {
            return Ok(result);
        };
        let gain = if d > 0.0 { d } else { 0.0 };
        let loss = if d < 0.0 { -d } else { 0.0 };

        avg_gain = gain * alpha + avg_gain * (1.0 - alpha);
        avg_loss = loss * alpha + avg_loss * (1.0 - alpha);

        result[i] = rsi_value(avg_gain, avg_loss);
    }

    Ok(result)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        None
    } else {
        Some(100.0 * avg_gain / total)
    }
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    field: PriceField,
    name: String,
}

impl Rsi {
    /// RSI of closes.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Self::on(period, PriceField::Close)
    }

    pub fn on(period: usize, field: PriceField) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidWindow {
                indicator: "rsi",
                window: period,
            });
        }
        let name = match field {
            PriceField::Close => format!("rsi_{period}"),
            other => format!("rsi_{period}_{}", other.as_str()),
        };
        Ok(Self {
            period,
            field,
            name,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.field)).collect();
        let values = rsi(&prices, self.period).unwrap_or_else(|_| vec![None; bars.len()]);
        IndicatorSeries::new(self.name.clone(), values)
    }
}
