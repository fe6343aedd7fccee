//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{Indicator, IndicatorError, IndicatorSeries};
use crate::domain::{Bar, PriceField};

/// Rolling mean of `values` over `period`.
///
/// `output[i] = mean(values[i+1-period..=i])` for `i >= period - 1`,
/// undefined before that. A window containing a non-finite value is
/// undefined. A period longer than the input yields an all-undefined series.
pub fn sma(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidWindow {
            indicator: "sma",
            window: period,
        });
    }

    let n = values.len();
    let mut result = vec![None; n];
    if n < period {
        return Ok(result);
    }

    let mut sum = 0.0;
    let mut bad_in_window = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sum += v;
        } else {
            bad_in_window += 1;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                bad_in_window -= 1;
            }
        }

        if i + 1 >= period && bad_in_window == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    Ok(result)
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    /// SMA of closes.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Self::on(period, PriceField::Close)
    }

    /// SMA of an arbitrary price field.
    pub fn on(period: usize, field: PriceField) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidWindow {
                indicator: "sma",
                window: period,
            });
        }
        let name = match field {
            PriceField::Close => format!("sma_{period}"),
            other => format!("sma_{period}_{}", other.as_str()),
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

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.field)).collect();
        // period was validated in the constructor
        let values = sma(&prices, self.period).unwrap_or_else(|_| vec![None; bars.len()]);
        IndicatorSeries::new(self.name.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).unwrap().compute(&bars);

        assert_eq!(result.len(), 7);
        for i in 0..4 {
            assert_eq!(result.get(i), None, "expected undefined at index {i}");
        }
        assert_approx(result.get(4).unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result.get(5).unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(result.get(6).unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[2.0, 3.0, 4.0]);
        let result = Sma::new(1).unwrap().compute(&bars);
        assert_eq!(result.values, vec![Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn zero_window_is_invalid() {
        assert_eq!(
            Sma::new(0).unwrap_err(),
            IndicatorError::InvalidWindow {
                indicator: "sma",
                window: 0
            }
        );
        assert!(sma(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn window_longer_than_series_is_all_undefined() {
        let closes: Vec<f64> = (0..50).map(|i| 3.0 + i as f64 * 0.01).collect();
        let bars = make_bars(&closes);
        let result = Sma::new(200).unwrap().compute(&bars);
        assert_eq!(result.len(), 50);
        assert!(result.is_all_undefined());
    }

    #[test]
    fn non_finite_input_poisons_its_windows() {
        let values = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let result = sma(&values, 3).unwrap();
        assert_eq!(result[2], None);
        assert_eq!(result[3], None);
        assert_eq!(result[4], None);
        assert_approx(result[5].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn reads_requested_field() {
        let bars = make_bars(&[10.0, 12.0, 14.0]);
        let on_open = Sma::on(2, PriceField::Open).unwrap();
        assert_eq!(on_open.name(), "sma_2_open");
        let result = on_open.compute(&bars);
        // opens: 10, 10, 12
        assert_approx(result.get(1).unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(result.get(2).unwrap(), 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback_and_name() {
        let s = Sma::new(200).unwrap();
        assert_eq!(s.lookback(), 199);
        assert_eq!(s.name(), "sma_200");
        assert_eq!(Sma::new(1).unwrap().lookback(), 0);
    }
}
