//! Bar, the fundamental market data unit, and the validated bar series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Read one price field of the bar.
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    /// Returns true if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Which price of a bar an indicator or signal operand reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        }
    }
}

/// Malformed input bar data. Always fatal: rejected before simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar dates must be strictly increasing: bar {index} ({current}) does not follow {previous}")]
    NonMonotonicDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("bar {index} ({date}) has a non-finite price")]
    NonFinitePrice { index: usize, date: NaiveDate },
}

/// Date-ordered bar sequence.
///
/// Only constructible from bars whose dates are strictly increasing (which
/// also makes them unique) and whose prices are finite. Gaps between dates
/// are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_finite() {
                return Err(BarError::NonFinitePrice {
                    index,
                    date: bar.date,
                });
            }
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(BarError::NonMonotonicDates {
                        index,
                        previous,
                        current: bar.date,
                    });
                }
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Extract one price field as a plain series.
    pub fn prices(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.price(field)).collect()
    }

    /// Bars within an inclusive date range. `None` bounds are open.
    ///
    /// The result is still ordered, so no re-validation is needed.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> BarSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| start.map_or(true, |s| b.date >= s) && end.map_or(true, |e| b.date <= e))
            .cloned()
            .collect();
        BarSeries { bars }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = BarError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        BarSeries::new(bars)
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
