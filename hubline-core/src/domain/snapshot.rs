use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point of the equity curve, taken at a bar's close.
///
/// `equity` is always derived as `cash + quantity * close`, so the accounting
/// identity holds exactly on every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub cash: f64,
    pub quantity: f64,
    pub close: f64,
    pub position_value: f64,
    pub equity: f64,
}

impl PortfolioSnapshot {
    pub fn mark(bar_index: usize, date: NaiveDate, cash: f64, quantity: f64, close: f64) -> Self {
        let position_value = quantity * close;
        Self {
            bar_index,
            date,
            cash,
            quantity,
            close,
            position_value,
            equity: cash + position_value,
        }
    }
}
