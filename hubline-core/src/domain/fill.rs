use crate::domain::order::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One executed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    /// Bar on which the originating order was created.
    pub order_bar: usize,
    pub rule: Option<String>,
}

impl Fill {
    /// Cash moved by the fill: negative for buys, positive for sells.
    pub fn cash_flow(&self) -> f64 {
        let notional = self.price * self.quantity;
        match self.side {
            OrderSide::Buy => -notional,
            OrderSide::Sell => notional,
        }
    }
}
