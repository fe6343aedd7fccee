use serde::{Deserialize, Serialize};

/// Long-only position: quantity held and average cost basis.
///
/// Quantity is never negative. A flat position has quantity 0 and a zero
/// cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub avg_cost: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.quantity <= 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.avg_cost)
    }

    /// Add units at `price`, averaging the cost basis.
    pub fn add(&mut self, quantity: f64, price: f64) {
        let total = self.quantity + quantity;
        if total > 0.0 {
            self.avg_cost = (self.avg_cost * self.quantity + price * quantity) / total;
        }
        self.quantity = total;
    }

    /// Remove up to `quantity` units at `price`; returns (units removed, realized PnL).
    pub fn reduce(&mut self, quantity: f64, price: f64) -> (f64, f64) {
        let removed = quantity.min(self.quantity).max(0.0);
        let realized = (price - self.avg_cost) * removed;
        self.quantity -= removed;
        if self.quantity <= 0.0 {
            *self = Self::flat();
        }
        (removed, realized)
    }
}
