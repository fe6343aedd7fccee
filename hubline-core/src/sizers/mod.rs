//! Order sizing — turns a fill price and a currency allocation into units.
//!
//! Sizers run at fill time, against the open of the fill bar, so a sized
//! order never looks at the decision bar's close. The simulator validates
//! the returned quantity; a sizer is free to return anything.

pub mod fixed;

pub use fixed::{FixedAllocation, FixedUnits};

/// Sizing policy: `(price, allocation) -> quantity`.
pub trait Sizer: Send + Sync {
    fn name(&self) -> &str;

    /// Units to buy at `price` given `allocation` in currency.
    fn size(&self, price: f64, allocation: f64) -> f64;
}

impl<F> Sizer for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn size(&self, price: f64, allocation: f64) -> f64 {
        self(price, allocation)
    }
}
