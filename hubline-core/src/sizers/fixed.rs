use super::Sizer;
use serde::{Deserialize, Serialize};

/// `min(allocation / price, max_units)`, optionally rounded down to whole units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FixedAllocation {
    pub max_units: Option<f64>,
    pub whole_units: bool,
}

impl FixedAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_units(mut self, max_units: f64) -> Self {
        self.max_units = Some(max_units);
        self
    }

    pub fn whole_units(mut self) -> Self {
        self.whole_units = true;
        self
    }
}

impl Sizer for FixedAllocation {
    fn name(&self) -> &str {
        "fixed_allocation"
    }

    fn size(&self, price: f64, allocation: f64) -> f64 {
        let mut qty = allocation / price;
        if let Some(max) = self.max_units {
            qty = qty.min(max);
        }
        if self.whole_units {
            qty = qty.floor();
        }
        qty
    }
}

/// A constant number of units regardless of price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedUnits {
    pub units: f64,
}

impl FixedUnits {
    pub fn new(units: f64) -> Self {
        Self { units }
    }
}

impl Sizer for FixedUnits {
    fn name(&self) -> &str {
        "fixed_units"
    }

    fn size(&self, _price: f64, _allocation: f64) -> f64 {
        self.units
    }
}
