//! Orders — transient instructions created on a decision bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// How many units an order asks for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderQuantity {
    /// Resolved by the simulator's sizing policy against the fill price.
    Sized,
    /// An explicit number of units, fixed when the order was created.
    Units(f64),
    /// The entire position held at fill time.
    Liquidate,
}

/// Which price an order fills at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// Open of the bar after the decision bar.
    #[default]
    NextOpen,
}

/// An order generated on bar `created_bar`, consumed on the following bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub side: OrderSide,
    pub quantity: OrderQuantity,
    pub fill_rule: FillRule,
    pub created_bar: usize,
    pub created_date: NaiveDate,
    /// Name of the rule that produced the order, if any.
    pub rule: Option<String>,
}

impl Order {
    /// Buy sized by the sizing policy at the next open.
    pub fn entry(created_bar: usize, created_date: NaiveDate) -> Self {
        Self {
            side: OrderSide::Buy,
            quantity: OrderQuantity::Sized,
            fill_rule: FillRule::NextOpen,
            created_bar,
            created_date,
            rule: None,
        }
    }

    /// Sell the whole position at the next open.
    pub fn exit_all(created_bar: usize, created_date: NaiveDate) -> Self {
        Self {
            side: OrderSide::Sell,
            quantity: OrderQuantity::Liquidate,
            fill_rule: FillRule::NextOpen,
            created_bar,
            created_date,
            rule: None,
        }
    }

    /// Sell an explicit number of units at the next open.
    pub fn sell_units(created_bar: usize, created_date: NaiveDate, units: f64) -> Self {
        Self {
            side: OrderSide::Sell,
            quantity: OrderQuantity::Units(units),
            fill_rule: FillRule::NextOpen,
            created_bar,
            created_date,
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}
