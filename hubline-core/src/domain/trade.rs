//! Trade — a round-trip (or the closed slice of one) in the trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A trade record: entry, optional exit, size and realized PnL.
///
/// A trade opens on a flat-to-long fill and accumulates pyramid fills at an
/// averaged entry price. A sell that closes only part of it splits off a
/// closed record for the units sold; the remainder stays open. A trade still
/// open when the run ends has no exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: Option<usize>,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,

    // ── Size ──
    pub quantity: f64,
    /// Number of buy fills folded into this trade.
    pub entry_fills: usize,

    // ── PnL ──
    pub realized_pnl: f64,

    // ── Traceability ──
    pub entry_rule: Option<String>,
    pub exit_rule: Option<String>,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_date.is_some()
    }

    pub fn is_winner(&self) -> bool {
        self.is_closed() && self.realized_pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.is_closed() && self.realized_pnl < 0.0
    }

    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.realized_pnl / (self.entry_price * self.quantity)
    }

    pub fn bars_held(&self) -> Option<usize> {
        self.exit_bar.map(|exit| exit.saturating_sub(self.entry_bar))
    }
}
