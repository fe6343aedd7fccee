//! Long-only order and portfolio simulator.
//!
//! Three steps per bar:
//! 1. Open: fill orders queued on the previous bar at this bar's open
//! 2. Close: mark to market and record one snapshot
//! 3. Decide: turn this bar's entry/exit signals into orders for the next bar
//!
//! The simulator owns all mutable run state (cash, position, pending orders,
//! fills, trade log, snapshots, diagnostics). Nothing else mutates it.

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::EngineError;
use crate::domain::{Bar, Fill, Order, OrderQuantity, OrderSide, PortfolioSnapshot, Position, Trade};
use crate::sizers::Sizer;
use crate::strategy::EntryPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remainders below this are treated as a closed position.
const QTY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub initial_equity: f64,
    /// Currency handed to the sizer for each entry.
    pub allocation: f64,
    pub entry_policy: EntryPolicy,
}

impl SimulatorConfig {
    pub fn new(initial_equity: f64, allocation: f64) -> Self {
        Self {
            initial_equity,
            allocation,
            entry_policy: EntryPolicy::IgnoreWhileLong,
        }
    }

    pub fn with_entry_policy(mut self, policy: EntryPolicy) -> Self {
        self.entry_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Long,
}

/// Everything a finished simulation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub fills: Vec<Fill>,
    pub trades: Vec<Trade>,
    pub snapshots: Vec<PortfolioSnapshot>,
    pub diagnostics: Vec<Diagnostic>,
    pub final_cash: f64,
    pub final_position: Position,
}

pub struct Simulator<'a> {
    config: SimulatorConfig,
    sizer: &'a dyn Sizer,
    cash: f64,
    position: Position,
    pending: Vec<Order>,
    fills: Vec<Fill>,
    trades: Vec<Trade>,
    open_trade: Option<Trade>,
    snapshots: Vec<PortfolioSnapshot>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Simulator<'a> {
    pub fn new(config: SimulatorConfig, sizer: &'a dyn Sizer) -> Self {
        Self {
            config,
            sizer,
            cash: config.initial_equity,
            position: Position::flat(),
            pending: Vec::new(),
            fills: Vec::new(),
            trades: Vec::new(),
            open_trade: None,
            snapshots: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    // ── Accessors ──

    pub fn state(&self) -> PositionState {
        if self.position.is_long() {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn snapshots(&self) -> &[PortfolioSnapshot] {
        &self.snapshots
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ── Driving ──

    /// Queue an order for the next bar's open.
    pub fn submit(&mut self, order: Order) {
        self.pending.push(order);
    }

    /// Run all three steps for one bar.
    ///
    /// `entry` / `exit` name the rule firing on this bar, if any. `has_next`
    /// is false on the final bar, where new orders cannot be filled.
    pub fn on_bar(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        entry: Option<&str>,
        exit: Option<&str>,
        has_next: bool,
    ) -> Result<(), EngineError> {
        self.fill_pending(bar_index, bar)?;
        self.mark(bar_index, bar);
        self.decide(bar_index, bar.date, entry, exit, has_next);
        Ok(())
    }

    /// Step 1: fill every queued order at `bar.open`, in submission order.
    pub fn fill_pending(&mut self, bar_index: usize, bar: &Bar) -> Result<(), EngineError> {
        let orders = std::mem::take(&mut self.pending);
        for order in orders {
            match order.side {
                OrderSide::Buy => self.fill_buy(order, bar_index, bar)?,
                OrderSide::Sell => self.fill_sell(order, bar_index, bar)?,
            }
        }
        Ok(())
    }

    /// Step 2: record the bar's closing snapshot.
    pub fn mark(&mut self, bar_index: usize, bar: &Bar) {
        self.snapshots.push(PortfolioSnapshot::mark(
            bar_index,
            bar.date,
            self.cash,
            self.position.quantity,
            bar.close,
        ));
    }

    /// Step 3: translate signals into an order for the next bar.
    ///
    /// While long, an exit takes precedence over an entry on the same bar.
    pub fn decide(
        &mut self,
        bar_index: usize,
        date: NaiveDate,
        entry: Option<&str>,
        exit: Option<&str>,
        has_next: bool,
    ) {
        let order = match self.state() {
            PositionState::Flat => entry.map(|rule| Order::entry(bar_index, date).with_rule(rule)),
            PositionState::Long => match (exit, entry, self.config.entry_policy) {
                (Some(rule), _, _) => Some(Order::exit_all(bar_index, date).with_rule(rule)),
                (None, Some(rule), EntryPolicy::Pyramid { max_units })
                    if self.position.quantity < max_units =>
                {
                    Some(Order::entry(bar_index, date).with_rule(rule))
                }
                (None, Some(rule), _) => {
                    tracing::debug!(bar = bar_index, rule, "entry ignored while long");
                    None
                }
                (None, None, _) => None,
            },
        };

        let Some(order) = order else { return };
        if has_next {
            self.pending.push(order);
        } else {
            self.record(
                Diagnostic::new(
                    bar_index,
                    date,
                    DiagnosticKind::NoFillWindow { side: order.side },
                )
                .with_rule(order.rule),
            );
        }
    }

    /// Close out the run. Orders still queued have no bar left to fill on;
    /// a trade still open stays in the log without an exit.
    pub fn finish(mut self) -> SimulationOutput {
        for order in std::mem::take(&mut self.pending) {
            let diag = Diagnostic::new(
                order.created_bar,
                order.created_date,
                DiagnosticKind::NoFillWindow { side: order.side },
            )
            .with_rule(order.rule);
            self.record(diag);
        }
        if let Some(open) = self.open_trade.take() {
            self.trades.push(open);
        }
        SimulationOutput {
            fills: self.fills,
            trades: self.trades,
            snapshots: self.snapshots,
            diagnostics: self.diagnostics,
            final_cash: self.cash,
            final_position: self.position,
        }
    }

    // ── Fills ──

    fn fill_buy(&mut self, order: Order, bar_index: usize, bar: &Bar) -> Result<(), EngineError> {
        let price = bar.open;
        let requested = match order.quantity {
            OrderQuantity::Sized => self.sizer.size(price, self.config.allocation),
            OrderQuantity::Units(q) => q,
            OrderQuantity::Liquidate => 0.0,
        };
        check_size(requested, order.side, bar_index)?;

        let quantity = match self.config.entry_policy {
            EntryPolicy::Pyramid { max_units } => {
                requested.min(max_units - self.position.quantity).max(0.0)
            }
            EntryPolicy::IgnoreWhileLong => requested,
        };
        if quantity <= 0.0 {
            self.record(
                Diagnostic::new(bar_index, bar.date, DiagnosticKind::ZeroQuantity { side: order.side })
                    .with_rule(order.rule),
            );
            return Ok(());
        }

        self.cash -= quantity * price;
        self.position.add(quantity, price);

        match self.open_trade.as_mut() {
            Some(trade) => {
                let total = trade.quantity + quantity;
                trade.entry_price = (trade.entry_price * trade.quantity + price * quantity) / total;
                trade.quantity = total;
                trade.entry_fills += 1;
            }
            None => {
                self.open_trade = Some(Trade {
                    entry_bar: bar_index,
                    entry_date: bar.date,
                    entry_price: price,
                    exit_bar: None,
                    exit_date: None,
                    exit_price: None,
                    quantity,
                    entry_fills: 1,
                    realized_pnl: 0.0,
                    entry_rule: order.rule.clone(),
                    exit_rule: None,
                });
            }
        }

        self.push_fill(order, bar_index, bar.date, price, quantity);
        Ok(())
    }

    fn fill_sell(&mut self, order: Order, bar_index: usize, bar: &Bar) -> Result<(), EngineError> {
        let price = bar.open;
        let held = self.position.quantity;
        let requested = match order.quantity {
            OrderQuantity::Liquidate => held,
            OrderQuantity::Units(q) => q,
            OrderQuantity::Sized => self.sizer.size(price, self.config.allocation),
        };
        check_size(requested, order.side, bar_index)?;

        if requested > held {
            self.record(
                Diagnostic::new(
                    bar_index,
                    bar.date,
                    DiagnosticKind::OversizedExit { requested, held },
                )
                .with_rule(order.rule.clone()),
            );
        }
        let quantity = requested.min(held);
        if quantity <= 0.0 {
            if requested <= held {
                self.record(
                    Diagnostic::new(bar_index, bar.date, DiagnosticKind::ZeroQuantity { side: order.side })
                        .with_rule(order.rule),
                );
            }
            return Ok(());
        }

        let (removed, realized) = self.position.reduce(quantity, price);
        self.cash += removed * price;
        self.close_trade(removed, realized, price, bar_index, bar.date, order.rule.as_deref());
        self.push_fill(order, bar_index, bar.date, price, removed);
        Ok(())
    }

    /// Close the open trade, or split off the sold slice if units remain.
    fn close_trade(
        &mut self,
        removed: f64,
        realized: f64,
        price: f64,
        bar_index: usize,
        date: NaiveDate,
        rule: Option<&str>,
    ) {
        let Some(mut trade) = self.open_trade.take() else {
            return;
        };
        let remaining = trade.quantity - removed;

        let mut closed = trade.clone();
        closed.quantity = removed;
        closed.exit_bar = Some(bar_index);
        closed.exit_date = Some(date);
        closed.exit_price = Some(price);
        closed.realized_pnl = realized;
        closed.exit_rule = rule.map(str::to_owned);
        tracing::debug!(
            entry = %closed.entry_date,
            exit = %date,
            quantity = removed,
            pnl = realized,
            "trade closed"
        );
        self.trades.push(closed);

        if remaining > QTY_EPSILON && self.position.is_long() {
            trade.quantity = remaining;
            self.open_trade = Some(trade);
        }
    }

    fn push_fill(&mut self, order: Order, bar_index: usize, date: NaiveDate, price: f64, quantity: f64) {
        tracing::debug!(
            bar = bar_index,
            side = ?order.side,
            price,
            quantity,
            rule = order.rule.as_deref().unwrap_or("-"),
            "fill"
        );
        self.fills.push(Fill {
            bar_index,
            date,
            side: order.side,
            price,
            quantity,
            order_bar: order.created_bar,
            rule: order.rule,
        });
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }
}

fn check_size(quantity: f64, side: OrderSide, bar_index: usize) -> Result<(), EngineError> {
    if quantity.is_finite() && quantity >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidOrderSize {
            bar_index,
            side,
            quantity,
        })
    }
}
