//! Strategy — indicators plus named entry/exit rules and the entry policy.

use crate::domain::Bar;
use crate::indicators::{IndicatorError, IndicatorFrame, IndicatorSet, Rsi, Sma};
use crate::signals::{Relation, SignalError, SignalExpr, SignalSeries};
use serde::{Deserialize, Serialize};

/// What an entry signal does while the position is already long.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Entry signals are ignored until the position is flat again.
    #[default]
    IgnoreWhileLong,
    /// Each entry signal adds a sized buy; total quantity is capped.
    Pyramid { max_units: f64 },
}

/// A named signal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub expr: SignalExpr,
}

impl Rule {
    pub fn new(name: impl Into<String>, expr: SignalExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

#[derive(Debug)]
pub struct Strategy {
    name: String,
    indicators: IndicatorSet,
    entries: Vec<Rule>,
    exits: Vec<Rule>,
    entry_policy: EntryPolicy,
}

impl Strategy {
    pub fn new(name: impl Into<String>, indicators: IndicatorSet) -> Self {
        Self {
            name: name.into(),
            indicators,
            entries: Vec::new(),
            exits: Vec::new(),
            entry_policy: EntryPolicy::default(),
        }
    }

    pub fn entry(mut self, name: impl Into<String>, expr: SignalExpr) -> Self {
        self.entries.push(Rule::new(name, expr));
        self
    }

    pub fn exit(mut self, name: impl Into<String>, expr: SignalExpr) -> Self {
        self.exits.push(Rule::new(name, expr));
        self
    }

    pub fn with_entry_policy(mut self, policy: EntryPolicy) -> Self {
        self.entry_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn entries(&self) -> &[Rule] {
        &self.entries
    }

    pub fn exits(&self) -> &[Rule] {
        &self.exits
    }

    pub fn entry_policy(&self) -> EntryPolicy {
        self.entry_policy
    }

    pub fn warmup(&self) -> usize {
        self.indicators.warmup()
    }

    /// Check that every rule only references indicators registered in this
    /// strategy's own set.
    pub fn validate(&self) -> Result<(), SignalError> {
        for rule in self.entries.iter().chain(&self.exits) {
            let handles = rule.expr.handles();
            if let Some(handle) = handles.into_iter().find(|h| !self.indicators.owns(*h)) {
                return Err(SignalError::UnknownSeries {
                    handle: handle.index(),
                });
            }
        }
        Ok(())
    }

    /// Compute the indicators once and evaluate every rule over `bars`.
    pub fn evaluate(&self, bars: &[Bar]) -> Result<StrategySignals, SignalError> {
        self.validate()?;
        let frame = self.indicators.compute(bars);
        let eval = |rules: &[Rule]| -> Result<Vec<SignalSeries>, SignalError> {
            rules
                .iter()
                .map(|r| r.expr.evaluate_named(r.name.clone(), bars, &frame))
                .collect()
        };
        let entries = eval(&self.entries)?;
        let exits = eval(&self.exits)?;
        Ok(StrategySignals {
            frame,
            entries,
            exits,
        })
    }
}

/// Every rule's signal series over one bar range, plus the indicator frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySignals {
    pub frame: IndicatorFrame,
    pub entries: Vec<SignalSeries>,
    pub exits: Vec<SignalSeries>,
}

impl StrategySignals {
    /// Name of the first entry rule firing on `bar_index`.
    pub fn entry_at(&self, bar_index: usize) -> Option<&str> {
        first_firing(&self.entries, bar_index)
    }

    /// Name of the first exit rule firing on `bar_index`.
    pub fn exit_at(&self, bar_index: usize) -> Option<&str> {
        first_firing(&self.exits, bar_index)
    }
}

fn first_firing(series: &[SignalSeries], bar_index: usize) -> Option<&str> {
    series
        .iter()
        .find(|s| s.fires(bar_index))
        .map(|s| s.name.as_str())
}

// ── Reference strategy ──

/// Parameters of the moving-average filter + RSI dip strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceParams {
    pub slow_window: usize,
    pub fast_window: usize,
    pub rsi_window: usize,
    pub rsi_entry: f64,
    pub rsi_exit: f64,
    pub entry_policy: EntryPolicy,
}

impl Default for ReferenceParams {
    fn default() -> Self {
        Self {
            slow_window: 200,
            fast_window: 50,
            rsi_window: 3,
            rsi_entry: 30.0,
            rsi_exit: 70.0,
            entry_policy: EntryPolicy::IgnoreWhileLong,
        }
    }
}

/// Buy the RSI dip while the fast average is above the slow one; sell when
/// RSI recovers or the filter breaks.
///
/// - entry `rsi_dip`: cross[(fast > slow) & (rsi < rsi_entry)]
/// - exit `rsi_exit`: cross[rsi > rsi_exit]
/// - exit `trend_exit`: cross[fast < slow]
pub fn reference_strategy(params: &ReferenceParams) -> Result<Strategy, IndicatorError> {
    let mut indicators = IndicatorSet::new();
    let slow = indicators.add(Sma::new(params.slow_window)?);
    let fast = indicators.add(Sma::new(params.fast_window)?);
    let rsi = indicators.add(Rsi::new(params.rsi_window)?);

    let trend_up = SignalExpr::compare(fast, Relation::Gt, slow);
    let dip = SignalExpr::threshold(rsi, Relation::Lt, params.rsi_entry);

    Ok(Strategy::new("sma_filter_rsi", indicators)
        .entry("rsi_dip", trend_up.and(dip).cross())
        .exit(
            "rsi_exit",
            SignalExpr::threshold(rsi, Relation::Gt, params.rsi_exit).cross(),
        )
        .exit(
            "trend_exit",
            SignalExpr::compare(fast, Relation::Lt, slow).cross(),
        )
        .with_entry_policy(params.entry_policy))
}
