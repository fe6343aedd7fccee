//! Signal expression tree.
//!
//! Three node kinds, each referencing inputs through typed operands:
//! - `Compare`: series vs. series
//! - `Threshold`: series vs. constant
//! - `Formula`: AND of two sub-signals
//!
//! Every node may be marked cross-only, in which case it fires only on the
//! bar where its condition turns true after being false or undefined.

use crate::domain::PriceField;
use crate::indicators::SeriesHandle;
use std::fmt;

/// Comparison relationship between two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
}

impl Relation {
    pub fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Relation::Gt => a > b,
            Relation::Lt => a < b,
            Relation::Eq => a == b,
            Relation::Gte => a >= b,
            Relation::Lte => a <= b,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Gt => ">",
            Relation::Lt => "<",
            Relation::Eq => "==",
            Relation::Gte => ">=",
            Relation::Lte => "<=",
        }
    }
}

/// Input of a comparison: an indicator output or a raw bar price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Series(SeriesHandle),
    Price(PriceField),
}

impl From<SeriesHandle> for Operand {
    fn from(handle: SeriesHandle) -> Self {
        Operand::Series(handle)
    }
}

impl From<PriceField> for Operand {
    fn from(field: PriceField) -> Self {
        Operand::Price(field)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Series(h) => write!(f, "#{}", h.index()),
            Operand::Price(field) => f.write_str(field.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalExpr {
    Compare {
        a: Operand,
        b: Operand,
        rel: Relation,
        cross_only: bool,
    },
    Threshold {
        series: Operand,
        value: f64,
        rel: Relation,
        cross_only: bool,
    },
    Formula {
        a: Box<SignalExpr>,
        b: Box<SignalExpr>,
        cross_only: bool,
    },
}

impl SignalExpr {
    /// `a REL b` on every bar.
    pub fn compare(a: impl Into<Operand>, rel: Relation, b: impl Into<Operand>) -> Self {
        SignalExpr::Compare {
            a: a.into(),
            b: b.into(),
            rel,
            cross_only: false,
        }
    }

    /// `series REL value` on every bar.
    pub fn threshold(series: impl Into<Operand>, rel: Relation, value: f64) -> Self {
        SignalExpr::Threshold {
            series: series.into(),
            value,
            rel,
            cross_only: false,
        }
    }

    /// `self AND other`.
    pub fn and(self, other: SignalExpr) -> Self {
        SignalExpr::Formula {
            a: Box::new(self),
            b: Box::new(other),
            cross_only: false,
        }
    }

    /// Make this node fire only on false/undefined → true transitions.
    pub fn cross(mut self) -> Self {
        match &mut self {
            SignalExpr::Compare { cross_only, .. }
            | SignalExpr::Threshold { cross_only, .. }
            | SignalExpr::Formula { cross_only, .. } => *cross_only = true,
        }
        self
    }

    pub fn is_cross_only(&self) -> bool {
        match self {
            SignalExpr::Compare { cross_only, .. }
            | SignalExpr::Threshold { cross_only, .. }
            | SignalExpr::Formula { cross_only, .. } => *cross_only,
        }
    }

    /// Every indicator handle referenced anywhere in the tree.
    pub fn handles(&self) -> Vec<SeriesHandle> {
        let mut out = Vec::new();
        self.collect_handles(&mut out);
        out
    }

    fn collect_handles(&self, out: &mut Vec<SeriesHandle>) {
        match self {
            SignalExpr::Compare { a, b, .. } => {
                push_handle(out, a);
                push_handle(out, b);
            }
            SignalExpr::Threshold { series, .. } => push_handle(out, series),
            SignalExpr::Formula { a, b, .. } => {
                a.collect_handles(out);
                b.collect_handles(out);
            }
        }
    }
}

fn push_handle(out: &mut Vec<SeriesHandle>, op: &Operand) {
    if let Operand::Series(h) = op {
        if !out.contains(h) {
            out.push(*h);
        }
    }
}

impl fmt::Display for SignalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (body, cross_only) = match self {
            SignalExpr::Compare {
                a,
                b,
                rel,
                cross_only,
            } => (format!("{a} {} {b}", rel.symbol()), *cross_only),
            SignalExpr::Threshold {
                series,
                value,
                rel,
                cross_only,
            } => (format!("{series} {} {value}", rel.symbol()), *cross_only),
            SignalExpr::Formula { a, b, cross_only } => (format!("({a}) & ({b})"), *cross_only),
        };
        if cross_only {
            write!(f, "cross[{body}]")
        } else {
            f.write_str(&body)
        }
    }
}
