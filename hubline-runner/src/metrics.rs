//! Trade statistics and equity metrics — pure functions over a finished run.
//!
//! Trade-level figures use closed trades only (round trips and the closed
//! slices of partially exited trades). Net P&L and every equity figure come
//! from the equity curve, so open positions count at their last mark.

use hubline_core::domain::{Fill, PortfolioSnapshot, Trade};
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Profit factor reported when there are profits but no losses.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Summary statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    // ── Counts ──
    pub transactions: usize,
    pub round_trips: usize,
    pub open_trades: usize,

    // ── Trade P&L ──
    pub net_pnl: f64,
    pub realized_pnl: f64,
    pub avg_trade_pnl: f64,
    pub median_trade_pnl: f64,
    pub std_trade_pnl: f64,
    pub largest_winner: f64,
    pub largest_loser: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub percent_positive: f64,
    pub percent_negative: f64,
    pub profit_factor: f64,
    pub avg_winning_trade: f64,
    pub avg_losing_trade: f64,
    pub avg_win_loss_ratio: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    // ── Equity ──
    pub start_equity: f64,
    pub end_equity: f64,
    pub max_equity: f64,
    pub min_equity: f64,
    pub total_return: f64,
    pub annualized_sharpe: f64,
    /// Largest peak-to-trough fall in currency, as a non-positive number.
    pub max_drawdown: f64,
    /// Same drawdown as a fraction of the peak, non-positive.
    pub max_drawdown_pct: f64,
    pub profit_to_max_drawdown: f64,
}

impl TradeStats {
    /// Compute every statistic from a run's outputs.
    pub fn compute(
        trades: &[Trade],
        fills: &[Fill],
        snapshots: &[PortfolioSnapshot],
        initial_equity: f64,
    ) -> Self {
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
        let pnls: Vec<f64> = closed.iter().map(|t| t.realized_pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();

        let curve: Vec<f64> = snapshots.iter().map(|s| s.equity).collect();
        // Drawdown and extremes also see the starting capital.
        let mut equity = Vec::with_capacity(curve.len() + 1);
        equity.push(initial_equity);
        equity.extend(&curve);

        let end_equity = *equity.last().unwrap_or(&initial_equity);
        let net_pnl = end_equity - initial_equity;
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();
        let avg_winning_trade = mean_f64(&wins);
        let avg_losing_trade = mean_f64(&losses);
        let dd = max_drawdown_abs(&equity);

        Self {
            transactions: fills.len(),
            round_trips: closed.len(),
            open_trades: trades.len() - closed.len(),

            net_pnl,
            realized_pnl: pnls.iter().sum(),
            avg_trade_pnl: mean_f64(&pnls),
            median_trade_pnl: median(&pnls),
            std_trade_pnl: std_dev(&pnls),
            largest_winner: wins.iter().copied().fold(0.0, f64::max),
            largest_loser: losses.iter().copied().fold(0.0, f64::min),
            gross_profit,
            gross_loss,
            percent_positive: percent(wins.len(), pnls.len()),
            percent_negative: percent(losses.len(), pnls.len()),
            profit_factor: profit_factor(gross_profit, gross_loss),
            avg_winning_trade,
            avg_losing_trade,
            avg_win_loss_ratio: if avg_losing_trade < 0.0 {
                avg_winning_trade / avg_losing_trade.abs()
            } else {
                0.0
            },
            max_consecutive_wins: max_consecutive(&closed, Trade::is_winner),
            max_consecutive_losses: max_consecutive(&closed, Trade::is_loser),

            start_equity: initial_equity,
            end_equity,
            max_equity: equity.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_equity: equity.iter().copied().fold(f64::INFINITY, f64::min),
            total_return: total_return(&equity),
            annualized_sharpe: sharpe_ratio(&curve, 0.0),
            max_drawdown: dd,
            max_drawdown_pct: max_drawdown(&equity),
            profit_to_max_drawdown: if dd < 0.0 { net_pnl / dd.abs() } else { 0.0 },
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&last)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let mean = mean_f64(&excess);
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Maximum drawdown in currency, as a non-positive number.
pub fn max_drawdown_abs(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        max_dd = max_dd.min(eq - peak);
    }
    max_dd
}

/// Profit factor: gross profits / |gross losses|.
///
/// [`PROFIT_FACTOR_CAP`] stands in for infinity when there are no losses.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    let loss = gross_loss.abs();
    if loss < 1e-10 {
        return if gross_profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    gross_profit / loss
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

fn max_consecutive(trades: &[&Trade], pred: fn(&Trade) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if pred(trade) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
