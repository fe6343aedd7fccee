//! End-to-end scenarios on synthetic close series.
//!
//! Bars are built with open = previous close, so a fill "at the next open"
//! lands on the decision bar's close price.

use chrono::NaiveDate;
use hubline_core::domain::{Bar, BarError, BarSeries, Order, OrderSide};
use hubline_core::engine::{DiagnosticKind, Simulator, SimulatorConfig};
use hubline_core::indicators::{sma, IndicatorSet, Sma};
use hubline_core::signals::{Relation, SignalExpr};
use hubline_core::sizers::{FixedAllocation, FixedUnits};
use hubline_core::{
    reference_strategy, run_backtest, BacktestConfig, BacktestError, ReferenceParams, Strategy,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base_date() + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 0.1,
                open.min(close) - 0.1,
                close,
                10_000,
            )
        })
        .collect()
}

fn series(closes: &[f64]) -> BarSeries {
    BarSeries::new(bars_from_closes(closes)).unwrap()
}

/// Enter when the fast average crosses above the slow one.
fn sma_cross(fast: usize, slow: usize) -> Strategy {
    let mut set = IndicatorSet::new();
    let slow = set.add(Sma::new(slow).unwrap());
    let fast = set.add(Sma::new(fast).unwrap());
    Strategy::new("sma_cross", set)
        .entry("golden_cross", SignalExpr::compare(fast, Relation::Gt, slow).cross())
        .exit("death_cross", SignalExpr::compare(fast, Relation::Lt, slow).cross())
}

// ── SMA crossover ────────────────────────────────────────────────────

#[test]
fn sma_crossover_enters_at_following_open() {
    // Flat at 100 through bar 200 (index 199); bar 201 jumps to 200.
    // SMA50 = 102 > SMA200 = 100.5 on bar 201 → entry fills at bar 202's open.
    // A steadily rising prefix would put SMA50 above SMA200 on bar 200, the
    // first bar both are defined, so the cross would fire a bar early.
    // Holding the prefix flat keeps the averages equal until the jump.
    let mut closes = vec![100.0; 200];
    closes.extend(std::iter::repeat(200.0).take(10));
    let bars = series(&closes);

    let result = run_backtest(
        &bars,
        &sma_cross(50, 200),
        &BacktestConfig::new(100_000.0, 10_000.0),
        &FixedAllocation::new(),
    )
    .unwrap();

    let entry = &result.signals[0];
    assert_eq!(entry.firing_bars(), vec![200]);

    assert_eq!(result.fills.len(), 1);
    let fill = &result.fills[0];
    assert_eq!(fill.side, OrderSide::Buy);
    assert_eq!(fill.order_bar, 200);
    assert_eq!(fill.bar_index, 201);
    assert_eq!(fill.price, 200.0);
    assert_eq!(fill.quantity, 50.0);
    assert_eq!(fill.rule.as_deref(), Some("golden_cross"));
}

#[test]
fn equal_averages_never_cross() {
    let bars = series(&[100.0; 260]);
    let result = run_backtest(
        &bars,
        &sma_cross(50, 200),
        &BacktestConfig::default(),
        &FixedAllocation::new(),
    )
    .unwrap();
    assert!(result.fills.is_empty());
}

// ── RSI mean reversion ───────────────────────────────────────────────

#[test]
fn rsi_dip_with_trend_filter_enters_next_open() {
    // Steady climb, then a sharp two-bar drop. On bar 10 (index 9):
    //   RSI(3) = 28.57 < 30, SMA3 = 15.67 > SMA6 = 15.33.
    // On bar 11 (index 10) SMA3 falls below SMA6 → trend exit.
    let closes = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 16.5, 13.5, 14.0, 15.0];
    let params = ReferenceParams {
        slow_window: 6,
        fast_window: 3,
        rsi_window: 3,
        ..ReferenceParams::default()
    };
    let strategy = reference_strategy(&params).unwrap();
    let result = run_backtest(
        &series(&closes),
        &strategy,
        &BacktestConfig::new(100_000.0, 10_000.0),
        &FixedAllocation::new(),
    )
    .unwrap();

    let rsi_dip = result.signals.iter().find(|s| s.name == "rsi_dip").unwrap();
    assert_eq!(rsi_dip.firing_bars(), vec![9]);

    assert_eq!(result.fills.len(), 2);
    let buy = &result.fills[0];
    assert_eq!(buy.order_bar, 9);
    assert_eq!(buy.bar_index, 10);
    assert_eq!(buy.price, 13.5);

    let sell = &result.fills[1];
    assert_eq!(sell.side, OrderSide::Sell);
    assert_eq!(sell.rule.as_deref(), Some("trend_exit"));
    assert_eq!(sell.bar_index, 11);
    assert_eq!(sell.price, 14.0);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert!(trade.is_closed());
    assert!(trade.exit_date.unwrap() > trade.entry_date);
    let expected = 10_000.0 / 13.5 * (14.0 - 13.5);
    assert!((trade.realized_pnl - expected).abs() < 1e-9);
}

#[test]
fn rsi_dip_with_reference_windows() {
    // 250 rising bars put SMA50 far above SMA200, then a two-bar drop:
    //   index 250: RSI(3) = 25 < 30, SMA50 = 325.36 > SMA200 = 250.47
    //   index 254: RSI(3) = 70.4 crosses above 70 → rsi_exit
    let mut closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
    closes.extend([343.0, 337.0, 340.0, 345.0, 347.0, 348.0]);

    let strategy = reference_strategy(&ReferenceParams::default()).unwrap();
    let result = run_backtest(
        &series(&closes),
        &strategy,
        &BacktestConfig::new(100_000.0, 10_000.0),
        &FixedAllocation::new(),
    )
    .unwrap();

    let rsi_dip = result.signals.iter().find(|s| s.name == "rsi_dip").unwrap();
    assert_eq!(rsi_dip.firing_bars(), vec![250]);

    assert_eq!(result.fills.len(), 2);
    let buy = &result.fills[0];
    assert_eq!(buy.side, OrderSide::Buy);
    assert_eq!(buy.order_bar, 250);
    assert_eq!(buy.bar_index, 251);
    assert_eq!(buy.price, 343.0);

    let sell = &result.fills[1];
    assert_eq!(sell.rule.as_deref(), Some("rsi_exit"));
    assert_eq!(sell.order_bar, 254);
    assert_eq!(sell.bar_index, 255);
    assert_eq!(sell.price, 347.0);

    let expected = 10_000.0 / 343.0 * (347.0 - 343.0);
    assert!((result.trades[0].realized_pnl - expected).abs() < 1e-9);
    assert!(result.diagnostics.is_empty());
}

// ── Insufficient history ─────────────────────────────────────────────

#[test]
fn fifty_bars_never_define_sma200() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
    let values = sma(&closes, 200).unwrap();
    assert_eq!(values.len(), 50);
    assert!(values.iter().all(|v| v.is_none()));

    let result = run_backtest(
        &series(&closes),
        &reference_strategy(&ReferenceParams::default()).unwrap(),
        &BacktestConfig::default(),
        &FixedAllocation::new(),
    )
    .unwrap();
    assert_eq!(result.warmup_bars, 199);
    for name in ["rsi_dip", "trend_exit"] {
        let signal = result.signals.iter().find(|s| s.name == name).unwrap();
        assert!(signal.values.iter().all(|v| v.is_none()), "{name} defined");
        assert!(signal.firing_bars().is_empty());
    }
    assert!(result.fills.is_empty());
}

// ── Exit clipping ────────────────────────────────────────────────────

#[test]
fn stale_exit_is_clipped_to_holding() {
    let bars = bars_from_closes(&[10.0, 10.0, 11.0, 12.0]);
    let sizer = FixedUnits::new(1.0);
    let mut sim = Simulator::new(SimulatorConfig::new(1_000.0, 100.0), &sizer);

    sim.on_bar(0, &bars[0], Some("in"), None, true).unwrap();
    sim.on_bar(1, &bars[1], None, None, true).unwrap();
    assert_eq!(sim.position().quantity, 1.0);

    sim.submit(Order::sell_units(1, bars[1].date, 5.0));
    sim.on_bar(2, &bars[2], None, None, true).unwrap();
    assert_eq!(sim.position().quantity, 0.0);

    let out = sim.finish();
    assert_eq!(out.fills.len(), 2);
    assert_eq!(out.fills[1].quantity, 1.0);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(
        out.diagnostics[0].kind,
        DiagnosticKind::OversizedExit {
            requested: 5.0,
            held: 1.0
        }
    );
    assert!(out.trades[0].is_closed());
}

// ── Final-bar signal ─────────────────────────────────────────────────

#[test]
fn signal_on_last_bar_produces_no_order() {
    let mut set = IndicatorSet::new();
    let close = set.add(Sma::new(1).unwrap());
    let strategy = Strategy::new("late", set)
        .entry("spike", SignalExpr::threshold(close, Relation::Gt, 50.0).cross());

    let result = run_backtest(
        &series(&[10.0, 10.0, 10.0, 99.0]),
        &strategy,
        &BacktestConfig::default(),
        &FixedAllocation::new(),
    )
    .unwrap();

    assert!(result.fills.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].is_no_fill_window());
    assert_eq!(result.diagnostics[0].bar_index, 3);
    assert_eq!(result.snapshots.len(), 4);
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn replay_is_identical() {
    let closes: Vec<f64> = (0..400)
        .map(|i| 3.0 + (i as f64 * 0.05).sin() + (i as f64 * 0.31).cos() * 0.4)
        .collect();
    let bars = series(&closes);
    let params = ReferenceParams {
        slow_window: 60,
        fast_window: 20,
        ..ReferenceParams::default()
    };
    let strategy = reference_strategy(&params).unwrap();
    let config = BacktestConfig::default();

    let a = run_backtest(&bars, &strategy, &config, &FixedAllocation::new()).unwrap();
    let b = run_backtest(&bars, &strategy, &config, &FixedAllocation::new()).unwrap();
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.snapshots, b.snapshots);
    assert_eq!(a, b);
}

// ── Fatal errors ─────────────────────────────────────────────────────

#[test]
fn non_monotonic_dates_rejected_before_simulation() {
    let mut bars = bars_from_closes(&[1.0, 2.0, 3.0]);
    bars.swap(1, 2);
    assert!(matches!(
        BarSeries::new(bars),
        Err(BarError::NonMonotonicDates { index: 2, .. })
    ));
}

#[test]
fn negative_sizing_aborts_run() {
    let mut set = IndicatorSet::new();
    let close = set.add(Sma::new(1).unwrap());
    let strategy = Strategy::new("always", set)
        .entry("any", SignalExpr::threshold(close, Relation::Gt, 0.0));
    let sizer = |_price: f64, _allocation: f64| -> f64 { -3.0 };

    let err = run_backtest(&series(&[1.0, 2.0, 3.0]), &strategy, &BacktestConfig::default(), &sizer)
        .unwrap_err();
    assert!(matches!(err, BacktestError::Engine(_)));
}
