/// Dashboard and analytics aggregates over a trade snapshot.
/// All functions are pure -- they take a snapshot and return computed values.
/// Degenerate inputs give zeroed aggregates, never NaN.

pub mod breakdown;
pub mod equity;
pub mod streaks;
pub mod window;

use crate::trade::{Trade, TradeResult};
use chrono::{DateTime, Utc};
use streaks::StreakTracker;
use window::TimeFilter;

/// Derived metrics for one snapshot. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DerivedMetrics {
    pub total_trades: usize,
    pub open_positions: usize,
    pub closed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: f64,
    pub win_rate: f64,         // percent of closed legs that won
    pub total_capital: f64,
    pub roi: f64,              // total_pnl / total_capital, percent
    pub avg_win: f64,
    pub avg_loss: f64,         // negative when there are losses
    /// |avg_win / avg_loss|. Ratio of averages, not of sums.
    pub profit_factor: f64,
    /// Conventional form: gross profit / gross loss.
    pub gross_profit_factor: f64,
    pub best_trade: f64,       // floored at 0
    pub worst_trade: f64,      // capped at 0
    pub max_consecutive_wins: u32,
    pub max_consecutive_losses: u32,
}

/// Compute every aggregate in one pass.
///
/// Streaks are taken over the closed legs in the order given. Pass a
/// chronologically (or at least consistently) ordered snapshot if the streak
/// numbers should mean anything; the snapshot is not re-sorted.
pub fn compute_metrics<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> DerivedMetrics {
    let mut m = DerivedMetrics::default();
    let mut streaks = StreakTracker::default();
    let mut gross_win = 0.0;
    let mut gross_loss = 0.0;
    let mut best = 0.0_f64;
    let mut worst = 0.0_f64;

    for t in trades {
        let pnl = t.pnl_or_zero();
        m.total_trades += 1;
        m.total_pnl += pnl;
        m.total_capital += t.capital;
        best = best.max(pnl);
        worst = worst.min(pnl);

        if t.is_open() {
            m.open_positions += 1;
            continue;
        }

        m.closed_trades += 1;
        streaks.record(t.result);
        match t.result {
            TradeResult::Win => {
                m.wins += 1;
                gross_win += pnl;
            }
            TradeResult::Loss => {
                m.losses += 1;
                gross_loss += pnl;
            }
            TradeResult::Open => {}
        }
    }

    m.win_rate = percent(m.wins as f64, m.closed_trades as f64);
    m.roi = percent(m.total_pnl, m.total_capital);
    m.avg_win = mean(gross_win, m.wins);
    m.avg_loss = mean(gross_loss, m.losses);
    m.profit_factor = guarded_ratio(m.avg_win, m.avg_loss);
    m.gross_profit_factor = guarded_ratio(gross_win, gross_loss);
    m.best_trade = best;
    m.worst_trade = worst;
    m.max_consecutive_wins = streaks.max_wins;
    m.max_consecutive_losses = streaks.max_losses;
    m
}

/// Metrics restricted to trades entered inside `filter`'s window.
pub fn compute_metrics_in_window(trades: &[Trade], filter: TimeFilter, now: DateTime<Utc>) -> DerivedMetrics {
    compute_metrics(trades.iter().filter(|t| filter.contains(t, now)))
}

#[inline]
pub(crate) fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

#[inline]
fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// |win / loss| when win > 0 and loss < 0, else 0.
#[inline]
fn guarded_ratio(win: f64, loss: f64) -> f64 {
    if loss < 0.0 && win > 0.0 {
        (win / loss).abs()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::{closed_leg, open_leg};
    use chrono::Duration;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_snapshot_is_zeroed() {
        let m = compute_metrics(&Vec::<Trade>::new());
        assert_eq!(m, DerivedMetrics::default());
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.total_pnl, 0.0);
    }

    #[test]
    fn test_only_open_legs() {
        let trades = vec![open_leg("a", "BTC", 100.0, 1.0, 0), open_leg("b", "ETH", 10.0, 3.0, 1)];
        let m = compute_metrics(&trades);
        assert_eq!(m.total_trades, 2);
        assert_eq!(m.open_positions, 2);
        assert_eq!(m.closed_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert!(close(m.total_capital, 130.0));
        assert_eq!(m.roi, 0.0);
    }

    #[test]
    fn test_mixed_snapshot() {
        let mut missing_pnl = open_leg("o", "BTC", 100.0, 1.0, 0);
        missing_pnl.pnl = None;
        let trades = vec![
            closed_leg("w1", 30.0),
            closed_leg("l1", -10.0),
            closed_leg("w2", 10.0),
            closed_leg("l2", -30.0),
            missing_pnl,
        ];
        let m = compute_metrics(&trades);

        assert_eq!(m.total_trades, 5);
        assert_eq!(m.open_positions, 1);
        assert_eq!(m.closed_trades, 4);
        assert_eq!((m.wins, m.losses), (2, 2));
        assert!(close(m.total_pnl, 0.0));
        assert!(close(m.win_rate, 50.0));
        assert!(close(m.avg_win, 20.0));
        assert!(close(m.avg_loss, -20.0));
        assert!(close(m.profit_factor, 1.0));
        assert!(close(m.gross_profit_factor, 1.0));
        assert!(close(m.best_trade, 30.0));
        assert!(close(m.worst_trade, -30.0));
        assert!(close(m.total_capital, 500.0));
        assert_eq!((m.max_consecutive_wins, m.max_consecutive_losses), (1, 1));
    }

    #[test]
    fn test_profit_factor_is_ratio_of_averages() {
        // avg win 10 over three wins, avg loss -15 over one loss
        let trades = vec![
            closed_leg("w1", 10.0),
            closed_leg("w2", 10.0),
            closed_leg("w3", 10.0),
            closed_leg("l1", -15.0),
        ];
        let m = compute_metrics(&trades);
        assert!(close(m.profit_factor, 10.0 / 15.0), "pf: {}", m.profit_factor);
        assert!(close(m.gross_profit_factor, 2.0), "gross pf: {}", m.gross_profit_factor);
    }

    #[test]
    fn test_profit_factor_zero_without_losses() {
        let trades = vec![closed_leg("w1", 10.0), closed_leg("w2", 5.0)];
        let m = compute_metrics(&trades);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.gross_profit_factor, 0.0);
        assert!(close(m.win_rate, 100.0));
        assert_eq!(m.worst_trade, 0.0, "worst trade is capped at 0");
    }

    #[test]
    fn test_best_trade_floored_at_zero() {
        let trades = vec![closed_leg("l1", -5.0), closed_leg("l2", -8.0)];
        let m = compute_metrics(&trades);
        assert_eq!(m.best_trade, 0.0);
        assert!(close(m.worst_trade, -8.0));
        assert_eq!(m.win_rate, 0.0);
    }

    #[test]
    fn test_win_rate_bounds_and_full_win() {
        let all_wins = vec![closed_leg("a", 1.0), closed_leg("b", 2.0), open_leg("c", "X", 1.0, 1.0, 0)];
        let m = compute_metrics(&all_wins);
        assert!(close(m.win_rate, 100.0));

        let mixed = vec![closed_leg("a", 1.0), closed_leg("b", -2.0), closed_leg("c", -1.0)];
        let m = compute_metrics(&mixed);
        assert!(m.win_rate > 0.0 && m.win_rate < 100.0, "win rate: {}", m.win_rate);
    }

    #[test]
    fn test_total_pnl_order_invariant_and_idempotent() {
        let trades: Vec<_> = [12.5, -3.25, 7.0, -0.5, 4.125]
            .iter()
            .enumerate()
            .map(|(i, p)| closed_leg(&format!("t{i}"), *p))
            .collect();
        let expected: f64 = trades.iter().map(|t| t.pnl_or_zero()).sum();

        let first = compute_metrics(&trades);
        let second = compute_metrics(&trades);
        assert_eq!(first, second, "same snapshot must give identical output");
        assert!(close(first.total_pnl, expected));

        let mut reversed = trades.clone();
        reversed.reverse();
        assert!(close(compute_metrics(&reversed).total_pnl, expected));
    }

    #[test]
    fn test_metrics_in_window() {
        let mut old = closed_leg("old", -50.0);
        old.entry_date -= Duration::days(60);
        let recent = closed_leg("recent", 20.0);
        let now = recent.entry_date + Duration::days(1);
        let trades = vec![old, recent];

        let all = compute_metrics_in_window(&trades, TimeFilter::All, now);
        assert_eq!(all.total_trades, 2);

        let month = compute_metrics_in_window(&trades, TimeFilter::Last30Days, now);
        assert_eq!(month.total_trades, 1);
        assert!(close(month.total_pnl, 20.0));
        assert!(close(month.roi, 20.0));
    }
}
