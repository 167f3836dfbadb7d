use crate::trade::{Strategy, Trade};
use chrono::{DateTime, Utc};

/// One point of the cumulative P&L chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EquityPoint {
    #[serde(with = "crate::trade::time::required")]
    pub date: DateTime<Utc>,
    pub cumulative_pnl: f64,
    pub symbol: String,
    pub strategy: Strategy,
}

/// Running P&L by entry date. Legs whose pnl was never populated are left
/// out; equal entry dates keep snapshot order.
pub fn equity_curve<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<EquityPoint> {
    let mut legs: Vec<&Trade> = trades.into_iter().filter(|t| t.pnl.is_some()).collect();
    legs.sort_by_key(|t| t.entry_date);

    let mut running = 0.0;
    legs.into_iter()
        .map(|t| {
            running += t.pnl_or_zero();
            EquityPoint {
                date: t.entry_date,
                cumulative_pnl: running,
                symbol: t.symbol.clone(),
                strategy: t.strategy,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::{closed_leg, open_leg};
    use chrono::Duration;

    #[test]
    fn test_curve_sorted_and_cumulative() {
        let mut late = closed_leg("late", -5.0);
        late.entry_date += Duration::days(2);
        let early = closed_leg("early", 10.0);
        let mut undefined = open_leg("u", "BTC", 1.0, 1.0, 1);
        undefined.pnl = None;

        let curve = equity_curve(&vec![late, undefined, early]);
        assert_eq!(curve.len(), 2, "legs without pnl are skipped");
        assert!((curve[0].cumulative_pnl - 10.0).abs() < 1e-9);
        assert!((curve[1].cumulative_pnl - 5.0).abs() < 1e-9);
        assert!(curve[0].date < curve[1].date);
    }

    #[test]
    fn test_empty_curve() {
        assert!(equity_curve(&Vec::<Trade>::new()).is_empty());
    }
}
