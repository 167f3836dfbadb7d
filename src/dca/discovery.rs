use crate::trade::{Strategy, Trade};
use indexmap::IndexMap;

/// An open DCA position a new leg can be linked to.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OpenGroupSummary {
    pub id: String,
    pub symbol: String,
    pub strategy: Strategy,
    pub count: usize,
    /// Unweighted mean of leg entry prices
    pub avg_price: f64,
    pub total_quantity: f64,
}

impl OpenGroupSummary {
    /// Streamed mean: avg_n = (avg_{n-1} * (n - 1) + price_n) / n.
    #[inline]
    fn push_leg(&mut self, trade: &Trade) {
        self.count += 1;
        self.total_quantity += trade.quantity;
        let n = self.count as f64;
        self.avg_price = (self.avg_price * (n - 1.0) + trade.price) / n;
    }
}

/// Open legs bucketed by group id, in first-encounter order.
/// Symbol and strategy come from the first open leg of each group.
pub fn find_open_groups<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<OpenGroupSummary> {
    let mut groups: IndexMap<&str, OpenGroupSummary> = IndexMap::new();
    for t in trades.into_iter().filter(|t| t.is_open()) {
        let Some(id) = t.group_id() else { continue };
        groups
            .entry(id)
            .or_insert_with(|| OpenGroupSummary {
                id: id.to_string(),
                symbol: t.symbol.clone(),
                strategy: t.strategy,
                count: 0,
                avg_price: 0.0,
                total_quantity: 0.0,
            })
            .push_leg(t);
    }
    groups.into_values().collect()
}

/// Groups offered for a leg in `symbol`. An empty symbol offers every group.
pub fn groups_for_symbol<'a>(groups: &'a [OpenGroupSummary], symbol: &str) -> Vec<&'a OpenGroupSummary> {
    let symbol = symbol.trim();
    groups
        .iter()
        .filter(|g| symbol.is_empty() || g.symbol == symbol)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::{closed_leg, open_leg};

    fn grouped(mut t: Trade, group: &str) -> Trade {
        t.dca_group_id = Some(group.to_string());
        t
    }

    #[test]
    fn test_running_average_matches_mean() {
        let trades = vec![
            grouped(open_leg("a", "BTC", 100.0, 1.0, 0), "g1"),
            grouped(open_leg("b", "BTC", 110.0, 2.0, 1), "g1"),
            grouped(open_leg("c", "BTC", 93.0, 0.5, 2), "g1"),
        ];
        let groups = find_open_groups(&trades);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.count, 3);
        assert!((g.avg_price - 101.0).abs() < 1e-9, "avg: {}", g.avg_price);
        assert!((g.total_quantity - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_skips_closed_and_ungrouped_legs() {
        let mut closed = grouped(closed_leg("c", 5.0), "g1");
        closed.price = 1_000.0;
        let trades = vec![
            open_leg("plain", "BTC", 1.0, 1.0, 0),
            grouped(open_leg("a", "BTC", 100.0, 1.0, 0), "g1"),
            closed,
            grouped(open_leg("e", "ETH", 2000.0, 1.0, 0), ""),
        ];
        let groups = find_open_groups(&trades);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].avg_price, 100.0);
    }

    #[test]
    fn test_fully_closed_group_is_not_offered() {
        let trades = vec![grouped(closed_leg("c", 5.0), "done")];
        assert!(find_open_groups(&trades).is_empty());
    }

    #[test]
    fn test_groups_for_symbol() {
        let trades = vec![
            grouped(open_leg("a", "BTC", 100.0, 1.0, 0), "g1"),
            grouped(open_leg("b", "ETH", 10.0, 1.0, 0), "g2"),
        ];
        let groups = find_open_groups(&trades);
        assert_eq!(groups_for_symbol(&groups, "").len(), 2);
        let eth = groups_for_symbol(&groups, "ETH");
        assert_eq!(eth.len(), 1);
        assert_eq!(eth[0].id, "g2");
        assert!(groups_for_symbol(&groups, "SOL").is_empty());
    }
}
