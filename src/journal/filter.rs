use crate::trade::{Interval, RiskLevel, Strategy, Trade, TradeResult, TradeStatus, Trend};

/// Journal search and column filters. `None` on a column means "all".
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub status: Option<TradeStatus>,
    #[serde(default)]
    pub risk: Option<RiskLevel>,
    #[serde(default)]
    pub result: Option<TradeResult>,
    #[serde(default)]
    pub interval: Option<Interval>,
    #[serde(default)]
    pub trend: Option<Trend>,
}

impl TradeFilter {
    pub fn is_active(&self) -> bool {
        self.search_term().is_some()
            || self.strategy.is_some()
            || self.status.is_some()
            || self.risk.is_some()
            || self.result.is_some()
            || self.interval.is_some()
            || self.trend.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(term) = self.search_term() {
            if !matches_search(trade, &term) {
                return false;
            }
        }
        self.strategy.map_or(true, |v| trade.strategy == v)
            && self.status.map_or(true, |v| trade.status == v)
            && self.risk.map_or(true, |v| trade.risk == v)
            && self.result.map_or(true, |v| trade.result == v)
            && self.interval.map_or(true, |v| trade.interval == v)
            && self.trend.map_or(true, |v| trade.trend == v)
    }

    /// Matching trades, input order preserved.
    pub fn apply<'a>(&self, trades: impl IntoIterator<Item = &'a Trade>) -> Vec<&'a Trade> {
        trades.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// Case-insensitive substring match on symbol, strategy, technical notes and
/// group id. `term` is already lowercased.
fn matches_search(trade: &Trade, term: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(term);
    hit(&trade.symbol)
        || hit(trade.strategy.label())
        || trade.technical.as_deref().is_some_and(hit)
        || trade.dca_group_id.as_deref().is_some_and(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::fixtures::{closed_leg, open_leg};

    fn sample() -> Vec<Trade> {
        let mut eth = open_leg("eth", "ETH", 2000.0, 1.0, 0);
        eth.technical = Some("Bullish RSI divergence".into());
        eth.strategy = Strategy::Breakout;
        let mut dca = open_leg("dca", "SOL", 20.0, 5.0, 1);
        dca.dca_group_id = Some("DCA-SOL-123456".into());
        dca.strategy = Strategy::DcaScalp;
        let mut loss = closed_leg("loss", -5.0);
        loss.risk = RiskLevel::High;
        vec![eth, dca, loss]
    }

    fn ids(v: Vec<&Trade>) -> Vec<&str> {
        v.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_inactive_filter_keeps_everything() {
        let trades = sample();
        let f = TradeFilter::default();
        assert!(!f.is_active());
        assert_eq!(f.apply(&trades).len(), 3);
    }

    #[test]
    fn test_search_fields() {
        let trades = sample();
        let mut f = TradeFilter { search: Some("rsi".into()), ..Default::default() };
        assert_eq!(ids(f.apply(&trades)), vec!["eth"]);

        f.search = Some("dca-sol".into());
        assert_eq!(ids(f.apply(&trades)), vec!["dca"]);

        f.search = Some("dca scalp".into());
        assert_eq!(ids(f.apply(&trades)), vec!["dca"], "strategy label is searchable");

        f.search = Some("  btc ".into());
        assert_eq!(ids(f.apply(&trades)), vec!["loss"]);

        f.search = Some("   ".into());
        assert!(!f.is_active(), "blank search is not a filter");
    }

    #[test]
    fn test_column_filters_combine() {
        let trades = sample();
        let mut f = TradeFilter { status: Some(TradeStatus::Open), ..Default::default() };
        assert_eq!(ids(f.apply(&trades)), vec!["eth", "dca"]);

        f.strategy = Some(Strategy::DcaScalp);
        assert_eq!(ids(f.apply(&trades)), vec!["dca"]);

        f.clear();
        f.risk = Some(RiskLevel::High);
        f.result = Some(TradeResult::Loss);
        assert_eq!(ids(f.apply(&trades)), vec!["loss"]);
    }
}
