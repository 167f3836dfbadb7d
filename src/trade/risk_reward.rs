use super::Trade;

/// Planned reward-to-risk ratio: |tp - entry| / |entry - sl|.
/// `None` when a level is missing, zero, non-finite, or the risk leg is flat.
pub fn risk_reward(entry: f64, take_profit: Option<f64>, stop_loss: Option<f64>) -> Option<f64> {
    let usable = |v: f64| v.is_finite() && v != 0.0;
    let (tp, sl) = (take_profit?, stop_loss?);
    if !usable(entry) || !usable(tp) || !usable(sl) {
        return None;
    }
    let reward = (tp - entry).abs();
    let risk = (entry - sl).abs();
    if risk > 0.0 {
        Some(reward / risk)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardTier {
    /// 1:2 or better
    Favorable,
    /// between 1:1 and 1:2
    Neutral,
    Unfavorable,
}

impl RewardTier {
    pub fn classify(ratio: f64) -> Self {
        if ratio >= 2.0 {
            Self::Favorable
        } else if ratio >= 1.0 {
            Self::Neutral
        } else {
            Self::Unfavorable
        }
    }
}

impl Trade {
    #[inline]
    pub fn risk_reward(&self) -> Option<f64> {
        risk_reward(self.price, self.take_profit, self.stop_loss)
    }
}
