use crate::errors::JournalError;
use crate::trade::Trade;
use chrono::{DateTime, Duration, Utc};

/// Analytics look-back window, applied to `entry_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl TimeFilter {
    pub fn window(&self) -> Option<Duration> {
        match self {
            Self::All => None,
            Self::Last7Days => Some(Duration::days(7)),
            Self::Last30Days => Some(Duration::days(30)),
            Self::Last90Days => Some(Duration::days(90)),
        }
    }

    /// Earliest entry date still in scope, relative to `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }

    #[inline]
    pub fn contains(&self, trade: &Trade, now: DateTime<Utc>) -> bool {
        self.cutoff(now).map_or(true, |c| trade.entry_date >= c)
    }

    /// Trades in scope, input order preserved.
    pub fn apply<'a>(&self, trades: &'a [Trade], now: DateTime<Utc>) -> Vec<&'a Trade> {
        trades.iter().filter(|t| self.contains(t, now)).collect()
    }
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Last7Days => write!(f, "7d"),
            Self::Last30Days => write!(f, "30d"),
            Self::Last90Days => write!(f, "90d"),
        }
    }
}

impl std::str::FromStr for TimeFilter {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            other => Err(JournalError::Parse(format!("unknown time filter: {other:?}"))),
        }
    }
}
