pub mod lifecycle;
pub mod risk_reward;
pub mod time;

use crate::errors::{JournalError, JournalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Defines a closed set of journal labels. The label is the wire and storage
/// form (`"R:R"`, `"Very Low"`, `"Exit Full"`), so serde, `Display` and
/// `FromStr` all go through the same table.
macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            #[inline]
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = JournalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(JournalError::Parse(format!(
                        concat!("unknown ", stringify!($name), ": {:?}"),
                        other
                    ))),
                }
            }
        }
    };
}

// ── Journal enumerations ──

labeled_enum!(
    /// Trading strategy a leg was opened under.
    Strategy {
        RiskReward => "R:R",
        DcaTechnical => "DCA T.A",
        TrailingStop => "TSL",
        Scalp => "Scalp",
        RiskRewardSwing => "R:R Swing",
        TslScalp => "TSL Scalp",
        DcaScalp => "DCA Scalp",
        Breakout => "Breakout",
        Reversal => "Reversal",
    }
);

impl Strategy {
    /// DCA strategies get a group id when a new leg is created.
    #[inline]
    pub fn is_dca(&self) -> bool {
        self.label().contains("DCA")
    }
}

labeled_enum!(
    Interval {
        M1 => "1m",
        M5 => "5m",
        M15 => "15m",
        M30 => "30m",
        H1 => "1h",
        H4 => "4h",
        D1 => "1d",
        W1 => "1w",
    }
);

labeled_enum!(
    /// Market bias at entry.
    Trend {
        Bull => "Bull",
        Bear => "Bear",
        Break => "Break",
        Side => "Side",
        Reversal => "Reversal",
    }
);

labeled_enum!(
    RiskLevel {
        VeryLow => "Very Low",
        Low => "Low",
        Medium => "Medium",
        High => "High",
        VeryHigh => "Very High",
    }
);

labeled_enum!(
    TradeResult {
        Win => "Win",
        Loss => "Loss",
        Open => "Open",
    }
);

labeled_enum!(
    OrderType {
        Entry => "Entry",
        ExitPartial => "Exit Partial",
        ExitFull => "Exit Full",
    }
);

labeled_enum!(
    TradeStatus {
        Open => "Open",
        Closed => "Closed",
    }
);

// ── Trade record ──

/// One leg of a position as stored by the trade store.
///
/// `pnl` and `percentage` are `None` when the store never populated them;
/// every aggregate treats a missing value as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub strategy: Strategy,
    pub capital: f64,
    #[serde(with = "time::required")]
    pub entry_date: DateTime<Utc>,
    #[serde(default, with = "time::optional")]
    pub exit_date: Option<DateTime<Utc>>,
    pub price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub interval: Interval,
    pub trend: Trend,
    pub risk: RiskLevel,
    pub result: TradeResult,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub dca_group_id: Option<String>,
    pub order_type: OrderType,
    pub status: TradeStatus,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub technical: Option<String>,
    #[serde(default)]
    pub fundamental: Option<String>,
}

impl Trade {
    #[inline]
    pub fn pnl_or_zero(&self) -> f64 {
        self.pnl.unwrap_or(0.0)
    }

    #[inline]
    pub fn percentage_or_zero(&self) -> f64 {
        self.percentage.unwrap_or(0.0)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// DCA group key. Blank ids count as no group.
    #[inline]
    pub fn group_id(&self) -> Option<&str> {
        self.dca_group_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Closed if and only if exit price/date are set; a closed leg also
    /// carries its realized pnl and percentage.
    pub fn check_closed_invariant(&self) -> JournalResult<()> {
        let has_exit = self.exit_price.is_some() && self.exit_date.is_some();
        match self.status {
            TradeStatus::Closed => {
                if !has_exit || self.pnl.is_none() || self.percentage.is_none() {
                    return Err(JournalError::InvalidRecord(format!(
                        "trade {} is closed without exit price, exit date, pnl and percentage",
                        self.id
                    )));
                }
                if self.result == TradeResult::Open {
                    return Err(JournalError::InvalidRecord(format!(
                        "trade {} is closed with result Open",
                        self.id
                    )));
                }
            }
            TradeStatus::Open => {
                if self.exit_price.is_some() || self.exit_date.is_some() {
                    return Err(JournalError::InvalidRecord(format!(
                        "trade {} has exit data but is still open",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }
}

// ── Collaborator payloads ──

/// Create payload. The store assigns `id`, zeroes `pnl`/`percentage` and
/// forces `result` to `Open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInput {
    pub symbol: String,
    pub strategy: Strategy,
    pub capital: f64,
    #[serde(with = "time::required")]
    pub entry_date: DateTime<Utc>,
    pub price: f64,
    pub quantity: f64,
    pub interval: Interval,
    pub trend: Trend,
    pub risk: RiskLevel,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub dca_group_id: Option<String>,
    #[serde(default = "default_order_type")]
    pub order_type: OrderType,
    #[serde(default = "default_status")]
    pub status: TradeStatus,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub technical: Option<String>,
    #[serde(default)]
    pub fundamental: Option<String>,
}

fn default_order_type() -> OrderType {
    OrderType::Entry
}

fn default_status() -> TradeStatus {
    TradeStatus::Open
}

impl TradeInput {
    pub fn validate(&self) -> JournalResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(JournalError::InvalidRecord("symbol is required".into()));
        }
        for (field, value) in [
            ("capital", self.capital),
            ("price", self.price),
            ("quantity", self.quantity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(JournalError::InvalidRecord(format!(
                    "{field} must be a positive number, got {value}"
                )));
            }
        }
        for (field, value) in [("take_profit", self.take_profit), ("stop_loss", self.stop_loss)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(JournalError::InvalidRecord(format!("{field} is not finite")));
                }
            }
        }
        if self.status == TradeStatus::Closed {
            return Err(JournalError::InvalidRecord(
                "new legs are created open; close them with an update".into(),
            ));
        }
        Ok(())
    }

    pub fn into_trade(self, id: String) -> Trade {
        Trade {
            id,
            symbol: self.symbol.trim().to_string(),
            strategy: self.strategy,
            capital: self.capital,
            entry_date: self.entry_date,
            exit_date: None,
            price: self.price,
            exit_price: None,
            quantity: self.quantity,
            interval: self.interval,
            trend: self.trend,
            risk: self.risk,
            result: TradeResult::Open,
            pnl: Some(0.0),
            percentage: Some(0.0),
            dca_group_id: self.dca_group_id,
            order_type: self.order_type,
            status: self.status,
            take_profit: self.take_profit,
            stop_loss: self.stop_loss,
            notes: self.notes,
            technical: self.technical,
            fundamental: self.fundamental,
        }
    }
}

/// Partial update. In practice only used to move a leg from Open to Closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePatch {
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default, with = "time::optional")]
    pub exit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result: Option<TradeResult>,
    #[serde(default)]
    pub status: Option<TradeStatus>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Open leg entered `day` days after 2024-01-01.
    pub fn open_leg(id: &str, symbol: &str, price: f64, quantity: f64, day: u32) -> Trade {
        Trade {
            id: id.to_string(),
            symbol: symbol.to_string(),
            strategy: Strategy::RiskReward,
            capital: price * quantity,
            entry_date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
                + chrono::Duration::days(day as i64),
            exit_date: None,
            price,
            exit_price: None,
            quantity,
            interval: Interval::H4,
            trend: Trend::Bull,
            risk: RiskLevel::Medium,
            result: TradeResult::Open,
            pnl: Some(0.0),
            percentage: Some(0.0),
            dca_group_id: None,
            order_type: OrderType::Entry,
            status: TradeStatus::Open,
            take_profit: None,
            stop_loss: None,
            notes: None,
            technical: None,
            fundamental: None,
        }
    }

    /// Closed leg with a realized pnl; result follows the pnl sign.
    pub fn closed_leg(id: &str, pnl: f64) -> Trade {
        let mut t = open_leg(id, "BTC", 100.0, 1.0, 0);
        let exit = 100.0 + pnl;
        t.exit_price = Some(exit);
        t.exit_date = Some(t.entry_date + chrono::Duration::hours(6));
        t.pnl = Some(pnl);
        t.percentage = Some(pnl);
        t.status = TradeStatus::Closed;
        t.result = if pnl >= 0.0 { TradeResult::Win } else { TradeResult::Loss };
        t.order_type = OrderType::ExitFull;
        t
    }
}
