/// Closing a leg and applying store patches.
/// P&L is long-only: there is no side field on a trade, so a short would need
/// the sign flipped here.

use super::{OrderType, Trade, TradePatch, TradeResult, TradeStatus};
use crate::errors::{JournalError, JournalResult};
use chrono::{DateTime, Utc};

/// What the user submits when closing an open leg.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClosePosition {
    pub exit_price: f64,
    #[serde(with = "super::time::required")]
    pub exit_date: DateTime<Utc>,
    pub result: TradeResult,
    #[serde(default = "default_exit_order")]
    pub order_type: OrderType,
}

fn default_exit_order() -> OrderType {
    OrderType::ExitFull
}

/// Build the update patch that closes `trade` at `exit`.
/// pnl = (exit - entry) * quantity, percentage = (exit - entry) / entry * 100.
pub fn close_position(trade: &Trade, exit: &ClosePosition) -> JournalResult<TradePatch> {
    if trade.is_closed() {
        return Err(JournalError::InvalidTransition(format!(
            "trade {} is already closed",
            trade.id
        )));
    }
    if exit.result == TradeResult::Open {
        return Err(JournalError::InvalidTransition(
            "a closed leg must be a Win or a Loss".into(),
        ));
    }
    if exit.order_type == OrderType::Entry {
        return Err(JournalError::InvalidTransition(
            "closing order must be Exit Partial or Exit Full".into(),
        ));
    }
    if !exit.exit_price.is_finite() || exit.exit_price <= 0.0 {
        return Err(JournalError::InvalidRecord(format!(
            "exit price must be a positive number, got {}",
            exit.exit_price
        )));
    }
    if !trade.price.is_finite() || trade.price == 0.0 || !trade.quantity.is_finite() {
        return Err(JournalError::InvalidRecord(format!(
            "trade {} has no usable entry price/quantity",
            trade.id
        )));
    }

    Ok(TradePatch {
        exit_price: Some(exit.exit_price),
        exit_date: Some(exit.exit_date),
        result: Some(exit.result),
        status: Some(TradeStatus::Closed),
        pnl: Some(realized_pnl(trade.price, exit.exit_price, trade.quantity)),
        percentage: Some(realized_percentage(trade.price, exit.exit_price)),
        order_type: Some(exit.order_type),
    })
}

/// P&L shown while the user is still typing an exit price. 0 for unusable input.
pub fn preview_pnl(trade: &Trade, exit_price: f64) -> f64 {
    if !exit_price.is_finite() || !trade.price.is_finite() {
        return 0.0;
    }
    realized_pnl(trade.price, exit_price, trade.quantity)
}

pub fn preview_percentage(trade: &Trade, exit_price: f64) -> f64 {
    if !exit_price.is_finite() || !trade.price.is_finite() || trade.price == 0.0 {
        return 0.0;
    }
    realized_percentage(trade.price, exit_price)
}

#[inline]
fn realized_pnl(entry: f64, exit: f64, quantity: f64) -> f64 {
    (exit - entry) * quantity
}

#[inline]
fn realized_percentage(entry: f64, exit: f64) -> f64 {
    (exit - entry) / entry * 100.0
}

/// Relative tolerance when checking a submitted pnl/percentage against the
/// value derived from the prices.
const REALIZED_TOLERANCE: f64 = 1e-6;

/// Apply a store patch in place. Only the Open -> Closed move is accepted:
/// a closed leg is frozen, an open leg cannot carry a Win/Loss result, and
/// the realized pnl/percentage of a closing patch must match the prices
/// (they are filled in when the patch omits them).
pub fn apply_patch(trade: &mut Trade, patch: &TradePatch) -> JournalResult<()> {
    if trade.is_closed() {
        if *patch == TradePatch::default() {
            return Ok(());
        }
        return Err(JournalError::InvalidTransition(format!(
            "trade {} is already closed",
            trade.id
        )));
    }
    for (field, value) in [
        ("exit_price", patch.exit_price),
        ("pnl", patch.pnl),
        ("percentage", patch.percentage),
    ] {
        if matches!(value, Some(v) if !v.is_finite()) {
            return Err(JournalError::InvalidRecord(format!("{field} is not finite")));
        }
    }

    let mut next = trade.clone();
    if let Some(v) = patch.exit_price {
        next.exit_price = Some(v);
    }
    if let Some(v) = patch.exit_date {
        next.exit_date = Some(v);
    }
    if let Some(v) = patch.result {
        next.result = v;
    }
    if let Some(v) = patch.status {
        next.status = v;
    }
    if let Some(v) = patch.order_type {
        next.order_type = v;
    }

    if next.is_open() && next.result != TradeResult::Open {
        return Err(JournalError::InvalidTransition(format!(
            "trade {} is still open and cannot be marked {}",
            trade.id, next.result
        )));
    }

    if next.is_closed() {
        if let Some(exit_price) = next.exit_price {
            if !next.price.is_finite() || next.price == 0.0 || !next.quantity.is_finite() {
                return Err(JournalError::InvalidRecord(format!(
                    "trade {} has no usable entry price/quantity",
                    trade.id
                )));
            }
            next.pnl = Some(checked_realized(
                "pnl",
                patch.pnl,
                realized_pnl(next.price, exit_price, next.quantity),
            )?);
            next.percentage = Some(checked_realized(
                "percentage",
                patch.percentage,
                realized_percentage(next.price, exit_price),
            )?);
        }
    } else {
        if let Some(v) = patch.pnl {
            next.pnl = Some(v);
        }
        if let Some(v) = patch.percentage {
            next.percentage = Some(v);
        }
    }

    next.check_closed_invariant()?;
    *trade = next;
    Ok(())
}

fn checked_realized(field: &str, submitted: Option<f64>, expected: f64) -> JournalResult<f64> {
    match submitted {
        Some(v) if (v - expected).abs() > REALIZED_TOLERANCE * expected.abs().max(1.0) => {
            Err(JournalError::InvalidRecord(format!(
                "{field} {v} does not match the exit price (expected {expected})"
            )))
        }
        _ => Ok(expected),
    }
}
