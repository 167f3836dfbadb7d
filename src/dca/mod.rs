/// DCA position views.
///
/// A DCA group is every leg sharing one `dca_group_id`. The composite view is
/// recomputed from the legs each time; nothing about a group is stored.

pub mod discovery;
pub mod group_id;

use crate::errors::{JournalError, JournalResult};
use crate::metrics::percent;
use crate::trade::{Strategy, Trade};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Composite position built from the legs of one group.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DcaGroup {
    pub group_id: String,
    // Taken from the earliest leg
    pub symbol: String,
    pub strategy: Strategy,
    #[serde(with = "crate::trade::time::required")]
    pub first_entry_date: DateTime<Utc>,
    pub total_capital: f64,
    pub total_quantity: f64,
    /// Quantity-weighted entry price. `None` when the legs net to zero
    /// quantity, where the average is undefined.
    pub avg_entry_price: Option<f64>,
    pub total_pnl: f64,
    pub overall_percentage: f64,
    pub open_count: usize,
    pub closed_count: usize,
    pub leg_count: usize,
}

/// Aggregate the legs of a single group.
///
/// Fails on an empty slice, on legs that carry different group ids or
/// symbols, and on non-finite price, quantity or capital.
pub fn aggregate_group<'a>(legs: impl IntoIterator<Item = &'a Trade>) -> JournalResult<DcaGroup> {
    let mut legs = legs.into_iter();
    let first = legs.next().ok_or(JournalError::EmptyGroup)?;
    let group_id = first
        .group_id()
        .ok_or_else(|| JournalError::InvalidRecord(format!("trade {} has no DCA group", first.id)))?;

    let mut earliest = first;
    let mut total_capital = 0.0;
    let mut total_quantity = 0.0;
    let mut weighted_price = 0.0;
    let mut total_pnl = 0.0;
    let mut open_count = 0;
    let mut closed_count = 0;
    let mut leg_count = 0;

    for leg in std::iter::once(first).chain(legs) {
        check_leg(leg, group_id, &first.symbol)?;
        total_capital += leg.capital;
        total_quantity += leg.quantity;
        weighted_price += leg.price * leg.quantity;
        total_pnl += leg.pnl_or_zero();
        if leg.is_open() {
            open_count += 1;
        } else {
            closed_count += 1;
        }
        leg_count += 1;
        // Strictly earlier only, so ties keep the first leg seen
        if leg.entry_date < earliest.entry_date {
            earliest = leg;
        }
    }

    let avg_entry_price = if total_quantity == 0.0 {
        None
    } else {
        Some(weighted_price / total_quantity)
    };
    let overall_percentage = if total_capital > 0.0 {
        percent(total_pnl, total_capital)
    } else {
        0.0
    };

    Ok(DcaGroup {
        group_id: group_id.to_string(),
        symbol: earliest.symbol.clone(),
        strategy: earliest.strategy,
        first_entry_date: earliest.entry_date,
        total_capital,
        total_quantity,
        avg_entry_price,
        total_pnl,
        overall_percentage,
        open_count,
        closed_count,
        leg_count,
    })
}

fn check_leg(leg: &Trade, group_id: &str, symbol: &str) -> JournalResult<()> {
    if leg.group_id() != Some(group_id) {
        return Err(JournalError::InvalidRecord(format!(
            "trade {} is not part of DCA group {group_id}",
            leg.id
        )));
    }
    if leg.symbol != symbol {
        return Err(JournalError::InvalidRecord(format!(
            "trade {} trades {} but group {group_id} trades {symbol}",
            leg.id, leg.symbol
        )));
    }
    for (field, value) in [("price", leg.price), ("quantity", leg.quantity), ("capital", leg.capital)] {
        if !value.is_finite() {
            return Err(JournalError::InvalidRecord(format!(
                "trade {} has non-finite {field}",
                leg.id
            )));
        }
    }
    Ok(())
}

/// A snapshot split into DCA buckets and standalone trades.
#[derive(Debug, Default)]
pub struct GroupPartition<'a> {
    /// Group id -> legs, in first-occurrence order of the id
    pub groups: IndexMap<&'a str, Vec<&'a Trade>>,
    pub individual: Vec<&'a Trade>,
}

pub fn partition_by_group<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> GroupPartition<'a> {
    let mut partition = GroupPartition::default();
    for t in trades {
        match t.group_id() {
            Some(id) => partition.groups.entry(id).or_default().push(t),
            None => partition.individual.push(t),
        }
    }
    partition
}

impl<'a> GroupPartition<'a> {
    /// Aggregate each bucket on its own, so one malformed group does not
    /// hide the others.
    pub fn aggregate_each(&self) -> Vec<(&'a str, JournalResult<DcaGroup>)> {
        self.groups
            .iter()
            .map(|(id, legs)| (*id, aggregate_group(legs.iter().copied())))
            .collect()
    }
}

/// Aggregate every group found in the snapshot, in first-occurrence order.
/// Fails on the first malformed group; see `GroupPartition::aggregate_each`.
pub fn aggregate_groups<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> JournalResult<Vec<DcaGroup>> {
    partition_by_group(trades)
        .aggregate_each()
        .into_iter()
        .map(|(_, group)| group)
        .collect()
}
