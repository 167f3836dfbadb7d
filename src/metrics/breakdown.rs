/// Partition-and-reduce views for the strategy and risk panels.
/// Output rows appear in first-occurrence order of their key. The key sets
/// are the fixed journal enumerations, so rows live inline in a SmallVec.

use super::percent;
use crate::trade::{RiskLevel, Strategy, Trade, TradeResult};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StrategyPerformance {
    pub name: Strategy,
    pub trades: usize,
    pub pnl: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RiskExposure {
    pub name: RiskLevel,
    pub count: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StrategyShare {
    pub name: Strategy,
    pub count: usize,
    pub percentage: f64,
}

pub type StrategyRows = SmallVec<[StrategyPerformance; 9]>;
pub type RiskRows = SmallVec<[RiskExposure; 5]>;

/// Per-strategy trade count, pnl, outcomes and win rate.
/// win_rate = wins / (wins + losses) * 100, so open legs do not dilute it.
pub fn group_by_strategy<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> StrategyRows {
    let mut rows = StrategyRows::new();
    for t in trades {
        let idx = match rows.iter().position(|r| r.name == t.strategy) {
            Some(i) => i,
            None => {
                rows.push(StrategyPerformance {
                    name: t.strategy,
                    trades: 0,
                    pnl: 0.0,
                    wins: 0,
                    losses: 0,
                    win_rate: 0.0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        row.trades += 1;
        row.pnl += t.pnl_or_zero();
        match t.result {
            TradeResult::Win => row.wins += 1,
            TradeResult::Loss => row.losses += 1,
            TradeResult::Open => {}
        }
    }
    for row in rows.iter_mut() {
        row.win_rate = percent(row.wins as f64, (row.wins + row.losses) as f64);
    }
    rows
}

pub fn group_by_risk<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> RiskRows {
    let mut rows = RiskRows::new();
    for t in trades {
        match rows.iter_mut().find(|r| r.name == t.risk) {
            Some(row) => {
                row.count += 1;
                row.pnl += t.pnl_or_zero();
            }
            None => rows.push(RiskExposure {
                name: t.risk,
                count: 1,
                pnl: t.pnl_or_zero(),
            }),
        }
    }
    rows
}

/// Share of the snapshot entered under each strategy.
pub fn strategy_distribution<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> SmallVec<[StrategyShare; 9]> {
    let mut rows: SmallVec<[StrategyShare; 9]> = SmallVec::new();
    let mut total = 0usize;
    for t in trades {
        total += 1;
        match rows.iter_mut().find(|r| r.name == t.strategy) {
            Some(row) => row.count += 1,
            None => rows.push(StrategyShare {
                name: t.strategy,
                count: 1,
                percentage: 0.0,
            }),
        }
    }
    for row in rows.iter_mut() {
        row.percentage = percent(row.count as f64, total as f64);
    }
    rows
}
