use crate::errors::{JournalError, JournalResult};
use crate::store::{SortSpec, TradeStore};
use crate::trade::lifecycle::apply_patch;
use crate::trade::time::parse_timestamp;
use crate::trade::{Trade, TradeInput, TradePatch};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type DbPool = Arc<Mutex<Connection>>;

const TRADE_COLUMNS: &str = "id, symbol, strategy, capital, entry_date, exit_date, price, exit_price, quantity, interval, trend, risk, result, pnl, percentage, dca_group_id, order_type, status, take_profit, stop_loss, notes, technical, fundamental";

pub fn init_db(data_dir: &Path, file_name: &str) -> JournalResult<DbPool> {
    std::fs::create_dir_all(data_dir).map_err(|e| JournalError::Database(format!("create dir: {e}")))?;
    let db_path = data_dir.join(file_name);
    let conn = Connection::open(&db_path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    migrate(&conn)?;

    tracing::info!("database initialized at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database with the same schema. Used by tests.
pub fn init_memory_db() -> JournalResult<DbPool> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn migrate(conn: &Connection) -> JournalResult<()> {
    let schema = include_str!("../migrations/001_init.sql");
    conn.execute_batch(schema)?;
    Ok(())
}

/// Fixed-width UTC text so that ORDER BY on the column is chronological.
fn storage_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite-backed trade store.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn lock(&self) -> JournalResult<std::sync::MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|e| JournalError::Database(format!("lock poisoned: {e}")))
    }
}

impl TradeStore for SqliteStore {
    fn list(&self, sort: Option<SortSpec>) -> JournalResult<Vec<Trade>> {
        let conn = self.lock()?;
        // Column names come from the SortField whitelist, never from input
        let order = match sort {
            Some(spec) => format!(
                " ORDER BY {} {}, rowid ASC",
                spec.field.column(),
                if spec.descending { "DESC" } else { "ASC" }
            ),
            None => " ORDER BY rowid ASC".to_string(),
        };
        let sql = format!("SELECT {TRADE_COLUMNS} FROM trades{order}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], TradeRow::from_row)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(Trade::try_from(row?)?);
        }
        Ok(trades)
    }

    fn get(&self, id: &str) -> JournalResult<Trade> {
        let conn = self.lock()?;
        get_trade_inner(&conn, id)?.ok_or_else(|| JournalError::NotFound(id.to_string()))
    }

    fn create(&self, input: TradeInput) -> JournalResult<Trade> {
        input.validate()?;
        let trade = input.into_trade(uuid::Uuid::new_v4().to_string());

        let conn = self.lock()?;
        if let Some(group) = trade.group_id() {
            check_group_symbol(&conn, group, &trade.symbol)?;
        }
        insert_trade(&conn, &trade)?;
        tracing::info!(
            id = %trade.id,
            symbol = %trade.symbol,
            strategy = %trade.strategy,
            group = trade.dca_group_id.as_deref().unwrap_or("-"),
            "trade created"
        );
        Ok(trade)
    }

    fn update(&self, id: &str, patch: &TradePatch) -> JournalResult<Trade> {
        let conn = self.lock()?;
        let mut trade = get_trade_inner(&conn, id)?
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;

        apply_patch(&mut trade, patch)?;

        conn.execute(
            "UPDATE trades SET exit_price = ?1, exit_date = ?2, result = ?3, status = ?4, pnl = ?5, percentage = ?6, order_type = ?7 WHERE id = ?8",
            rusqlite::params![
                trade.exit_price,
                trade.exit_date.as_ref().map(storage_timestamp),
                trade.result.label(),
                trade.status.label(),
                trade.pnl,
                trade.percentage,
                trade.order_type.label(),
                trade.id,
            ],
        )?;
        tracing::info!(id = %trade.id, status = %trade.status, result = %trade.result, pnl = trade.pnl_or_zero(), "trade updated");
        Ok(trade)
    }
}

fn insert_trade(conn: &Connection, t: &Trade) -> JournalResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO trades ({TRADE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
        ),
        rusqlite::params![
            t.id,
            t.symbol,
            t.strategy.label(),
            t.capital,
            storage_timestamp(&t.entry_date),
            t.exit_date.as_ref().map(storage_timestamp),
            t.price,
            t.exit_price,
            t.quantity,
            t.interval.label(),
            t.trend.label(),
            t.risk.label(),
            t.result.label(),
            t.pnl,
            t.percentage,
            t.dca_group_id,
            t.order_type.label(),
            t.status.label(),
            t.take_profit,
            t.stop_loss,
            t.notes,
            t.technical,
            t.fundamental,
        ],
    )?;
    Ok(())
}

/// A new leg may join an existing group only if the group trades the same symbol.
fn check_group_symbol(conn: &Connection, group: &str, symbol: &str) -> JournalResult<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT symbol FROM trades WHERE dca_group_id = ?1 ORDER BY rowid LIMIT 1",
            rusqlite::params![group],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(existing) if existing != symbol => Err(JournalError::InvalidRecord(format!(
            "DCA group {group} trades {existing}, not {symbol}"
        ))),
        _ => Ok(()),
    }
}

fn get_trade_inner(conn: &Connection, id: &str) -> JournalResult<Option<Trade>> {
    let row = conn
        .query_row(
            &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1"),
            rusqlite::params![id],
            TradeRow::from_row,
        )
        .optional()?;
    row.map(Trade::try_from).transpose()
}

// ── Row type ──

/// Raw column values; enum and date text is validated in `TryFrom`.
struct TradeRow {
    id: String,
    symbol: String,
    strategy: String,
    capital: f64,
    entry_date: String,
    exit_date: Option<String>,
    price: f64,
    exit_price: Option<f64>,
    quantity: f64,
    interval: String,
    trend: String,
    risk: String,
    result: String,
    pnl: Option<f64>,
    percentage: Option<f64>,
    dca_group_id: Option<String>,
    order_type: String,
    status: String,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
    notes: Option<String>,
    technical: Option<String>,
    fundamental: Option<String>,
}

impl TradeRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            symbol: row.get(1)?,
            strategy: row.get(2)?,
            capital: row.get(3)?,
            entry_date: row.get(4)?,
            exit_date: row.get(5)?,
            price: row.get(6)?,
            exit_price: row.get(7)?,
            quantity: row.get(8)?,
            interval: row.get(9)?,
            trend: row.get(10)?,
            risk: row.get(11)?,
            result: row.get(12)?,
            pnl: row.get(13)?,
            percentage: row.get(14)?,
            dca_group_id: row.get(15)?,
            order_type: row.get(16)?,
            status: row.get(17)?,
            take_profit: row.get(18)?,
            stop_loss: row.get(19)?,
            notes: row.get(20)?,
            technical: row.get(21)?,
            fundamental: row.get(22)?,
        })
    }
}

impl TryFrom<TradeRow> for Trade {
    type Error = JournalError;

    fn try_from(r: TradeRow) -> JournalResult<Self> {
        Ok(Trade {
            strategy: r.strategy.parse()?,
            entry_date: parse_timestamp(&r.entry_date)?,
            exit_date: r.exit_date.as_deref().map(parse_timestamp).transpose()?,
            interval: r.interval.parse()?,
            trend: r.trend.parse()?,
            risk: r.risk.parse()?,
            result: r.result.parse()?,
            order_type: r.order_type.parse()?,
            status: r.status.parse()?,
            dca_group_id: r.dca_group_id.filter(|id| !id.trim().is_empty()),
            id: r.id,
            symbol: r.symbol,
            capital: r.capital,
            price: r.price,
            exit_price: r.exit_price,
            quantity: r.quantity,
            pnl: r.pnl,
            percentage: r.percentage,
            take_profit: r.take_profit,
            stop_loss: r.stop_loss,
            notes: r.notes,
            technical: r.technical,
            fundamental: r.fundamental,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::lifecycle::{close_position, ClosePosition};
    use crate::trade::{Interval, OrderType, RiskLevel, Strategy, TradeResult, TradeStatus, Trend};
    use chrono::{Duration, TimeZone};

    fn input(symbol: &str, price: f64, quantity: f64, day: i64) -> TradeInput {
        TradeInput {
            symbol: symbol.into(),
            strategy: Strategy::DcaTechnical,
            capital: price * quantity,
            entry_date: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap() + Duration::days(day),
            price,
            quantity,
            interval: Interval::D1,
            trend: Trend::Bull,
            risk: RiskLevel::Low,
            dca_group_id: Some("g-1".into()),
            order_type: OrderType::Entry,
            status: TradeStatus::Open,
            take_profit: None,
            stop_loss: None,
            notes: Some("first leg".into()),
            technical: None,
            fundamental: None,
        }
    }

    fn store() -> SqliteStore {
        SqliteStore::new(init_memory_db().unwrap())
    }

    #[test]
    fn test_create_assigns_defaults() {
        let store = store();
        let t = store.create(input("BTC", 40000.0, 0.01, 0)).unwrap();
        assert!(!t.id.is_empty());
        assert_eq!(t.result, TradeResult::Open);
        assert_eq!(t.pnl, Some(0.0));
        assert_eq!(t.percentage, Some(0.0));

        let listed = store.list(None).unwrap();
        assert_eq!(listed, vec![t], "stored record must round-trip unchanged");
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let store = store();
        assert!(matches!(store.create(input("", 1.0, 1.0, 0)), Err(JournalError::InvalidRecord(_))));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_list_sorting() {
        let store = store();
        for (symbol, day) in [("B", 1), ("A", 3), ("C", 2)] {
            let mut leg = input(symbol, 1.0, 1.0, day);
            leg.dca_group_id = None;
            store.create(leg).unwrap();
        }

        let newest: Vec<_> = store.list(Some(SortSpec::NEWEST_FIRST)).unwrap().into_iter().map(|t| t.symbol).collect();
        assert_eq!(newest, vec!["A", "C", "B"]);

        let by_symbol: Vec<_> = store.list(Some("symbol".parse().unwrap())).unwrap().into_iter().map(|t| t.symbol).collect();
        assert_eq!(by_symbol, vec!["A", "B", "C"]);

        let insertion: Vec<_> = store.list(None).unwrap().into_iter().map(|t| t.symbol).collect();
        assert_eq!(insertion, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_update_closes_position() {
        let store = store();
        let t = store.create(input("BTC", 100.0, 10.0, 0)).unwrap();
        let exit = ClosePosition {
            exit_price: 120.0,
            exit_date: t.entry_date + Duration::days(2),
            result: TradeResult::Win,
            order_type: OrderType::ExitFull,
        };
        let patch = close_position(&t, &exit).unwrap();
        let closed = store.update(&t.id, &patch).unwrap();
        assert!(closed.is_closed());
        assert!((closed.pnl_or_zero() - 200.0).abs() < 1e-9);

        let reloaded = store.list(None).unwrap();
        assert_eq!(reloaded[0], closed);
        assert_eq!(reloaded[0].exit_date, Some(exit.exit_date));
    }

    #[test]
    fn test_update_errors() {
        let store = store();
        assert!(matches!(
            store.update("missing", &TradePatch::default()),
            Err(JournalError::NotFound(_))
        ));

        let t = store.create(input("BTC", 100.0, 1.0, 0)).unwrap();
        let half = TradePatch { status: Some(TradeStatus::Closed), ..Default::default() };
        assert!(matches!(store.update(&t.id, &half), Err(JournalError::InvalidRecord(_))));
        assert!(store.list(None).unwrap()[0].is_open(), "rejected patch must not be written");
    }

    #[test]
    fn test_get_by_id() {
        let store = store();
        let t = store.create(input("BTC", 100.0, 1.0, 0)).unwrap();
        assert_eq!(store.get(&t.id).unwrap(), t);
        assert!(matches!(store.get("missing"), Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_group_link_must_match_symbol() {
        let store = store();
        store.create(input("BTC", 100.0, 1.0, 0)).unwrap();
        assert!(matches!(store.create(input("ETH", 2000.0, 1.0, 1)), Err(JournalError::InvalidRecord(_))));
        store.create(input("BTC", 90.0, 1.0, 2)).unwrap();

        let mut other = input("ETH", 2000.0, 1.0, 3);
        other.dca_group_id = Some("g-2".into());
        store.create(other).unwrap();
        assert_eq!(store.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_update_keeps_closed_legs_and_prices_consistent() {
        let store = store();
        let t = store.create(input("BTC", 100.0, 10.0, 0)).unwrap();
        let exit_date = t.entry_date + Duration::days(1);

        let forged = TradePatch {
            exit_price: Some(120.0),
            exit_date: Some(exit_date),
            result: Some(TradeResult::Loss),
            status: Some(TradeStatus::Closed),
            pnl: Some(999.0),
            percentage: Some(-5.0),
            order_type: Some(OrderType::ExitFull),
        };
        assert!(matches!(store.update(&t.id, &forged), Err(JournalError::InvalidRecord(_))));

        let win_while_open = TradePatch { result: Some(TradeResult::Win), ..Default::default() };
        assert!(matches!(store.update(&t.id, &win_while_open), Err(JournalError::InvalidTransition(_))));
        assert_eq!(store.get(&t.id).unwrap().result, TradeResult::Open);

        let exit = ClosePosition { exit_price: 120.0, exit_date, result: TradeResult::Win, order_type: OrderType::ExitFull };
        store.update(&t.id, &close_position(&t, &exit).unwrap()).unwrap();

        let reclose = ClosePosition { exit_price: 50.0, result: TradeResult::Loss, ..exit };
        let stale = close_position(&t, &reclose).unwrap();
        assert!(matches!(store.update(&t.id, &stale), Err(JournalError::InvalidTransition(_))));
        let stored = store.get(&t.id).unwrap();
        assert_eq!(stored.exit_price, Some(120.0));
        assert!((stored.pnl_or_zero() - 200.0).abs() < 1e-9);
    }
}
