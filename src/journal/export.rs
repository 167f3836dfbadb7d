use crate::errors::JournalResult;
use crate::trade::time::format_timestamp;
use crate::trade::Trade;
use chrono::NaiveDate;
use std::io::Write;

const HEADERS: [&str; 11] = [
    "Symbol", "Strategy", "Entry Date", "Price", "Quantity",
    "Capital", "Risk", "P&L", "Percentage", "Status", "Result",
];

/// Write the journal table as CSV. Every field is quoted; missing pnl and
/// percentage are written as 0.
pub fn write_csv<'a, W: Write>(trades: impl IntoIterator<Item = &'a Trade>, out: W) -> JournalResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);

    wtr.write_record(HEADERS)?;
    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.strategy.to_string(),
            format_timestamp(&t.entry_date),
            t.price.to_string(),
            t.quantity.to_string(),
            t.capital.to_string(),
            t.risk.to_string(),
            t.pnl_or_zero().to_string(),
            t.percentage_or_zero().to_string(),
            t.status.to_string(),
            t.result.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("trading-journal-{}.csv", date.format("%Y-%m-%d"))
}
