use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use trade_journal::config::AppConfig;
use trade_journal::dca::discovery::{find_open_groups, groups_for_symbol};
use trade_journal::dca::partition_by_group;
use trade_journal::db::{self, SqliteStore};
use trade_journal::errors::JournalResult;
use trade_journal::journal::format::{format_currency, format_percentage};
use trade_journal::journal::{export, TradeFilter};
use trade_journal::metrics::breakdown::{group_by_risk, group_by_strategy, strategy_distribution};
use trade_journal::metrics::equity::equity_curve;
use trade_journal::metrics::window::TimeFilter;
use trade_journal::metrics::compute_metrics;
use trade_journal::store::{SortSpec, TradeStore};
use trade_journal::trade::Trade;

const RECENT_TRADES: usize = 10;

#[derive(Parser)]
#[command(name = "journal-report")]
#[command(about = "Compute journal views from the local trade store")]
struct Cli {
    /// Data directory holding the journal database (overrides JOURNAL_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Time window applied by entry date
    #[arg(long, default_value = "all")]
    window: TimeFilter,

    /// Case-insensitive search over symbol, strategy, technical notes and group id
    #[arg(long)]
    search: Option<String>,

    #[arg(long, value_enum, default_value_t = View::Dashboard)]
    view: View,

    /// Restrict open groups to one symbol
    #[arg(long)]
    symbol: Option<String>,

    /// Write the CSV view to `trading-journal-YYYY-MM-DD.csv` in this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum View {
    Dashboard,
    Analytics,
    Dca,
    OpenGroups,
    Csv,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("report failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> JournalResult<()> {
    let mut cfg = AppConfig::from_env()?;
    if let Some(dir) = &cli.data_dir {
        cfg.data_dir = dir.clone();
    }

    let store = SqliteStore::new(db::init_db(&cfg.data_dir, &cfg.db_file)?);
    // Chronological order; streaks and the equity curve follow it
    let snapshot = store.list(Some(SortSpec::OLDEST_FIRST))?;

    let filter = TradeFilter {
        search: cli.search.clone(),
        ..Default::default()
    };
    let windowed = cli.window.apply(&snapshot, chrono::Utc::now());
    let trades: Vec<&Trade> = filter.apply(windowed);

    tracing::info!(
        db = %cfg.db_path().display(),
        total = snapshot.len(),
        selected = trades.len(),
        window = %cli.window,
        view = ?cli.view,
        "report run"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let report = match cli.view {
        View::Dashboard => {
            let metrics = compute_metrics(trades.iter().copied());
            serde_json::json!({
                "window": cli.window,
                "summary": {
                    "total_pnl": format_currency(metrics.total_pnl),
                    "win_rate": format_percentage(metrics.win_rate),
                    "roi": format_percentage(metrics.roi),
                    "total_capital": format_currency(metrics.total_capital),
                },
                "metrics": metrics,
                "strategy_distribution": strategy_distribution(trades.iter().copied()),
                "equity_curve": equity_curve(trades.iter().copied()),
                "recent_trades": trades.iter().rev().take(RECENT_TRADES).collect::<Vec<_>>(),
            })
        }
        View::Analytics => serde_json::json!({
            "window": cli.window,
            "metrics": compute_metrics(trades.iter().copied()),
            "by_strategy": group_by_strategy(trades.iter().copied()),
            "by_risk": group_by_risk(trades.iter().copied()),
        }),
        View::Dca => {
            let partition = partition_by_group(trades.iter().copied());
            let mut groups = Vec::new();
            let mut rejected = Vec::new();
            for (group_id, result) in partition.aggregate_each() {
                match result {
                    Ok(group) => groups.push(group),
                    Err(e) => {
                        tracing::warn!(group = group_id, "skipping DCA group: {e}");
                        rejected.push(serde_json::json!({ "group_id": group_id, "error": e.to_string() }));
                    }
                }
            }
            serde_json::json!({
                "groups": groups,
                "rejected_groups": rejected,
                "individual_trades": partition.individual.len(),
            })
        }
        View::OpenGroups => {
            let open = find_open_groups(trades.iter().copied());
            match cli.symbol.as_deref() {
                Some(symbol) => serde_json::json!({ "open_groups": groups_for_symbol(&open, symbol) }),
                None => serde_json::json!({ "open_groups": open }),
            }
        }
        View::Csv => {
            match &cli.out_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;
                    let path = dir.join(export::export_file_name(chrono::Local::now().date_naive()));
                    let file = std::fs::File::create(&path)?;
                    export::write_csv(trades.iter().copied(), std::io::BufWriter::new(file))?;
                    tracing::info!("exported {} trades to {}", trades.len(), path.display());
                }
                None => export::write_csv(trades.iter().copied(), &mut out)?,
            }
            return Ok(());
        }
    };

    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}
