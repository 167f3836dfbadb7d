use crate::errors::{JournalError, JournalResult};
use crate::trade::{Trade, TradeInput, TradePatch};

/// Storage collaborator. This is the only surface the metrics and DCA code
/// depends on: fetch a snapshot, add a leg, patch a leg.
pub trait TradeStore: Send + Sync {
    fn list(&self, sort: Option<SortSpec>) -> JournalResult<Vec<Trade>>;

    /// One leg by id; `NotFound` when absent.
    fn get(&self, id: &str) -> JournalResult<Trade>;

    /// Persist a new leg. The store assigns the id and starts it Open with
    /// zero pnl/percentage. A leg linked to an existing DCA group must trade
    /// the group's symbol.
    fn create(&self, input: TradeInput) -> JournalResult<Trade>;

    fn update(&self, id: &str, patch: &TradePatch) -> JournalResult<Trade>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    EntryDate,
    ExitDate,
    Symbol,
    Capital,
    Pnl,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::EntryDate => "entry_date",
            Self::ExitDate => "exit_date",
            Self::Symbol => "symbol",
            Self::Capital => "capital",
            Self::Pnl => "pnl",
        }
    }
}

/// `field` ascending or `-field` descending, e.g. `-entry_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl SortSpec {
    pub const NEWEST_FIRST: SortSpec = SortSpec {
        field: SortField::EntryDate,
        descending: true,
    };

    pub const OLDEST_FIRST: SortSpec = SortSpec {
        field: SortField::EntryDate,
        descending: false,
    };
}

impl std::str::FromStr for SortSpec {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "entry_date" => SortField::EntryDate,
            "exit_date" => SortField::ExitDate,
            "symbol" => SortField::Symbol,
            "capital" => SortField::Capital,
            "pnl" => SortField::Pnl,
            other => return Err(JournalError::Parse(format!("unknown sort field: {other:?}"))),
        };
        Ok(Self { field, descending })
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }
        write!(f, "{}", self.field.column())
    }
}
