use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// A transaction row as the journal store delivers it.
///
/// The upstream API spells the credit column `kredit`; the serde rename keeps
/// the wire shape intact while the rest of the engine says `credit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub document: String,
    pub description: String,
    pub account_id: String,
    #[serde(default)]
    pub sub_account_id: Option<String>,
    #[serde(default)]
    pub debit: i64,
    #[serde(rename = "kredit", default)]
    pub credit: i64,
}

/// An opening-balance row. Carries no date: it precedes every transaction
/// for its account by definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRecord {
    pub account_id: String,
    #[serde(default)]
    pub sub_account_id: Option<String>,
    #[serde(default)]
    pub debit: i64,
    #[serde(rename = "kredit", default)]
    pub credit: i64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A chart-of-accounts entry. `code` is hierarchical: account "1101" is a
/// descendant of "11" by prefix. The normal-balance side is always derived
/// (see `classify`), never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized entry
// ---------------------------------------------------------------------------

/// One normalized ledger entry: either an opening balance (`is_opening`) or
/// a transaction. For a settled entry exactly one of debit/credit is
/// positive; both zero only happens for unsaved placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub document: String,
    pub description: String,
    pub account_id: String,
    #[serde(default)]
    pub sub_account_id: Option<String>,
    pub debit: i64,
    #[serde(rename = "kredit")]
    pub credit: i64,
    pub is_opening: bool,
}

impl Entry {
    /// The event this entry belongs to. All entries posted together share
    /// one key and must net to zero before the event counts as committed.
    pub fn event_key(&self) -> EventKey {
        EventKey {
            date: self.date,
            document: self.document.clone(),
            description: self.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event identity
// ---------------------------------------------------------------------------

/// Identity of a group of entries posted together: (date, document,
/// description).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub date: NaiveDate,
    pub document: String,
    pub description: String,
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.date, self.document, self.description)
    }
}

// ---------------------------------------------------------------------------
// Normal-balance side
// ---------------------------------------------------------------------------

/// Which side increases an account. Determines the sign orientation of the
/// running-balance fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// Signed contribution of one entry on this orientation.
    pub fn delta(self, debit: i64, credit: i64) -> i64 {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "D"),
            Self::Credit => write!(f, "K"),
        }
    }
}

// ---------------------------------------------------------------------------
// Projection output
// ---------------------------------------------------------------------------

/// One row of a projected ledger view: the entry plus the cumulative balance
/// after it and the orientation it was folded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    pub entry: Entry,
    pub balance: i64,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub debit: i64,
    #[serde(rename = "kredit")]
    pub credit: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub rows: Vec<LedgerRow>,
    pub totals: Totals,
}

// ---------------------------------------------------------------------------
// Report summaries
// ---------------------------------------------------------------------------

/// Per-account totals for the trial balance screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: String,
    pub code: String,
    pub name: String,
    pub debit: i64,
    #[serde(rename = "kredit")]
    pub credit: i64,
    pub side: Side,
    pub balance: i64,
}

/// Revenue vs expense totals, each on its natural orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncomeStatement {
    pub revenue: i64,
    pub expense: i64,
    pub net: i64,
}
