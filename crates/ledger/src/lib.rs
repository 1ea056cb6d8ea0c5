//! `ledgerbook-ledger` — Ledger projection engine.
//!
//! Pure engine crate: receives pre-loaded opening and transaction records,
//! returns ordered ledger rows with running balances and report summaries.
//! No I/O, no clocks, no shared state.

pub mod accounts;
pub mod classify;
pub mod model;
pub mod normalize;
pub mod project;
pub mod reports;

pub use accounts::AccountDirectory;
pub use classify::classify;
pub use model::{Account, Entry, EventKey, JournalRecord, LedgerRow, OpeningRecord, Projection, Side, Totals};
pub use normalize::normalize;
pub use project::project;
