//! `ledgerbook-session` — Optimistic overlay and background reconciliation.
//!
//! Owns the mutable session state: the last confirmed server snapshot, the
//! per-event-key overlay machines, and the journal-store seam. All report
//! computation lives in `ledgerbook-ledger`; this crate only decides which
//! entries are currently visible.

pub mod config;
pub mod error;
pub mod overlay;
pub mod session;
pub mod store;

pub use config::SessionConfig;
pub use error::SessionError;
pub use overlay::{compose, OverlayState, VisibleEntry};
pub use session::{LedgerSession, RefreshReport, RefreshToken};
pub use store::{JournalStore, MemoryStore, StoreError};
