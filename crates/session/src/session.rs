use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use log::warn;

use ledgerbook_ledger::accounts::AccountDirectory;
use ledgerbook_ledger::model::{Entry, EventKey, JournalRecord, OpeningRecord, Projection};
use ledgerbook_ledger::normalize::{entries_from_records, normalize};
use ledgerbook_ledger::project;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::overlay::{compose, OverlayMap, OverlayState, VisibleEntry};
use crate::store::{JournalStore, StoreError};

// ---------------------------------------------------------------------------
// Refresh bookkeeping
// ---------------------------------------------------------------------------

/// Captured when a refresh begins: the overlay versions the fetched result
/// is allowed to confirm. A key mutated after capture has a newer version
/// and its confirmation is discarded as stale.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    versions: BTreeMap<EventKey, u64>,
    pub started_at: DateTime<Utc>,
}

/// What one refresh pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub confirmed: Vec<EventKey>,
    pub expired: Vec<EventKey>,
    pub stale: Vec<EventKey>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One user's reconciled view of the journal: the last confirmed server
/// snapshot plus pending local mutations, kept consistent by the
/// suppression/confirmation/expiry machinery.
///
/// Single-threaded by design. Time never comes from a wall clock; every
/// transition takes `now` so the whole lifecycle is testable.
pub struct LedgerSession<S: JournalStore> {
    store: S,
    config: SessionConfig,
    openings: Vec<Entry>,
    server: Vec<Entry>,
    overlays: OverlayMap,
    last_refresh: Option<DateTime<Utc>>,
}

impl<S: JournalStore> LedgerSession<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            openings: Vec::new(),
            server: Vec::new(),
            overlays: OverlayMap::default(),
            last_refresh: None,
        }
    }

    /// Seed the per-session opening balances (fetched once per company by
    /// an external collaborator).
    pub fn with_openings(mut self, openings: &[OpeningRecord]) -> Self {
        self.openings = normalize(openings, &[]);
        self
    }

    /// Initial fetch of server truth.
    pub fn bootstrap(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let fetched = self.store.list().map_err(SessionError::Fetch)?;
        self.server = entries_from_records(&fetched);
        self.last_refresh = Some(now);
        Ok(())
    }

    // -- mutations ----------------------------------------------------------

    /// Apply a local create/update/delete for one event and submit it to the
    /// store. An empty record set deletes the event; server rows for the key
    /// that the submitted set omits are deleted as well, so an edit can
    /// shrink an event. The overlay becomes visible immediately; a store
    /// failure rolls it back to the prior state and surfaces
    /// `MutationFailed`.
    pub fn apply_mutation(
        &mut self,
        key: EventKey,
        records: Vec<JournalRecord>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        validate_event(&key, &records)?;

        // Server rows for the key whose id the submitted set does not carry
        // are no longer wanted.
        let kept_ids: HashSet<&str> = records.iter().filter_map(|r| r.id.as_deref()).collect();
        let delete_ids: Vec<String> = self
            .server
            .iter()
            .filter(|e| e.event_key() == key)
            .filter_map(|e| e.id.clone())
            .filter(|id| !kept_ids.contains(id.as_str()))
            .collect();

        let prior = self.overlays.get(&key).cloned();
        self.overlays
            .apply(key.clone(), entries_from_records(&records), now);

        let result: Result<(), StoreError> = delete_ids
            .iter()
            .try_for_each(|id| self.store.delete(id))
            .and_then(|()| {
                records.iter().try_for_each(|record| match record.id.as_deref() {
                    Some(id) => self.store.update(id, record),
                    None => self.store.create(record).map(|_| ()),
                })
            });

        if let Err(source) = result {
            warn!("mutation for event '{key}' failed, rolling back overlay: {source}");
            match prior {
                Some(overlay) => self.overlays.restore(key.clone(), overlay),
                None => {
                    self.overlays.remove(&key);
                }
            }
            return Err(SessionError::MutationFailed {
                key: key.to_string(),
                source,
            });
        }
        Ok(())
    }

    // -- views --------------------------------------------------------------

    /// The reconciled transaction list: server truth with pending overlays
    /// replacing their keys' rows.
    pub fn visible_list(&self) -> Vec<VisibleEntry> {
        compose(&self.server, &self.overlays)
    }

    /// Projection input: openings plus the reconciled transaction list.
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.openings.clone();
        entries.extend(self.visible_list().into_iter().map(|v| v.entry));
        entries
    }

    /// Ledger view for one account scope over the reconciled entries.
    pub fn project(&self, scope: Option<&str>, accounts: &AccountDirectory) -> Projection {
        project(scope, &self.entries(), accounts)
    }

    pub fn overlay_state(&self, key: &EventKey) -> Option<OverlayState> {
        self.overlays.get(key).map(|o| o.state)
    }

    pub fn pending_count(&self) -> usize {
        self.overlays.len()
    }

    // -- reconciliation loop -------------------------------------------------

    /// Advance overlay machines; returns keys expired on this tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<EventKey> {
        self.overlays
            .tick(now, self.config.suppression(), self.config.confirm_timeout())
    }

    /// Whether the scheduler should start a background refresh now: the
    /// cadence has elapsed and no key sits inside its suppression window.
    pub fn should_refresh(&self, now: DateTime<Utc>) -> bool {
        if self
            .overlays
            .any_in_suppression(now, self.config.suppression())
        {
            return false;
        }
        match self.last_refresh {
            Some(at) => now - at >= self.config.refresh_interval(),
            None => true,
        }
    }

    /// Capture the state a refresh result will be validated against.
    pub fn begin_refresh(&self, now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            versions: self.overlays.versions(),
            started_at: now,
        }
    }

    /// Integrate a fetched journal list: replace the server snapshot,
    /// confirm pending keys the fetch proves, discard confirmations whose
    /// key was mutated after the fetch began.
    pub fn complete_refresh(
        &mut self,
        token: &RefreshToken,
        fetched: Vec<JournalRecord>,
        now: DateTime<Utc>,
    ) -> RefreshReport {
        let mut report = RefreshReport {
            expired: self.tick(now),
            ..RefreshReport::default()
        };

        let entries = entries_from_records(&fetched);

        let keys: Vec<EventKey> = self.overlays.keys().cloned().collect();
        for key in keys {
            let overlay = match self.overlays.get(&key) {
                Some(o) => o,
                None => continue,
            };
            match token.versions.get(&key) {
                Some(&version) if version == overlay.version => {
                    let on_server = entries.iter().any(|e| e.event_key() == key);
                    let confirmed = if overlay.is_deletion() {
                        !on_server
                    } else {
                        on_server
                    };
                    if confirmed {
                        self.overlays.remove(&key);
                        report.confirmed.push(key);
                    }
                }
                _ => {
                    // Mutated after the fetch began (or created mid-flight):
                    // this result must not clobber the newer edit.
                    warn!("discarding stale refresh result for event '{key}'");
                    report.stale.push(key);
                }
            }
        }

        self.server = entries;
        self.last_refresh = Some(now);
        report
    }

    /// One full refresh pass. A fetch failure leaves every overlay and the
    /// current snapshot untouched.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<RefreshReport, SessionError> {
        let token = self.begin_refresh(now);
        let fetched = self.store.list().map_err(SessionError::Fetch)?;
        Ok(self.complete_refresh(&token, fetched, now))
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// An event is acceptable when every line carries the event's identity and
/// an account reference, each line is one-sided, and debits equal credits.
/// An empty record set (deletion) is always acceptable.
fn validate_event(key: &EventKey, records: &[JournalRecord]) -> Result<(), SessionError> {
    let mut debit_total = 0i64;
    let mut credit_total = 0i64;

    for record in records {
        if record.date != key.date
            || record.document != key.document
            || record.description != key.description
        {
            return Err(SessionError::Validation(format!(
                "line does not belong to event '{key}'"
            )));
        }
        if record.account_id.is_empty() {
            return Err(SessionError::Validation(
                "line is missing an account reference".into(),
            ));
        }
        if record.debit < 0 || record.credit < 0 {
            return Err(SessionError::Validation("negative amount".into()));
        }
        match (record.debit > 0, record.credit > 0) {
            (true, true) => {
                return Err(SessionError::Validation(
                    "line carries both a debit and a credit".into(),
                ))
            }
            (false, false) => {
                return Err(SessionError::Validation("line carries no amount".into()))
            }
            _ => {}
        }
        debit_total += record.debit;
        credit_total += record.credit;
    }

    if debit_total != credit_total {
        return Err(SessionError::Validation(format!(
            "unbalanced event '{key}': debit {debit_total} != credit {credit_total}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(doc: &str) -> EventKey {
        EventKey {
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            document: doc.into(),
            description: format!("posting {doc}"),
        }
    }

    fn line(doc: &str, account: &str, debit: i64, credit: i64) -> JournalRecord {
        JournalRecord {
            id: None,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            document: doc.into(),
            description: format!("posting {doc}"),
            account_id: account.into(),
            sub_account_id: None,
            debit,
            credit,
        }
    }

    #[test]
    fn balanced_event_accepted() {
        let records = vec![
            line("JV-1", "cash", 200_000, 0),
            line("JV-1", "inventory", 100_000, 0),
            line("JV-1", "sales", 0, 300_000),
        ];
        assert!(validate_event(&key("JV-1"), &records).is_ok());
    }

    #[test]
    fn unbalanced_event_rejected() {
        let records = vec![
            line("JV-1", "cash", 200_000, 0),
            line("JV-1", "sales", 0, 300_000),
        ];
        let err = validate_event(&key("JV-1"), &records).unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[test]
    fn foreign_line_rejected() {
        let records = vec![line("JV-2", "cash", 100, 0), line("JV-1", "sales", 0, 100)];
        assert!(validate_event(&key("JV-1"), &records).is_err());
    }

    #[test]
    fn two_sided_line_rejected() {
        let records = vec![line("JV-1", "cash", 100, 100)];
        assert!(validate_event(&key("JV-1"), &records).is_err());
    }

    #[test]
    fn empty_line_rejected() {
        let records = vec![line("JV-1", "cash", 0, 0)];
        assert!(validate_event(&key("JV-1"), &records).is_err());
    }

    #[test]
    fn missing_account_rejected() {
        let records = vec![line("JV-1", "", 100, 0), line("JV-1", "sales", 0, 100)];
        assert!(validate_event(&key("JV-1"), &records).is_err());
    }

    #[test]
    fn deletion_is_always_valid() {
        assert!(validate_event(&key("JV-1"), &[]).is_ok());
    }
}
