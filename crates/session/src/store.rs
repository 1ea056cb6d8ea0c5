use std::fmt;

use ledgerbook_ledger::model::JournalRecord;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure. Recoverable; the caller may retry.
    Network(String),
    /// The store refused the operation (unknown id, constraint violation).
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected by store: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// The authoritative journal entry store. Transport is the implementor's
/// concern; the session only needs these four calls.
pub trait JournalStore {
    fn list(&mut self) -> Result<Vec<JournalRecord>, StoreError>;
    /// Returns the id the store assigned.
    fn create(&mut self, record: &JournalRecord) -> Result<String, StoreError>;
    fn update(&mut self, id: &str, record: &JournalRecord) -> Result<(), StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory store with failure injection, for tests and examples.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<JournalRecord>,
    next_id: u64,
    /// Fail the next `list` calls with a network error.
    pub fail_list: bool,
    /// Fail all mutation calls with a network error.
    pub fail_mutations: bool,
    /// Accept mutations but silently drop them (simulates a server that
    /// acknowledges writes it never applies).
    pub drop_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(records: Vec<JournalRecord>) -> Self {
        let mut store = Self::new();
        for mut record in records {
            if record.id.is_none() {
                record.id = Some(store.assign_id());
            }
            store.records.push(record);
        }
        store
    }

    pub fn records(&self) -> &[JournalRecord] {
        &self.records
    }

    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("srv_{}", self.next_id)
    }

    fn check_mutation(&self) -> Result<(), StoreError> {
        if self.fail_mutations {
            return Err(StoreError::Network("connection reset".into()));
        }
        Ok(())
    }
}

impl JournalStore for MemoryStore {
    fn list(&mut self) -> Result<Vec<JournalRecord>, StoreError> {
        if self.fail_list {
            return Err(StoreError::Network("connection reset".into()));
        }
        Ok(self.records.clone())
    }

    fn create(&mut self, record: &JournalRecord) -> Result<String, StoreError> {
        self.check_mutation()?;
        let id = self.assign_id();
        if !self.drop_writes {
            let mut stored = record.clone();
            stored.id = Some(id.clone());
            self.records.push(stored);
        }
        Ok(id)
    }

    fn update(&mut self, id: &str, record: &JournalRecord) -> Result<(), StoreError> {
        self.check_mutation()?;
        if self.drop_writes {
            return Ok(());
        }
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::Rejected(format!("no entry with id '{id}'")))?;
        let mut stored = record.clone();
        stored.id = Some(id.to_string());
        *slot = stored;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.check_mutation()?;
        if self.drop_writes {
            return Ok(());
        }
        let before = self.records.len();
        self.records.retain(|r| r.id.as_deref() != Some(id));
        if self.records.len() == before {
            return Err(StoreError::Rejected(format!("no entry with id '{id}'")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(doc: &str, debit: i64, credit: i64) -> JournalRecord {
        JournalRecord {
            id: None,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            document: doc.into(),
            description: format!("posting {doc}"),
            account_id: "cash".into(),
            sub_account_id: None,
            debit,
            credit,
        }
    }

    #[test]
    fn create_assigns_ids_and_lists() {
        let mut store = MemoryStore::new();
        let id = store.create(&record("JV-1", 100, 0)).unwrap();
        assert_eq!(id, "srv_1");
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_deref(), Some("srv_1"));
    }

    #[test]
    fn update_unknown_id_rejected() {
        let mut store = MemoryStore::new();
        let err = store.update("srv_9", &record("JV-1", 100, 0)).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[test]
    fn delete_removes() {
        let mut store = MemoryStore::seeded(vec![record("JV-1", 100, 0)]);
        store.delete("srv_1").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn failure_injection() {
        let mut store = MemoryStore::new();
        store.fail_list = true;
        assert!(matches!(store.list(), Err(StoreError::Network(_))));
        store.fail_mutations = true;
        assert!(matches!(
            store.create(&record("JV-1", 100, 0)),
            Err(StoreError::Network(_))
        ));
    }

    #[test]
    fn dropped_writes_acknowledge_but_vanish() {
        let mut store = MemoryStore::new();
        store.drop_writes = true;
        let id = store.create(&record("JV-1", 100, 0)).unwrap();
        assert_eq!(id, "srv_1");
        assert!(store.list().unwrap().is_empty());
    }
}
