use chrono::NaiveDate;
use log::warn;

use crate::model::{Entry, JournalRecord, OpeningRecord};

/// Label carried by normalized opening-balance entries.
pub const OPENING_DESCRIPTION: &str = "Opening balance";

/// Merge opening-balance and transaction records into one entry sequence.
///
/// Order-preserving: openings first in input order, then transactions in
/// input order. Opening entries get `NaiveDate::MIN` as their date so they
/// sort before any real transaction; projection orders them by the
/// `is_opening` flag anyway. Records without an account reference are
/// dropped with a warning, never an error.
pub fn normalize(openings: &[OpeningRecord], txns: &[JournalRecord]) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(openings.len() + txns.len());

    for rec in openings {
        if rec.account_id.is_empty() {
            warn!("dropping opening record without account reference");
            continue;
        }
        entries.push(Entry {
            id: None,
            date: NaiveDate::MIN,
            document: String::new(),
            description: OPENING_DESCRIPTION.to_string(),
            account_id: rec.account_id.clone(),
            sub_account_id: rec.sub_account_id.clone(),
            debit: rec.debit,
            credit: rec.credit,
            is_opening: true,
        });
    }

    for rec in txns {
        if rec.account_id.is_empty() {
            warn!(
                "dropping transaction record {:?} without account reference",
                rec.id
            );
            continue;
        }
        entries.push(entry_from_record(rec));
    }

    entries
}

/// Normalize a single transaction record. Used by the session when folding
/// fetched journal rows into the server snapshot.
pub fn entry_from_record(rec: &JournalRecord) -> Entry {
    Entry {
        id: rec.id.clone(),
        date: rec.date,
        document: rec.document.clone(),
        description: rec.description.clone(),
        account_id: rec.account_id.clone(),
        sub_account_id: rec.sub_account_id.clone(),
        debit: rec.debit,
        credit: rec.credit,
        is_opening: false,
    }
}

/// Normalize a list of transaction records, dropping rows without an
/// account reference.
pub fn entries_from_records(records: &[JournalRecord]) -> Vec<Entry> {
    normalize(&[], records)
}
