use std::collections::HashSet;

use log::warn;

use crate::accounts::AccountDirectory;
use crate::classify::classify;
use crate::model::{Entry, LedgerRow, Projection, Totals};

/// Project entries into an ordered ledger view for one account scope.
///
/// Scope resolution: `Some(id)` selects that account; entries of descendant
/// accounts (by code prefix, or direct children by `parent_id`) roll up into
/// it. `None` selects everything.
///
/// Ordering: opening entries first in stable input order, then transactions
/// by date ascending with ties broken by resolved account code, then input
/// order. When more than one opening exists for the same (account,
/// sub-account) — a data anomaly — the first in input order is the opening
/// and the rest are ordered as ordinary transactions at period start.
///
/// The running balance folds `debit - credit` on a debit orientation and
/// the mirror on credit. With a scope, one side is classified for the scope
/// account and applies to every row; without one, each row folds on its own
/// account's classified side.
///
/// Total and never panics: entries referencing unknown accounts are
/// excluded with a warning, an unknown scope yields an empty projection.
pub fn project(
    scope: Option<&str>,
    entries: &[Entry],
    accounts: &AccountDirectory,
) -> Projection {
    let scope_account = match scope {
        Some(id) => match accounts.get(id) {
            Some(account) => Some(account),
            None => {
                warn!("projection scope references unknown account '{id}'");
                return Projection::default();
            }
        },
        None => None,
    };

    // Filter to scope, resolving each entry's hierarchical code.
    let mut rows: Vec<ScopedEntry> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(resolved) = accounts.resolve(entry) else {
            warn!(
                "excluding entry {:?}: unknown account '{}'",
                entry.id, entry.account_id
            );
            continue;
        };
        let in_scope = match scope_account {
            None => true,
            Some(acct) => {
                if entry.is_opening {
                    opening_in_scope(entry, &acct.id, accounts)
                } else {
                    resolved.code.starts_with(&acct.code)
                        || resolved.parent_id.as_deref() == Some(acct.id.as_str())
                }
            }
        };
        if in_scope {
            rows.push(ScopedEntry {
                entry: entry.clone(),
                resolved_id: resolved.id.clone(),
                code: resolved.code.clone(),
                index,
                rank: Rank::Dated,
            });
        }
    }

    // First opening per (account, sub-account) keeps its opening rank; the
    // remainder sort with the dated group (their NaiveDate::MIN date puts
    // them at period start).
    let mut seen_openings: HashSet<(String, Option<String>)> = HashSet::new();
    for row in rows.iter_mut() {
        if row.entry.is_opening
            && seen_openings.insert((
                row.entry.account_id.clone(),
                row.entry.sub_account_id.clone(),
            ))
        {
            row.rank = Rank::Opening;
        }
    }

    rows.sort_by(|a, b| {
        (a.rank, a.entry.date, &a.code, a.index).cmp(&(b.rank, b.entry.date, &b.code, b.index))
    });

    // Orientation for the fold.
    let scoped_entries: Vec<Entry> = rows.iter().map(|r| r.entry.clone()).collect();
    let scope_side = scope_account.map(|acct| classify(&acct.id, &acct.code, &scoped_entries));

    let mut balance = 0i64;
    let mut totals = Totals::default();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let side = match scope_side {
            Some(side) => side,
            None => classify(&row.resolved_id, &row.code, &scoped_entries),
        };
        balance += side.delta(row.entry.debit, row.entry.credit);
        totals.debit += row.entry.debit;
        totals.credit += row.entry.credit;
        out.push(LedgerRow {
            entry: row.entry,
            balance,
            side,
        });
    }
    totals.balance = balance;

    Projection { rows: out, totals }
}

/// An opening belongs to a scope only through a direct reference: its
/// account id, or its sub-account's parent, is the scope account.
fn opening_in_scope(entry: &Entry, scope_id: &str, accounts: &AccountDirectory) -> bool {
    if entry.account_id == scope_id {
        return true;
    }
    entry
        .sub_account_id
        .as_deref()
        .and_then(|sub_id| accounts.get(sub_id))
        .and_then(|sub| sub.parent_id.as_deref())
        == Some(scope_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Opening,
    Dated,
}

#[derive(Debug)]
struct ScopedEntry {
    entry: Entry,
    resolved_id: String,
    code: String,
    index: usize,
    rank: Rank,
}
