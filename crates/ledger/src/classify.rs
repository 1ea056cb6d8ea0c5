use crate::model::{Entry, Side};

/// Infer the normal-balance side for an account.
///
/// Pure and deterministic over its arguments: identical `(account_id, code,
/// entries)` always yields the identical side, so the result is safe to
/// memoize. Priority order:
///
/// 1. An opening entry for the account with debit != credit decides by the
///    larger magnitude.
/// 2. Else the chronologically earliest transaction decides by its positive
///    side; a single anomalous both-positive entry decides by the larger.
/// 3. Else the account-code range decides: leading digit 1 or 5 is debit
///    (assets, expenses), 2/3/4 is credit (liabilities, equity, revenue).
/// 4. Default: debit.
pub fn classify(account_id: &str, code: &str, entries: &[Entry]) -> Side {
    let mine: Vec<&Entry> = entries.iter().filter(|e| belongs(e, account_id)).collect();

    // Rule 1: opening magnitude
    if let Some(opening) = mine.iter().find(|e| e.is_opening) {
        if opening.debit != opening.credit {
            return if opening.debit > opening.credit {
                Side::Debit
            } else {
                Side::Credit
            };
        }
    }

    // Rule 2: earliest transaction sign. Stable input order breaks date ties.
    let earliest = mine
        .iter()
        .filter(|e| !e.is_opening)
        .min_by_key(|e| e.date);
    if let Some(e) = earliest {
        match (e.debit > 0, e.credit > 0) {
            (true, false) => return Side::Debit,
            (false, true) => return Side::Credit,
            (true, true) => {
                return if e.debit >= e.credit {
                    Side::Debit
                } else {
                    Side::Credit
                }
            }
            (false, false) => {} // unsaved placeholder, fall through
        }
    }

    // Rule 3: account-code range
    match code.chars().next() {
        Some('1') | Some('5') => Side::Debit,
        Some('2') | Some('3') | Some('4') => Side::Credit,
        _ => Side::Debit,
    }
}

fn belongs(entry: &Entry, account_id: &str) -> bool {
    entry.account_id == account_id || entry.sub_account_id.as_deref() == Some(account_id)
}
