use std::collections::BTreeMap;

use crate::accounts::AccountDirectory;
use crate::classify::classify;
use crate::model::{Entry, IncomeStatement, Side, TrialBalanceRow};

/// Per-account debit/credit totals with the classified closing balance,
/// ordered by account code. Accounts with no entries are omitted.
pub fn trial_balance(entries: &[Entry], accounts: &AccountDirectory) -> Vec<TrialBalanceRow> {
    let mut sums: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for entry in entries {
        let Some(account) = accounts.resolve(entry) else {
            continue;
        };
        let sum = sums.entry(account.id.clone()).or_insert((0, 0));
        sum.0 += entry.debit;
        sum.1 += entry.credit;
    }

    accounts
        .in_code_order()
        .into_iter()
        .filter_map(|account| {
            let (debit, credit) = *sums.get(&account.id)?;
            let side = classify(&account.id, &account.code, entries);
            Some(TrialBalanceRow {
                account_id: account.id.clone(),
                code: account.code.clone(),
                name: account.name.clone(),
                debit,
                credit,
                side,
                balance: side.delta(debit, credit),
            })
        })
        .collect()
}

/// Revenue (code range 4) against expenses (code range 5), each summed on
/// its natural orientation.
pub fn income_statement(entries: &[Entry], accounts: &AccountDirectory) -> IncomeStatement {
    let mut statement = IncomeStatement::default();
    for row in trial_balance(entries, accounts) {
        match row.code.chars().next() {
            Some('4') => statement.revenue += Side::Credit.delta(row.debit, row.credit),
            Some('5') => statement.expense += Side::Debit.delta(row.debit, row.credit),
            _ => {}
        }
    }
    statement.net = statement.revenue - statement.expense;
    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Account;
    use chrono::NaiveDate;

    fn acct(id: &str, code: &str) -> Account {
        Account {
            id: id.into(),
            code: code.into(),
            name: format!("Account {code}"),
            parent_id: None,
        }
    }

    fn txn(account: &str, date: &str, debit: i64, credit: i64) -> Entry {
        Entry {
            id: Some(format!("t_{account}_{debit}_{credit}")),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            document: "JV-1".into(),
            description: "posting".into(),
            account_id: account.into(),
            sub_account_id: None,
            debit,
            credit,
            is_opening: false,
        }
    }

    fn dir() -> AccountDirectory {
        AccountDirectory::new(vec![
            acct("cash", "1100"),
            acct("sales", "4100"),
            acct("rent", "5200"),
        ])
    }

    #[test]
    fn rows_ordered_by_code_and_oriented() {
        let entries = vec![
            txn("sales", "2026-01-10", 0, 500_000),
            txn("cash", "2026-01-10", 500_000, 0),
            txn("cash", "2026-01-12", 0, 150_000),
            txn("rent", "2026-01-12", 150_000, 0),
        ];
        let rows = trial_balance(&entries, &dir());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].code, "1100");
        assert_eq!(rows[0].balance, 350_000); // debit-normal
        assert_eq!(rows[1].code, "4100");
        assert_eq!(rows[1].side, Side::Credit);
        assert_eq!(rows[1].balance, 500_000);
        assert_eq!(rows[2].code, "5200");
        assert_eq!(rows[2].balance, 150_000);
    }

    #[test]
    fn silent_accounts_omitted() {
        let entries = vec![txn("cash", "2026-01-10", 100, 0)];
        let rows = trial_balance(&entries, &dir());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_id, "cash");
    }

    #[test]
    fn income_statement_nets_revenue_against_expense() {
        let entries = vec![
            txn("sales", "2026-01-10", 0, 500_000),
            txn("rent", "2026-01-12", 150_000, 0),
        ];
        let statement = income_statement(&entries, &dir());
        assert_eq!(statement.revenue, 500_000);
        assert_eq!(statement.expense, 150_000);
        assert_eq!(statement.net, 350_000);
    }
}
