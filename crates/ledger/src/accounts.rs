use std::collections::BTreeMap;

use crate::model::{Account, Entry};

/// Session-scoped chart-of-accounts cache.
///
/// Owned explicitly and passed by reference into the projector and session;
/// `reload` is the one invalidation path. Iteration order is code order.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    by_id: BTreeMap<String, Account>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        let mut dir = Self::default();
        dir.reload(accounts);
        dir
    }

    /// Replace the cached chart of accounts wholesale.
    pub fn reload(&mut self, accounts: Vec<Account>) {
        self.by_id = accounts.into_iter().map(|a| (a.id.clone(), a)).collect();
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// The account an entry resolves to for code comparisons: the
    /// sub-account when one is referenced and known, else the main account.
    /// `None` when neither reference is in the directory.
    pub fn resolve(&self, entry: &Entry) -> Option<&Account> {
        if let Some(ref sub_id) = entry.sub_account_id {
            if let Some(sub) = self.by_id.get(sub_id) {
                return Some(sub);
            }
        }
        self.by_id.get(&entry.account_id)
    }

    /// Resolved hierarchical code for an entry, if its account is known.
    pub fn code_of(&self, entry: &Entry) -> Option<&str> {
        self.resolve(entry).map(|a| a.code.as_str())
    }

    /// All accounts whose code falls under `prefix`, in code order.
    pub fn descendants_of(&self, prefix: &str) -> Vec<&Account> {
        let mut out: Vec<&Account> = self
            .by_id
            .values()
            .filter(|a| a.code.starts_with(prefix))
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    /// Accounts ordered by code, for report iteration.
    pub fn in_code_order(&self) -> Vec<&Account> {
        let mut out: Vec<&Account> = self.by_id.values().collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn acct(id: &str, code: &str, parent: Option<&str>) -> Account {
        Account {
            id: id.into(),
            code: code.into(),
            name: format!("Account {code}"),
            parent_id: parent.map(|p| p.to_string()),
        }
    }

    fn entry(account_id: &str, sub: Option<&str>) -> Entry {
        Entry {
            id: None,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            document: "JV-1".into(),
            description: "test".into(),
            account_id: account_id.into(),
            sub_account_id: sub.map(|s| s.to_string()),
            debit: 100,
            credit: 0,
            is_opening: false,
        }
    }

    #[test]
    fn resolve_prefers_sub_account() {
        let dir = AccountDirectory::new(vec![
            acct("a1", "1100", None),
            acct("a2", "1101", Some("a1")),
        ]);
        let e = entry("a1", Some("a2"));
        assert_eq!(dir.resolve(&e).unwrap().code, "1101");
        assert_eq!(dir.code_of(&e), Some("1101"));
    }

    #[test]
    fn resolve_falls_back_to_main_account() {
        let dir = AccountDirectory::new(vec![acct("a1", "1100", None)]);
        // sub-account id not in directory
        let e = entry("a1", Some("ghost"));
        assert_eq!(dir.code_of(&e), Some("1100"));
    }

    #[test]
    fn resolve_unknown_is_none() {
        let dir = AccountDirectory::new(vec![acct("a1", "1100", None)]);
        assert!(dir.resolve(&entry("nope", None)).is_none());
    }

    #[test]
    fn descendants_by_prefix() {
        let dir = AccountDirectory::new(vec![
            acct("a1", "11", None),
            acct("a2", "1101", Some("a1")),
            acct("a3", "1102", Some("a1")),
            acct("a4", "2101", None),
        ]);
        let descendants = dir.descendants_of("11");
        assert_eq!(descendants.len(), 3);
        assert_eq!(descendants[0].code, "11");
        assert_eq!(descendants[2].code, "1102");
    }

    #[test]
    fn reload_replaces_contents() {
        let mut dir = AccountDirectory::new(vec![acct("a1", "1100", None)]);
        dir.reload(vec![acct("b1", "2100", None)]);
        assert!(dir.get("a1").is_none());
        assert_eq!(dir.get("b1").unwrap().code, "2100");
    }
}
