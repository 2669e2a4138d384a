use std::collections::HashMap;

use super::Account;
use crate::model::AccountId;

/// Immutable view of every account at one instant.
///
/// New versions are built by copying the map and overwriting entries; the
/// source set is never touched.
#[derive(Debug, Default)]
pub struct AccountSet {
    accounts: HashMap<AccountId, Account>,
}

impl AccountSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate over accounts in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> + '_ {
        self.accounts.values()
    }

    /// A new set with `replacements` inserted over this one's accounts.
    /// Later entries with the same id win.
    pub fn new_version(&self, replacements: impl IntoIterator<Item = Account>) -> Self {
        let mut accounts = self.accounts.clone();
        for account in replacements {
            accounts.insert(account.id().to_string(), account);
        }
        Self { accounts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use rust_decimal_macros::dec;

    #[test]
    fn unknown_account_is_absent() {
        let set = AccountSet::new();
        assert!(set.get("foo").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn new_version_contains_new_account() {
        let set = AccountSet::new();
        let account = Account::new("new1");
        let next = set.new_version([account.clone(), account.clone()]);
        assert_eq!(next.get("new1"), Some(&account));
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn adding_does_not_touch_original() {
        let set = AccountSet::new();
        let _ = set.new_version([Account::new("new1")]);
        assert!(!set.contains("new1"));
    }

    #[test]
    fn replacement_overwrites_existing() {
        let set = AccountSet::new().new_version([Account::new("a"), Account::new("b")]);
        let credited = set.get("a").unwrap().adjust_balance(Amount::from(dec!(5))).unwrap();
        let next = set.new_version([credited]);

        assert_eq!(next.get("a").unwrap().balance(), Amount::from(dec!(5)));
        assert_eq!(next.get("b").unwrap().balance(), Amount::ZERO);
        assert_eq!(set.get("a").unwrap().balance(), Amount::ZERO);
    }

    #[test]
    fn iter_visits_every_account() {
        let set = AccountSet::new().new_version([Account::new("a"), Account::new("b")]);
        let mut ids: Vec<_> = set.iter().map(|a| a.id().to_string()).collect();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
    }
}
