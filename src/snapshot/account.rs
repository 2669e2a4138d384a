use crate::Amount;
use crate::amount::AmountOverflow;
use crate::model::AccountId;

/// One account at one point in time. Adjusting produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    balance: Amount,
}

impl Account {
    /// A fresh account with a zero balance.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            balance: Amount::ZERO,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Copy of this account with `delta` applied. No floor is enforced.
    pub(crate) fn adjust_balance(&self, delta: Amount) -> Result<Self, AmountOverflow> {
        Ok(Self {
            id: self.id.clone(),
            balance: self.balance.checked_add(delta)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stores_id() {
        let account = Account::new("asdf");
        assert_eq!(account.id(), "asdf");
    }

    #[test]
    fn starts_with_zero_balance() {
        assert_eq!(Account::new("test").balance(), Amount::ZERO);
    }

    #[test]
    fn adjusting_leaves_original_unchanged() {
        let account = Account::new("test");
        let _ = account.adjust_balance(Amount::from(dec!(1))).unwrap();
        assert_eq!(account.balance(), Amount::ZERO);
    }

    #[test]
    fn adjusts_positively_and_negatively() {
        let account = Account::new("test");
        let up = account.adjust_balance(Amount::from(dec!(1))).unwrap();
        let down = account.adjust_balance(Amount::from(dec!(-1))).unwrap();
        assert_eq!(up.balance(), Amount::from(dec!(1)));
        assert_eq!(down.balance(), Amount::from(dec!(-1)));
        assert_eq!(down.id(), "test");
    }

    #[test]
    fn refuses_adjustment_that_would_round() {
        let account = Account::new("test")
            .adjust_balance(Amount::from(dec!(10000000000000000000000000000)))
            .unwrap();
        assert!(account.adjust_balance(Amount::from(dec!(0.1))).is_err());
        assert_eq!(
            account.balance(),
            Amount::from(dec!(10000000000000000000000000000))
        );
    }
}
