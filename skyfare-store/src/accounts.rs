use skyfare_core::reservation::UserAccount;
use skyfare_core::BookingError;
use std::collections::HashMap;

/// In-memory account balances, keyed by username.
///
/// Callers serialize access; debits and credits are applied against the
/// current balance with no partial states.
pub struct BalanceLedger {
    accounts: HashMap<String, UserAccount>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Create an account with an initial balance.
    pub fn create(&mut self, username: &str, password: &str, balance: i32) -> Result<(), AccountError> {
        if balance < 0 {
            return Err(AccountError::NegativeBalance(balance));
        }
        if self.accounts.contains_key(username) {
            return Err(AccountError::Duplicate(username.to_string()));
        }
        self.accounts.insert(
            username.to_string(),
            UserAccount {
                username: username.to_string(),
                password: password.to_string(),
                balance,
            },
        );
        Ok(())
    }

    /// True if the username/password pair matches a stored account.
    /// Plaintext comparison; credential hardening is out of scope.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.accounts
            .get(username)
            .is_some_and(|a| a.password == password)
    }

    pub fn balance(&self, username: &str) -> Result<i32, AccountError> {
        self.accounts
            .get(username)
            .map(|a| a.balance)
            .ok_or_else(|| AccountError::NotFound(username.to_string()))
    }

    /// Remove `amount` from the account, returning the remaining balance.
    pub fn debit(&mut self, username: &str, amount: i32) -> Result<i32, AccountError> {
        let account = self.get_account_mut(username)?;
        if account.balance < amount {
            return Err(AccountError::Insufficient {
                balance: account.balance,
                amount,
            });
        }
        account.balance -= amount;
        Ok(account.balance)
    }

    /// Add `amount` to the account, returning the new balance.
    pub fn credit(&mut self, username: &str, amount: i32) -> Result<i32, AccountError> {
        let account = self.get_account_mut(username)?;
        account.balance += amount;
        Ok(account.balance)
    }

    fn get_account_mut(&mut self, username: &str) -> Result<&mut UserAccount, AccountError> {
        self.accounts
            .get_mut(username)
            .ok_or_else(|| AccountError::NotFound(username.to_string()))
    }
}

impl Default for BalanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account already exists: {0}")]
    Duplicate(String),

    #[error("Initial balance must be non-negative, got {0}")]
    NegativeBalance(i32),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Balance {balance} does not cover {amount}")]
    Insufficient { balance: i32, amount: i32 },
}

impl From<AccountError> for BookingError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Duplicate(_) => BookingError::DuplicateUser,
            AccountError::NegativeBalance(_) => BookingError::InvalidInitialBalance,
            AccountError::Insufficient { balance, amount } => BookingError::InsufficientFunds {
                balance,
                cost: amount,
            },
            AccountError::NotFound(user) => {
                BookingError::Unavailable(format!("account missing: {}", user))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_lifecycle() {
        let mut ledger = BalanceLedger::new();
        ledger.create("amy", "pw", 1000).unwrap();

        assert!(ledger.verify("amy", "pw"));
        assert!(!ledger.verify("amy", "wrong"));
        assert!(!ledger.verify("bob", "pw"));

        assert_eq!(ledger.debit("amy", 400).unwrap(), 600);
        assert_eq!(ledger.credit("amy", 150).unwrap(), 750);
        assert_eq!(ledger.balance("amy").unwrap(), 750);
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let mut ledger = BalanceLedger::new();
        ledger.create("amy", "pw", 0).unwrap();
        assert!(matches!(
            ledger.create("amy", "other", 10),
            Err(AccountError::Duplicate(_))
        ));
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let mut ledger = BalanceLedger::new();
        assert!(matches!(
            ledger.create("amy", "pw", -1),
            Err(AccountError::NegativeBalance(-1))
        ));
    }

    #[test]
    fn test_debit_never_overdraws() {
        let mut ledger = BalanceLedger::new();
        ledger.create("amy", "pw", 100).unwrap();
        let err = ledger.debit("amy", 250).unwrap_err();
        assert!(matches!(
            err,
            AccountError::Insufficient {
                balance: 100,
                amount: 250
            }
        ));
        assert_eq!(ledger.balance("amy").unwrap(), 100);
    }
}
