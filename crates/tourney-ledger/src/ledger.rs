//! Balance ledger with atomic debit/credit.
//!
//! Each account sits behind its own mutex, so operations on one user are
//! totally ordered while different users proceed in parallel. The account
//! map itself is only read-locked long enough to clone the account handle.
//!
//! Lock order, everywhere: account map → account → supply totals.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockWriteGuard};
use rust_decimal::Decimal;
use tourney_types::{
    Balance, Result, TourneyConfig, TourneyError, UserId, constants, is_valid_amount,
};

use crate::supply::SupplyConservation;

/// One ledger account. `closed` is set when the account is removed while
/// another thread still holds its handle.
#[derive(Debug)]
struct Account {
    balance: Balance,
    closed: bool,
}

/// Per-user balance store.
pub struct Ledger {
    accounts: RwLock<HashMap<UserId, Arc<Mutex<Account>>>>,
    supply: Mutex<SupplyConservation>,
    lock_timeout: Duration,
}

impl Ledger {
    /// Create an empty ledger whose per-user lock waits are bounded by
    /// `lock_timeout`.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            supply: Mutex::new(SupplyConservation::new()),
            lock_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &TourneyConfig) -> Self {
        Self::new(config.lock_timeout())
    }

    /// Open the account (and its zero balance) for a user.
    ///
    /// # Errors
    /// Returns [`TourneyError::AccountExists`] if the user already has one,
    /// `Busy` if the account map stayed locked past the timeout.
    pub fn open_account(&self, user_id: UserId) -> Result<Balance> {
        let mut accounts = self.write_accounts()?;
        if accounts.contains_key(&user_id) {
            return Err(TourneyError::AccountExists(user_id));
        }
        let balance = Balance::new(user_id);
        accounts.insert(
            user_id,
            Arc::new(Mutex::new(Account {
                balance: balance.clone(),
                closed: false,
            })),
        );
        tracing::info!(user = %user_id, "Account opened");
        Ok(balance)
    }

    /// Close a user's account. Whatever is left on it is written off.
    ///
    /// # Errors
    /// - `UserNotFound` if there is no such account
    /// - `Busy` if the account map or the account lock could not be taken
    ///   in time
    pub fn close_account(&self, user_id: UserId) -> Result<Decimal> {
        let mut accounts = self.write_accounts()?;
        let handle = accounts
            .get(&user_id)
            .cloned()
            .ok_or(TourneyError::UserNotFound(user_id))?;
        let mut account = self.lock(user_id, &handle)?;
        accounts.remove(&user_id);

        account.closed = true;
        let remaining = account.balance.amount;
        self.supply.lock().record_write_off(remaining);

        tracing::info!(user = %user_id, written_off = %remaining, "Account closed");
        Ok(remaining)
    }

    /// Increase a balance. There is no upper bound.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is not positive or has more than two
    ///   decimal places
    /// - `UserNotFound`, `Busy`
    pub fn credit(&self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        Self::check_amount(amount)?;
        let handle = self.account(user_id)?;
        let mut account = self.lock(user_id, &handle)?;
        if account.closed {
            return Err(TourneyError::UserNotFound(user_id));
        }

        let mut new_amount = account
            .balance
            .amount
            .checked_add(amount)
            .ok_or_else(|| TourneyError::Internal(format!("balance overflow for {user_id}")))?;
        new_amount.rescale(constants::AMOUNT_SCALE);
        account.balance.amount = new_amount;
        account.balance.updated_at = Utc::now();
        self.supply.lock().record_credit(amount);

        tracing::debug!(user = %user_id, amount = %amount, balance = %new_amount, "Balance credited");
        Ok(new_amount)
    }

    /// Decrease a balance, refusing to go below zero.
    ///
    /// The check and the subtraction happen under the account lock, so two
    /// concurrent debits can never both pass against the same funds.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is not positive or has more than two
    ///   decimal places
    /// - `InsufficientFunds` if the balance is smaller than `amount`
    /// - `UserNotFound`, `Busy`
    pub fn debit(&self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        Self::check_amount(amount)?;
        let handle = self.account(user_id)?;
        let mut account = self.lock(user_id, &handle)?;
        if account.closed {
            return Err(TourneyError::UserNotFound(user_id));
        }

        if account.balance.amount < amount {
            tracing::debug!(
                user = %user_id,
                needed = %amount,
                available = %account.balance.amount,
                "Debit refused: insufficient funds"
            );
            return Err(TourneyError::InsufficientFunds {
                needed: amount,
                available: account.balance.amount,
            });
        }

        let mut new_amount = account.balance.amount - amount;
        new_amount.rescale(constants::AMOUNT_SCALE);
        account.balance.amount = new_amount;
        account.balance.updated_at = Utc::now();
        self.supply.lock().record_debit(amount);

        tracing::debug!(user = %user_id, amount = %amount, balance = %new_amount, "Balance debited");
        Ok(new_amount)
    }

    /// Current amount on a user's balance.
    ///
    /// # Errors
    /// `UserNotFound`, `Busy`
    pub fn get_balance(&self, user_id: UserId) -> Result<Decimal> {
        self.balance(user_id).map(|balance| balance.amount)
    }

    /// Snapshot of a user's balance record.
    ///
    /// # Errors
    /// `UserNotFound`, `Busy`
    pub fn balance(&self, user_id: UserId) -> Result<Balance> {
        let handle = self.account(user_id)?;
        let account = self.lock(user_id, &handle)?;
        if account.closed {
            return Err(TourneyError::UserNotFound(user_id));
        }
        Ok(account.balance.clone())
    }

    /// Whether the user has an open account.
    #[must_use]
    pub fn has_account(&self, user_id: UserId) -> bool {
        self.accounts.read().contains_key(&user_id)
    }

    /// Number of open accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    /// Check the supply conservation invariant against a consistent snapshot
    /// of every open balance.
    ///
    /// # Errors
    /// - `SupplyInvariantViolation` if the totals do not add up
    /// - `Busy` if some account stayed locked past the timeout
    pub fn audit(&self) -> Result<Decimal> {
        let accounts = self.accounts.read();
        let mut guards = Vec::with_capacity(accounts.len());
        for (user_id, handle) in accounts.iter() {
            guards.push(self.lock(*user_id, handle)?);
        }
        let actual: Decimal = guards.iter().map(|account| account.balance.amount).sum();

        let supply = self.supply.lock();
        if let Err(err) = supply.verify(actual) {
            tracing::error!(error = %err, "Ledger audit failed");
            return Err(err);
        }
        tracing::debug!(accounts = guards.len(), supply = %actual, "Ledger audit passed");
        Ok(actual)
    }

    fn check_amount(amount: Decimal) -> Result<()> {
        if is_valid_amount(amount) {
            Ok(())
        } else {
            Err(TourneyError::InvalidAmount(amount))
        }
    }

    fn account(&self, user_id: UserId) -> Result<Arc<Mutex<Account>>> {
        self.accounts
            .read()
            .get(&user_id)
            .cloned()
            .ok_or(TourneyError::UserNotFound(user_id))
    }

    fn write_accounts(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<UserId, Arc<Mutex<Account>>>>> {
        self.accounts.try_write_for(self.lock_timeout).ok_or_else(|| {
            tracing::warn!(timeout = ?self.lock_timeout, "Account map lock timed out");
            TourneyError::Busy {
                resource: "account map".to_string(),
            }
        })
    }

    fn lock<'a>(&self, user_id: UserId, handle: &'a Mutex<Account>) -> Result<MutexGuard<'a, Account>> {
        handle.try_lock_for(self.lock_timeout).ok_or_else(|| {
            tracing::warn!(user = %user_id, timeout = ?self.lock_timeout, "Account lock timed out");
            TourneyError::Busy {
                resource: format!("balance of {user_id}"),
            }
        })
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::from_config(&TourneyConfig::default())
    }
}
