//! Balance record for the internal point ledger.
//!
//! Every user owns exactly one `Balance`. The record is created together
//! with the account (there is no lazy creation on first use) and its amount
//! is kept at a fixed scale of two decimal places.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{UserId, constants};

/// The balance owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    /// The user that exclusively owns this balance.
    pub owner: UserId,
    /// Current amount, never negative, always at scale 2.
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a zero balance for `owner`.
    #[must_use]
    pub fn new(owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            amount: Decimal::new(0, constants::AMOUNT_SCALE),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the balance holds nothing.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Whether `amount` is representable in the ledger: strictly positive and
/// with no more than two significant decimal places.
#[must_use]
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount.normalize().scale() <= constants::AMOUNT_SCALE
}
