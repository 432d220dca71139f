//! Supply conservation invariant checker.
//!
//! Invariant enforced by [`crate::Ledger::audit`]:
//! ```text
//! Σ(open balances) == Σ(credits) - Σ(debits) - Σ(written off by closed accounts)
//! ```
//!
//! Points only enter the system through credits and only leave through
//! debits or account closure. If the sum of balances drifts from that, a
//! mutation was lost or applied twice.

use rust_decimal::Decimal;
use tourney_types::{Result, TourneyError};

/// Running totals of every ledger movement.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    credited: Decimal,
    debited: Decimal,
    written_off: Decimal,
}

impl SupplyConservation {
    /// Create a tracker with all totals at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_credit(&mut self, amount: Decimal) {
        self.credited += amount;
    }

    pub fn record_debit(&mut self, amount: Decimal) {
        self.debited += amount;
    }

    /// Record the remaining amount of an account that was closed.
    pub fn record_write_off(&mut self, amount: Decimal) {
        self.written_off += amount;
    }

    #[must_use]
    pub fn total_credited(&self) -> Decimal {
        self.credited
    }

    #[must_use]
    pub fn total_debited(&self) -> Decimal {
        self.debited
    }

    /// What the open balances must add up to.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.credited - self.debited - self.written_off
    }

    /// Compare the actual sum of open balances against the expected supply.
    ///
    /// # Errors
    /// Returns [`TourneyError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(TourneyError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {expected} \
                     (credited={}, debited={}, written_off={})",
                    self.credited, self.debited, self.written_off
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 2)
    }

    #[test]
    fn empty_tracker_expects_zero() {
        let supply = SupplyConservation::new();
        assert_eq!(supply.expected_supply(), Decimal::ZERO);
        assert!(supply.verify(Decimal::ZERO).is_ok());
    }

    #[test]
    fn movements_accumulate() {
        let mut supply = SupplyConservation::new();
        supply.record_credit(dec(10_000));
        supply.record_debit(dec(2_550));
        supply.record_write_off(dec(450));
        assert_eq!(supply.expected_supply(), dec(7_000));
        assert_eq!(supply.total_credited(), dec(10_000));
        assert_eq!(supply.total_debited(), dec(2_550));
        assert!(supply.verify(dec(7_000)).is_ok());
    }

    #[test]
    fn mismatch_is_reported() {
        let mut supply = SupplyConservation::new();
        supply.record_credit(dec(500));
        let err = supply.verify(dec(1_000)).unwrap_err();
        assert!(matches!(err, TourneyError::SupplyInvariantViolation { .. }));
        assert!(err.to_string().contains("TOURNEY_ERR_902"));
    }
}
