//! Registration engine: joining and leaving tournaments, kill rewards.
//!
//! Per (tournament, user) pair the engine is a two-state machine:
//! **NOT_REGISTERED ⇄ REGISTERED**.
//!
//! A join runs entirely under the tournament's lock:
//! 1. Gate: status OPEN and registration flag set
//! 2. Reject duplicates
//! 3. Reject when the participant set is at `max_limit`
//! 4. Debit the entry fee from the ledger
//! 5. Insert the user
//!
//! Step 5 cannot fail once step 4 succeeded, and nothing else can touch the
//! participant set in between, so a join either pays *and* registers or
//! does neither. Concurrent joins near capacity are serialized by the same
//! lock and can never overshoot `max_limit`.

use std::sync::Arc;

use rust_decimal::Decimal;
use tourney_ledger::Ledger;
use tourney_types::{Result, TournamentId, TourneyError, UserId};

use crate::table::TournamentTable;

/// Drives participant-set changes and kill payouts.
pub struct RegistrationEngine {
    table: Arc<TournamentTable>,
    ledger: Arc<Ledger>,
}

impl RegistrationEngine {
    #[must_use]
    pub fn new(table: Arc<TournamentTable>, ledger: Arc<Ledger>) -> Self {
        Self { table, ledger }
    }

    /// Register `user_id` in a tournament, paying its entry fee.
    ///
    /// Returns the new participant count.
    ///
    /// # Errors
    /// - `TournamentNotFound`
    /// - `RegistrationClosed` if the status is not OPEN or the flag is off
    /// - `AlreadyRegistered`
    /// - `CapacityFull`
    /// - `UserNotFound` if the user has no ledger account
    /// - `InsufficientFunds`, propagated unchanged from the ledger
    /// - `Busy` on lock timeout
    pub fn join(&self, tournament_id: TournamentId, user_id: UserId) -> Result<u32> {
        self.table.with_locked(tournament_id, |tournament| {
            if !tournament.accepts_registrations() {
                return Err(TourneyError::RegistrationClosed(tournament_id));
            }
            if tournament.participants.contains(&user_id) {
                return Err(TourneyError::AlreadyRegistered {
                    tournament: tournament_id,
                    user: user_id,
                });
            }
            if tournament.is_full() {
                return Err(TourneyError::CapacityFull {
                    max: tournament.max_limit,
                });
            }
            if !self.ledger.has_account(user_id) {
                return Err(TourneyError::UserNotFound(user_id));
            }

            if tournament.fee > 0 {
                self.ledger.debit(user_id, tournament.fee_amount())?;
            }
            tournament.participants.insert(user_id);
            tournament.touch();

            let count = tournament.participant_count();
            tracing::info!(
                tournament = %tournament_id,
                user = %user_id,
                fee = tournament.fee,
                participants = count,
                max = tournament.max_limit,
                "User joined tournament"
            );
            Ok(count)
        })
    }

    /// Remove `user_id` from a tournament. The entry fee is not refunded.
    ///
    /// Returns the remaining participant count.
    ///
    /// # Errors
    /// - `TournamentNotFound`
    /// - `NotRegistered`
    /// - `RegistrationClosed` once the participant set is frozen
    /// - `Busy`
    pub fn leave(&self, tournament_id: TournamentId, user_id: UserId) -> Result<u32> {
        self.table.with_locked(tournament_id, |tournament| {
            if !tournament.participants.contains(&user_id) {
                return Err(TourneyError::NotRegistered {
                    tournament: tournament_id,
                    user: user_id,
                });
            }
            if !tournament.accepts_registrations() {
                return Err(TourneyError::RegistrationClosed(tournament_id));
            }

            tournament.participants.remove(&user_id);
            tournament.touch();

            let count = tournament.participant_count();
            tracing::info!(
                tournament = %tournament_id,
                user = %user_id,
                participants = count,
                "User left tournament"
            );
            Ok(count)
        })
    }

    /// Pay the tournament's kill reward to a participant.
    ///
    /// Returns the killer's new balance. There is no inverse operation.
    ///
    /// # Errors
    /// - `TournamentNotFound`
    /// - `NotRegistered` if the killer is not a participant
    /// - `UserNotFound`, `Busy` from the ledger
    pub fn record_kill(&self, tournament_id: TournamentId, killer_id: UserId) -> Result<Decimal> {
        self.table.with_locked(tournament_id, |tournament| {
            if !tournament.participants.contains(&killer_id) {
                return Err(TourneyError::NotRegistered {
                    tournament: tournament_id,
                    user: killer_id,
                });
            }

            let reward = tournament.reward_per_kill;
            let balance = if reward.is_zero() {
                self.ledger.get_balance(killer_id)?
            } else {
                self.ledger.credit(killer_id, reward)?
            };

            tracing::info!(
                tournament = %tournament_id,
                killer = %killer_id,
                reward = %reward,
                balance = %balance,
                "Kill recorded"
            );
            Ok(balance)
        })
    }

    /// Current participant count.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn participant_count(&self, tournament_id: TournamentId) -> Result<u32> {
        self.table
            .with_locked(tournament_id, |tournament| Ok(tournament.participant_count()))
    }

    /// The participant set, in no particular order.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn participants(&self, tournament_id: TournamentId) -> Result<Vec<UserId>> {
        self.table.with_locked(tournament_id, |tournament| {
            Ok(tournament.participants.iter().copied().collect())
        })
    }

    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn is_registered(&self, tournament_id: TournamentId, user_id: UserId) -> Result<bool> {
        self.table.with_locked(tournament_id, |tournament| {
            Ok(tournament.participants.contains(&user_id))
        })
    }
}
