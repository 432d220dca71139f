//! Tournament lifecycle: status transitions and the registration flag.
//!
//! ```text
//! MODERATION ──▶ OPEN ──▶ ONGOING ──▶ FINISHED
//!                  │          │
//!                  └──────────┴──▶ CANCELED
//! ```
//!
//! Transitions are one-way. Leaving OPEN freezes the participant set: the
//! registration engine refuses joins and leaves whenever the status is not
//! OPEN, so no separate lock is needed.

use std::sync::Arc;

use tourney_types::{Result, TournamentId, TournamentStatus, TourneyError};

use crate::table::TournamentTable;

/// Drives status changes for stored tournaments.
pub struct TournamentLifecycle {
    table: Arc<TournamentTable>,
}

impl TournamentLifecycle {
    #[must_use]
    pub fn new(table: Arc<TournamentTable>) -> Self {
        Self { table }
    }

    /// Move a tournament to `next`. Returns the previous status.
    ///
    /// # Errors
    /// - `TournamentNotFound`
    /// - `InvalidTransition` if `next` is not reachable from the current status
    /// - `Busy`
    pub fn transition(
        &self,
        tournament_id: TournamentId,
        next: TournamentStatus,
    ) -> Result<TournamentStatus> {
        self.table.with_locked(tournament_id, |tournament| {
            let current = tournament.status;
            if !current.can_transition_to(next) {
                tracing::debug!(
                    tournament = %tournament_id,
                    from = %current,
                    to = %next,
                    "Transition refused"
                );
                return Err(TourneyError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
            tournament.status = next;
            tournament.touch();
            tracing::info!(
                tournament = %tournament_id,
                from = %current,
                to = %next,
                participants = tournament.participant_count(),
                "Tournament status changed"
            );
            Ok(current)
        })
    }

    /// Start an OPEN tournament, refusing if it is below `min_limit`.
    ///
    /// # Errors
    /// - `NotEnoughParticipants`
    /// - everything [`Self::transition`] returns
    pub fn start(&self, tournament_id: TournamentId) -> Result<()> {
        self.table.with_locked(tournament_id, |tournament| {
            let current = tournament.status;
            if !current.can_transition_to(TournamentStatus::Ongoing) {
                return Err(TourneyError::InvalidTransition {
                    from: current,
                    to: TournamentStatus::Ongoing,
                });
            }
            if !tournament.meets_minimum() {
                return Err(TourneyError::NotEnoughParticipants {
                    needed: tournament.min_limit,
                    have: tournament.participant_count(),
                });
            }
            tournament.status = TournamentStatus::Ongoing;
            tournament.touch();
            tracing::info!(
                tournament = %tournament_id,
                participants = tournament.participant_count(),
                "Tournament started"
            );
            Ok(())
        })
    }

    /// Pause or resume intake without changing the status.
    ///
    /// # Errors
    /// - `TournamentNotFound`
    /// - `RegistrationClosed` if the tournament already reached a terminal status
    /// - `Busy`
    pub fn set_registration_open(&self, tournament_id: TournamentId, open: bool) -> Result<()> {
        self.table.with_locked(tournament_id, |tournament| {
            if tournament.status.is_terminal() {
                return Err(TourneyError::RegistrationClosed(tournament_id));
            }
            if tournament.registration_open != open {
                tournament.registration_open = open;
                tournament.touch();
                tracing::info!(tournament = %tournament_id, open, "Registration flag changed");
            }
            Ok(())
        })
    }

    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn status(&self, tournament_id: TournamentId) -> Result<TournamentStatus> {
        self.table
            .with_locked(tournament_id, |tournament| Ok(tournament.status))
    }
}
