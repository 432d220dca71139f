//! The public face of the core: every operation an outer layer (HTTP, admin
//! tooling) may call.
//!
//! The service wires the components together and adds the existence checks
//! against the external user and game directory:
//!
//! ```text
//! create_tournament ──▶ IdAllocator ──▶ TournamentTable
//! join / leave / record_kill ──▶ RegistrationEngine ──▶ Ledger
//! transition / start / set_registration_open ──▶ TournamentLifecycle
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tourney_ledger::Ledger;
use tourney_types::{
    Balance, Result, Tournament, TournamentId, TournamentSpec, TournamentStatus, TourneyConfig,
    TourneyError, UserId,
};

use crate::{
    directory::Directory, id_allocator::IdAllocator, lifecycle::TournamentLifecycle,
    registration::RegistrationEngine, request_guard::RequestGuard, table::TournamentTable,
};

/// Tournament registration core.
pub struct TournamentService {
    directory: Arc<dyn Directory>,
    ledger: Arc<Ledger>,
    table: Arc<TournamentTable>,
    ids: IdAllocator,
    registration: RegistrationEngine,
    lifecycle: TournamentLifecycle,
    requests: Mutex<RequestGuard>,
}

impl TournamentService {
    /// Build a service from a validated configuration.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is unusable.
    pub fn new(config: &TourneyConfig, directory: Arc<dyn Directory>) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(Ledger::from_config(config));
        let table = Arc::new(TournamentTable::new(config.lock_timeout()));
        Ok(Self {
            directory,
            registration: RegistrationEngine::new(Arc::clone(&table), Arc::clone(&ledger)),
            lifecycle: TournamentLifecycle::new(Arc::clone(&table)),
            ids: IdAllocator::new(config.ids),
            requests: Mutex::new(RequestGuard::new(config.idempotency_cache_size)),
            ledger,
            table,
        })
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Open the balance of a user known to the directory.
    ///
    /// # Errors
    /// `UserNotFound`, `AccountExists`
    pub fn open_account(&self, user_id: UserId) -> Result<Balance> {
        if !self.directory.user_exists(user_id) {
            return Err(TourneyError::UserNotFound(user_id));
        }
        self.ledger.open_account(user_id)
    }

    /// Close a user's balance when the user is deleted. Returns the amount
    /// written off.
    ///
    /// # Errors
    /// `UserNotFound`, `Busy`
    pub fn close_account(&self, user_id: UserId) -> Result<Decimal> {
        self.ledger.close_account(user_id)
    }

    /// # Errors
    /// `UserNotFound`, `Busy`
    pub fn get_balance(&self, user_id: UserId) -> Result<Decimal> {
        self.ledger.get_balance(user_id)
    }

    /// Administrative top-up (prize payouts, promotions).
    ///
    /// # Errors
    /// `InvalidAmount`, `UserNotFound`, `Busy`
    pub fn credit(&self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        self.ledger.credit(user_id, amount)
    }

    // ------------------------------------------------------------------
    // Tournaments
    // ------------------------------------------------------------------

    /// Validate `spec`, allocate a public id and store the tournament.
    ///
    /// # Errors
    /// `InvalidTournament`, `GameNotFound`, `AllocationExhausted`
    pub fn create_tournament(&self, spec: TournamentSpec) -> Result<TournamentId> {
        spec.validate()?;
        if !self.directory.game_exists(spec.game) {
            return Err(TourneyError::GameNotFound(spec.game));
        }

        let id = self.ids.allocate()?;
        let tournament = Tournament::from_spec(id, spec);
        let (status, max) = (tournament.status, tournament.max_limit);
        if let Err(err) = self.table.insert(tournament) {
            self.ids.release(id);
            return Err(err);
        }

        tracing::info!(tournament = %id, status = %status, max_participants = max, "Tournament created");
        Ok(id)
    }

    /// Delete a tournament and free its id for reuse.
    ///
    /// Only tournaments that are finished, canceled, or have nobody
    /// registered can be deleted.
    ///
    /// # Errors
    /// `TournamentNotFound`, `InvalidTournament`, `Busy`
    pub fn delete_tournament(&self, tournament_id: TournamentId) -> Result<()> {
        self.table.remove_if(tournament_id, |tournament| {
            if tournament.status.is_terminal() || tournament.participants.is_empty() {
                Ok(())
            } else {
                Err(TourneyError::InvalidTournament {
                    reason: format!(
                        "tournament {tournament_id} is {} with {} participants",
                        tournament.status,
                        tournament.participant_count()
                    ),
                })
            }
        })?;
        self.ids.release(tournament_id);
        tracing::info!(tournament = %tournament_id, "Tournament deleted");
        Ok(())
    }

    /// Snapshot of a tournament.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn tournament(&self, tournament_id: TournamentId) -> Result<Tournament> {
        self.table.snapshot(tournament_id)
    }

    /// Ids of all stored tournaments.
    #[must_use]
    pub fn tournament_ids(&self) -> Vec<TournamentId> {
        self.table.ids()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a user, paying the entry fee. Returns the participant count.
    ///
    /// # Errors
    /// See [`RegistrationEngine::join`]; additionally `UserNotFound` if the
    /// directory does not know the user.
    pub fn join(&self, tournament_id: TournamentId, user_id: UserId) -> Result<u32> {
        if !self.directory.user_exists(user_id) {
            return Err(TourneyError::UserNotFound(user_id));
        }
        self.registration.join(tournament_id, user_id)
    }

    /// [`Self::join`] guarded by a caller-supplied idempotency key.
    ///
    /// The key is bound to this (tournament, user) pair. It is consumed only
    /// by a successful join; a failed join (for example `Busy`) may be
    /// retried with the same key.
    ///
    /// # Errors
    /// - `DuplicateRequest` if the same join under `request_key` is running
    ///   or already succeeded
    /// - `RequestKeyConflict` if `request_key` belongs to another join
    /// - everything [`Self::join`] returns
    pub fn join_once(
        &self,
        request_key: &str,
        tournament_id: TournamentId,
        user_id: UserId,
    ) -> Result<u32> {
        self.requests
            .lock()
            .begin(request_key, tournament_id, user_id)?;
        let result = self.join(tournament_id, user_id);
        let mut requests = self.requests.lock();
        match result {
            Ok(_) => requests.complete(request_key),
            Err(_) => requests.abandon(request_key),
        }
        result
    }

    /// Remove a user from a tournament. The fee is not refunded.
    ///
    /// # Errors
    /// See [`RegistrationEngine::leave`].
    pub fn leave(&self, tournament_id: TournamentId, user_id: UserId) -> Result<u32> {
        self.registration.leave(tournament_id, user_id)
    }

    /// Pay the kill reward to a participant. Returns their new balance.
    ///
    /// # Errors
    /// See [`RegistrationEngine::record_kill`].
    pub fn record_kill(&self, tournament_id: TournamentId, killer_id: UserId) -> Result<Decimal> {
        self.registration.record_kill(tournament_id, killer_id)
    }

    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn participants(&self, tournament_id: TournamentId) -> Result<Vec<UserId>> {
        self.registration.participants(tournament_id)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// # Errors
    /// See [`TournamentLifecycle::transition`].
    pub fn transition(
        &self,
        tournament_id: TournamentId,
        next: TournamentStatus,
    ) -> Result<TournamentStatus> {
        self.lifecycle.transition(tournament_id, next)
    }

    /// # Errors
    /// See [`TournamentLifecycle::start`].
    pub fn start(&self, tournament_id: TournamentId) -> Result<()> {
        self.lifecycle.start(tournament_id)
    }

    /// # Errors
    /// See [`TournamentLifecycle::set_registration_open`].
    pub fn set_registration_open(&self, tournament_id: TournamentId, open: bool) -> Result<()> {
        self.lifecycle.set_registration_open(tournament_id, open)
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    /// Verify ledger supply conservation. Returns the total of all balances.
    ///
    /// # Errors
    /// `SupplyInvariantViolation`, `Busy`
    pub fn audit(&self) -> Result<Decimal> {
        self.ledger.audit()
    }
}
