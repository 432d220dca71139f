//! Public tournament id allocation.
//!
//! Ids are drawn uniformly at random from the configured range so they
//! cannot be enumerated. A candidate is reserved by inserting it into the
//! active set under one lock: the insert *is* the uniqueness check, so two
//! concurrent allocations can never both win the same id. Collisions are
//! retried up to `max_attempts` times.

use std::collections::HashSet;

use parking_lot::Mutex;
use rand::Rng;
use tourney_types::{IdAllocatorConfig, Result, TournamentId, TourneyError};

/// Hands out unique public tournament ids.
pub struct IdAllocator {
    /// Ids currently held by stored tournaments.
    active: Mutex<HashSet<TournamentId>>,
    config: IdAllocatorConfig,
}

impl IdAllocator {
    #[must_use]
    pub fn new(config: IdAllocatorConfig) -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
            config,
        }
    }

    /// Reserve a fresh id using the thread-local RNG.
    ///
    /// # Errors
    /// Returns [`TourneyError::AllocationExhausted`] if no free id was found.
    pub fn allocate(&self) -> Result<TournamentId> {
        self.allocate_with(&mut rand::thread_rng())
    }

    /// Reserve a fresh id drawing candidates from `rng`.
    ///
    /// # Errors
    /// Returns [`TourneyError::AllocationExhausted`] if every id in the range
    /// is taken or `max_attempts` candidates all collided, and
    /// `Configuration` if the range is empty.
    pub fn allocate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TournamentId> {
        self.config.validate()?;
        let IdAllocatorConfig {
            min_id,
            max_id,
            max_attempts,
        } = self.config;

        let taken = u64::try_from(self.active.lock().len()).unwrap_or(u64::MAX);
        if taken >= self.config.space() {
            tracing::error!(space = self.config.space(), "Tournament id space is full");
            return Err(TourneyError::AllocationExhausted { attempts: 0 });
        }

        for attempt in 1..=max_attempts {
            let candidate = TournamentId(rng.gen_range(min_id..=max_id));
            if self.active.lock().insert(candidate) {
                tracing::debug!(id = %candidate, attempt, "Tournament id allocated");
                return Ok(candidate);
            }
            tracing::trace!(id = %candidate, attempt, "Tournament id collision");
        }

        tracing::error!(attempts = max_attempts, "Tournament id allocation exhausted");
        Err(TourneyError::AllocationExhausted {
            attempts: max_attempts,
        })
    }

    /// Return an id to the pool once its tournament is deleted.
    ///
    /// Returns `false` if the id was not active.
    pub fn release(&self, id: TournamentId) -> bool {
        let released = self.active.lock().remove(&id);
        if released {
            tracing::debug!(id = %id, "Tournament id released");
        }
        released
    }

    #[must_use]
    pub fn is_active(&self, id: TournamentId) -> bool {
        self.active.lock().contains(&id)
    }

    /// Number of ids currently reserved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdAllocatorConfig::default())
    }
}
