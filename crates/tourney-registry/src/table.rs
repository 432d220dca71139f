//! Tournament storage.
//!
//! The table owns every tournament record. Each record sits behind its own
//! mutex; all reads and writes of a tournament's status, open flag and
//! participant set happen while holding it, which makes operations on one
//! tournament linearizable. Lock waits are bounded and surface as `Busy`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tourney_types::{Result, Tournament, TournamentId, TourneyError};

/// A stored tournament. `removed` marks a record that was deleted while a
/// concurrent caller still held its handle.
#[derive(Debug)]
struct Entry {
    tournament: Tournament,
    removed: bool,
}

/// Owner of all tournament records.
pub struct TournamentTable {
    entries: RwLock<HashMap<TournamentId, Arc<Mutex<Entry>>>>,
    lock_timeout: Duration,
}

impl TournamentTable {
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Store a new tournament.
    ///
    /// # Errors
    /// Returns `Internal` if the id is already stored; ids come from the
    /// allocator, so that means the allocator and the table disagree.
    /// `Busy` if the table stayed locked past the timeout.
    pub fn insert(&self, tournament: Tournament) -> Result<()> {
        let id = tournament.id;
        let mut entries = self.write_entries()?;
        if entries.contains_key(&id) {
            return Err(TourneyError::Internal(format!(
                "tournament id {id} already stored"
            )));
        }
        entries.insert(
            id,
            Arc::new(Mutex::new(Entry {
                tournament,
                removed: false,
            })),
        );
        Ok(())
    }

    /// Run `f` with exclusive access to one tournament.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`, or whatever `f` returns.
    pub fn with_locked<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut Tournament) -> Result<T>,
    ) -> Result<T> {
        let handle = self.handle(id)?;
        let mut entry = self.lock(id, &handle)?;
        if entry.removed {
            return Err(TourneyError::TournamentNotFound(id));
        }
        f(&mut entry.tournament)
    }

    /// Copy of a tournament's current state.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`
    pub fn snapshot(&self, id: TournamentId) -> Result<Tournament> {
        self.with_locked(id, |tournament| Ok(tournament.clone()))
    }

    /// Remove a tournament if `allow` accepts its current state.
    ///
    /// Both the table and the tournament lock waits are bounded.
    ///
    /// # Errors
    /// `TournamentNotFound`, `Busy`, or the error returned by `allow`.
    pub fn remove_if(
        &self,
        id: TournamentId,
        allow: impl FnOnce(&Tournament) -> Result<()>,
    ) -> Result<Tournament> {
        let mut entries = self.write_entries()?;
        let handle = entries
            .get(&id)
            .cloned()
            .ok_or(TourneyError::TournamentNotFound(id))?;
        let mut entry = self.lock(id, &handle)?;
        allow(&entry.tournament)?;
        entries.remove(&id);
        entry.removed = true;
        Ok(entry.tournament.clone())
    }

    #[must_use]
    pub fn contains(&self, id: TournamentId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// All stored ids, unordered.
    #[must_use]
    pub fn ids(&self) -> Vec<TournamentId> {
        self.entries.read().keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn handle(&self, id: TournamentId) -> Result<Arc<Mutex<Entry>>> {
        self.entries
            .read()
            .get(&id)
            .cloned()
            .ok_or(TourneyError::TournamentNotFound(id))
    }

    fn write_entries(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<TournamentId, Arc<Mutex<Entry>>>>> {
        self.entries.try_write_for(self.lock_timeout).ok_or_else(|| {
            tracing::warn!(timeout = ?self.lock_timeout, "Tournament table lock timed out");
            TourneyError::Busy {
                resource: "tournament table".to_string(),
            }
        })
    }

    fn lock<'a>(
        &self,
        id: TournamentId,
        handle: &'a Mutex<Entry>,
    ) -> Result<parking_lot::MutexGuard<'a, Entry>> {
        handle.try_lock_for(self.lock_timeout).ok_or_else(|| {
            tracing::warn!(tournament = %id, timeout = ?self.lock_timeout, "Tournament lock timed out");
            TourneyError::Busy {
                resource: format!("tournament {id}"),
            }
        })
    }
}
