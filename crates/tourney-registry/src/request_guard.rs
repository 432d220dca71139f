//! Join request deduplication.
//!
//! Each idempotency key is bound to the (tournament, user) pair of the join
//! it was first sent with, and goes through two states:
//!
//! ```text
//! begin ──▶ IN_FLIGHT ──complete──▶ COMPLETED ──(evicted, oldest first)
//!               │
//!               └──abandon──▶ forgotten (the key may be sent again)
//! ```
//!
//! Only completed keys count towards `capacity` and only they are evicted.
//! In-flight keys stay until their join finishes, so their number is bounded
//! by the number of concurrent callers rather than by `capacity`.

use std::collections::{HashMap, VecDeque, hash_map::Entry};

use tourney_types::{Result, TournamentId, TourneyError, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinState {
    InFlight,
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct JoinRequest {
    tournament: TournamentId,
    user: UserId,
    state: JoinState,
}

/// Remembers which join requests were already carried out.
pub struct RequestGuard {
    requests: HashMap<String, JoinRequest>,
    /// Completed keys, oldest first.
    completed: VecDeque<String>,
    capacity: usize,
}

impl RequestGuard {
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "request guard capacity must be positive");
        Self {
            requests: HashMap::new(),
            completed: VecDeque::new(),
            capacity,
        }
    }

    /// Mark `key` as in flight for a join of `user` into `tournament`.
    ///
    /// # Errors
    /// - `DuplicateRequest` if the same join under this key is running or
    ///   already completed
    /// - `RequestKeyConflict` if the key belongs to a different join
    pub fn begin(&mut self, key: &str, tournament: TournamentId, user: UserId) -> Result<()> {
        match self.requests.entry(key.to_string()) {
            Entry::Occupied(held) => {
                let held = held.get();
                if held.tournament == tournament && held.user == user {
                    tracing::debug!(key, tournament = %tournament, user = %user, state = ?held.state, "Join request replayed");
                    Err(TourneyError::DuplicateRequest(key.to_string()))
                } else {
                    tracing::warn!(key, tournament = %tournament, user = %user, "Join request key reused for another join");
                    Err(TourneyError::RequestKeyConflict {
                        key: key.to_string(),
                    })
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(JoinRequest {
                    tournament,
                    user,
                    state: JoinState::InFlight,
                });
                Ok(())
            }
        }
    }

    /// Record that the join under `key` succeeded.
    pub fn complete(&mut self, key: &str) {
        let Some(request) = self.requests.get_mut(key) else {
            return;
        };
        if request.state == JoinState::Completed {
            return;
        }
        request.state = JoinState::Completed;
        self.completed.push_back(key.to_string());

        while self.completed.len() > self.capacity {
            if let Some(oldest) = self.completed.pop_front() {
                self.requests.remove(&oldest);
            }
        }
    }

    /// Forget an in-flight key after its join failed. Completed keys are
    /// left alone.
    pub fn abandon(&mut self, key: &str) {
        if self
            .requests
            .get(key)
            .is_some_and(|request| request.state == JoinState::InFlight)
        {
            self.requests.remove(key);
        }
    }

    #[must_use]
    pub fn is_completed(&self, key: &str) -> bool {
        self.requests
            .get(key)
            .is_some_and(|request| request.state == JoinState::Completed)
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.requests.len() - self.completed.len()
    }

    /// Number of remembered keys, in flight or completed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
