//! Existence checks against the user and game subsystems.
//!
//! Users and games are owned elsewhere; the core only needs to know whether
//! an id refers to something real.

use std::collections::HashSet;

use parking_lot::RwLock;
use tourney_types::{GameId, UserId};

/// Read-only view of the external user and game catalogs.
pub trait Directory: Send + Sync {
    fn user_exists(&self, user_id: UserId) -> bool;
    fn game_exists(&self, game_id: GameId) -> bool;
}

/// A `Directory` backed by in-process sets.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashSet<UserId>>,
    games: RwLock<HashSet<GameId>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: UserId) {
        self.users.write().insert(user_id);
    }

    pub fn remove_user(&self, user_id: UserId) -> bool {
        self.users.write().remove(&user_id)
    }

    pub fn add_game(&self, game_id: GameId) {
        self.games.write().insert(game_id);
    }
}

impl Directory for InMemoryDirectory {
    fn user_exists(&self, user_id: UserId) -> bool {
        self.users.read().contains(&user_id)
    }

    fn game_exists(&self, game_id: GameId) -> bool {
        self.games.read().contains(&game_id)
    }
}
