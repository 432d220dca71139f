//! Tournament model and status graph.
//!
//! A tournament moves one way through its statuses:
//! **MODERATION → OPEN → ONGOING → FINISHED**, with **CANCELED** reachable
//! from OPEN or ONGOING as a terminal override.
//!
//! Registration is gated twice: the status must be OPEN *and* the
//! independent `registration_open` flag must be set. The flag lets intake be
//! paused without ending the tournament.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GameId, TourneyError, TournamentId, UserId, constants, error::Result};

// ---------------------------------------------------------------------------
// TournamentStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Awaiting review before it is published.
    Moderation,
    /// Published; accepts registrations while the open flag is set.
    Open,
    /// Running. The participant set is frozen.
    Ongoing,
    /// Completed normally.
    Finished,
    /// Called off.
    Canceled,
}

impl TournamentStatus {
    /// Whether `next` is reachable from `self` in one step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Moderation, Self::Open)
                | (Self::Open, Self::Ongoing | Self::Canceled)
                | (Self::Ongoing, Self::Finished | Self::Canceled)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Canceled)
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moderation => write!(f, "moderation"),
            Self::Open => write!(f, "open"),
            Self::Ongoing => write!(f, "ongoing"),
            Self::Finished => write!(f, "finished"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Region / Rating
// ---------------------------------------------------------------------------

/// Geographic region the tournament is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Asia,
    Europe,
    America,
}

/// Rating bucket, one to five marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    X,
    Xx,
    Xxx,
    Xxxx,
    Xxxxx,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = match self {
            Self::X => 1,
            Self::Xx => 2,
            Self::Xxx => 3,
            Self::Xxxx => 4,
            Self::Xxxxx => 5,
        };
        write!(f, "{}", "x".repeat(marks))
    }
}

// ---------------------------------------------------------------------------
// TournamentSpec (creation input)
// ---------------------------------------------------------------------------

/// Everything needed to create a tournament, minus the public id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSpec {
    pub name: String,
    pub game: GameId,
    pub region: Region,
    #[serde(default)]
    pub rating: Rating,
    /// Entry fee in whole points.
    pub fee: u64,
    /// Credited to a participant for every recorded kill.
    pub reward_per_kill: Decimal,
    pub prize_pool: u64,
    /// Number of prize places.
    pub winner_spots: u32,
    pub min_limit: u32,
    pub max_limit: u32,
    /// Either `Moderation` or `Open`.
    pub initial_status: TournamentStatus,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
}

impl TournamentSpec {
    /// Check the definition before an id is spent on it.
    ///
    /// # Errors
    /// Returns [`TourneyError::InvalidTournament`] describing the first
    /// violated rule.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(TourneyError::InvalidTournament { reason });

        if self.name.trim().is_empty() {
            return invalid("name must not be empty".to_string());
        }
        if self.name.chars().count() > constants::MAX_TOURNAMENT_NAME_LEN {
            return invalid(format!(
                "name longer than {} characters",
                constants::MAX_TOURNAMENT_NAME_LEN
            ));
        }
        if self.min_limit == 0 {
            return invalid("min_limit must be at least 1".to_string());
        }
        if self.min_limit > self.max_limit {
            return invalid(format!(
                "min_limit {} exceeds max_limit {}",
                self.min_limit, self.max_limit
            ));
        }
        if self.winner_spots == 0 || self.winner_spots > self.max_limit {
            return invalid(format!(
                "winner_spots {} must be within 1..={}",
                self.winner_spots, self.max_limit
            ));
        }
        if self.reward_per_kill < Decimal::ZERO {
            return invalid("reward_per_kill must not be negative".to_string());
        }
        if self.reward_per_kill.normalize().scale() > constants::AMOUNT_SCALE {
            return invalid(format!(
                "reward_per_kill {} has more than {} decimal places",
                self.reward_per_kill,
                constants::AMOUNT_SCALE
            ));
        }
        if !matches!(
            self.initial_status,
            TournamentStatus::Moderation | TournamentStatus::Open
        ) {
            return invalid(format!(
                "tournament cannot be created as {}",
                self.initial_status
            ));
        }
        Ok(())
    }

    /// A small valid open tournament, for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn dummy(fee: u64, min_limit: u32, max_limit: u32) -> Self {
        Self {
            name: "Weekend Cup".to_string(),
            game: GameId::new(),
            region: Region::Europe,
            rating: Rating::default(),
            fee,
            reward_per_kill: Decimal::new(150, 2),
            prize_pool: 1_000,
            winner_spots: 1,
            min_limit,
            max_limit,
            initial_status: TournamentStatus::Open,
            info: None,
            rules: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tournament
// ---------------------------------------------------------------------------

/// A tournament record.
///
/// Participants are held as user ids, never as user records, so ownership
/// stays one-directional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub game: GameId,
    pub status: TournamentStatus,
    pub region: Region,
    pub rating: Rating,
    pub fee: u64,
    pub reward_per_kill: Decimal,
    pub prize_pool: u64,
    pub winner_spots: u32,
    pub min_limit: u32,
    pub max_limit: u32,
    /// Registration gate, independent of `status`.
    pub registration_open: bool,
    pub participants: HashSet<UserId>,
    pub info: Option<String>,
    pub rules: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    /// Build the record for a validated spec under its allocated id.
    #[must_use]
    pub fn from_spec(id: TournamentId, spec: TournamentSpec) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: spec.name,
            game: spec.game,
            status: spec.initial_status,
            region: spec.region,
            rating: spec.rating,
            fee: spec.fee,
            reward_per_kill: spec.reward_per_kill,
            prize_pool: spec.prize_pool,
            winner_spots: spec.winner_spots,
            min_limit: spec.min_limit,
            max_limit: spec.max_limit,
            registration_open: true,
            participants: HashSet::new(),
            info: spec.info,
            rules: spec.rules,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of registered participants.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn participant_count(&self) -> u32 {
        // Bounded by max_limit, which is a u32.
        self.participants.len() as u32
    }

    /// Whether the participant set is at `max_limit`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.participant_count() >= self.max_limit
    }

    /// Whether the minimum participant count is reached.
    #[must_use]
    pub fn meets_minimum(&self) -> bool {
        self.participant_count() >= self.min_limit
    }

    /// Whether new registrations are currently accepted.
    #[must_use]
    pub fn accepts_registrations(&self) -> bool {
        self.status == TournamentStatus::Open && self.registration_open
    }

    /// The entry fee as a ledger amount.
    #[must_use]
    pub fn fee_amount(&self) -> Decimal {
        Decimal::from(self.fee)
    }

    /// Bump `updated_at` after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
