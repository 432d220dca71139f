//! Error types for the tourney core.
//!
//! All errors use the `TOURNEY_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Not found
//! - 2xx: Invalid state
//! - 3xx: Capacity
//! - 4xx: Funds
//! - 5xx: Id allocation
//! - 6xx: Lock contention
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{GameId, TournamentId, TournamentStatus, UserId};

/// Coarse classification of [`TourneyError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    CapacityExceeded,
    Funds,
    AllocationExhausted,
    Busy,
    Internal,
}

/// Central error enum for all tourney operations.
#[derive(Debug, Error)]
pub enum TourneyError {
    // =================================================================
    // Not Found (1xx)
    // =================================================================
    /// No tournament with this public id.
    #[error("TOURNEY_ERR_100: Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// The user has no account (and therefore no balance).
    #[error("TOURNEY_ERR_101: User not found: {0}")]
    UserNotFound(UserId),

    /// The referenced game does not exist in the catalog.
    #[error("TOURNEY_ERR_102: Game not found: {0}")]
    GameNotFound(GameId),

    // =================================================================
    // Invalid State (2xx)
    // =================================================================
    /// Registration is paused or the tournament is not open.
    #[error("TOURNEY_ERR_200: Registration closed for tournament {0}")]
    RegistrationClosed(TournamentId),

    /// The status graph does not allow this transition.
    #[error("TOURNEY_ERR_201: Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    /// The user is already in the participant set.
    #[error("TOURNEY_ERR_202: User {user} already registered in tournament {tournament}")]
    AlreadyRegistered {
        tournament: TournamentId,
        user: UserId,
    },

    /// The user is not in the participant set.
    #[error("TOURNEY_ERR_203: User {user} not registered in tournament {tournament}")]
    NotRegistered {
        tournament: TournamentId,
        user: UserId,
    },

    /// The tournament cannot start below its minimum participant count.
    #[error("TOURNEY_ERR_204: Not enough participants: need {needed}, have {have}")]
    NotEnoughParticipants { needed: u32, have: u32 },

    /// The tournament definition failed validation.
    #[error("TOURNEY_ERR_205: Invalid tournament: {reason}")]
    InvalidTournament { reason: String },

    /// The idempotency key was already used by an earlier request.
    #[error("TOURNEY_ERR_206: Duplicate request: {0}")]
    DuplicateRequest(String),

    /// A balance already exists for this user.
    #[error("TOURNEY_ERR_207: Account already exists: {0}")]
    AccountExists(UserId),

    /// The idempotency key was already used for a join of another
    /// (tournament, user) pair.
    #[error("TOURNEY_ERR_208: Request key {key} already bound to another join")]
    RequestKeyConflict { key: String },

    // =================================================================
    // Capacity (3xx)
    // =================================================================
    /// The participant set is at `max_limit`.
    #[error("TOURNEY_ERR_300: Tournament full: {max} participants")]
    CapacityFull { max: u32 },

    // =================================================================
    // Funds (4xx)
    // =================================================================
    /// Not enough balance to cover a debit.
    #[error("TOURNEY_ERR_400: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// The amount is not positive or has more than two decimal places.
    #[error("TOURNEY_ERR_401: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    // =================================================================
    // Allocation (5xx)
    // =================================================================
    /// Rejection sampling did not find a free public id.
    #[error("TOURNEY_ERR_500: Tournament id space exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    // =================================================================
    // Contention (6xx)
    // =================================================================
    /// A per-entity lock was not acquired within the configured timeout.
    #[error("TOURNEY_ERR_600: Resource busy: {resource}")]
    Busy { resource: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TOURNEY_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid values, unparsable input).
    #[error("TOURNEY_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Ledger totals no longer add up. Critical.
    #[error("TOURNEY_ERR_902: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },
}

impl TourneyError {
    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TournamentNotFound(_)
            | Self::UserNotFound(_)
            | Self::GameNotFound(_) => ErrorKind::NotFound,
            Self::RegistrationClosed(_)
            | Self::InvalidTransition { .. }
            | Self::AlreadyRegistered { .. }
            | Self::NotRegistered { .. }
            | Self::NotEnoughParticipants { .. }
            | Self::InvalidTournament { .. }
            | Self::DuplicateRequest(_)
            | Self::AccountExists(_)
            | Self::RequestKeyConflict { .. } => ErrorKind::InvalidState,
            Self::CapacityFull { .. } => ErrorKind::CapacityExceeded,
            Self::InsufficientFunds { .. } | Self::InvalidAmount(_) => ErrorKind::Funds,
            Self::AllocationExhausted { .. } => ErrorKind::AllocationExhausted,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Internal(_)
            | Self::Configuration(_)
            | Self::SupplyInvariantViolation { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the same request may simply be retried.
    ///
    /// Only lock contention is transient; every other failure is terminal
    /// for the request that produced it.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TourneyError>;

impl From<serde_json::Error> for TourneyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = TourneyError::TournamentNotFound(TournamentId(123_456));
        let msg = format!("{err}");
        assert!(msg.starts_with("TOURNEY_ERR_100"), "Got: {msg}");
        assert!(msg.contains("123456"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = TourneyError::InsufficientFunds {
            needed: Decimal::new(1000, 2),
            available: Decimal::new(500, 2),
        };
        let msg = format!("{err}");
        assert!(msg.contains("TOURNEY_ERR_400"));
        assert!(msg.contains("10.00"));
        assert!(msg.contains("5.00"));
    }

    #[test]
    fn invalid_transition_display() {
        let err = TourneyError::InvalidTransition {
            from: TournamentStatus::Ongoing,
            to: TournamentStatus::Open,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TOURNEY_ERR_201"));
        assert!(msg.contains("ongoing -> open"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            TourneyError::CapacityFull { max: 2 }.kind(),
            ErrorKind::CapacityExceeded
        );
        assert_eq!(
            TourneyError::InvalidAmount(Decimal::ZERO).kind(),
            ErrorKind::Funds
        );
        assert_eq!(
            TourneyError::RegistrationClosed(TournamentId(100_000)).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            TourneyError::AllocationExhausted { attempts: 1 }.kind(),
            ErrorKind::AllocationExhausted
        );
    }

    #[test]
    fn only_busy_is_retryable() {
        let busy = TourneyError::Busy {
            resource: "tournament 100000".into(),
        };
        assert!(busy.is_retryable());
        assert!(!TourneyError::CapacityFull { max: 1 }.is_retryable());
        assert!(
            !TourneyError::InsufficientFunds {
                needed: Decimal::ONE,
                available: Decimal::ZERO,
            }
            .is_retryable()
        );
    }

    #[test]
    fn all_errors_have_tourney_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(TourneyError::UserNotFound(UserId::new())),
            Box::new(TourneyError::DuplicateRequest("k".into())),
            Box::new(TourneyError::Internal("test".into())),
            Box::new(TourneyError::NotEnoughParticipants { needed: 2, have: 1 }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TOURNEY_ERR_"),
                "Error missing TOURNEY_ERR_ prefix: {msg}"
            );
        }
    }
}
