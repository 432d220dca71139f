//! # tourney-types
//!
//! Shared types, errors, and configuration for the **tourney** tournament
//! registration core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`GameId`], [`TournamentId`]
//! - **Balance model**: [`Balance`]
//! - **Tournament model**: [`Tournament`], [`TournamentSpec`], [`TournamentStatus`], [`Region`], [`Rating`]
//! - **Configuration**: [`TourneyConfig`], [`IdAllocatorConfig`]
//! - **Errors**: [`TourneyError`] with `TOURNEY_ERR_` prefix codes, grouped by [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod tournament;

// Re-export all primary types at crate root for ergonomic imports:
//   use tourney_types::{Tournament, TournamentStatus, UserId, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use tournament::*;

// Constants are accessed via `tourney_types::constants::FOO`
// (not re-exported to avoid name collisions).
