//! # tourney-registry
//!
//! Tournaments and their participants.
//!
//! ## Components
//!
//! 1. **IdAllocator**: unique random 6-digit public ids
//! 2. **TournamentTable**: tournament records, one lock per tournament
//! 3. **RegistrationEngine**: join / leave / kill rewards against the ledger
//! 4. **TournamentLifecycle**: one-way status machine and registration flag
//! 5. **RequestGuard**: idempotency keys for retried joins
//! 6. **TournamentService**: the facade outer layers call
//!
//! ## Lock order
//!
//! A tournament lock may be held while a ledger account lock is taken,
//! never the other way round. No operation holds two tournament locks.

pub mod directory;
pub mod id_allocator;
pub mod lifecycle;
pub mod registration;
pub mod request_guard;
pub mod service;
pub mod table;

pub use directory::{Directory, InMemoryDirectory};
pub use id_allocator::IdAllocator;
pub use lifecycle::TournamentLifecycle;
pub use registration::RegistrationEngine;
pub use request_guard::RequestGuard;
pub use service::TournamentService;
pub use table::TournamentTable;
