//! # tourney-ledger
//!
//! The per-user point ledger.
//!
//! Every user owns exactly one balance, opened explicitly together with the
//! account. Balances move only through [`Ledger::credit`] and
//! [`Ledger::debit`]; both are linearizable per user and a debit never takes
//! a balance below zero.
//!
//! ```text
//! open_account ──▶ credit / debit (per-user lock) ──▶ close_account
//!                         │
//!                         └──▶ SupplyConservation totals ──▶ audit()
//! ```

pub mod ledger;
pub mod supply;

pub use ledger::Ledger;
pub use supply::SupplyConservation;
