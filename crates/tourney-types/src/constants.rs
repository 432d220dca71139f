//! System-wide constants for the tourney core.

/// Decimal places every balance amount is stored with.
pub const AMOUNT_SCALE: u32 = 2;

/// Smallest public tournament id (inclusive).
pub const MIN_TOURNAMENT_ID: u32 = 100_000;

/// Largest public tournament id (inclusive).
pub const MAX_TOURNAMENT_ID: u32 = 999_999;

/// Number of distinct public tournament ids.
pub const TOURNAMENT_ID_SPACE: u32 = MAX_TOURNAMENT_ID - MIN_TOURNAMENT_ID + 1;

/// Rejection-sampling attempts before id allocation gives up.
pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: u32 = 10_000;

/// Default wait for a per-entity lock before failing with `Busy`.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;

/// Default number of request idempotency keys to remember.
pub const DEFAULT_IDEMPOTENCY_CACHE_SIZE: usize = 100_000;

/// Maximum tournament name length (characters).
pub const MAX_TOURNAMENT_NAME_LEN: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "tourney";
