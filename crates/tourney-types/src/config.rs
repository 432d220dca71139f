//! Configuration types for the tourney core.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{TourneyError, constants, error::Result};

/// Top-level configuration shared by the ledger and the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TourneyConfig {
    /// Longest wait for a per-user or per-tournament lock before `Busy`.
    pub lock_timeout_ms: u64,
    /// Public id allocation.
    pub ids: IdAllocatorConfig,
    /// How many request idempotency keys to remember.
    pub idempotency_cache_size: usize,
}

impl Default for TourneyConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: constants::DEFAULT_LOCK_TIMEOUT_MS,
            ids: IdAllocatorConfig::default(),
            idempotency_cache_size: constants::DEFAULT_IDEMPOTENCY_CACHE_SIZE,
        }
    }
}

impl TourneyConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`TourneyError::Configuration`] if the document is malformed
    /// or describes an unusable configuration.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core cannot run with.
    ///
    /// # Errors
    /// Returns [`TourneyError::Configuration`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(TourneyError::Configuration(
                "lock_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.idempotency_cache_size == 0 {
            return Err(TourneyError::Configuration(
                "idempotency_cache_size must be at least 1".to_string(),
            ));
        }
        self.ids.validate()
    }

    /// The lock timeout as a `Duration`.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Range and retry bound for public tournament ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IdAllocatorConfig {
    /// Smallest id handed out (inclusive).
    pub min_id: u32,
    /// Largest id handed out (inclusive).
    pub max_id: u32,
    /// Rejection-sampling attempts before `AllocationExhausted`.
    pub max_attempts: u32,
}

impl Default for IdAllocatorConfig {
    fn default() -> Self {
        Self {
            min_id: constants::MIN_TOURNAMENT_ID,
            max_id: constants::MAX_TOURNAMENT_ID,
            max_attempts: constants::DEFAULT_MAX_ALLOCATION_ATTEMPTS,
        }
    }
}

impl IdAllocatorConfig {
    /// Number of ids in the configured range.
    #[must_use]
    pub fn space(&self) -> u64 {
        u64::from(self.max_id) - u64::from(self.min_id) + 1
    }

    /// # Errors
    /// Returns [`TourneyError::Configuration`] for a range that is empty or
    /// leaves the public 6-digit id space, or a zero retry bound.
    pub fn validate(&self) -> Result<()> {
        if self.min_id < constants::MIN_TOURNAMENT_ID || self.max_id > constants::MAX_TOURNAMENT_ID {
            return Err(TourneyError::Configuration(format!(
                "ids range {}..={} must lie within {}..={}",
                self.min_id,
                self.max_id,
                constants::MIN_TOURNAMENT_ID,
                constants::MAX_TOURNAMENT_ID
            )));
        }
        if self.min_id > self.max_id {
            return Err(TourneyError::Configuration(format!(
                "ids.min_id {} exceeds ids.max_id {}",
                self.min_id, self.max_id
            )));
        }
        if self.max_attempts == 0 {
            return Err(TourneyError::Configuration(
                "ids.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = TourneyConfig::default();
        assert_eq!(cfg.lock_timeout_ms, 250);
        assert_eq!(cfg.ids.min_id, 100_000);
        assert_eq!(cfg.ids.max_id, 999_999);
        assert_eq!(cfg.ids.max_attempts, 10_000);
        assert_eq!(cfg.ids.space(), 900_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let cfg = TourneyConfig::from_json(r#"{ "lock_timeout_ms": 40, "ids": { "max_attempts": 7 } }"#)
            .unwrap();
        assert_eq!(cfg.lock_timeout(), Duration::from_millis(40));
        assert_eq!(cfg.ids.max_attempts, 7);
        assert_eq!(cfg.ids.min_id, 100_000);
        assert_eq!(cfg.idempotency_cache_size, 100_000);
    }

    #[test]
    fn from_json_rejects_bad_values() {
        let err = TourneyConfig::from_json(r#"{ "ids": { "min_id": 5, "max_id": 4 } }"#).unwrap_err();
        assert!(matches!(err, TourneyError::Configuration(_)));

        let err = TourneyConfig::from_json(r#"{ "lock_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, TourneyError::Configuration(_)));

        let err = TourneyConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, TourneyError::Configuration(_)));
    }

    #[test]
    fn id_range_must_stay_public() {
        let err = TourneyConfig::from_json(r#"{ "ids": { "min_id": 1, "max_id": 5 } }"#).unwrap_err();
        assert!(
            matches!(&err, TourneyError::Configuration(msg) if msg.contains("100000..=999999")),
            "Got: {err:?}"
        );

        let err =
            TourneyConfig::from_json(r#"{ "ids": { "max_id": 1000000 } }"#).unwrap_err();
        assert!(matches!(err, TourneyError::Configuration(_)));

        let narrow = TourneyConfig::from_json(r#"{ "ids": { "min_id": 500000, "max_id": 500099 } }"#)
            .unwrap();
        assert_eq!(narrow.ids.space(), 100);
    }
}
