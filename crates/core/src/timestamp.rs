//! Microsecond-precision audit timestamp type
//!
//! Entities carry three audit timestamps (`created_at`, `last_updated`,
//! `deleted_at`), all assigned exclusively by the storage layer. This type
//! represents them as microseconds since Unix epoch.
//!
//! ## Blank state
//!
//! A freshly constructed entity has not been persisted, so its timestamps are
//! [`Timestamp::EPOCH`], the canonical "unassigned" value. Storage replaces
//! it on create and refreshes `last_updated` on every state change.
//!
//! This crate has no clock: producing "now" is a storage concern, so
//! wall-clock sourcing lives behind the storage boundary.

use serde::{Deserialize, Serialize};

/// Microsecond-precision timestamp
///
/// Represents a point in time as microseconds since Unix epoch.
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are comparable and orderable
/// - The zero timestamp (`EPOCH`) doubles as the blank/unassigned state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch; the blank value for an unpersisted entity
    pub const EPOCH: Timestamp = Timestamp(0);

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis.saturating_mul(1_000))
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get milliseconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Get seconds since Unix epoch (truncates)
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Check whether storage has assigned this timestamp
    ///
    /// `EPOCH` is the blank state, so any non-zero value counts as assigned.
    #[inline]
    pub const fn is_set(&self) -> bool {
        self.0 != 0
    }

    /// Check if this timestamp is before another
    #[inline]
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Check if this timestamp is after another
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format as "seconds.microseconds" for readability
        let secs = self.0 / 1_000_000;
        let micros = self.0 % 1_000_000;
        write!(f, "{}.{:06}", secs, micros)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_epoch_is_blank() {
        assert_eq!(Timestamp::EPOCH.as_micros(), 0);
        assert!(!Timestamp::EPOCH.is_set());
        assert_eq!(Timestamp::default(), Timestamp::EPOCH);
    }

    #[test]
    fn test_timestamp_from_secs() {
        let ts = Timestamp::from_secs(1000);
        assert_eq!(ts.as_secs(), 1000);
        assert_eq!(ts.as_millis(), 1_000_000);
        assert_eq!(ts.as_micros(), 1_000_000_000);
        assert!(ts.is_set());
    }

    #[test]
    fn test_timestamp_from_millis() {
        let ts = Timestamp::from_millis(5000);
        assert_eq!(ts.as_millis(), 5000);
        assert_eq!(ts.as_micros(), 5_000_000);
        assert_eq!(ts.as_secs(), 5);
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_micros(100);
        let t2 = Timestamp::from_micros(200);
        let t3 = Timestamp::from_micros(100);

        assert!(t1 < t2);
        assert!(t1.is_before(t2));
        assert!(t2.is_after(t1));
        assert_eq!(t1, t3);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::from_micros(1_234_567_890);
        assert_eq!(format!("{}", ts), "1234.567890");
        assert_eq!(format!("{}", Timestamp::EPOCH), "0.000000");
    }

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::from_micros(1_234_567);
        let json = serde_json::to_string(&ts).unwrap();
        let restored: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, restored);
    }
}
