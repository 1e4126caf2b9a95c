//! Public types for the tiered cache coordinator.

use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bounds every cache key satisfies. Blanket-implemented.
///
/// Keys are encoded on the way to the cold tier but never decoded, so only
/// `Serialize` is needed. The encoding must be stable: equal keys must
/// produce equal bytes.
pub trait CacheKey: Eq + Hash + Clone + Serialize + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Serialize + Send + Sync + 'static {}

/// Bounds every cache value satisfies. Blanket-implemented.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Where a key currently lives.
///
/// Used by [`super::TieredCache::residency()`] to report tier membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// In the hot tier and tracked by the recency index
    Indexed,
    /// In the hot tier only (pushed out of the index by capacity, or a
    /// demotion of it failed)
    HotOnly,
    /// Demoted: only the cold tier holds it
    Cold,
    /// Not stored anywhere
    Absent,
}

impl std::fmt::Display for Residency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Indexed => write!(f, "Indexed"),
            Self::HotOnly => write!(f, "HotOnly"),
            Self::Cold => write!(f, "Cold"),
            Self::Absent => write!(f, "Absent"),
        }
    }
}

/// Point-in-time counters for a cache instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries held in memory
    pub hot_entries: usize,
    /// Entries tracked by the recency index
    pub indexed_entries: usize,
    /// Recency index bound
    pub index_capacity: usize,
    /// Demotion checks scheduled but not yet run
    pub pending_demotions: u64,
    /// Entries moved to the cold tier
    pub demotions: u64,
    /// Demotions abandoned on encode or store failure
    pub failed_demotions: u64,
    /// Demotions whose pick was rewritten or deleted before it left memory
    pub superseded_demotions: u64,
    /// Cold hits brought back into memory
    pub promotions: u64,
    /// Entries pushed out of the recency index by capacity
    pub index_overflows: u64,
}

/// Result of one demotion check (internal use)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DemotionOutcome {
    /// Memory under threshold, nothing to do
    BelowThreshold,
    /// Over threshold but the index had no candidate
    IndexEmpty,
    /// Entry written to cold tier and dropped from memory
    Demoted,
    /// The picked entry was rewritten or deleted meanwhile; the hot tier was left as is
    Superseded,
    /// Encode or store failure; entry stays in memory
    Failed,
}

impl DemotionOutcome {
    pub(super) fn as_str(&self) -> &'static str {
        match self {
            Self::BelowThreshold => "below_threshold",
            Self::IndexEmpty => "index_empty",
            Self::Demoted => "demoted",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residency_display() {
        assert_eq!(format!("{}", Residency::Indexed), "Indexed");
        assert_eq!(format!("{}", Residency::HotOnly), "HotOnly");
        assert_eq!(format!("{}", Residency::Cold), "Cold");
        assert_eq!(format!("{}", Residency::Absent), "Absent");
    }

    #[test]
    fn test_demotion_outcome_labels() {
        assert_eq!(DemotionOutcome::Demoted.as_str(), "demoted");
        assert_eq!(DemotionOutcome::Failed.as_str(), "failed");
        assert_eq!(DemotionOutcome::IndexEmpty.as_str(), "index_empty");
    }

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = CacheStats::default();
        assert_eq!(stats.hot_entries, 0);
        assert_eq!(stats.demotions, 0);
    }
}
