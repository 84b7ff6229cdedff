//! Time-bounded store of usage snapshots

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use rotom_team::FormatId;

use crate::MetaError;
use crate::snapshot::{SnapshotId, UsageSnapshot};

/// How long snapshots stay fresh, and how many are kept
#[derive(Debug, Clone)]
pub struct StalenessPolicy {
    pub default_horizon: TimeDelta,
    /// Overrides for fast- or slow-moving formats
    pub per_format: HashMap<FormatId, TimeDelta>,
    /// Snapshots kept per format; older ones are evicted on ingest
    pub retain: usize,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            // usage dumps are published monthly
            default_horizon: TimeDelta::days(35),
            per_format: HashMap::new(),
            retain: 4,
        }
    }
}

impl StalenessPolicy {
    pub fn horizon_for(&self, format: &FormatId) -> TimeDelta {
        self.per_format
            .get(format)
            .copied()
            .unwrap_or(self.default_horizon)
    }

    pub fn with_horizon(mut self, format: impl Into<FormatId>, horizon: TimeDelta) -> Self {
        self.per_format.insert(format.into(), horizon);
        self
    }
}

/// Shared snapshot cache.
///
/// Parsing happens before the write lock is taken, and readers hold `Arc`s,
/// so a slow ingest never blocks or invalidates a reader.
#[derive(Debug)]
pub struct MetaCache {
    snapshots: RwLock<HashMap<FormatId, Vec<Arc<UsageSnapshot>>>>,
    next_id: AtomicU64,
    policy: StalenessPolicy,
}

impl Default for MetaCache {
    fn default() -> Self {
        Self::new(StalenessPolicy::default())
    }
}

impl MetaCache {
    pub fn new(policy: StalenessPolicy) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            policy,
        }
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.policy
    }

    /// Parse raw usage data into a new snapshot and store it
    pub fn ingest(
        &self,
        format: &FormatId,
        raw: &serde_json::Value,
        as_of: DateTime<Utc>,
    ) -> Result<Arc<UsageSnapshot>, MetaError> {
        let id = SnapshotId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let horizon = self.policy.horizon_for(format);

        let snapshot = match UsageSnapshot::from_value(id, format.clone(), raw, as_of, horizon) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!(format = %format, error = %e, "Rejected usage stats");
                return Err(e);
            }
        };

        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);
        let kept = snapshots.entry(format.clone()).or_default();
        kept.push(Arc::clone(&snapshot));
        if kept.len() > self.policy.retain.max(1) {
            kept.sort_by_key(|s| (s.as_of, s.id));
            let evict = kept.len() - self.policy.retain.max(1);
            kept.drain(..evict);
        }
        drop(snapshots);

        tracing::info!(
            format = %format,
            snapshot = %snapshot.id,
            species = snapshot.len(),
            as_of = %snapshot.as_of,
            "Ingested usage snapshot"
        );
        Ok(snapshot)
    }

    /// Newest snapshot for a format.
    ///
    /// Fails with [`MetaError::Stale`] once the newest snapshot has outlived
    /// its horizon, unless `force` acknowledges the staleness.
    pub fn current(
        &self,
        format: &FormatId,
        now: DateTime<Utc>,
        force: bool,
    ) -> Result<Arc<UsageSnapshot>, MetaError> {
        let newest = {
            let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
            snapshots
                .get(format)
                .and_then(|kept| kept.iter().max_by_key(|s| (s.as_of, s.id)))
                .cloned()
        }
        .ok_or_else(|| MetaError::NoSnapshot(format.clone()))?;

        if newest.is_stale(now) {
            let age = newest.age(now);
            if !force {
                return Err(MetaError::Stale {
                    format: format.clone(),
                    age_secs: age.num_seconds(),
                    horizon_secs: newest.horizon.num_seconds(),
                });
            }
            tracing::warn!(
                format = %format,
                snapshot = %newest.id,
                age_secs = age.num_seconds(),
                "Serving stale usage snapshot"
            );
        }

        Ok(newest)
    }

    /// Number of snapshots held for a format
    pub fn snapshot_count(&self, format: &FormatId) -> usize {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        snapshots.get(format).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000 + secs, 0).unwrap()
    }

    fn stats(usage: f64) -> serde_json::Value {
        json!({"pokemon": {"Kingambit": {"usage": usage}}})
    }

    fn ou() -> FormatId {
        FormatId::new("gen9ou")
    }

    #[test]
    fn test_current_picks_newest_timestamp() {
        let cache = MetaCache::default();
        cache.ingest(&ou(), &stats(0.3), t(100)).unwrap();
        // ingested later, but older data
        cache.ingest(&ou(), &stats(0.1), t(0)).unwrap();

        let current = cache.current(&ou(), t(200), false).unwrap();
        assert_eq!(current.as_of, t(100));
        assert_eq!(current.usage("Kingambit"), 0.3);
    }

    #[test]
    fn test_current_is_stable_without_ingest() {
        let cache = MetaCache::default();
        cache.ingest(&ou(), &stats(0.3), t(0)).unwrap();

        let a = cache.current(&ou(), t(10), false).unwrap();
        let b = cache.current(&ou(), t(20), false).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.as_of, b.as_of);
    }

    #[test]
    fn test_stale_requires_force() {
        let policy = StalenessPolicy::default().with_horizon("gen9ou", TimeDelta::hours(1));
        let cache = MetaCache::new(policy);
        cache.ingest(&ou(), &stats(0.3), t(0)).unwrap();

        let err = cache.current(&ou(), t(7200), false).unwrap_err();
        assert_eq!(
            err,
            MetaError::Stale {
                format: ou(),
                age_secs: 7200,
                horizon_secs: 3600
            }
        );

        let forced = cache.current(&ou(), t(7200), true).unwrap();
        assert_eq!(forced.as_of, t(0));
    }

    #[test]
    fn test_horizon_is_per_format() {
        let policy = StalenessPolicy::default().with_horizon("gen9randombattle", TimeDelta::hours(1));
        assert_eq!(policy.horizon_for(&FormatId::new("gen9randombattle")), TimeDelta::hours(1));
        assert_eq!(policy.horizon_for(&ou()), TimeDelta::days(35));
    }

    #[test]
    fn test_no_snapshot() {
        let cache = MetaCache::default();
        let err = cache.current(&ou(), t(0), true).unwrap_err();
        assert_eq!(err, MetaError::NoSnapshot(ou()));
    }

    #[test]
    fn test_malformed_is_not_stored() {
        let cache = MetaCache::default();
        let err = cache.ingest(&ou(), &json!({"pokemon": []}), t(0)).unwrap_err();
        assert!(matches!(err, MetaError::MalformedStats(_)));
        assert_eq!(cache.snapshot_count(&ou()), 0);
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let policy = StalenessPolicy {
            retain: 2,
            ..StalenessPolicy::default()
        };
        let cache = MetaCache::new(policy);
        let oldest = cache.ingest(&ou(), &stats(0.1), t(0)).unwrap();
        cache.ingest(&ou(), &stats(0.2), t(10)).unwrap();
        cache.ingest(&ou(), &stats(0.3), t(20)).unwrap();

        assert_eq!(cache.snapshot_count(&ou()), 2);
        // a reader holding the evicted snapshot still has it
        assert_eq!(oldest.usage("Kingambit"), 0.1);
        assert_eq!(cache.current(&ou(), t(30), false).unwrap().as_of, t(20));
    }

    #[test]
    fn test_formats_are_independent() {
        let cache = MetaCache::default();
        cache.ingest(&ou(), &stats(0.3), t(0)).unwrap();
        let uu = FormatId::new("gen9uu");
        assert!(matches!(cache.current(&uu, t(0), false), Err(MetaError::NoSnapshot(_))));
    }
}
