//! Pulling fresh usage statistics into the cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rotom_meta::{MetaCache, MetaError, UsageSnapshot};
use rotom_team::FormatId;

/// Where raw usage dumps come from
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Raw usage JSON for a format, with the time it describes
    async fn fetch(&self, format: &FormatId) -> Result<(serde_json::Value, DateTime<Utc>), MetaError>;

    /// Published sample teams for a format as export text, best first
    async fn fetch_sample_teams(&self, _format: &FormatId) -> Result<Vec<String>, MetaError> {
        Ok(Vec::new())
    }
}

/// Fetch from `source` and ingest into `cache`.
///
/// A fetch that outlives `timeout` counts as malformed stats; the cache keeps
/// serving whatever it had.
pub async fn refresh(
    source: &dyn StatsSource,
    cache: &MetaCache,
    format: &FormatId,
    timeout: Duration,
) -> Result<Arc<UsageSnapshot>, MetaError> {
    let (raw, as_of) = match tokio::time::timeout(timeout, source.fetch(format)).await {
        Ok(fetched) => fetched?,
        Err(_) => {
            tracing::warn!(
                format = %format,
                timeout_ms = timeout.as_millis() as u64,
                "Usage stats fetch timed out"
            );
            return Err(MetaError::MalformedStats(format!(
                "fetch timed out after {}ms",
                timeout.as_millis()
            )));
        }
    };
    cache.ingest(format, &raw, as_of)
}

/// Fetch a format's sample teams from `source`, under the same timeout
pub async fn fetch_samples(
    source: &dyn StatsSource,
    format: &FormatId,
    timeout: Duration,
) -> Result<Vec<String>, MetaError> {
    match tokio::time::timeout(timeout, source.fetch_sample_teams(format)).await {
        Ok(fetched) => fetched,
        Err(_) => {
            tracing::warn!(
                format = %format,
                timeout_ms = timeout.as_millis() as u64,
                "Sample teams fetch timed out"
            );
            Err(MetaError::MalformedStats(format!(
                "sample teams fetch timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Fixed {
        raw: serde_json::Value,
        delay: Duration,
    }

    #[async_trait]
    impl StatsSource for Fixed {
        async fn fetch(&self, _format: &FormatId) -> Result<(serde_json::Value, DateTime<Utc>), MetaError> {
            tokio::time::sleep(self.delay).await;
            Ok((self.raw.clone(), DateTime::from_timestamp(1_760_000_000, 0).unwrap()))
        }
    }

    #[tokio::test]
    async fn test_refresh_ingests() {
        let cache = MetaCache::default();
        let source = Fixed {
            raw: json!({"pokemon": {"Kingambit": {"usage": 0.28}}}),
            delay: Duration::ZERO,
        };
        let format = FormatId::new("gen9ou");

        let snapshot = refresh(&source, &cache, &format, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(snapshot.usage("Kingambit"), 0.28);
        assert_eq!(cache.snapshot_count(&format), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_malformed() {
        let cache = MetaCache::default();
        let source = Fixed {
            raw: json!({"pokemon": {"Kingambit": {"usage": 0.28}}}),
            delay: Duration::from_secs(5),
        };
        let format = FormatId::new("gen9ou");

        let err = refresh(&source, &cache, &format, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, MetaError::MalformedStats(msg) if msg.contains("timed out")));
        assert_eq!(cache.snapshot_count(&format), 0);
    }

    #[tokio::test]
    async fn test_sample_teams_default_to_none() {
        let source = Fixed {
            raw: json!({}),
            delay: Duration::ZERO,
        };
        let teams = fetch_samples(&source, &FormatId::new("gen9ou"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(teams.is_empty());
    }

    #[tokio::test]
    async fn test_bad_payload_is_malformed() {
        let cache = MetaCache::default();
        let source = Fixed {
            raw: json!({"pokemon": "nope"}),
            delay: Duration::ZERO,
        };
        let err = refresh(&source, &cache, &FormatId::new("gen9ou"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MetaError::MalformedStats(_)));
    }
}
