use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use rotom_meta::{SkillTier, StalenessPolicy};
use rotom_team::FormatId;
use serde::{Deserialize, Serialize};

/// Tunables for a [`SessionManager`](crate::SessionManager).
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Prior roster versions kept per session for undo
    pub history_depth: usize,
    /// Default age after which a usage snapshot is stale
    pub staleness_secs: u64,
    /// Per-format overrides of `staleness_secs`, keyed by format name
    pub format_staleness_secs: HashMap<String, u64>,
    pub max_snapshots_per_format: usize,
    /// Sessions untouched for this long are closed by `close_idle`
    pub idle_timeout_secs: u64,
    pub fetch_timeout_ms: u64,
    /// Upper bound on recommendations returned per request
    pub max_recommendations: usize,
    /// Tier used for the advice attached to edits
    pub default_tier: SkillTier,
    /// Sample teams kept per format
    pub max_sample_teams: usize,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            history_depth: 20,
            staleness_secs: 35 * 24 * 60 * 60,
            format_staleness_secs: HashMap::new(),
            max_snapshots_per_format: 4,
            idle_timeout_secs: 30 * 60,
            fetch_timeout_ms: 10_000,
            max_recommendations: 10,
            default_tier: SkillTier::Intermediate,
            max_sample_teams: 2,
        }
    }
}

impl CoachConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid coach config")
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Failed to load config {}", path.display()))
    }

    pub fn staleness_policy(&self) -> StalenessPolicy {
        let per_format = self
            .format_staleness_secs
            .iter()
            .map(|(format, secs)| (FormatId::new(format), secs_delta(*secs)))
            .collect();
        StalenessPolicy {
            default_horizon: secs_delta(self.staleness_secs),
            per_format,
            retain: self.max_snapshots_per_format,
        }
    }

    pub fn idle_timeout(&self) -> TimeDelta {
        secs_delta(self.idle_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

fn secs_delta(secs: u64) -> TimeDelta {
    TimeDelta::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX)).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = CoachConfig::from_json_str(
            r#"{"history_depth": 3, "format_staleness_secs": {"[Gen 9] Random Battle": 3600}}"#,
        )
        .unwrap();

        assert_eq!(config.history_depth, 3);
        assert_eq!(config.max_recommendations, 10);
        assert_eq!(config.default_tier, SkillTier::Intermediate);

        let policy = config.staleness_policy();
        assert_eq!(
            policy.horizon_for(&FormatId::new("gen9randombattle")),
            TimeDelta::hours(1)
        );
        assert_eq!(policy.horizon_for(&FormatId::new("gen9ou")), TimeDelta::days(35));
        assert_eq!(policy.retain, 4);
    }

    #[test]
    fn test_invalid_config() {
        let err = CoachConfig::from_json_str(r#"{"history_depth": "lots"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid coach config"));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("rotom-coach-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"idle_timeout_secs": 60, "fetch_timeout_ms": 250, "default_tier": "expert"}"#)
            .unwrap();

        let config = CoachConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.idle_timeout(), TimeDelta::minutes(1));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(250));
        assert_eq!(config.default_tier, SkillTier::Expert);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CoachConfig::load("/nonexistent/rotom.json").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config"));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = CoachConfig {
            idle_timeout_secs: u64::MAX,
            ..CoachConfig::default()
        };
        assert_eq!(config.idle_timeout(), TimeDelta::MAX);
    }
}
