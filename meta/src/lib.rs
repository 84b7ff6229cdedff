//! Usage statistics and meta-aware recommendations.
//!
//! - [`UsageSnapshot`] - immutable usage table for one format at one time
//! - [`MetaCache`] - shared store handing out the freshest snapshot
//! - [`score`] - rank candidate species, moves, items and abilities for a slot

use rotom_team::FormatId;
use thiserror::Error;

mod cache;
mod scorer;
mod snapshot;

pub use cache::{MetaCache, StalenessPolicy};
pub use scorer::{Change, Recommendation, SkillTier, TierWeights, penalty, score};
pub use snapshot::{Rate, SnapshotId, SpeciesUsage, UsageSnapshot};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetaError {
    #[error("Malformed usage stats: {0}")]
    MalformedStats(String),

    #[error("Usage stats for {format} are {age_secs}s old (horizon {horizon_secs}s)")]
    Stale {
        format: FormatId,
        age_secs: i64,
        horizon_secs: i64,
    },

    #[error("No usage stats ingested for {0}")]
    NoSnapshot(FormatId),

    #[error("Snapshot for {snapshot} cannot score under the {ruleset} rules")]
    IncompatibleSnapshot { snapshot: FormatId, ruleset: FormatId },

    #[error("No usage data for {0}")]
    NoUsageData(String),

    #[error("Unknown skill tier: {0}")]
    UnknownTier(String),
}
