//! Versioned format rulesets and team legality validation.
//!
//! - [`Ruleset`] - one immutable revision of a format's clauses and banlist
//! - [`RulesetStore`] - shared store of every published revision
//! - [`validate`] / [`validate_with_dex`] - pure legality check of a roster

use rotom_team::{FormatId, RulesetId};
use thiserror::Error;

mod ruleset;
mod store;
mod validate;

pub use ruleset::{Banlist, Clause, Ruleset};
pub use store::RulesetStore;
pub use validate::{Reason, Rule, ValidationResult, Violation, validate, validate_with_dex};

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Unknown format: {0}")]
    NotFound(FormatId),

    #[error("Unknown ruleset revision: {0}")]
    RevisionNotFound(RulesetId),

    #[error("Ruleset {0} is already published")]
    VersionConflict(RulesetId),

    #[error("Malformed ruleset data: {0}")]
    Malformed(#[from] serde_json::Error),
}
