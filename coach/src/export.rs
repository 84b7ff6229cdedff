//! Export gate

use rotom_rules::ValidationResult;
use rotom_team::to_export;

use crate::error::{CoachError, Result, StateError};
use crate::session::RosterVersion;

/// Showdown export text for a roster version whose last validation was legal
pub fn render(version: &RosterVersion) -> Result<String> {
    match &version.validation {
        None => Err(StateError::NotValidated.into()),
        Some(ValidationResult::Illegal(violations)) => {
            Err(CoachError::NotExportable(violations.clone()))
        }
        Some(ValidationResult::Legal) => Ok(to_export(&version.roster.slots)),
    }
}
