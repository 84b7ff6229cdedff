use rotom_meta::MetaError;
use rotom_rules::{RulesError, Violation};
use rotom_team::{FormatId, ParseError, StructuralError};
use thiserror::Error;

use crate::session::SessionId;

/// Operation not allowed in the session's current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Roster has not been validated yet")]
    NotValidated,

    #[error("No earlier roster version to restore")]
    NoHistory,

    #[error("Session {0} is closed")]
    Closed(SessionId),
}

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Invalid edit: {0}")]
    Structural(#[from] StructuralError),

    #[error("Invalid team import: {0}")]
    Import(#[from] ParseError),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error("Roster is not exportable ({} violation(s))", .0.len())]
    NotExportable(Vec<Violation>),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("No sample team {index} for {format}")]
    UnknownSample { format: FormatId, index: usize },
}

/// Coarse error taxonomy for callers that only need to pick a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is malformed
    Structural,
    /// The roster breaks the format's rules
    RuleViolation,
    /// Reference or usage data is missing, stale or unusable
    Data,
    /// Not allowed in the session's current state
    State,
    NotFound,
}

impl CoachError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoachError::Structural(_) | CoachError::Import(_) => ErrorKind::Structural,
            CoachError::NotExportable(_) => ErrorKind::RuleViolation,
            CoachError::State(_) => ErrorKind::State,
            CoachError::UnknownSession(_) | CoachError::UnknownSample { .. } => ErrorKind::NotFound,
            CoachError::Rules(e) => match e {
                RulesError::NotFound(_) | RulesError::RevisionNotFound(_) => ErrorKind::NotFound,
                RulesError::VersionConflict(_) => ErrorKind::State,
                RulesError::Malformed(_) => ErrorKind::Data,
            },
            CoachError::Meta(e) => match e {
                MetaError::NoSnapshot(_) => ErrorKind::NotFound,
                MetaError::UnknownTier(_) => ErrorKind::Structural,
                MetaError::MalformedStats(_)
                | MetaError::Stale { .. }
                | MetaError::IncompatibleSnapshot { .. }
                | MetaError::NoUsageData(_) => ErrorKind::Data,
            },
        }
    }

    /// Whether the caller can carry on by fixing the team, retrying with
    /// `force` or re-ingesting stats. A structural error is a caller bug and
    /// the request is simply rejected.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoachError::State(StateError::Closed(_)) | CoachError::UnknownSession(_) => false,
            _ => self.kind() != ErrorKind::Structural,
        }
    }

    /// Violations behind a refused export
    pub fn violations(&self) -> &[Violation] {
        match self {
            CoachError::NotExportable(violations) => violations,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let stale = CoachError::from(MetaError::Stale {
            format: FormatId::new("gen9ou"),
            age_secs: 10,
            horizon_secs: 5,
        });
        assert_eq!(stale.kind(), ErrorKind::Data);
        assert!(stale.is_recoverable());

        let missing = CoachError::from(RulesError::NotFound(FormatId::new("gen9ou")));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let undo = CoachError::from(StateError::NoHistory);
        assert_eq!(undo.kind(), ErrorKind::State);
        assert!(undo.is_recoverable());

        let closed = CoachError::from(StateError::Closed(SessionId(3)));
        assert!(!closed.is_recoverable());

        let edit = CoachError::from(StructuralError::SlotOutOfRange { index: 9, len: 2 });
        assert_eq!(edit.kind(), ErrorKind::Structural);
        assert!(!edit.is_recoverable());

        let malformed = CoachError::from(MetaError::MalformedStats("empty".to_string()));
        assert!(malformed.is_recoverable());
    }

    #[test]
    fn test_not_exportable_is_rule_violation() {
        let err = CoachError::NotExportable(Vec::new());
        assert_eq!(err.kind(), ErrorKind::RuleViolation);
        assert!(err.to_string().contains("0 violation(s)"));
    }
}
