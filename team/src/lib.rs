//! Pokemon Showdown team formats and conversion utilities.
//!
//! - [`Slot`] / [`Roster`] - team data with the structural checks every
//!   roster must pass before legality is even considered
//! - [`to_export`] / [`parse_export`] - the teambuilder's import/export text
//! - [`FormatId`] / [`RulesetId`] - identifiers shared with the rules and meta crates

mod export;
mod format;
mod import;
mod roster;
mod slot;
mod stats;

pub use export::{slot_to_export, to_export};
pub use format::{FormatId, RulesetId};
pub use import::{ParseError, parse_export};
pub use roster::{MAX_SLOTS, Roster, StructuralError};
pub use slot::{DEFAULT_LEVEL, Gender, MAX_MOVES, Slot};
pub use stats::{MAX_IV, MAX_STAT_EVS, MAX_TOTAL_EVS, Stat, StatSpread};
