//! Team-building sessions on top of the rules and meta crates.
//!
//! A [`SessionManager`] owns the shared [`RulesetStore`](rotom_rules::RulesetStore)
//! and [`MetaCache`](rotom_meta::MetaCache) and hands out sessions. Every edit
//! to a session is validated immediately and committed as a new immutable
//! [`RosterVersion`]; export is only possible from a legal version. A legal
//! edit also comes back with [`Advice`] scored against the format's current
//! usage stats. Published sample teams can seed a session's roster.
//!
//! The crate installs no `tracing` subscriber; that is the embedding
//! application's job.

mod config;
mod error;
mod export;
mod manager;
mod refresh;
mod samples;
mod session;

pub use config::CoachConfig;
pub use error::{CoachError, ErrorKind, Result, StateError};
pub use export::render;
pub use manager::SessionManager;
pub use refresh::{StatsSource, fetch_samples, refresh};
pub use samples::{SampleLibrary, SampleTeam};
pub use session::{Advice, Edit, EditOutcome, RosterVersion, Session, SessionId, SessionState};
