//! Type chart, matchup queries and reference tables for Showdown team tooling.
//!
//! # Overview
//!
//! `rotom-dex` is the leaf of the workspace:
//!
//! ```text
//! rotom-dex (types + reference tables) ← THIS CRATE
//!        │
//!        ├─> rotom-team (slots, rosters, export text)
//!        ├─> rotom-rules (legality)
//!        └─> rotom-meta (usage + scoring)
//! ```
//!
//! The species-data table itself is owned by whoever embeds the workspace; this
//! crate only defines the [`Dex`] seam and a [`MemoryDex`] for tests and
//! small deployments.

mod dex;
mod id;
pub mod matchup;
mod types;

pub use dex::{Dex, DexError, MemoryDex};
pub use id::to_id;
pub use types::{TYPE_CHART, Type};
