//! Usage snapshots

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rotom_dex::to_id;
use rotom_team::FormatId;
use serde::{Deserialize, Serialize};

use crate::MetaError;

/// Cache-unique snapshot number; higher is newer within one cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// === Raw schema, modelled on the pkmn/Smogon usage dumps ===

#[derive(Deserialize)]
struct RawStats {
    #[serde(default)]
    battles: u64,
    pokemon: BTreeMap<String, RawSpecies>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUsage {
    Rate(f64),
    Detailed { weighted: f64 },
}

impl RawUsage {
    fn rate(&self) -> f64 {
        match self {
            RawUsage::Rate(r) => *r,
            RawUsage::Detailed { weighted } => *weighted,
        }
    }
}

#[derive(Deserialize)]
struct RawSpecies {
    usage: RawUsage,
    #[serde(default)]
    moves: BTreeMap<String, f64>,
    #[serde(default)]
    items: BTreeMap<String, f64>,
    #[serde(default)]
    abilities: BTreeMap<String, f64>,
    #[serde(default)]
    teammates: BTreeMap<String, f64>,
}

/// A name with its observed rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    pub name: String,
    pub rate: f64,
}

/// Observed statistics for one species
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesUsage {
    pub name: String,
    /// Fraction of teams carrying the species
    pub usage: f64,
    /// Keyed by id
    pub moves: BTreeMap<String, Rate>,
    pub items: BTreeMap<String, Rate>,
    pub abilities: BTreeMap<String, Rate>,
    pub teammates: BTreeMap<String, Rate>,
}

impl SpeciesUsage {
    /// How often `other` appears on teams with this species
    pub fn teammate_rate(&self, other: &str) -> f64 {
        self.teammates.get(&to_id(other)).map_or(0.0, |r| r.rate)
    }
}

/// An immutable view of one format's usage at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub id: SnapshotId,
    pub format: FormatId,
    pub as_of: DateTime<Utc>,
    /// Max age before the snapshot counts as stale
    #[serde(skip)]
    pub horizon: TimeDelta,
    pub battles: u64,
    /// Keyed by species id
    species: BTreeMap<String, SpeciesUsage>,
}

impl UsageSnapshot {
    /// Build from raw JSON, rejecting anything that does not fit the schema
    pub fn from_value(
        id: SnapshotId,
        format: FormatId,
        raw: &serde_json::Value,
        as_of: DateTime<Utc>,
        horizon: TimeDelta,
    ) -> Result<Self, MetaError> {
        let raw = RawStats::deserialize(raw)
            .map_err(|e| MetaError::MalformedStats(format!("schema mismatch: {}", e)))?;

        if raw.pokemon.is_empty() {
            return Err(MetaError::MalformedStats("no species entries".to_string()));
        }

        let mut species = BTreeMap::new();
        for (name, entry) in raw.pokemon {
            let id = to_id(&name);
            if id.is_empty() {
                return Err(MetaError::MalformedStats(format!("invalid species name {:?}", name)));
            }
            let usage = check_rate(&name, "usage", entry.usage.rate())?;
            let parsed = SpeciesUsage {
                moves: rates(&name, "moves", entry.moves)?,
                items: rates(&name, "items", entry.items)?,
                abilities: rates(&name, "abilities", entry.abilities)?,
                teammates: rates(&name, "teammates", entry.teammates)?,
                name,
                usage,
            };
            if species.insert(id, parsed).is_some() {
                return Err(MetaError::MalformedStats(
                    "two species entries share an id".to_string(),
                ));
            }
        }

        Ok(Self {
            id,
            format,
            as_of,
            horizon,
            battles: raw.battles,
            species,
        })
    }

    /// Parse a JSON string, see [`from_value`](Self::from_value)
    pub fn from_json(
        id: SnapshotId,
        format: FormatId,
        raw: &str,
        as_of: DateTime<Utc>,
        horizon: TimeDelta,
    ) -> Result<Self, MetaError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| MetaError::MalformedStats(format!("invalid JSON: {}", e)))?;
        Self::from_value(id, format, &value, as_of, horizon)
    }

    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.as_of
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > self.horizon
    }

    pub fn species(&self, name: &str) -> Option<&SpeciesUsage> {
        self.species.get(&to_id(name))
    }

    /// Usage rate of a species, 0 when unseen
    pub fn usage(&self, name: &str) -> f64 {
        self.species(name).map_or(0.0, |s| s.usage)
    }

    /// Every species, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesUsage> {
        self.species.values()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Species names ordered by usage, highest first
    pub fn top_species(&self, n: usize) -> Vec<&str> {
        let mut all: Vec<&SpeciesUsage> = self.species.values().collect();
        all.sort_by(|a, b| b.usage.total_cmp(&a.usage).then_with(|| a.name.cmp(&b.name)));
        all.into_iter().take(n).map(|s| s.name.as_str()).collect()
    }
}

fn check_rate(species: &str, field: &str, rate: f64) -> Result<f64, MetaError> {
    if rate.is_finite() && (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(MetaError::MalformedStats(format!(
            "{} {} rate {} outside 0..=1",
            species, field, rate
        )))
    }
}

/// Usage dumps write "" (empty move slot) and "nothing" (no item) as
/// placeholders; those carry no choice and are skipped.
fn rates(
    species: &str,
    field: &str,
    raw: BTreeMap<String, f64>,
) -> Result<BTreeMap<String, Rate>, MetaError> {
    let mut out = BTreeMap::new();
    for (name, rate) in raw {
        let id = to_id(&name);
        if id.is_empty() || id == "nothing" {
            continue;
        }
        let rate = check_rate(species, field, rate)?;
        out.insert(id, Rate { name, rate });
    }
    Ok(out)
}
