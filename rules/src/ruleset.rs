//! Ruleset definitions

use std::collections::BTreeSet;

use rotom_dex::to_id;
use rotom_team::{FormatId, MAX_SLOTS, RulesetId};
use serde::{Deserialize, Deserializer, Serialize};

/// A named legality rule, checked in the order the ruleset declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// No two slots share a species
    SpeciesClause,
    /// No two slots share a held item
    ItemClause,
    /// No slot above this level
    LevelCap(u8),
    /// EV ceilings per slot
    EvLimit { total: u16, per_stat: u16 },
    /// Nothing from the ruleset's banlist. Bans are enforced either way;
    /// declaring the clause sets where their violations rank.
    Banlist,
    /// Fewer slots than the usual six (e.g. 1v1, VGC bring-4 variants)
    MaxTeamSize(u8),
}

impl Clause {
    pub fn name(&self) -> &'static str {
        match self {
            Clause::SpeciesClause => "Species Clause",
            Clause::ItemClause => "Item Clause",
            Clause::LevelCap(_) => "Level Cap",
            Clause::EvLimit { .. } => "EV Limit",
            Clause::Banlist => "Banlist",
            Clause::MaxTeamSize(_) => "Team Size",
        }
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Clause::LevelCap(cap) => write!(f, "Level Cap = {}", cap),
            Clause::EvLimit { total, .. } => write!(f, "EV Limit = {}", total),
            Clause::MaxTeamSize(size) => write!(f, "Team Size = {}", size),
            other => f.write_str(other.name()),
        }
    }
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names.iter().map(|n| to_id(n)).collect())
}

/// Banned names, stored as ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banlist {
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub species: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub items: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub moves: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub abilities: BTreeSet<String>,
}

impl Banlist {
    pub fn bans_species(&self, name: &str) -> bool {
        self.species.contains(&to_id(name))
    }

    pub fn bans_item(&self, name: &str) -> bool {
        self.items.contains(&to_id(name))
    }

    pub fn bans_move(&self, name: &str) -> bool {
        self.moves.contains(&to_id(name))
    }

    pub fn bans_ability(&self, name: &str) -> bool {
        self.abilities.contains(&to_id(name))
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
            && self.items.is_empty()
            && self.moves.is_empty()
            && self.abilities.is_empty()
    }
}

/// One immutable revision of a format's rules.
///
/// A rule change is published as a new revision; existing revisions are
/// never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(flatten)]
    pub id: RulesetId,

    /// Display name, e.g. "[Gen 9] OU"
    #[serde(default)]
    pub name: String,

    /// Tag of the rules update this revision took effect with
    #[serde(default)]
    pub effective_from: String,

    /// Checked in this order
    #[serde(default)]
    pub clauses: Vec<Clause>,

    #[serde(default)]
    pub bans: Banlist,
}

impl Ruleset {
    pub fn new(format: impl Into<FormatId>, revision: u32) -> Self {
        let id = RulesetId::new(format, revision);
        Self {
            name: id.format.to_string(),
            id,
            effective_from: String::new(),
            clauses: Vec::new(),
            bans: Banlist::default(),
        }
    }

    pub fn format(&self) -> &FormatId {
        &self.id.format
    }

    pub fn generation(&self) -> Option<u8> {
        self.id.format.generation()
    }

    /// Team size this ruleset allows
    pub fn max_team_size(&self) -> usize {
        self.clauses
            .iter()
            .filter_map(|c| match c {
                Clause::MaxTeamSize(size) => Some(usize::from(*size)),
                _ => None,
            })
            .min()
            .unwrap_or(MAX_SLOTS)
            .min(MAX_SLOTS)
    }

    pub fn has_clause(&self, clause: &Clause) -> bool {
        self.clauses.contains(clause)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn effective_from(mut self, tag: impl Into<String>) -> Self {
        self.effective_from = tag.into();
        self
    }

    pub fn with_clause(mut self, clause: Clause) -> Self {
        if !self.clauses.contains(&clause) {
            self.clauses.push(clause);
        }
        self
    }

    pub fn ban_species(mut self, name: &str) -> Self {
        self.bans.species.insert(to_id(name));
        self
    }

    pub fn ban_item(mut self, name: &str) -> Self {
        self.bans.items.insert(to_id(name));
        self
    }

    pub fn ban_move(mut self, name: &str) -> Self {
        self.bans.moves.insert(to_id(name));
        self
    }

    pub fn ban_ability(mut self, name: &str) -> Self {
        self.bans.abilities.insert(to_id(name));
        self
    }

    /// Copy of this ruleset as the next revision, for publishing a change
    pub fn next_revision(&self) -> Self {
        let mut next = self.clone();
        next.id.revision += 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_normalizes_bans() {
        let ruleset: Ruleset = serde_json::from_str(
            r#"{
                "format": "[Gen 9] OU",
                "revision": 2,
                "name": "[Gen 9] OU",
                "effective_from": "2026-09",
                "clauses": ["species_clause", {"level_cap": 100}, "banlist"],
                "bans": {"species": ["Annihilape"], "abilities": ["Shadow Tag"], "moves": ["Last Respects"]}
            }"#,
        )
        .unwrap();

        assert_eq!(ruleset.id, RulesetId::new("gen9ou", 2));
        assert_eq!(ruleset.generation(), Some(9));
        assert_eq!(
            ruleset.clauses,
            vec![Clause::SpeciesClause, Clause::LevelCap(100), Clause::Banlist]
        );
        assert!(ruleset.bans.bans_species("annihilape"));
        assert!(ruleset.bans.bans_ability("Shadow Tag"));
        assert!(ruleset.bans.bans_move("last-respects"));
        assert!(!ruleset.bans.bans_item("Leftovers"));
    }

    #[test]
    fn test_with_clause_is_idempotent() {
        let ruleset = Ruleset::new("gen9ou", 1)
            .with_clause(Clause::SpeciesClause)
            .with_clause(Clause::SpeciesClause);
        assert_eq!(ruleset.clauses.len(), 1);
    }

    #[test]
    fn test_max_team_size() {
        assert_eq!(Ruleset::new("gen9ou", 1).max_team_size(), 6);
        let oneone = Ruleset::new("gen91v1", 1).with_clause(Clause::MaxTeamSize(3));
        assert_eq!(oneone.max_team_size(), 3);
        let silly = Ruleset::new("gen9ou", 1).with_clause(Clause::MaxTeamSize(9));
        assert_eq!(silly.max_team_size(), 6);
    }

    #[test]
    fn test_next_revision() {
        let first = Ruleset::new("gen9ou", 1).ban_species("Kyurem");
        let second = first.next_revision().ban_species("Roaring Moon");
        assert_eq!(second.id.revision, 2);
        assert!(!first.bans.bans_species("Roaring Moon"));
        assert!(second.bans.bans_species("Kyurem"));
    }

    #[test]
    fn test_clause_display() {
        assert_eq!(Clause::SpeciesClause.to_string(), "Species Clause");
        assert_eq!(Clause::LevelCap(50).to_string(), "Level Cap = 50");
    }
}
