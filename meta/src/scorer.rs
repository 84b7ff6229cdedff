//! Skill-tier weighted recommendation scoring

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rotom_dex::{Dex, Type, matchup, to_id};
use rotom_rules::{Ruleset, ValidationResult, Violation, validate, validate_with_dex};
use rotom_team::{MAX_MOVES, Roster, Slot};
use serde::{Deserialize, Serialize};

use crate::MetaError;
use crate::snapshot::{Rate, SnapshotId, SpeciesUsage, UsageSnapshot};

/// How much hand-holding the player wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillTier {
    Beginner,
    Intermediate,
    Expert,
}

impl SkillTier {
    pub fn weights(self) -> TierWeights {
        match self {
            SkillTier::Beginner => TierWeights {
                usage: 1.0,
                fit: 0.5,
                penalty: 1.0,
                coverage: 0.0,
            },
            SkillTier::Intermediate => TierWeights {
                usage: 1.0,
                fit: 0.5,
                penalty: 0.5,
                coverage: 0.25,
            },
            SkillTier::Expert => TierWeights {
                usage: 1.0,
                fit: 0.5,
                penalty: 0.0,
                coverage: 0.5,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillTier::Beginner => "beginner",
            SkillTier::Intermediate => "intermediate",
            SkillTier::Expert => "expert",
        }
    }
}

impl FromStr for SkillTier {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SkillTier::Beginner),
            "intermediate" => Ok(SkillTier::Intermediate),
            "expert" => Ok(SkillTier::Expert),
            _ => Err(MetaError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coefficients of `usage*w_u + fit*w_f - penalty*w_p + coverage*w_c`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierWeights {
    pub usage: f64,
    pub fit: f64,
    pub penalty: f64,
    pub coverage: f64,
}

// Picks that punish misplays or need reads to pay off. Values in 0..=1.
const PENALIZED_MOVES: &[(&str, f64)] = &[
    ("batonpass", 1.0),
    ("counter", 1.0),
    ("mirrorcoat", 1.0),
    ("destinybond", 1.0),
    ("perishsong", 1.0),
    ("focuspunch", 1.0),
    ("shellsmash", 0.5),
    ("bellydrum", 0.5),
    ("trickroom", 0.5),
    ("encore", 0.5),
    ("trick", 0.5),
    ("switcheroo", 0.5),
    ("substitute", 0.5),
    ("suckerpunch", 0.5),
    ("pursuit", 0.5),
];

const PENALIZED_ABILITIES: &[(&str, f64)] = &[
    ("illusion", 1.0),
    ("stancechange", 1.0),
    ("zenmode", 1.0),
    ("imposter", 0.5),
    ("wonderguard", 0.5),
];

const PENALIZED_ITEMS: &[(&str, f64)] = &[
    ("redcard", 1.0),
    ("ejectbutton", 1.0),
    ("ejectpack", 1.0),
    ("custapberry", 1.0),
    ("ringtarget", 1.0),
    ("stickybarb", 1.0),
    ("flameorb", 0.5),
    ("toxicorb", 0.5),
    ("powerherb", 0.5),
];

const PENALIZED_SPECIES: &[(&str, f64)] = &[
    ("zoroark", 1.0),
    ("zoroarkhisui", 1.0),
    ("aegislash", 1.0),
    ("shedinja", 1.0),
    ("ditto", 0.5),
    ("smeargle", 0.5),
    ("darmanitangalar", 0.5),
];

/// Beginner-tier penalty for a change, from the fixed tables
pub fn penalty(change: &Change) -> f64 {
    let (table, name) = match change {
        Change::Species(name) => (PENALIZED_SPECIES, name),
        Change::Move { name, .. } => (PENALIZED_MOVES, name),
        Change::Item(name) => (PENALIZED_ITEMS, name),
        Change::Ability(name) => (PENALIZED_ABILITIES, name),
    };
    let id = to_id(name);
    table
        .iter()
        .find(|(penalized, _)| *penalized == id)
        .map_or(0.0, |(_, p)| *p)
}

/// A single modification to the candidate slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Change {
    Species(String),
    /// `replaces` is set when the slot already had a full move set
    Move {
        name: String,
        replaces: Option<String>,
    },
    Item(String),
    Ability(String),
}

impl Change {
    pub fn name(&self) -> &str {
        match self {
            Change::Species(name)
            | Change::Move { name, .. }
            | Change::Item(name)
            | Change::Ability(name) => name,
        }
    }

    fn apply(&self, slot: &Slot) -> Slot {
        let mut slot = slot.clone();
        match self {
            Change::Species(name) => slot.species = name.clone(),
            Change::Move { name, replaces } => {
                if let Some(old) = replaces {
                    slot.moves.retain(|m| to_id(m) != to_id(old));
                }
                slot.moves.push(name.clone());
            }
            Change::Item(name) => slot.item = Some(name.clone()),
            Change::Ability(name) => slot.ability = Some(name.clone()),
        }
        slot
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Species(name) => write!(f, "species {}", name),
            Change::Move {
                name,
                replaces: Some(old),
            } => write!(f, "move {} over {}", name, old),
            Change::Move { name, replaces: None } => write!(f, "move {}", name),
            Change::Item(name) => write!(f, "item {}", name),
            Change::Ability(name) => write!(f, "ability {}", name),
        }
    }
}

/// One ranked suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub change: Change,
    /// The candidate slot with the change applied
    pub slot: Slot,
    pub score: f64,
    /// Raw usage component, the first tie-breaker
    pub usage: f64,
    pub snapshot: SnapshotId,
}

struct Factors {
    usage: f64,
    fit: f64,
    coverage: f64,
}

/// Rank changes to `candidate` against the snapshot, most relevant first.
///
/// A candidate without a species gets species suggestions, excluding species
/// already on the roster. Otherwise its species' moves, items and abilities
/// are ranked. Coverage of the roster's shared weaknesses needs a [`Dex`] for
/// typings and is zero without one.
///
/// A change is only offered if it keeps the roster within `ruleset`: the
/// changed slot is put back in the roster (or appended, for a candidate that
/// is not a member yet) and must not add any violation the roster did not
/// already have.
pub fn score(
    candidate: &Slot,
    roster: &Roster,
    ruleset: &Ruleset,
    snapshot: &UsageSnapshot,
    tier: SkillTier,
    dex: Option<&dyn Dex>,
) -> Result<Vec<Recommendation>, MetaError> {
    if snapshot.format != *ruleset.format() {
        return Err(MetaError::IncompatibleSnapshot {
            snapshot: snapshot.format.clone(),
            ruleset: ruleset.format().clone(),
        });
    }

    let weights = tier.weights();
    let scored = if candidate.is_placeholder() {
        species_candidates(roster, snapshot, dex)
    } else {
        let usage = snapshot
            .species(&candidate.species)
            .ok_or_else(|| MetaError::NoUsageData(candidate.species.clone()))?;
        detail_candidates(candidate, usage)
    };

    let legality = Legality::new(candidate, roster, ruleset, dex);
    let considered = scored.len();
    let mut ranked: Vec<Recommendation> = scored
        .into_iter()
        .filter_map(|(change, factors)| {
            let slot = change.apply(candidate);
            if !legality.allows(&slot) {
                return None;
            }
            let score = factors.usage * weights.usage + factors.fit * weights.fit
                - penalty(&change) * weights.penalty
                + factors.coverage * weights.coverage;
            Some(Recommendation {
                slot,
                change,
                score,
                usage: factors.usage,
                snapshot: snapshot.id,
            })
        })
        .collect();
    ranked.sort_by(rank_order);

    tracing::debug!(
        snapshot = %snapshot.id,
        ruleset = %ruleset.id,
        tier = %tier,
        candidates = ranked.len(),
        rejected = considered - ranked.len(),
        "Scored recommendations"
    );
    Ok(ranked)
}

/// The roster with the candidate in place, and the violations it already has
struct Legality<'a> {
    ruleset: &'a Ruleset,
    dex: Option<&'a dyn Dex>,
    roster: Roster,
    index: usize,
    baseline: Vec<Violation>,
}

impl<'a> Legality<'a> {
    fn new(candidate: &Slot, roster: &Roster, ruleset: &'a Ruleset, dex: Option<&'a dyn Dex>) -> Self {
        let mut placed = roster.clone();
        let index = match roster.slots.iter().position(|s| s == candidate) {
            Some(index) => index,
            None => {
                placed.slots.push(candidate.clone());
                placed.slots.len() - 1
            }
        };

        let baseline = check(&placed, ruleset, dex).violations().to_vec();
        Self {
            ruleset,
            dex,
            roster: placed,
            index,
            baseline,
        }
    }

    fn allows(&self, slot: &Slot) -> bool {
        let mut roster = self.roster.clone();
        roster.slots[self.index] = slot.clone();
        check(&roster, self.ruleset, self.dex)
            .violations()
            .iter()
            .all(|v| self.baseline.contains(v))
    }
}

fn check(roster: &Roster, ruleset: &Ruleset, dex: Option<&dyn Dex>) -> ValidationResult {
    match dex {
        Some(dex) => validate_with_dex(roster, ruleset, dex),
        None => validate(roster, ruleset),
    }
}

fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.usage.total_cmp(&a.usage))
        .then_with(|| a.change.name().cmp(b.change.name()))
}

fn species_candidates(
    roster: &Roster,
    snapshot: &UsageSnapshot,
    dex: Option<&dyn Dex>,
) -> Vec<(Change, Factors)> {
    let members: Vec<&Slot> = roster
        .slots
        .iter()
        .filter(|s| !s.is_placeholder())
        .collect();

    let member_types: Vec<&[Type]> = match dex {
        Some(dex) => members
            .iter()
            .filter_map(|s| dex.species_types(&s.species))
            .collect(),
        None => Vec::new(),
    };
    let shared = matchup::shared_weaknesses(&member_types);

    snapshot
        .iter()
        .filter(|s| !roster.contains_species(&s.name))
        .filter(|s| dex.is_none_or(|dex| dex.has_species(&s.name)))
        .map(|s| {
            let coverage = dex
                .and_then(|dex| dex.species_types(&s.name))
                .map_or(0.0, |types| matchup::patch_score(types, &shared));
            let factors = Factors {
                usage: s.usage,
                fit: teammate_fit(s, &members),
                coverage,
            };
            (Change::Species(s.name.clone()), factors)
        })
        .collect()
}

/// Mean co-occurrence of the candidate with each species already on the team
fn teammate_fit(candidate: &SpeciesUsage, members: &[&Slot]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let total: f64 = members
        .iter()
        .map(|m| candidate.teammate_rate(&m.species))
        .sum();
    total / members.len() as f64
}

fn detail_candidates(candidate: &Slot, usage: &SpeciesUsage) -> Vec<(Change, Factors)> {
    let by_rate = |rate: &Rate| Factors {
        usage: rate.rate,
        fit: 0.0,
        coverage: 0.0,
    };

    let replaces = if candidate.moves.len() >= MAX_MOVES {
        weakest_move(candidate, usage)
    } else {
        None
    };

    let mut out = Vec::new();
    if candidate.moves.len() < MAX_MOVES || replaces.is_some() {
        for rate in usage.moves.values() {
            if candidate.has_move(&rate.name) {
                continue;
            }
            let change = Change::Move {
                name: rate.name.clone(),
                replaces: replaces.clone(),
            };
            out.push((change, by_rate(rate)));
        }
    }

    let current_item = candidate.item_id();
    for rate in usage.items.values() {
        if current_item.as_deref() != Some(to_id(&rate.name).as_str()) {
            out.push((Change::Item(rate.name.clone()), by_rate(rate)));
        }
    }

    let current_ability = candidate.ability.as_deref().map(to_id);
    for rate in usage.abilities.values() {
        if current_ability.as_deref() != Some(to_id(&rate.name).as_str()) {
            out.push((Change::Ability(rate.name.clone()), by_rate(rate)));
        }
    }
    out
}

/// The least used move currently on the slot; the last one wins ties
fn weakest_move(slot: &Slot, usage: &SpeciesUsage) -> Option<String> {
    slot.moves
        .iter()
        .map(|m| (m, usage.moves.get(&to_id(m)).map_or(0.0, |r| r.rate)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b).then(Ordering::Greater))
        .map(|(m, _)| m.clone())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta};
    use rotom_dex::MemoryDex;
    use rotom_rules::Clause;
    use rotom_team::FormatId;
    use serde_json::json;

    use super::*;

    fn snapshot(format: &str, raw: serde_json::Value) -> UsageSnapshot {
        UsageSnapshot::from_value(
            SnapshotId(7),
            FormatId::new(format),
            &raw,
            DateTime::from_timestamp(1_760_000_000, 0).unwrap(),
            TimeDelta::days(30),
        )
        .unwrap()
    }

    fn ou_stats() -> UsageSnapshot {
        snapshot(
            "gen9ou",
            json!({
                "pokemon": {
                    "Great Tusk": {"usage": 0.30, "teammates": {"Kingambit": 0.4}},
                    "Kingambit": {
                        "usage": 0.28,
                        "moves": {
                            "Sucker Punch": 0.9,
                            "Kowtow Cleave": 0.85,
                            "Iron Head": 0.7,
                            "Swords Dance": 0.6,
                            "Low Kick": 0.2
                        },
                        "items": {"Leftovers": 0.4, "Black Glasses": 0.3},
                        "abilities": {"Supreme Overlord": 0.95, "Defiant": 0.05}
                    },
                    "Dragapult": {"usage": 0.25},
                    "Zamazenta": {"usage": 0.25},
                    "Zoroark-Hisui": {"usage": 0.26}
                }
            }),
        )
    }

    fn open() -> Ruleset {
        Ruleset::new("gen9ou", 1)
    }

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.change.name()).collect()
    }

    #[test]
    fn test_species_excludes_roster_and_uses_fit() {
        let roster = Roster::new("gen9ou").with_slots(vec![Slot::new("Kingambit")]);
        let recs = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Intermediate, None).unwrap();

        assert!(!names(&recs).contains(&"Kingambit"));
        // 0.30 + 0.4 * 0.5 fit
        assert_eq!(recs[0].change, Change::Species("Great Tusk".to_string()));
        assert!((recs[0].score - 0.5).abs() < 1e-9);
        assert_eq!(recs[0].slot.species, "Great Tusk");
        assert_eq!(recs[0].snapshot, SnapshotId(7));
    }

    #[test]
    fn test_ties_break_by_name() {
        let roster = Roster::new("gen9ou");
        let recs = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();
        assert_eq!(
            names(&recs),
            vec!["Great Tusk", "Kingambit", "Zoroark-Hisui", "Dragapult", "Zamazenta"]
        );

        let again = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();
        assert_eq!(recs, again);
    }

    #[test]
    fn test_beginner_penalizes_execution_heavy_picks() {
        let roster = Roster::new("gen9ou");
        let beginner = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Beginner, None).unwrap();
        assert_eq!(names(&beginner).last(), Some(&"Zoroark-Hisui"));

        let expert = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();
        assert_eq!(names(&expert)[2], "Zoroark-Hisui");
    }

    #[test]
    fn test_expert_rewards_patching_weaknesses() {
        let dex = MemoryDex::new()
            .with_species("Kingambit", &[Type::Dark, Type::Steel])
            .with_species("Great Tusk", &[Type::Ground, Type::Fighting])
            .with_species("Dragapult", &[Type::Dragon, Type::Ghost])
            .with_species("Zamazenta", &[Type::Fighting])
            .with_species("Zoroark-Hisui", &[Type::Normal, Type::Ghost]);
        let roster = Roster::new("gen9ou").with_slots(vec![Slot::new("Kingambit")]);

        let recs = score(
            &Slot::default(),
            &roster,
            &open(),
            &ou_stats(),
            SkillTier::Expert,
            Some(&dex),
        )
        .unwrap();
        // Ghost blanks Fighting and Dragon resists Fire, outweighing Great Tusk's fit
        assert_eq!(recs[0].change.name(), "Dragapult");
        assert!((recs[0].score - (0.25 + 0.5 * 2.0 / 3.0)).abs() < 1e-9);

        let without = score(&Slot::default(), &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();
        assert_eq!(without[0].change.name(), "Great Tusk");
    }

    #[test]
    fn test_detail_mode_ranks_moves_items_abilities() {
        let roster = Roster::new("gen9ou");
        let candidate = Slot::new("Kingambit")
            .with_ability("Supreme Overlord")
            .with_moves(["Kowtow Cleave"]);
        let recs = score(&candidate, &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();

        let all = names(&recs);
        assert!(!all.contains(&"Kowtow Cleave"));
        assert!(!all.contains(&"Supreme Overlord"));
        assert!(all.contains(&"Defiant"));
        assert_eq!(
            recs[0].change,
            Change::Move {
                name: "Sucker Punch".to_string(),
                replaces: None
            }
        );
        assert_eq!(recs[0].slot.moves, vec!["Kowtow Cleave", "Sucker Punch"]);
    }

    #[test]
    fn test_full_moveset_replaces_weakest() {
        let roster = Roster::new("gen9ou");
        let candidate = Slot::new("Kingambit").with_moves([
            "Kowtow Cleave",
            "Low Kick",
            "Iron Head",
            "Swords Dance",
        ]);
        let recs = score(&candidate, &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap();

        let sucker = recs
            .iter()
            .find(|r| r.change.name() == "Sucker Punch")
            .unwrap();
        assert_eq!(
            sucker.change,
            Change::Move {
                name: "Sucker Punch".to_string(),
                replaces: Some("Low Kick".to_string())
            }
        );
        assert_eq!(sucker.slot.moves.len(), MAX_MOVES);
        assert!(!sucker.slot.has_move("Low Kick"));
    }

    #[test]
    fn test_beginner_penalty_applies_to_moves() {
        let roster = Roster::new("gen9ou");
        let candidate = Slot::new("Kingambit");
        let recs = score(&candidate, &roster, &open(), &ou_stats(), SkillTier::Beginner, None).unwrap();
        let sucker = recs.iter().find(|r| r.change.name() == "Sucker Punch").unwrap();
        assert!((sucker.score - 0.4).abs() < 1e-9);
        assert_eq!(sucker.usage, 0.9);
    }

    #[test]
    fn test_wrong_format_is_incompatible() {
        let roster = Roster::new("gen9uu");
        let uu = Ruleset::new("gen9uu", 1);
        let err = score(&Slot::default(), &roster, &uu, &ou_stats(), SkillTier::Expert, None).unwrap_err();
        assert_eq!(
            err,
            MetaError::IncompatibleSnapshot {
                snapshot: FormatId::new("gen9ou"),
                ruleset: FormatId::new("gen9uu")
            }
        );
    }

    #[test]
    fn test_banned_species_never_suggested() {
        let ruleset = open().with_clause(Clause::SpeciesClause).ban_species("Zamazenta");
        let roster = Roster::new("gen9ou").with_slots(vec![Slot::new("Kingambit")]);
        let recs = score(&Slot::default(), &roster, &ruleset, &ou_stats(), SkillTier::Expert, None).unwrap();

        let all = names(&recs);
        assert!(!all.contains(&"Zamazenta"));
        assert_eq!(all, vec!["Great Tusk", "Zoroark-Hisui", "Dragapult"]);
    }

    #[test]
    fn test_banned_move_and_item_clash_dropped() {
        let ruleset = open()
            .with_clause(Clause::ItemClause)
            .ban_move("Swords Dance");
        let holder = Slot::new("Great Tusk").with_item("Leftovers");
        let candidate = Slot::new("Kingambit").with_moves(["Kowtow Cleave"]);
        let roster = Roster::new("gen9ou").with_slots(vec![holder, candidate.clone()]);

        let recs = score(&candidate, &roster, &ruleset, &ou_stats(), SkillTier::Expert, None).unwrap();
        let all = names(&recs);
        assert!(!all.contains(&"Leftovers"));
        assert!(!all.contains(&"Swords Dance"));
        assert!(all.contains(&"Black Glasses"));
        assert!(all.contains(&"Iron Head"));
    }

    #[test]
    fn test_existing_violations_do_not_block_suggestions() {
        let ruleset = open().ban_item("Choice Band");
        let candidate = Slot::new("Kingambit")
            .with_ability("Supreme Overlord")
            .with_item("Choice Band");
        let roster = Roster::new("gen9ou").with_slots(vec![candidate.clone()]);

        let recs = score(&candidate, &roster, &ruleset, &ou_stats(), SkillTier::Expert, None).unwrap();
        assert_eq!(
            recs[0].change,
            Change::Move {
                name: "Sucker Punch".to_string(),
                replaces: None
            }
        );
        assert!(names(&recs).contains(&"Leftovers"));
    }

    #[test]
    fn test_unknown_species_has_no_usage() {
        let roster = Roster::new("gen9ou");
        let err = score(&Slot::new("Pikachu"), &roster, &open(), &ou_stats(), SkillTier::Expert, None).unwrap_err();
        assert_eq!(err, MetaError::NoUsageData("Pikachu".to_string()));
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("Expert".parse::<SkillTier>().unwrap(), SkillTier::Expert);
        assert_eq!(" beginner ".parse::<SkillTier>().unwrap(), SkillTier::Beginner);
        assert!(matches!(
            "grandmaster".parse::<SkillTier>(),
            Err(MetaError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_penalty_table() {
        assert_eq!(penalty(&Change::Item("Red Card".to_string())), 1.0);
        assert_eq!(penalty(&Change::Ability("Illusion".to_string())), 1.0);
        assert_eq!(penalty(&Change::Species("Great Tusk".to_string())), 0.0);
    }
}
