//! Team legality validation
//!
//! Every problem is reported in one pass so a caller can fix a whole team at
//! once instead of one error per round trip.
//!
//! Order of violations: slot index, then rule order (structure, reference
//! table, then clauses as the ruleset declares them), then the paired slot.
//! A non-empty banlist is always enforced; when the ruleset does not declare
//! [`Clause::Banlist`] it ranks after every declared clause.

use std::collections::HashMap;

use rotom_dex::Dex;
use rotom_team::{MAX_SLOTS, Roster, Slot, StructuralError};
use serde::Serialize;

use crate::ruleset::{Clause, Ruleset};

/// Which rule a violation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rule {
    /// Roster shape (slot count, move list)
    Structure,
    /// Name missing from the species-data table
    Reference,
    Clause(Clause),
}

/// Machine-readable reason code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Reason {
    TooManySlots,
    TooManyMoves,
    DuplicateMove,
    MissingSpecies,
    InvalidLevel,
    UnknownSpecies,
    UnknownAbility,
    UnknownItem,
    UnknownMove,
    DuplicateSpecies,
    DuplicateItem,
    OverLevelCap,
    EvTotalOverLimit,
    EvStatOverLimit,
    BannedSpecies,
    BannedItem,
    BannedAbility,
    BannedMove,
    OverTeamSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Offending slot (for a duplicate pair, the later one)
    pub slot: usize,
    /// Earlier slot of a duplicate pair
    pub paired_slot: Option<usize>,
    pub rule: Rule,
    pub reason: Reason,
    /// Offending name, when there is one
    pub subject: Option<String>,
}

impl Violation {
    fn new(slot: usize, rule: Rule, reason: Reason) -> Self {
        Self {
            slot,
            paired_slot: None,
            rule,
            reason,
            subject: None,
        }
    }

    fn paired(mut self, other: usize) -> Self {
        self.paired_slot = Some(other);
        self
    }

    fn about(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Every slot this violation references, ascending
    pub fn slots(&self) -> Vec<usize> {
        match self.paired_slot {
            Some(other) => vec![other.min(self.slot), other.max(self.slot)],
            None => vec![self.slot],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationResult {
    Legal,
    Illegal(Vec<Violation>),
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationResult::Legal
        } else {
            ValidationResult::Illegal(violations)
        }
    }

    pub fn is_legal(&self) -> bool {
        matches!(self, ValidationResult::Legal)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Legal => &[],
            ValidationResult::Illegal(violations) => violations,
        }
    }
}

/// Check a roster against a ruleset
pub fn validate(roster: &Roster, ruleset: &Ruleset) -> ValidationResult {
    run(roster, ruleset, None)
}

/// [`validate`], plus a check that every name exists in the reference table
pub fn validate_with_dex(roster: &Roster, ruleset: &Ruleset, dex: &dyn Dex) -> ValidationResult {
    run(roster, ruleset, Some(dex))
}

fn run(roster: &Roster, ruleset: &Ruleset, dex: Option<&dyn Dex>) -> ValidationResult {
    if roster.len() > MAX_SLOTS {
        let violation = Violation::new(MAX_SLOTS, Rule::Structure, Reason::TooManySlots)
            .about(roster.len().to_string());
        return ValidationResult::Illegal(vec![violation]);
    }

    // (rank, violation); rank orders rules within a slot
    let mut found: Vec<(usize, Violation)> = Vec::new();

    for problem in roster.structural_problems() {
        found.push((0, structural_violation(problem)));
    }

    if let Some(dex) = dex {
        for (index, slot) in roster.slots.iter().enumerate() {
            for violation in unknown_names(index, slot, dex) {
                found.push((1, violation));
            }
        }
    }

    for (position, clause) in ruleset.clauses.iter().enumerate() {
        let rank = 2 + position;
        for violation in check_clause(roster, ruleset, *clause) {
            found.push((rank, violation));
        }
    }

    if !ruleset.has_clause(&Clause::Banlist) && !ruleset.bans.is_empty() {
        let rank = 2 + ruleset.clauses.len();
        for violation in check_clause(roster, ruleset, Clause::Banlist) {
            found.push((rank, violation));
        }
    }

    found.sort_by_key(|(rank, v)| (v.slot, *rank, v.paired_slot));
    let violations: Vec<Violation> = found.into_iter().map(|(_, v)| v).collect();

    tracing::debug!(
        ruleset = %ruleset.id,
        slots = roster.len(),
        violations = violations.len(),
        "Validated roster"
    );

    ValidationResult::from_violations(violations)
}

fn structural_violation(problem: StructuralError) -> Violation {
    match problem {
        StructuralError::TooManySlots { count } => {
            Violation::new(MAX_SLOTS, Rule::Structure, Reason::TooManySlots).about(count.to_string())
        }
        StructuralError::TooManyMoves { slot, count } => {
            Violation::new(slot, Rule::Structure, Reason::TooManyMoves).about(count.to_string())
        }
        StructuralError::DuplicateMove { slot, name } => {
            Violation::new(slot, Rule::Structure, Reason::DuplicateMove).about(name)
        }
        StructuralError::MissingSpecies { slot } => {
            Violation::new(slot, Rule::Structure, Reason::MissingSpecies)
        }
        StructuralError::InvalidLevel { slot, level } => {
            Violation::new(slot, Rule::Structure, Reason::InvalidLevel).about(level.to_string())
        }
        StructuralError::SlotOutOfRange { index, .. } => {
            Violation::new(index, Rule::Structure, Reason::TooManySlots)
        }
    }
}

fn unknown_names(index: usize, slot: &Slot, dex: &dyn Dex) -> Vec<Violation> {
    let mut out = Vec::new();
    if !slot.is_placeholder() && !dex.has_species(&slot.species) {
        out.push(Violation::new(index, Rule::Reference, Reason::UnknownSpecies).about(&slot.species));
    }
    if let Some(ability) = slot.ability.as_deref().filter(|a| !dex.has_ability(a)) {
        out.push(Violation::new(index, Rule::Reference, Reason::UnknownAbility).about(ability));
    }
    if let Some(item) = slot.item.as_deref().filter(|i| !i.is_empty() && !dex.has_item(i)) {
        out.push(Violation::new(index, Rule::Reference, Reason::UnknownItem).about(item));
    }
    for m in slot.moves.iter().filter(|m| !dex.has_move(m)) {
        out.push(Violation::new(index, Rule::Reference, Reason::UnknownMove).about(m.as_str()));
    }
    out
}

fn check_clause(roster: &Roster, ruleset: &Ruleset, clause: Clause) -> Vec<Violation> {
    let rule = Rule::Clause(clause);
    match clause {
        Clause::SpeciesClause => duplicate_pairs(
            roster,
            |slot| Some(slot.species_id()).filter(|id| !id.is_empty()),
            |slot| slot.species.clone(),
            rule,
            Reason::DuplicateSpecies,
        ),
        Clause::ItemClause => duplicate_pairs(
            roster,
            Slot::item_id,
            |slot| slot.item.clone().unwrap_or_default(),
            rule,
            Reason::DuplicateItem,
        ),
        Clause::LevelCap(cap) => roster
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.level > cap)
            .map(|(i, slot)| Violation::new(i, rule, Reason::OverLevelCap).about(slot.level.to_string()))
            .collect(),
        Clause::EvLimit { total, per_stat } => {
            let mut out = Vec::new();
            for (i, slot) in roster.slots.iter().enumerate() {
                if slot.evs.total() > u32::from(total) {
                    out.push(
                        Violation::new(i, rule, Reason::EvTotalOverLimit).about(slot.evs.total().to_string()),
                    );
                }
                if slot.evs.max_stat() > per_stat {
                    out.push(
                        Violation::new(i, rule, Reason::EvStatOverLimit)
                            .about(slot.evs.max_stat().to_string()),
                    );
                }
            }
            out
        }
        Clause::Banlist => {
            let bans = &ruleset.bans;
            let mut out = Vec::new();
            for (i, slot) in roster.slots.iter().enumerate() {
                if bans.bans_species(&slot.species) {
                    out.push(Violation::new(i, rule, Reason::BannedSpecies).about(&slot.species));
                }
                if let Some(ability) = slot.ability.as_deref().filter(|a| bans.bans_ability(a)) {
                    out.push(Violation::new(i, rule, Reason::BannedAbility).about(ability));
                }
                if let Some(item) = slot.item.as_deref().filter(|i| bans.bans_item(i)) {
                    out.push(Violation::new(i, rule, Reason::BannedItem).about(item));
                }
                for m in slot.moves.iter().filter(|m| bans.bans_move(m)) {
                    out.push(Violation::new(i, rule, Reason::BannedMove).about(m.as_str()));
                }
            }
            out
        }
        Clause::MaxTeamSize(_) => {
            let max = ruleset.max_team_size();
            (max..roster.len())
                .map(|i| Violation::new(i, rule, Reason::OverTeamSize).about(roster.len().to_string()))
                .collect()
        }
    }
}

/// One violation per pair of slots sharing a key; the later slot is the
/// offender, the earlier one is paired.
fn duplicate_pairs(
    roster: &Roster,
    key: impl Fn(&Slot) -> Option<String>,
    subject: impl Fn(&Slot) -> String,
    rule: Rule,
    reason: Reason,
) -> Vec<Violation> {
    let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
    let mut out = Vec::new();
    for (i, slot) in roster.slots.iter().enumerate() {
        let Some(k) = key(slot) else { continue };
        let earlier = seen.entry(k).or_default();
        for &j in earlier.iter() {
            out.push(Violation::new(i, rule, reason).paired(j).about(subject(slot)));
        }
        earlier.push(i);
    }
    out
}
