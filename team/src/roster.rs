//! Rosters and their structural shape

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{FormatId, RulesetId};
use crate::slot::{MAX_MOVES, Slot};

/// Max slots on a roster
pub const MAX_SLOTS: usize = 6;

/// The roster is not shaped like a team at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Roster has {count} slots, at most 6 allowed")]
    TooManySlots { count: usize },

    #[error("Slot {slot} has {count} moves, at most 4 allowed")]
    TooManyMoves { slot: usize, count: usize },

    #[error("Slot {slot} repeats move {name}")]
    DuplicateMove { slot: usize, name: String },

    #[error("Slot {slot} has no species")]
    MissingSpecies { slot: usize },

    #[error("Slot {slot} has level {level}, must be 1-100")]
    InvalidLevel { slot: usize, level: u8 },

    #[error("Slot index {index} out of range for roster of {len}")]
    SlotOutOfRange { index: usize, len: usize },
}

/// A candidate team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub format: FormatId,

    /// Team order
    #[serde(default)]
    pub slots: Vec<Slot>,

    /// Bumped on every committed change; 0 means "no team yet"
    #[serde(default)]
    pub version: u64,

    /// Ruleset this roster was last validated against
    #[serde(default)]
    pub validated_against: Option<RulesetId>,
}

impl Roster {
    pub fn new(format: impl Into<FormatId>) -> Self {
        Self {
            format: format.into(),
            slots: Vec::new(),
            version: 0,
            validated_against: None,
        }
    }

    pub fn with_slots(mut self, slots: Vec<Slot>) -> Self {
        self.slots = slots;
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_SLOTS
    }

    pub fn slot(&self, index: usize) -> Result<&Slot, StructuralError> {
        self.slots.get(index).ok_or(StructuralError::SlotOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    pub fn slot_mut(&mut self, index: usize) -> Result<&mut Slot, StructuralError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(StructuralError::SlotOutOfRange { index, len })
    }

    /// Species ids on the roster, in team order
    pub fn species_ids(&self) -> Vec<String> {
        self.slots.iter().map(Slot::species_id).collect()
    }

    /// Whether a species (by id) is already on the roster
    pub fn contains_species(&self, species: &str) -> bool {
        let wanted = rotom_dex::to_id(species);
        self.slots.iter().any(|s| s.species_id() == wanted)
    }

    /// Every structural problem, slot by slot
    pub fn structural_problems(&self) -> Vec<StructuralError> {
        if self.slots.len() > MAX_SLOTS {
            return vec![StructuralError::TooManySlots {
                count: self.slots.len(),
            }];
        }

        let mut problems = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_placeholder() {
                problems.push(StructuralError::MissingSpecies { slot: index });
            }
            if slot.level == 0 || slot.level > 100 {
                problems.push(StructuralError::InvalidLevel {
                    slot: index,
                    level: slot.level,
                });
            }
            if slot.moves.len() > MAX_MOVES {
                problems.push(StructuralError::TooManyMoves {
                    slot: index,
                    count: slot.moves.len(),
                });
            }
            for name in slot.duplicate_moves() {
                problems.push(StructuralError::DuplicateMove {
                    slot: index,
                    name: name.to_string(),
                });
            }
        }
        problems
    }

    /// First structural problem, if any
    pub fn check_structure(&self) -> Result<(), StructuralError> {
        match self.structural_problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mon(species: &str) -> Slot {
        Slot::new(species)
    }

    #[test]
    fn test_empty_roster_is_well_formed() {
        let roster = Roster::new("gen9ou");
        assert!(roster.is_empty());
        assert!(roster.check_structure().is_ok());
    }

    #[test]
    fn test_too_many_slots_short_circuits() {
        let slots = (0..7).map(|_| mon("")).collect();
        let roster = Roster::new("gen9ou").with_slots(slots);
        assert_eq!(
            roster.structural_problems(),
            vec![StructuralError::TooManySlots { count: 7 }]
        );
    }

    #[test]
    fn test_slot_problems_are_collected() {
        let roster = Roster::new("gen9ou").with_slots(vec![
            mon("Great Tusk").with_moves(["Rapid Spin", "Rapid Spin"]),
            mon("").with_level(0),
            mon("Gholdengo").with_moves(["Make It Rain", "Shadow Ball", "Nasty Plot", "Recover", "Trick"]),
        ]);

        assert_eq!(
            roster.structural_problems(),
            vec![
                StructuralError::DuplicateMove {
                    slot: 0,
                    name: "Rapid Spin".to_string()
                },
                StructuralError::MissingSpecies { slot: 1 },
                StructuralError::InvalidLevel { slot: 1, level: 0 },
                StructuralError::TooManyMoves { slot: 2, count: 5 },
            ]
        );
        assert_eq!(
            roster.check_structure(),
            Err(StructuralError::DuplicateMove {
                slot: 0,
                name: "Rapid Spin".to_string()
            })
        );
    }

    #[test]
    fn test_slot_out_of_range() {
        let roster = Roster::new("gen9ou").with_slots(vec![mon("Kingambit")]);
        assert!(roster.slot(0).is_ok());
        assert_eq!(
            roster.slot(3).unwrap_err(),
            StructuralError::SlotOutOfRange { index: 3, len: 1 }
        );
    }

    #[test]
    fn test_contains_species_by_id() {
        let roster = Roster::new("gen9ou").with_slots(vec![mon("Iron Valiant")]);
        assert!(roster.contains_species("ironvaliant"));
        assert!(!roster.contains_species("Iron Moth"));
    }
}
