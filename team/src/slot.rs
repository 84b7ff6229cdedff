//! A single roster position

use rotom_dex::{Type, to_id};
use serde::{Deserialize, Serialize};

use crate::stats::StatSpread;

/// Max moves a slot may carry
pub const MAX_MOVES: usize = 4;
/// Level used when none is given
pub const DEFAULT_LEVEL: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_char(&self) -> char {
        match self {
            Gender::Male => 'M',
            Gender::Female => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'M' | 'm' => Some(Gender::Male),
            'F' | 'f' => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Full configuration of one team member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    /// Species including forme, e.g. "Ogerpon-Wellspring"
    pub species: String,

    /// Nickname (only when different from species)
    pub nickname: Option<String>,

    pub gender: Option<Gender>,

    /// Held item
    pub item: Option<String>,

    pub ability: Option<String>,

    /// Ordered move set, at most [`MAX_MOVES`] distinct entries
    pub moves: Vec<String>,

    pub evs: StatSpread,

    pub ivs: StatSpread,

    /// Nature name without the " Nature" suffix
    pub nature: Option<String>,

    /// Level (1-100)
    pub level: u8,

    pub shiny: bool,

    pub tera_type: Option<Type>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            species: String::new(),
            nickname: None,
            gender: None,
            item: None,
            ability: None,
            moves: Vec::new(),
            evs: StatSpread::zero_evs(),
            ivs: StatSpread::max_ivs(),
            nature: None,
            level: DEFAULT_LEVEL,
            shiny: false,
            tera_type: None,
        }
    }
}

impl Slot {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    pub fn with_moves<I, S>(mut self, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moves = moves.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_evs(mut self, evs: StatSpread) -> Self {
        self.evs = evs;
        self
    }

    pub fn with_nature(mut self, nature: impl Into<String>) -> Self {
        self.nature = Some(nature.into());
        self
    }

    /// Whether the slot has a species chosen yet
    pub fn is_placeholder(&self) -> bool {
        self.species.trim().is_empty()
    }

    /// Display name (nickname if set, otherwise species)
    pub fn name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.species)
    }

    pub fn species_id(&self) -> String {
        to_id(&self.species)
    }

    pub fn item_id(&self) -> Option<String> {
        self.item.as_deref().map(to_id).filter(|id| !id.is_empty())
    }

    pub fn has_move(&self, name: &str) -> bool {
        let wanted = to_id(name);
        self.moves.iter().any(|m| to_id(m) == wanted)
    }

    /// Moves that repeat an earlier entry (compared by id), in order of
    /// their second appearance
    pub fn duplicate_moves(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.moves.len());
        let mut dupes = Vec::new();
        for m in &self.moves {
            let id = to_id(m);
            if seen.contains(&id) {
                dupes.push(m.as_str());
            } else {
                seen.push(id);
            }
        }
        dupes
    }
}
