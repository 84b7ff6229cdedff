//! Species reference tables

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::id::to_id;
use crate::types::Type;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("Malformed dex data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Species {0} has no types")]
    Untyped(String),
}

/// Read access to the species-data table.
///
/// Names are matched by Showdown id (see [`to_id`]), so `"Great Tusk"` and
/// `"greattusk"` resolve to the same entry.
pub trait Dex: Send + Sync {
    /// Types of a species, or `None` if the species is unknown
    fn species_types(&self, species: &str) -> Option<&[Type]>;

    fn has_ability(&self, ability: &str) -> bool;

    fn has_item(&self, item: &str) -> bool;

    fn has_move(&self, name: &str) -> bool;

    fn has_species(&self, species: &str) -> bool {
        self.species_types(species).is_some()
    }
}

#[derive(Deserialize)]
struct RawDex {
    #[serde(default)]
    species: HashMap<String, Vec<Type>>,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    moves: Vec<String>,
}

/// In-memory [`Dex`] keyed by id
#[derive(Debug, Clone, Default)]
pub struct MemoryDex {
    species: HashMap<String, Vec<Type>>,
    abilities: HashSet<String>,
    items: HashSet<String>,
    moves: HashSet<String>,
}

impl MemoryDex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON of the form
    /// `{"species": {"Name": ["Type", ..]}, "abilities": [..], "items": [..], "moves": [..]}`
    pub fn from_json(json: &str) -> Result<Self, DexError> {
        let raw: RawDex = serde_json::from_str(json)?;
        let mut dex = Self::new();
        for (name, types) in raw.species {
            if types.is_empty() {
                return Err(DexError::Untyped(name));
            }
            dex.species.insert(to_id(&name), types);
        }
        dex.abilities = raw.abilities.iter().map(|a| to_id(a)).collect();
        dex.items = raw.items.iter().map(|i| to_id(i)).collect();
        dex.moves = raw.moves.iter().map(|m| to_id(m)).collect();
        Ok(dex)
    }

    pub fn with_species(mut self, name: &str, types: &[Type]) -> Self {
        self.species.insert(to_id(name), types.to_vec());
        self
    }

    pub fn with_ability(mut self, name: &str) -> Self {
        self.abilities.insert(to_id(name));
        self
    }

    pub fn with_item(mut self, name: &str) -> Self {
        self.items.insert(to_id(name));
        self
    }

    pub fn with_move(mut self, name: &str) -> Self {
        self.moves.insert(to_id(name));
        self
    }
}

impl Dex for MemoryDex {
    fn species_types(&self, species: &str) -> Option<&[Type]> {
        self.species.get(&to_id(species)).map(Vec::as_slice)
    }

    fn has_ability(&self, ability: &str) -> bool {
        self.abilities.contains(&to_id(ability))
    }

    fn has_item(&self, item: &str) -> bool {
        self.items.contains(&to_id(item))
    }

    fn has_move(&self, name: &str) -> bool {
        self.moves.contains(&to_id(name))
    }
}
