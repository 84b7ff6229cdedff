//! Published sample teams per format

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rotom_dex::Dex;
use rotom_rules::{Ruleset, ValidationResult, validate, validate_with_dex};
use rotom_team::{FormatId, Roster, RulesetId, Slot, parse_export};

/// A reference team, with the verdict it got when it was loaded
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTeam {
    pub slots: Vec<Slot>,
    pub validated_against: RulesetId,
    pub validation: ValidationResult,
}

/// Sample teams for every format, replaced wholesale on each load.
///
/// Readers get an `Arc` to the list that was current when they asked.
#[derive(Debug, Default)]
pub struct SampleLibrary {
    teams: RwLock<HashMap<FormatId, Arc<Vec<SampleTeam>>>>,
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate export `texts` under `ruleset`, keeping the first
    /// `limit` that parse. Text that does not parse is skipped.
    pub fn load(
        &self,
        ruleset: &Ruleset,
        texts: &[String],
        limit: usize,
        dex: Option<&dyn Dex>,
    ) -> Arc<Vec<SampleTeam>> {
        let mut teams = Vec::new();
        for (position, text) in texts.iter().enumerate() {
            if teams.len() == limit {
                break;
            }
            let slots = match parse_export(text) {
                Ok(slots) => slots,
                Err(err) => {
                    tracing::warn!(format = %ruleset.format(), position, error = %err, "Skipped sample team");
                    continue;
                }
            };
            let roster = Roster::new(ruleset.format().clone()).with_slots(slots);
            let validation = match dex {
                Some(dex) => validate_with_dex(&roster, ruleset, dex),
                None => validate(&roster, ruleset),
            };
            teams.push(SampleTeam {
                slots: roster.slots,
                validated_against: ruleset.id.clone(),
                validation,
            });
        }

        let teams = Arc::new(teams);
        self.teams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ruleset.format().clone(), Arc::clone(&teams));

        tracing::info!(
            ruleset = %ruleset.id,
            loaded = teams.len(),
            legal = teams.iter().filter(|t| t.validation.is_legal()).count(),
            "Loaded sample teams"
        );
        teams
    }

    /// Teams for `format`; empty when none were loaded
    pub fn get(&self, format: &FormatId) -> Arc<Vec<SampleTeam>> {
        let teams = self.teams.read().unwrap_or_else(PoisonError::into_inner);
        teams.get(format).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use rotom_rules::{Clause, Reason};

    use super::*;

    fn ou() -> Ruleset {
        Ruleset::new("gen9ou", 1)
            .with_clause(Clause::SpeciesClause)
            .ban_species("Koraidon")
    }

    #[test]
    fn test_load_validates_and_caps() {
        let library = SampleLibrary::new();
        let texts = vec![
            "Kingambit @ Black Glasses\n- Sucker Punch\n\nGreat Tusk\n- Rapid Spin\n".to_string(),
            "Koraidon\n- Collision Course\n".to_string(),
            "Dragapult\n- Shadow Ball\n".to_string(),
        ];

        let teams = library.load(&ou(), &texts, 2, None);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].slots.len(), 2);
        assert!(teams[0].validation.is_legal());
        assert_eq!(teams[1].validation.violations()[0].reason, Reason::BannedSpecies);
        assert_eq!(teams[1].validated_against, RulesetId::new("gen9ou", 1));

        assert_eq!(library.get(&FormatId::new("gen9ou")), teams);
        assert!(library.get(&FormatId::new("gen9uu")).is_empty());
    }

    #[test]
    fn test_unparseable_text_is_skipped() {
        let library = SampleLibrary::new();
        let texts = vec![
            "Kingambit\nLevel: lots\n".to_string(),
            "Great Tusk\n- Rapid Spin\n".to_string(),
        ];
        let teams = library.load(&ou(), &texts, 2, None);
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].slots[0].species, "Great Tusk");
    }

    #[test]
    fn test_reload_replaces() {
        let library = SampleLibrary::new();
        library.load(&ou(), &["Kingambit\n".to_string()], 2, None);
        library.load(&ou(), &[], 2, None);
        assert!(library.get(&FormatId::new("gen9ou")).is_empty());
    }
}
