//! Shared, read-mostly store of published rulesets

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use rotom_team::{FormatId, RulesetId};

use crate::RulesError;
use crate::ruleset::Ruleset;

/// Published rulesets, every revision of every format.
///
/// Readers get an `Arc` to an immutable revision; publishing a new revision
/// never touches the ones already handed out.
#[derive(Debug, Default)]
pub struct RulesetStore {
    rulesets: RwLock<HashMap<FormatId, BTreeMap<u32, Arc<Ruleset>>>>,
}

impl RulesetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest revision for a format
    pub fn get(&self, format: &FormatId) -> Result<Arc<Ruleset>, RulesError> {
        let rulesets = self.rulesets.read().unwrap_or_else(PoisonError::into_inner);
        rulesets
            .get(format)
            .and_then(|revisions| revisions.values().next_back())
            .cloned()
            .ok_or_else(|| RulesError::NotFound(format.clone()))
    }

    /// A specific revision
    pub fn get_revision(&self, id: &RulesetId) -> Result<Arc<Ruleset>, RulesError> {
        let rulesets = self.rulesets.read().unwrap_or_else(PoisonError::into_inner);
        let revisions = rulesets
            .get(&id.format)
            .ok_or_else(|| RulesError::NotFound(id.format.clone()))?;
        revisions
            .get(&id.revision)
            .cloned()
            .ok_or_else(|| RulesError::RevisionNotFound(id.clone()))
    }

    /// Register a new revision. Re-publishing an existing format+revision
    /// pair is rejected, even if the content is identical.
    pub fn publish(&self, ruleset: Ruleset) -> Result<Arc<Ruleset>, RulesError> {
        let id = ruleset.id.clone();
        let ruleset = Arc::new(ruleset);

        let mut rulesets = self.rulesets.write().unwrap_or_else(PoisonError::into_inner);
        let revisions = rulesets.entry(id.format.clone()).or_default();
        if revisions.contains_key(&id.revision) {
            return Err(RulesError::VersionConflict(id));
        }
        revisions.insert(id.revision, Arc::clone(&ruleset));
        drop(rulesets);

        tracing::info!(
            ruleset = %id,
            clauses = ruleset.clauses.len(),
            effective_from = %ruleset.effective_from,
            "Published ruleset"
        );
        Ok(ruleset)
    }

    /// Publish every ruleset in a JSON array, stopping at the first conflict
    pub fn load_json(&self, json: &str) -> Result<Vec<Arc<Ruleset>>, RulesError> {
        let rulesets: Vec<Ruleset> = serde_json::from_str(json)?;
        rulesets.into_iter().map(|r| self.publish(r)).collect()
    }

    /// Formats with at least one published revision, sorted
    pub fn formats(&self) -> Vec<FormatId> {
        let rulesets = self.rulesets.read().unwrap_or_else(PoisonError::into_inner);
        let mut formats: Vec<FormatId> = rulesets.keys().cloned().collect();
        formats.sort();
        formats
    }
}
