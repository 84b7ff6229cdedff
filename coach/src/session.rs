//! One user's team-building session

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rotom_dex::Dex;
use rotom_meta::{MetaError, Recommendation, SkillTier, UsageSnapshot, score};
use rotom_rules::{Ruleset, ValidationResult, validate, validate_with_dex};
use rotom_team::{MAX_SLOTS, Roster, Slot, StructuralError, parse_export};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::export::render;

/// Opaque session key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle of a session
///
/// ```text
/// Empty -> Draft -> Validated -> Exported
///            ^  \-> Invalid       |
///            \-------<------------/      any -> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Empty,
    Draft,
    Validated,
    Invalid,
    Exported,
    Closed,
}

/// One committed roster and the verdict it got
#[derive(Debug, Clone, PartialEq)]
pub struct RosterVersion {
    pub roster: Roster,
    /// `None` until the roster has been validated
    pub validation: Option<ValidationResult>,
}

impl RosterVersion {
    pub fn version(&self) -> u64 {
        self.roster.version
    }
}

/// A change requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddSlot { slot: Slot },
    ReplaceSlot { index: usize, slot: Slot },
    RemoveSlot { index: usize },
    SetSpecies { index: usize, species: String },
    SetItem { index: usize, item: Option<String> },
    SetAbility { index: usize, ability: Option<String> },
    SetMoves { index: usize, moves: Vec<String> },
    SetLevel { index: usize, level: u8 },
    SetNickname { index: usize, nickname: Option<String> },
    /// Replace every slot at once
    ReplaceRoster { slots: Vec<Slot> },
    /// Replace every slot from teambuilder export text
    Import { text: String },
}

impl Edit {
    /// Slot an edit works on, for edits that touch a single slot
    pub fn target(&self) -> Option<usize> {
        match self {
            Edit::ReplaceSlot { index, .. }
            | Edit::SetSpecies { index, .. }
            | Edit::SetItem { index, .. }
            | Edit::SetAbility { index, .. }
            | Edit::SetMoves { index, .. }
            | Edit::SetLevel { index, .. }
            | Edit::SetNickname { index, .. } => Some(*index),
            Edit::AddSlot { .. }
            | Edit::RemoveSlot { .. }
            | Edit::ReplaceRoster { .. }
            | Edit::Import { .. } => None,
        }
    }

    fn apply(self, roster: &mut Roster) -> Result<()> {
        match self {
            Edit::AddSlot { slot } => {
                if roster.is_full() {
                    return Err(StructuralError::TooManySlots {
                        count: roster.len() + 1,
                    }
                    .into());
                }
                roster.slots.push(slot);
            }
            Edit::ReplaceSlot { index, slot } => *roster.slot_mut(index)? = slot,
            Edit::RemoveSlot { index } => {
                roster.slot(index)?;
                roster.slots.remove(index);
            }
            Edit::SetSpecies { index, species } => roster.slot_mut(index)?.species = species,
            Edit::SetItem { index, item } => roster.slot_mut(index)?.item = item,
            Edit::SetAbility { index, ability } => roster.slot_mut(index)?.ability = ability,
            Edit::SetMoves { index, moves } => roster.slot_mut(index)?.moves = moves,
            Edit::SetLevel { index, level } => roster.slot_mut(index)?.level = level,
            Edit::SetNickname { index, nickname } => roster.slot_mut(index)?.nickname = nickname,
            Edit::ReplaceRoster { slots } => replace_slots(roster, slots)?,
            Edit::Import { text } => replace_slots(roster, parse_export(&text)?)?,
        }
        Ok(())
    }
}

fn replace_slots(roster: &mut Roster, slots: Vec<Slot>) -> Result<()> {
    if slots.len() > MAX_SLOTS {
        return Err(StructuralError::TooManySlots { count: slots.len() }.into());
    }
    roster.slots = slots;
    Ok(())
}

/// Suggestions computed as part of an edit
#[derive(Debug, Clone, PartialEq)]
pub enum Advice {
    /// Changes for the edited slot, or species for the next open slot
    Ranked(Vec<Recommendation>),
    /// The roster is not legal, or it is full and no single slot was edited
    NotScored,
    /// Usage stats were missing, stale or unusable; the edit still committed
    Unavailable(MetaError),
}

/// What an accepted edit produced
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub version: u64,
    pub state: SessionState,
    pub validation: ValidationResult,
    pub advice: Advice,
}

/// A session's roster history and bindings.
///
/// Every accepted edit creates a new [`RosterVersion`]; versions are shared
/// by `Arc` and never mutated, so callers can hold on to one while the
/// session moves on.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    current: Arc<RosterVersion>,
    history: VecDeque<Arc<RosterVersion>>,
    history_depth: usize,
    /// Highest version ever committed, so undo never reuses a number
    last_version: u64,
    ruleset: Arc<Ruleset>,
    snapshot: Option<Arc<UsageSnapshot>>,
    /// Tier and size of the advice attached to each edit
    tier: SkillTier,
    advice_limit: usize,
    last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, ruleset: Arc<Ruleset>, history_depth: usize, now: DateTime<Utc>) -> Self {
        let current = Arc::new(RosterVersion {
            roster: Roster::new(ruleset.format().clone()),
            validation: None,
        });
        Self {
            id,
            state: SessionState::Empty,
            current,
            history: VecDeque::new(),
            history_depth,
            last_version: 0,
            ruleset,
            snapshot: None,
            tier: SkillTier::Intermediate,
            advice_limit: 10,
            last_activity: now,
        }
    }

    pub fn with_advice(mut self, tier: SkillTier, limit: usize) -> Self {
        self.tier = tier;
        self.advice_limit = limit;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current(&self) -> Arc<RosterVersion> {
        Arc::clone(&self.current)
    }

    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    pub fn tier(&self) -> SkillTier {
        self.tier
    }

    pub fn set_tier(&mut self, tier: SkillTier) {
        self.tier = tier;
    }

    /// Snapshot used by the last recommendation
    pub fn snapshot(&self) -> Option<&Arc<UsageSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StateError::Closed(self.id).into());
        }
        Ok(())
    }

    /// Apply an edit, validate the result and commit it as a new version.
    ///
    /// A legal result is then scored against `snapshot` with the session's
    /// tier. Stats that cannot be used show up as [`Advice::Unavailable`] and
    /// never undo the edit. A rejected edit leaves the session untouched.
    pub fn edit(
        &mut self,
        edit: Edit,
        dex: Option<&dyn Dex>,
        snapshot: std::result::Result<Arc<UsageSnapshot>, MetaError>,
        now: DateTime<Utc>,
    ) -> Result<EditOutcome> {
        self.ensure_open()?;

        let target = edit.target();
        let mut roster = self.current.roster.clone();
        edit.apply(&mut roster)?;
        // Draft only lives between the edit and its validation
        self.state = SessionState::Draft;

        let mut outcome = self.commit(roster, dex);
        outcome.advice = self.advise(target, &outcome.validation, snapshot, dex);
        self.last_activity = now;
        tracing::debug!(
            session = %self.id,
            version = outcome.version,
            state = ?outcome.state,
            violations = outcome.validation.violations().len(),
            "Edit committed"
        );
        Ok(outcome)
    }

    fn advise(
        &mut self,
        target: Option<usize>,
        validation: &ValidationResult,
        snapshot: std::result::Result<Arc<UsageSnapshot>, MetaError>,
        dex: Option<&dyn Dex>,
    ) -> Advice {
        if !validation.is_legal() {
            return Advice::NotScored;
        }
        let roster = &self.current.roster;
        let candidate = match target.and_then(|index| roster.slots.get(index)) {
            Some(slot) => slot.clone(),
            None if roster.len() < self.ruleset.max_team_size() => Slot::default(),
            None => return Advice::NotScored,
        };

        let ranked = snapshot.and_then(|snapshot| {
            let ranked = score(&candidate, roster, &self.ruleset, &snapshot, self.tier, dex)?;
            Ok((ranked, snapshot))
        });
        match ranked {
            Ok((mut ranked, snapshot)) => {
                ranked.truncate(self.advice_limit);
                self.snapshot = Some(snapshot);
                Advice::Ranked(ranked)
            }
            Err(err) => {
                tracing::debug!(session = %self.id, error = %err, "Edit not scored");
                Advice::Unavailable(err)
            }
        }
    }

    fn commit(&mut self, mut roster: Roster, dex: Option<&dyn Dex>) -> EditOutcome {
        let validation = match dex {
            Some(dex) => validate_with_dex(&roster, &self.ruleset, dex),
            None => validate(&roster, &self.ruleset),
        };

        self.last_version += 1;
        roster.version = self.last_version;
        roster.validated_against = Some(self.ruleset.id.clone());

        let next = Arc::new(RosterVersion {
            roster,
            validation: Some(validation.clone()),
        });
        let prior = std::mem::replace(&mut self.current, next);
        // the untouched starting roster is not a version worth returning to
        if prior.version() > 0 {
            self.push_history(prior);
        }

        self.state = state_for(&validation);
        EditOutcome {
            version: self.last_version,
            state: self.state,
            validation,
            advice: Advice::NotScored,
        }
    }

    fn push_history(&mut self, version: Arc<RosterVersion>) {
        if self.history_depth == 0 {
            return;
        }
        self.history.push_back(version);
        while self.history.len() > self.history_depth {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(session = %self.id, version = evicted.version(), "History full, dropped version");
            }
        }
    }

    /// Restore the previous version
    pub fn undo(&mut self, now: DateTime<Utc>) -> Result<Arc<RosterVersion>> {
        self.ensure_open()?;
        let previous = self.history.pop_back().ok_or(StateError::NoHistory)?;

        self.state = match &previous.validation {
            Some(validation) => state_for(validation),
            None => SessionState::Draft,
        };
        self.current = Arc::clone(&previous);
        self.last_activity = now;
        tracing::debug!(session = %self.id, version = previous.version(), "Undo");
        Ok(previous)
    }

    /// Render the current roster as export text.
    ///
    /// Only a roster whose last validation was legal can be exported.
    pub fn export(&mut self, now: DateTime<Utc>) -> Result<String> {
        self.ensure_open()?;
        if self.state == SessionState::Empty {
            return Err(StateError::NotValidated.into());
        }

        let text = render(&self.current)?;
        self.state = SessionState::Exported;
        self.last_activity = now;
        Ok(text)
    }

    /// Rank changes to `candidate` against `snapshot`, at most `limit` of them
    pub fn recommend(
        &mut self,
        candidate: &Slot,
        tier: SkillTier,
        snapshot: Arc<UsageSnapshot>,
        dex: Option<&dyn Dex>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>> {
        self.ensure_open()?;

        let mut ranked = score(candidate, &self.current.roster, &self.ruleset, &snapshot, tier, dex)?;
        ranked.truncate(limit);
        self.snapshot = Some(snapshot);
        self.last_activity = now;
        Ok(ranked)
    }

    /// Slot `index` of the current roster, or an empty slot for species advice
    pub fn candidate(&self, index: Option<usize>) -> Result<Slot> {
        match index {
            Some(index) => Ok(self.current.roster.slot(index)?.clone()),
            None => Ok(Slot::default()),
        }
    }

    /// Rebind to another ruleset and revalidate the current slots under it.
    ///
    /// History is dropped, since earlier versions belong to the old format.
    /// `snapshot` is the new format's stats.
    pub fn switch_format(
        &mut self,
        ruleset: Arc<Ruleset>,
        dex: Option<&dyn Dex>,
        snapshot: std::result::Result<Arc<UsageSnapshot>, MetaError>,
        now: DateTime<Utc>,
    ) -> Result<EditOutcome> {
        self.ensure_open()?;

        let mut roster = self.current.roster.clone();
        roster.format = ruleset.format().clone();
        self.ruleset = ruleset;
        self.snapshot = None;

        let mut outcome = self.commit(roster, dex);
        outcome.advice = self.advise(None, &outcome.validation, snapshot, dex);
        self.history.clear();
        self.last_activity = now;
        tracing::info!(
            session = %self.id,
            ruleset = %self.ruleset.id,
            state = ?outcome.state,
            "Switched format"
        );
        Ok(outcome)
    }

    /// Close for good; the session stays readable until it is evicted
    pub fn close(&mut self, now: DateTime<Utc>) {
        if !self.is_closed() {
            self.state = SessionState::Closed;
            self.history.clear();
            self.snapshot = None;
            self.last_activity = now;
        }
    }

    pub fn is_idle(&self, now: DateTime<Utc>, timeout: chrono::TimeDelta) -> bool {
        now - self.last_activity > timeout
    }
}

fn state_for(validation: &ValidationResult) -> SessionState {
    if validation.is_legal() {
        SessionState::Validated
    } else {
        SessionState::Invalid
    }
}
