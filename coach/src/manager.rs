//! Session registry and the shared stores behind it

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rotom_dex::Dex;
use rotom_meta::{MetaCache, Recommendation, SkillTier, UsageSnapshot};
use rotom_rules::RulesetStore;
use rotom_team::FormatId;
use tokio::sync::{Mutex, RwLock};

use crate::config::CoachConfig;
use crate::error::{CoachError, Result, StateError};
use crate::refresh::{StatsSource, fetch_samples, refresh};
use crate::samples::{SampleLibrary, SampleTeam};
use crate::session::{Edit, EditOutcome, RosterVersion, Session, SessionId, SessionState};

/// Owns every open session.
///
/// Each session sits behind its own mutex, so one session's edit cycle runs
/// at a time while other sessions proceed in parallel. The ruleset store and
/// meta cache are shared read-mostly; a session clones the `Arc`s it needs at
/// the start of an operation.
///
/// A closed session stays registered, answering with
/// [`StateError::Closed`], until `close_idle` evicts it one idle timeout
/// later. After that its id is unknown.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    next_id: AtomicU64,
    rulesets: Arc<RulesetStore>,
    cache: Arc<MetaCache>,
    samples: SampleLibrary,
    dex: Option<Arc<dyn Dex>>,
    config: CoachConfig,
}

impl SessionManager {
    pub fn new(rulesets: Arc<RulesetStore>, cache: Arc<MetaCache>, config: CoachConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            rulesets,
            cache,
            samples: SampleLibrary::new(),
            dex: None,
            config,
        }
    }

    /// Build the stores from the config, with no rulesets or stats loaded
    pub fn from_config(config: CoachConfig) -> Self {
        let cache = MetaCache::new(config.staleness_policy());
        Self::new(Arc::new(RulesetStore::new()), Arc::new(cache), config)
    }

    /// Also check names against a species-data table
    pub fn with_dex(mut self, dex: Arc<dyn Dex>) -> Self {
        self.dex = Some(dex);
        self
    }

    pub fn rulesets(&self) -> &Arc<RulesetStore> {
        &self.rulesets
    }

    pub fn cache(&self) -> &Arc<MetaCache> {
        &self.cache
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Sessions that are still open
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        let mut open = 0;
        for session in sessions.values() {
            if !session.lock().await.is_closed() {
                open += 1;
            }
        }
        open
    }

    async fn session(&self, id: SessionId) -> Result<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or(CoachError::UnknownSession(id))
    }

    /// Start a session bound to the latest ruleset of `format`
    pub async fn open(&self, format: &FormatId, now: DateTime<Utc>) -> Result<SessionId> {
        let ruleset = self.rulesets.get(format)?;
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Session::new(id, Arc::clone(&ruleset), self.config.history_depth, now)
            .with_advice(self.config.default_tier, self.config.max_recommendations);

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));

        tracing::info!(session = %id, ruleset = %ruleset.id, "Opened session");
        Ok(id)
    }

    /// Apply an edit; a legal result comes back with advice from the
    /// format's current stats
    pub async fn edit(&self, id: SessionId, edit: Edit, now: DateTime<Utc>) -> Result<EditOutcome> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        let snapshot = self.cache.current(session.ruleset().format(), now, false);
        session.edit(edit, self.dex.as_deref(), snapshot, now)
    }

    /// Tier for the advice attached to later edits
    pub async fn set_tier(&self, id: SessionId, tier: SkillTier) -> Result<()> {
        let session = self.session(id).await?;
        session.lock().await.set_tier(tier);
        Ok(())
    }

    pub async fn undo(&self, id: SessionId, now: DateTime<Utc>) -> Result<Arc<RosterVersion>> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.undo(now)
    }

    pub async fn export(&self, id: SessionId, now: DateTime<Utc>) -> Result<String> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.export(now)
    }

    pub async fn current(&self, id: SessionId) -> Result<Arc<RosterVersion>> {
        let session = self.session(id).await?;
        let session = session.lock().await;
        Ok(session.current())
    }

    pub async fn state(&self, id: SessionId) -> Result<SessionState> {
        let session = self.session(id).await?;
        let session = session.lock().await;
        Ok(session.state())
    }

    /// Rank changes for slot `index`, or species for a new slot when `None`.
    ///
    /// Uses the cache's newest snapshot for the session's format; `force`
    /// accepts a stale one.
    pub async fn recommend(
        &self,
        id: SessionId,
        index: Option<usize>,
        tier: SkillTier,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;

        let candidate = session.candidate(index)?;
        let format = session.ruleset().format().clone();
        let snapshot = self.cache.current(&format, now, force)?;
        session.recommend(
            &candidate,
            tier,
            snapshot,
            self.dex.as_deref(),
            self.config.max_recommendations,
            now,
        )
    }

    /// Rebind a session to the latest ruleset of another format
    pub async fn switch_format(
        &self,
        id: SessionId,
        format: &FormatId,
        now: DateTime<Utc>,
    ) -> Result<EditOutcome> {
        let ruleset = self.rulesets.get(format)?;
        let snapshot = self.cache.current(format, now, false);
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        session.switch_format(ruleset, self.dex.as_deref(), snapshot, now)
    }

    /// Refresh a format's usage stats; no session lock is held while fetching
    pub async fn refresh_stats(
        &self,
        source: &dyn StatsSource,
        format: &FormatId,
    ) -> Result<Arc<UsageSnapshot>> {
        let snapshot = refresh(source, &self.cache, format, self.config.fetch_timeout()).await?;
        Ok(snapshot)
    }

    /// Fetch a format's sample teams and validate them under its latest
    /// ruleset. Replaces whatever was loaded for the format before.
    pub async fn refresh_samples(
        &self,
        source: &dyn StatsSource,
        format: &FormatId,
    ) -> Result<Arc<Vec<SampleTeam>>> {
        let ruleset = self.rulesets.get(format)?;
        let texts = fetch_samples(source, format, self.config.fetch_timeout()).await?;
        Ok(self
            .samples
            .load(&ruleset, &texts, self.config.max_sample_teams, self.dex.as_deref()))
    }

    pub fn sample_teams(&self, format: &FormatId) -> Arc<Vec<SampleTeam>> {
        self.samples.get(format)
    }

    /// Replace the session's roster with sample team `index` of its format
    pub async fn start_from_sample(
        &self,
        id: SessionId,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<EditOutcome> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;

        let format = session.ruleset().format().clone();
        let teams = self.samples.get(&format);
        let team = teams
            .get(index)
            .ok_or_else(|| CoachError::UnknownSample {
                format: format.clone(),
                index,
            })?;
        let edit = Edit::ReplaceRoster {
            slots: team.slots.clone(),
        };
        let snapshot = self.cache.current(&format, now, false);
        session.edit(edit, self.dex.as_deref(), snapshot, now)
    }

    /// Close a session. It keeps answering with [`StateError::Closed`] until
    /// `close_idle` evicts it.
    pub async fn close(&self, id: SessionId, now: DateTime<Utc>) -> Result<()> {
        let session = self.session(id).await?;
        let mut session = session.lock().await;
        if session.is_closed() {
            return Err(StateError::Closed(id).into());
        }
        session.close(now);

        tracing::info!(session = %id, "Closed session");
        Ok(())
    }

    /// Close every open session idle for longer than the configured timeout,
    /// and evict sessions that have been closed for that long. Returns the
    /// sessions closed by this call.
    ///
    /// Sessions busy with an operation are not idle and are skipped.
    pub async fn close_idle(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let timeout = self.config.idle_timeout();
        let mut sessions = self.sessions.write().await;

        let mut closed = Vec::new();
        let mut evicted = 0;
        sessions.retain(|id, session| {
            let Ok(mut session) = session.try_lock() else {
                return true;
            };
            if !session.is_idle(now, timeout) {
                return true;
            }
            if session.is_closed() {
                evicted += 1;
                return false;
            }
            session.close(now);
            closed.push(*id);
            true
        });
        drop(sessions);

        if !closed.is_empty() {
            tracing::warn!(count = closed.len(), sessions = ?closed, "Closed idle sessions");
        }
        if evicted > 0 {
            tracing::debug!(count = evicted, "Evicted closed sessions");
        }
        closed.sort_by_key(|id| id.0);
        closed
    }
}
