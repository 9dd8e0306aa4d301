//! Application state: roster + description providers, live sessions, and the process RNG.
//!
//! This module owns:
//!   - the memoized roster provider (scraped listing or local bank)
//!   - the memoized description provider (optional OpenAI client)
//!   - HTTP sessions by id, each behind its own lock, dropped after `session_ttl_secs` idle
//!   - the process-level RNG that seeds every session's RNG

use std::{collections::HashMap, sync::Arc, time::Duration};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{load_quiz_config_from_env, QuizConfig, QuizSettings};
use crate::describe::DescriptionProvider;
use crate::domain::Candidate;
use crate::error::{GameError, RosterError};
use crate::openai::OpenAI;
use crate::roster::RosterProvider;
use crate::session::SessionState;

/// One player's game plus everything needed to drive it.
pub struct SessionEntry {
    pub id: String,
    pub state: SessionState,
    pub rng: StdRng,
    /// Clues for the current round's candidate; empty if the description was unavailable.
    pub clues: Vec<String>,
}

pub type SharedSession = Arc<Mutex<SessionEntry>>;

struct SessionSlot {
    session: SharedSession,
    touched: Instant,
}

pub struct AppState {
    pub roster: RosterProvider,
    pub descriptions: DescriptionProvider,
    pub settings: QuizSettings,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    session_ttl: Duration,
    rng: Mutex<StdRng>,
}

impl AppState {
    /// Build state from env: load config, init OpenAI, prepare providers.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, RosterError> {
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "portrait_quiz", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            info!(target: "portrait_quiz", "OpenAI disabled (no OPENAI_API_KEY). Rounds will have no generated clues.");
        }

        Self::from_config(cfg, openai)
    }

    pub fn from_config(cfg: QuizConfig, openai: Option<OpenAI>) -> Result<Self, RosterError> {
        let seed = cfg.seed();
        let preset: HashMap<String, String> = cfg
            .roster
            .iter()
            .filter_map(|c| c.clues.as_ref().map(|t| (c.name.clone(), t.clone())))
            .collect();
        let local: Vec<Candidate> = cfg
            .roster
            .into_iter()
            .map(|c| Candidate::new(c.name, c.portrait))
            .collect();

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        info!(target: "portrait_quiz", seeded = seed.is_some(), local_roster = local.len(), preset_clues = preset.len(), "Quiz state initialised");

        Ok(Self {
            roster: RosterProvider::new(cfg.quiz.roster_url.clone(), local)?,
            descriptions: DescriptionProvider::new(openai, cfg.prompts, preset),
            session_ttl: Duration::from_secs(cfg.quiz.session_ttl_secs),
            settings: cfg.quiz,
            sessions: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
        })
    }

    /// Fresh, not yet registered session with its own RNG stream.
    pub async fn new_entry(&self) -> SessionEntry {
        let seed: u64 = self.rng.lock().await.gen();
        SessionEntry {
            id: Uuid::new_v4().to_string(),
            state: SessionState::new(),
            rng: StdRng::seed_from_u64(seed),
            clues: Vec::new(),
        }
    }

    fn is_stale(&self, slot: &SessionSlot, now: Instant) -> bool {
        now.saturating_duration_since(slot.touched) > self.session_ttl
    }

    /// Register a session, dropping every session idle for longer than the TTL.
    #[instrument(level = "debug", skip(self, entry), fields(id = %entry.id))]
    pub async fn insert_session(&self, entry: SessionEntry) {
        let now = Instant::now();
        let id = entry.id.clone();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| !self.is_stale(slot, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(target: "portrait_quiz", evicted, live = sessions.len(), "Dropped idle sessions");
        }
        sessions.insert(id, SessionSlot { session: Arc::new(Mutex::new(entry)), touched: now });
    }

    /// Look up a live session and mark it as used. An idle one is dropped and reported unknown.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_session(&self, id: &str) -> Result<SharedSession, GameError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get_mut(id) {
            Some(slot) if !self.is_stale(slot, now) => {
                slot.touched = now;
                return Ok(slot.session.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(id);
            debug!(target: "portrait_quiz", %id, "Session expired");
        }
        Err(GameError::UnknownSession(id.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_session(&self, id: &str) -> Result<(), GameError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GameError::UnknownSession(id.to_string()))
    }

    /// Registered HTTP sessions, including idle ones not yet swept.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tests::test_state;

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires_and_use_keeps_it_alive() {
        let state = test_state(6);
        let ttl = state.session_ttl;
        let entry = state.new_entry().await;
        let id = entry.id.clone();
        state.insert_session(entry).await;

        tokio::time::advance(ttl - Duration::from_secs(1)).await;
        assert!(state.get_session(&id).await.is_ok());
        tokio::time::advance(ttl - Duration::from_secs(1)).await;
        assert!(state.get_session(&id).await.is_ok());

        tokio::time::advance(ttl + Duration::from_secs(1)).await;
        let err = state.get_session(&id).await.err().unwrap();
        assert!(matches!(err, GameError::UnknownSession(ref missing) if *missing == id));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn inserting_sweeps_idle_sessions() {
        let state = test_state(6);
        let ttl = state.session_ttl;
        for _ in 0..3 {
            let entry = state.new_entry().await;
            state.insert_session(entry).await;
        }
        assert_eq!(state.session_count().await, 3);

        tokio::time::advance(ttl + Duration::from_secs(1)).await;
        let fresh = state.new_entry().await;
        let id = fresh.id.clone();
        state.insert_session(fresh).await;
        assert_eq!(state.session_count().await, 1);
        assert!(state.get_session(&id).await.is_ok());
    }
}
