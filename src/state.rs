//! Application state: backend gateway, live quiz sessions, flashcard decks and reviews,
//! summary modules.
//!
//! This module owns:
//!   - the backend (REST when BACKEND_URL is set, otherwise the in-memory bank)
//!   - the registry of live quiz sessions (by session id)
//!   - flashcard decks (config + built-in seeds) and running deck reviews
//!   - the read-only summary module catalogue (config + built-in seeds)
//!   - the session settings (from TOML or defaults)
//!
//! Sessions and reviews are evicted by `sweep`, which a background task runs periodically.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::backend::{MemoryBackend, QuizBackend, RestBackend};
use crate::config::{load_config_from_env, SessionSettings};
use crate::domain::{Deck, Module};
use crate::flashcards::DeckReview;
use crate::live::LiveSession;
use crate::seeds::{seed_decks, seed_modules, seed_quizzes};

/// A running deck review and the time it was last used.
pub struct ReviewSlot {
    pub review: DeckReview,
    pub last_active: Instant,
}

impl ReviewSlot {
    pub fn new(review: DeckReview) -> Self {
        Self { review, last_active: Instant::now() }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn QuizBackend>,
    pub settings: SessionSettings,
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<LiveSession>>>>,
    pub decks: Arc<Vec<Deck>>,
    pub reviews: Arc<RwLock<HashMap<Uuid, ReviewSlot>>>,
    pub modules: Arc<Vec<Module>>,
}

/// Config entries first; built-in seeds never shadow an existing id.
fn merge_by_id<T>(mut configured: Vec<T>, seeds: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<T> {
    for seed in seeds {
        if !configured.iter().any(|c| id(c) == id(&seed)) {
            configured.push(seed);
        }
    }
    configured
}

impl AppState {
    /// Build state from env: load config, pick the backend, collect decks and modules.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();

        let backend: Arc<dyn QuizBackend> = match RestBackend::from_env() {
            Some(rest) => {
                info!(target: "study_backend", base_url = %rest.base_url, "Remote backend enabled.");
                Arc::new(rest)
            }
            None => {
                let bank = merge_by_id(
                    cfg.quizzes.into_iter().map(|q| q.into_quiz()).collect(),
                    seed_quizzes(),
                    |(q, _)| q.id.as_str(),
                );
                info!(target: "study_backend", quizzes = bank.len(), "No BACKEND_URL set. Using in-memory quiz bank.");
                Arc::new(MemoryBackend::new(bank))
            }
        };

        let decks = merge_by_id(cfg.decks, seed_decks(), |d| d.id.as_str());
        let modules = merge_by_id(cfg.modules, seed_modules(), |m| m.id.as_str());
        info!(target: "flashcards", decks = decks.len(), modules = modules.len(), "Startup study material inventory");

        Self::with_backend(backend, cfg.session, decks, modules)
    }

    pub fn with_backend(
        backend: Arc<dyn QuizBackend>,
        settings: SessionSettings,
        decks: Vec<Deck>,
        modules: Vec<Module>,
    ) -> Self {
        Self {
            backend,
            settings,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            decks: Arc::new(decks),
            reviews: Arc::new(RwLock::new(HashMap::new())),
            modules: Arc::new(modules),
        }
    }

    pub async fn insert_session(&self, live: Arc<LiveSession>) {
        self.sessions.write().await.insert(live.id, live);
    }

    pub async fn session(&self, id: Uuid) -> Option<Arc<LiveSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove_session(&self, id: Uuid) -> Option<Arc<LiveSession>> {
        self.sessions.write().await.remove(&id)
    }

    pub fn deck(&self, id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Drop stale sessions and idle reviews. Returns how many of each were removed.
    pub async fn sweep(&self) -> (usize, usize) {
        let now = Instant::now();

        // Decide outside the registry lock; each check takes the session's own locks.
        let candidates: Vec<Arc<LiveSession>> = self.sessions.read().await.values().cloned().collect();
        let mut stale = Vec::new();
        for live in candidates {
            if live.is_stale(now, &self.settings).await {
                stale.push(live);
            }
        }
        if !stale.is_empty() {
            let mut sessions = self.sessions.write().await;
            for live in &stale {
                sessions.remove(&live.id);
            }
        }
        for live in &stale {
            live.abandon().await;
        }

        let idle = Duration::from_secs(self.settings.idle_timeout_secs);
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|_, slot| now.saturating_duration_since(slot.last_active) < idle);
        let dropped_reviews = before - reviews.len();

        if !stale.is_empty() || dropped_reviews > 0 {
            info!(target: "study_backend", sessions = stale.len(), reviews = dropped_reviews, "Evicted stale state");
        }
        (stale.len(), dropped_reviews)
    }

    /// Run `sweep` every `sweep_interval_secs` for the life of the process.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = Duration::from_secs(self.settings.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let (sessions, reviews) = state.sweep().await;
                debug!(target: "study_backend", sessions, reviews, "Sweep done");
            }
        })
    }
}
