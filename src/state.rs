use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::config::RagConfig;
use crate::error::Result;
use crate::rag::QueryOrchestrator;
use crate::session::Session;

/// (channel id, user id): every user gets their own transcript per channel.
pub type SessionKey = (u64, u64);

type SessionMap = HashMap<SessionKey, Arc<Mutex<Session>>>;

/// Sessions untouched for this long are dropped when new ones are created.
pub const SESSION_IDLE_HOURS: i64 = 24;

pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub config: Arc<RagConfig>,
    pub admin_ids: HashSet<u64>,
    sessions: RwLock<SessionMap>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<QueryOrchestrator>,
        config: Arc<RagConfig>,
        admin_ids: HashSet<u64>,
    ) -> Self {
        Self {
            orchestrator,
            config,
            admin_ids,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// The caller's session, created on first use. The map lock is only held
    /// for the lookup; callers then lock the session itself.
    pub async fn session(&self, key: SessionKey) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&key) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&key) {
            let cutoff = Utc::now() - chrono::Duration::hours(SESSION_IDLE_HOURS);
            retain_active(&mut sessions, cutoff);
        }
        sessions.entry(key).or_default().clone()
    }

    /// Answer `question` and record it in the caller's session. The session is
    /// only locked to record the exchange, never while the providers are
    /// working, so `history`/`clear` stay responsive.
    pub async fn ask(&self, key: SessionKey, question: &str) -> Result<String> {
        let session = self.session(key).await;
        let answer = self.orchestrator.answer_question(question).await?;
        session.lock().await.record_exchange(question, &answer);
        Ok(answer)
    }

    /// Drop sessions idle since before `now - max_idle`. Returns how many
    /// were removed.
    pub async fn evict_idle(&self, max_idle: chrono::Duration) -> usize {
        retain_active(&mut *self.sessions.write().await, Utc::now() - max_idle)
    }
}

/// Keep sessions that are in use (held elsewhere or locked) or were active at
/// or after `cutoff`.
fn retain_active(sessions: &mut SessionMap, cutoff: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| {
        if Arc::strong_count(session) > 1 {
            return true;
        }
        match session.try_lock() {
            Ok(s) => s.last_activity().is_some_and(|at| at >= cutoff),
            Err(_) => true,
        }
    });
    let evicted = before - sessions.len();
    if evicted > 0 {
        debug!(evicted, remaining = sessions.len(), "idle sessions evicted");
    }
    evicted
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
