// src/session/store.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use sqlx::SqlitePool;
use tokio::time::{self, MissedTickBehavior};
use uuid::Uuid;

use crate::config::SESSION_IDLE_TIMEOUT_SECS;

use super::{machine::TestSession, sink};

pub type SharedSession = Arc<tokio::sync::Mutex<TestSession>>;

/// All live sessions, keyed by session id.
///
/// The outer lock guards only the map and is never held across an
/// await. Each session carries its own async mutex, which serializes
/// the HTTP handlers against that session's ticker; everything a
/// session does happens under that one lock, in order.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, SharedSession>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a session under `id` and spawns its ticker task.
    pub fn insert(&self, id: Uuid, session: TestSession, pool: SqlitePool) -> SharedSession {
        let shared: SharedSession = Arc::new(tokio::sync::Mutex::new(session));
        self.map().insert(id, shared.clone());
        spawn_ticker(self.clone(), pool, id, Arc::downgrade(&shared));
        shared
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.map().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) {
        self.map().remove(id);
    }
}

/// Spawns the 1 Hz ticker that drives one session's countdown.
///
/// The task holds only a weak reference: once the session leaves the
/// store, the next tick observes the dead reference and the task ends,
/// so a ticker can never touch a torn-down session. Delayed ticks are
/// not made up for (the countdown simply stretches), and the first
/// tick fires a full second after creation.
///
/// On expiry the ticker runs the same submission pipeline as a manual
/// end, while still holding the session lock. Success leaves the
/// session in Submitted so the candidate can poll for the serial;
/// failure rolls it back to Active for a manual retry. Either way the
/// session is reaped once it has idled past the timeout.
fn spawn_ticker(
    store: SessionStore,
    pool: SqlitePool,
    id: Uuid,
    session: Weak<tokio::sync::Mutex<TestSession>>,
) {
    tokio::spawn(async move {
        let period = Duration::from_secs(1);
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let idle_timeout = Duration::from_secs(SESSION_IDLE_TIMEOUT_SECS);

        loop {
            interval.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            let mut guard = session.lock().await;

            if guard.is_stale(idle_timeout) {
                drop(guard);
                store.remove(&id);
                tracing::info!("Reaped idle session {}", id);
                break;
            }

            if let Some(attempt) = guard.tick() {
                match sink::submit_attempt(&pool, &attempt).await {
                    Ok(serial_number) => {
                        guard.complete_submission(serial_number);
                        tracing::info!(
                            "Session {} auto-submitted on expiry with serial {}",
                            id,
                            serial_number
                        );
                    }
                    Err(e) => {
                        guard.fail_submission();
                        tracing::error!("Auto-submission for session {} failed: {}", id, e);
                    }
                }
            }
        }
    });
}
