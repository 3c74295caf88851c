use crate::catalog::welcome_lines;
use crate::commands::CommandBook;
use crate::config::{ConsoleTiming, DemoSettings};
use crate::console::Console;
use crate::demo::DemoPlayer;
use crate::logger::Logger;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub max_sessions: usize,
    pub ttl: Duration,
    pub timing: ConsoleTiming,
    pub demo: DemoSettings,
}

struct SessionEntry {
    console: Arc<Console>,
    last_seen: Instant,
    demo: Option<JoinHandle<()>>,
}

impl SessionEntry {
    fn shutdown(self) {
        if let Some(demo) = self.demo {
            demo.abort();
        }
    }
}

/// In-memory console sessions, one console per visitor.
pub struct SessionStore {
    book: Arc<CommandBook>,
    settings: SessionSettings,
    logger: Logger,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn new(book: Arc<CommandBook>, settings: SessionSettings, logger: Logger) -> Self {
        Self {
            book,
            settings,
            logger,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a console and, when enabled, schedules its demo player.
    /// A full store makes room by dropping the least recently used session.
    pub async fn create(&self) -> (Uuid, Arc<Console>) {
        let id = Uuid::new_v4();
        let console = Arc::new(Console::with_banner(
            self.book.clone(),
            self.settings.timing.clone(),
            welcome_lines(),
        ));
        let demo = self
            .settings
            .demo
            .enabled
            .then(|| self.spawn_demo(id, console.clone()));

        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions);
        while sessions.len() >= self.settings.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            if let Some(entry) = sessions.remove(&oldest) {
                entry.shutdown();
            }
            self.logger.warn(
                "session.evicted",
                json!({ "sessionId": oldest.to_string(), "maxSessions": self.settings.max_sessions }),
            );
        }
        sessions.insert(
            id,
            SessionEntry {
                console: console.clone(),
                last_seen: Instant::now(),
                demo,
            },
        );
        self.logger.info(
            "session.created",
            json!({ "sessionId": id.to_string(), "liveSessions": sessions.len() }),
        );
        (id, console)
    }

    /// Looks a session up and marks it as used. Expired sessions are
    /// treated as missing.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Console>> {
        let mut sessions = self.sessions.lock().await;
        let ttl = self.settings.ttl;
        let expired = sessions
            .get(id)
            .is_some_and(|entry| entry.last_seen.elapsed() > ttl);
        if expired {
            if let Some(entry) = sessions.remove(id) {
                entry.shutdown();
            }
            self.logger
                .info("session.expired", json!({ "sessionId": id.to_string() }));
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.console.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(id);
        match removed {
            Some(entry) => {
                entry.shutdown();
                self.logger
                    .info("session.deleted", json!({ "sessionId": id.to_string() }));
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn purge_expired(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let ttl = self.settings.ttl;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| entry.last_seen.elapsed() > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(entry) = sessions.remove(&id) {
                entry.shutdown();
            }
            self.logger
                .info("session.expired", json!({ "sessionId": id.to_string() }));
        }
    }

    fn spawn_demo(&self, id: Uuid, console: Arc<Console>) -> JoinHandle<()> {
        let player = DemoPlayer::new(self.settings.demo.clone());
        let logger = self.logger.clone();
        tokio::spawn(async move {
            let outcome = player.run(console).await;
            logger.debug(
                "demo.finished",
                json!({ "sessionId": id.to_string(), "outcome": outcome.as_str() }),
            );
        })
    }
}
