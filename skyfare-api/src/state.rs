use skyfare_engine::{BookingEngine, SessionContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A caller's session, locked independently so one caller's operation never
/// serializes another's.
pub type SharedSession = Arc<Mutex<SessionContext>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    sessions: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
}

impl AppState {
    pub fn new(engine: Arc<BookingEngine>) -> Self {
        Self {
            engine,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .lock()
            .await
            .insert(id, Arc::new(Mutex::new(SessionContext::new())));
        id
    }

    /// The registry lock is held only for the lookup; the caller locks the
    /// returned session for the duration of its operation.
    pub async fn session(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.lock().await.get(&id).cloned()
    }
}
