use crate::{prediction::CaptionBackend, upload::controller::UploadController};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
};

/// Identifies one loaded page. A reload gets a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Sessions<B: CaptionBackend> {
    by_id: HashMap<SessionId, Arc<UploadController<B>>>,
    // Opening order, oldest first.
    order: VecDeque<SessionId>,
}

/// One upload controller per loaded page, all sharing the same backend.
/// Holds at most `max_sessions`; opening past the limit closes the oldest.
pub struct SessionRegistry<B: CaptionBackend> {
    backend: Arc<B>,
    max_sessions: usize,
    sessions: Mutex<Sessions<B>>,
}

impl<B: CaptionBackend> SessionRegistry<B> {
    pub fn new(backend: B, max_sessions: usize) -> Self {
        Self {
            backend: Arc::new(backend),
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions {
                by_id: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn open(&self) -> (SessionId, Arc<UploadController<B>>) {
        let id = SessionId::generate();
        let controller = Arc::new(UploadController::with_session(
            id.clone(),
            self.backend.clone(),
        ));

        let mut sessions = self.sessions.lock();
        while sessions.by_id.len() >= self.max_sessions {
            let Some(oldest) = sessions.order.pop_front() else {
                break;
            };
            if let Some(evicted) = sessions.by_id.remove(&oldest) {
                tracing::info!(session = %oldest, "Session limit reached, closing oldest session");
                evicted.close();
            }
        }
        sessions.by_id.insert(id.clone(), controller.clone());
        sessions.order.push_back(id.clone());

        tracing::debug!(session = %id, open = sessions.by_id.len(), "Session opened");
        (id, controller)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<UploadController<B>>> {
        self.sessions.lock().by_id.get(id).cloned()
    }

    /// Drops the session and releases its preview. Returns false for an
    /// unknown id.
    pub fn close(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock();
        let Some(controller) = sessions.by_id.remove(id) else {
            return false;
        };
        sessions.order.retain(|open| open != id);
        drop(sessions);

        controller.close();
        tracing::debug!(session = %id, "Session closed");
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
