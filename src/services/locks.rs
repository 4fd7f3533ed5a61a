use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Per-user write serialization. Every mutation of a user's program state
/// or maxes runs under that user's lock, so concurrent advances see a
/// single linear history and a progression's read-advance-write cycle
/// cannot write a max twice for one event. Cross-user work stays parallel.
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for one user's lock; the guard must be held across the whole
    /// read-modify-write.
    pub fn for_user(&self, user_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(user_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
