//! Conversation store: in-memory, per-user registration state.
//!
//! Entries live in a `DashMap`, so users on different shards never contend.
//! Nothing here is persisted; a restart drops every unfinished registration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use super::state::ConversationState;

/// How often the background sweep looks for idle registrations.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Entry {
    state: ConversationState,
    touched_at: Instant,
}

impl Entry {
    fn new(state: ConversationState) -> Self {
        Self {
            state,
            touched_at: Instant::now(),
        }
    }

    fn is_expired(&self, idle_ttl: Duration) -> bool {
        self.touched_at.elapsed() >= idle_ttl
    }
}

/// Per-user registration state with idle expiry.
#[derive(Debug)]
pub struct ConversationStore {
    entries: DashMap<String, Entry>,
    idle_ttl: Duration,
}

impl ConversationStore {
    /// Create a store whose entries expire after `idle_ttl` without activity.
    pub fn new(idle_ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            idle_ttl,
        })
    }

    /// Snapshot of a user's state, if one is live.
    pub fn get(&self, user_id: &str) -> Option<ConversationState> {
        let expired = match self.entries.get(user_id) {
            Some(entry) if !entry.is_expired(self.idle_ttl) => return Some(entry.state.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.evict(user_id);
        }
        None
    }

    /// Store (or replace) a user's state.
    pub fn set(&self, user_id: &str, state: ConversationState) {
        debug!(user_id, step = %state.step, "Conversation state set");
        self.entries.insert(user_id.to_string(), Entry::new(state));
    }

    /// Remove a user's state, returning it if it existed.
    pub fn clear(&self, user_id: &str) -> Option<ConversationState> {
        self.entries.remove(user_id).map(|(_, entry)| entry.state)
    }

    /// Mutate a live state in place. Returns `None` when the user has no
    /// live registration.
    ///
    /// The closure runs under the entry's shard lock and must not block.
    pub fn update<R>(&self, user_id: &str, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R> {
        {
            let mut entry = self.entries.get_mut(user_id)?;
            if !entry.is_expired(self.idle_ttl) {
                entry.touched_at = Instant::now();
                return Some(f(&mut entry.state));
            }
        }
        self.evict(user_id);
        None
    }

    /// Drop every idle entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(self.idle_ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            info!(removed, "Expired idle registrations");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&self, user_id: &str) {
        let ttl = self.idle_ttl;
        if self
            .entries
            .remove_if(user_id, |_, entry| entry.is_expired(ttl))
            .is_some()
        {
            debug!(user_id, "Idle registration evicted");
        }
    }
}

/// Spawn a background task that periodically drops idle registrations.
pub fn spawn_expiry_task(store: Arc<ConversationStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            store.purge_expired();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::state::{RegistrationStep, TextOutcome};

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn set_get_clear() {
        let store = ConversationStore::new(HOUR);
        assert!(store.get("U1").is_none());

        store.set("U1", ConversationState::start("U1"));
        let state = store.get("U1").unwrap();
        assert_eq!(state.step, RegistrationStep::AwaitingPlate);
        assert_eq!(store.len(), 1);

        let cleared = store.clear("U1").unwrap();
        assert_eq!(cleared.profile.user_id, "U1");
        assert!(store.get("U1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn set_overwrites_previous_state() {
        let store = ConversationStore::new(HOUR);
        store.set("U1", ConversationState::start("U1"));
        store.update("U1", |s| s.apply_text("ABC-1234"));
        assert_eq!(store.get("U1").unwrap().step, RegistrationStep::AwaitingPlaces);

        store.set("U1", ConversationState::start("U1"));
        let state = store.get("U1").unwrap();
        assert_eq!(state.step, RegistrationStep::AwaitingPlate);
        assert!(state.profile.plate_number.is_empty());
    }

    #[test]
    fn update_mutates_in_place() {
        let store = ConversationStore::new(HOUR);
        store.set("U1", ConversationState::start("U1"));

        let outcome = store.update("U1", |s| s.apply_text("abc-1234")).unwrap();
        assert_eq!(outcome, TextOutcome::Advanced(RegistrationStep::AwaitingPlaces));
        assert_eq!(store.get("U1").unwrap().profile.plate_number, "ABC-1234");

        assert!(store.update("U2", |s| s.apply_text("abc-1234")).is_none());
    }

    #[test]
    fn users_are_independent() {
        let store = ConversationStore::new(HOUR);
        store.set("U1", ConversationState::start("U1"));
        store.set("U2", ConversationState::start("U2"));
        store.update("U1", |s| s.apply_text("ABC-1234"));

        assert_eq!(store.get("U1").unwrap().step, RegistrationStep::AwaitingPlaces);
        assert_eq!(store.get("U2").unwrap().step, RegistrationStep::AwaitingPlate);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let store = ConversationStore::new(Duration::ZERO);
        store.set("U1", ConversationState::start("U1"));
        assert!(store.get("U1").is_none());
        assert!(store.is_empty(), "expired entry should be evicted on read");

        store.set("U2", ConversationState::start("U2"));
        assert!(store.update("U2", |s| s.step).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_only_idle_entries() {
        let idle = ConversationStore::new(Duration::ZERO);
        idle.set("U1", ConversationState::start("U1"));
        idle.set("U2", ConversationState::start("U2"));
        assert_eq!(idle.purge_expired(), 2);

        let live = ConversationStore::new(HOUR);
        live.set("U1", ConversationState::start("U1"));
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_users_do_not_interfere() {
        let store = ConversationStore::new(HOUR);
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let user = format!("U{i}");
                store.set(&user, ConversationState::start(&user));
                store.update(&user, |s| s.apply_text("ABC-1234"));
                store.update(&user, |s| s.apply_text(&format!("place {i}")));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 32);
        for i in 0..32 {
            let state = store.get(&format!("U{i}")).unwrap();
            assert_eq!(state.step, RegistrationStep::AwaitingIntro);
            assert_eq!(state.profile.haunted_places, format!("place {i}"));
        }
    }
}
