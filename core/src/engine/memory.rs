/// In-memory messaging engine for the simulator and tests
use super::{EngineObserver, MessagingEngine};
use crate::error::{Result, UiError};
use crate::observer::ObserverSet;
use crate::types::{
    ConnectionStatus, ConvId, ConversationInfo, ConversationKind, MessageContent, SyncError,
    SyncState, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};
use uuid::Uuid;

/// JSON seed data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineFixture {
    pub conversations: Vec<ConversationInfo>,
    #[serde(default)]
    pub current: Option<ConvId>,
}

impl EngineFixture {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

pub struct InMemoryEngine {
    conversations: RefCell<HashMap<ConvId, ConversationInfo>>,
    current: RefCell<Option<ConvId>>,
    sync_state: Cell<SyncState>,
    network_available: Cell<bool>,
    pending_errors: RefCell<Vec<SyncError>>,
    sent: RefCell<Vec<(ConvId, MessageContent)>>,
    calls: RefCell<Vec<ConvId>>,
    observers: ObserverSet<dyn EngineObserver>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            conversations: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
            sync_state: Cell::new(SyncState::Completed),
            network_available: Cell::new(true),
            pending_errors: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            observers: ObserverSet::new("engine"),
        }
    }

    pub fn from_fixture(fixture: EngineFixture) -> Self {
        let engine = Self::new();
        for conversation in fixture.conversations {
            engine.insert_conversation(conversation);
        }
        *engine.current.borrow_mut() = fixture.current;
        engine
    }

    /// Inserts or replaces a conversation and notifies observers.
    pub fn insert_conversation(&self, conversation: ConversationInfo) {
        self.conversations
            .borrow_mut()
            .insert(conversation.id.clone(), conversation.clone());
        let _ = self
            .observers
            .notify_all(|o| o.on_conversation_updated(&conversation));
    }

    pub fn set_network_available(&self, available: bool) {
        info!("Network available: {}", available);
        self.network_available.set(available);
    }

    pub fn set_sync_state(&self, state: SyncState) {
        if self.sync_state.replace(state) != state {
            let _ = self.observers.notify_all(|o| o.on_sync_state_changed(state));
        }
    }

    /// Records an error as pending and reports it to observers.
    pub fn report_sync_error(&self, error: SyncError) {
        self.pending_errors.borrow_mut().push(error.clone());
        let _ = self.observers.notify_all(|o| o.on_sync_error(&error));
    }

    pub fn pending_errors(&self) -> Vec<SyncError> {
        self.pending_errors.borrow().clone()
    }

    pub fn sent_messages(&self) -> Vec<(ConvId, MessageContent)> {
        self.sent.borrow().clone()
    }

    pub fn started_calls(&self) -> Vec<ConvId> {
        self.calls.borrow().clone()
    }

    fn update<F>(&self, id: &ConvId, change: F) -> Result<()>
    where
        F: FnOnce(&mut ConversationInfo),
    {
        let updated = {
            let mut conversations = self.conversations.borrow_mut();
            let conversation = conversations
                .get_mut(id)
                .ok_or_else(|| UiError::ConversationNotFound(id.clone()))?;
            change(conversation);
            conversation.clone()
        };
        self.observers
            .notify_all(|o| o.on_conversation_updated(&updated))?;
        Ok(())
    }

    fn find_by_user(&self, user: &UserId) -> Option<ConvId> {
        self.conversations
            .borrow()
            .values()
            .find(|c| c.other_user.as_ref() == Some(user))
            .map(|c| c.id.clone())
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingEngine for InMemoryEngine {
    fn conversation(&self, id: &ConvId) -> Option<ConversationInfo> {
        self.conversations.borrow().get(id).cloned()
    }

    fn conversations(&self) -> Vec<ConversationInfo> {
        let mut list: Vec<ConversationInfo> =
            self.conversations.borrow().values().cloned().collect();
        list.sort_by(|a, b| {
            b.last_event_at
                .cmp(&a.last_event_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    fn current_conversation(&self) -> Option<ConversationInfo> {
        let current = self.current.borrow().clone();
        current.and_then(|id| self.conversation(&id))
    }

    fn sync_state(&self) -> SyncState {
        self.sync_state.get()
    }

    fn is_network_available(&self) -> bool {
        self.network_available.get()
    }

    fn set_current_conversation(&self, id: Option<&ConvId>) -> Result<()> {
        if let Some(id) = id {
            if !self.conversations.borrow().contains_key(id) {
                return Err(UiError::ConversationNotFound(id.clone()));
            }
        }
        let previous = self.current.replace(id.cloned());
        if previous.as_ref() != id {
            debug!("Current conversation: {:?} -> {:?}", previous, id);
            self.observers
                .notify_all(|o| o.on_current_conversation_changed(previous.as_ref(), id))?;
        }
        Ok(())
    }

    fn set_archived(&self, id: &ConvId, archived: bool) -> Result<()> {
        self.update(id, |c| c.is_archived = archived)
    }

    fn set_muted(&self, id: &ConvId, muted: bool) -> Result<()> {
        self.update(id, |c| c.is_muted = muted)
    }

    fn rename(&self, id: &ConvId, name: &str) -> Result<()> {
        self.update(id, |c| c.name = name.to_string())
    }

    fn leave(&self, id: &ConvId) -> Result<()> {
        self.update(id, |c| {
            c.is_active = false;
            c.last_event_at = Utc::now();
        })
    }

    fn clear(&self, id: &ConvId) -> Result<()> {
        let removed = self.conversations.borrow_mut().remove(id);
        if removed.is_none() {
            return Err(UiError::ConversationNotFound(id.clone()));
        }
        let was_current = self.current.borrow().as_ref() == Some(id);
        if was_current {
            self.set_current_conversation(None)?;
        }
        self.observers.notify_all(|o| o.on_conversation_removed(id))?;
        Ok(())
    }

    fn accept_connection(&self, user: &UserId) -> Result<ConvId> {
        let id = self
            .find_by_user(user)
            .ok_or_else(|| UiError::Engine(format!("no connection request from {}", user)))?;
        self.update(&id, |c| {
            c.kind = ConversationKind::OneToOne;
            c.other_connection = Some(ConnectionStatus::Accepted);
        })?;
        Ok(id)
    }

    fn block_user(&self, user: &UserId) -> Result<()> {
        let id = self
            .find_by_user(user)
            .ok_or_else(|| UiError::Engine(format!("unknown user {}", user)))?;
        self.update(&id, |c| c.other_connection = Some(ConnectionStatus::Blocked))
    }

    fn unblock_user(&self, user: &UserId) -> Result<()> {
        let id = self
            .find_by_user(user)
            .ok_or_else(|| UiError::Engine(format!("unknown user {}", user)))?;
        self.update(&id, |c| c.other_connection = Some(ConnectionStatus::Accepted))
    }

    fn create_group_conversation(&self, users: &[UserId], name: Option<&str>) -> Result<ConvId> {
        if users.is_empty() {
            return Err(UiError::Engine("group needs at least one participant".to_string()));
        }
        let id = ConvId::random();
        let name = name.map(str::to_string).unwrap_or_else(|| {
            users
                .iter()
                .map(UserId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        });
        let mut conversation = ConversationInfo::group(id.as_str(), name);
        conversation.participants = users.to_vec();
        self.insert_conversation(conversation);
        info!("Created group {} with {} participant(s)", id, users.len());
        Ok(id)
    }

    fn add_participants(&self, id: &ConvId, users: &[UserId]) -> Result<()> {
        let conversation = self
            .conversation(id)
            .ok_or_else(|| UiError::ConversationNotFound(id.clone()))?;
        if !conversation.is_group() || !conversation.is_active {
            return Err(UiError::Engine(format!("cannot add people to {}", id)));
        }
        self.update(id, |c| {
            for user in users {
                if !c.participants.contains(user) {
                    c.participants.push(user.clone());
                }
            }
        })
    }

    fn send_message(&self, id: &ConvId, content: MessageContent) -> Result<()> {
        self.update(id, |c| c.last_event_at = Utc::now())?;
        self.sent.borrow_mut().push((id.clone(), content));
        Ok(())
    }

    fn start_call(&self, id: &ConvId) -> Result<()> {
        if !self.conversations.borrow().contains_key(id) {
            return Err(UiError::ConversationNotFound(id.clone()));
        }
        self.calls.borrow_mut().push(id.clone());
        Ok(())
    }

    fn dismiss_sync_error(&self, id: Uuid) {
        self.pending_errors.borrow_mut().retain(|e| e.id != id);
    }

    fn add_observer(&self, observer: Rc<dyn EngineObserver>) -> Result<()> {
        self.observers.add(observer).map(|_| ())
    }

    fn remove_observer(&self, observer: &Rc<dyn EngineObserver>) -> Result<()> {
        self.observers.remove(observer).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seeded() -> InMemoryEngine {
        let engine = InMemoryEngine::new();
        let mut old = ConversationInfo::group("old", "Old");
        old.last_event_at = Utc::now() - Duration::hours(2);
        engine.insert_conversation(old);
        engine.insert_conversation(ConversationInfo::one_to_one(
            "new",
            "Alice",
            UserId::from("alice"),
        ));
        engine
    }

    #[test]
    fn test_conversations_sorted_newest_first() {
        let engine = seeded();
        let ids: Vec<_> = engine
            .conversations()
            .into_iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_clear_resets_current() {
        let engine = seeded();
        let id = ConvId::from("new");
        engine.set_current_conversation(Some(&id)).unwrap();
        engine.clear(&id).unwrap();
        assert!(engine.current_conversation().is_none());
        assert!(engine.conversation(&id).is_none());
    }

    #[test]
    fn test_block_and_unblock_user() {
        let engine = seeded();
        let alice = UserId::from("alice");
        engine.block_user(&alice).unwrap();
        assert_eq!(
            engine.conversation(&ConvId::from("new")).unwrap().other_connection,
            Some(ConnectionStatus::Blocked)
        );
        engine.unblock_user(&alice).unwrap();
        assert_eq!(
            engine.conversation(&ConvId::from("new")).unwrap().other_connection,
            Some(ConnectionStatus::Accepted)
        );
    }

    #[test]
    fn test_group_participants() {
        let engine = seeded();
        let ann = UserId::from("ann");
        let bo = UserId::from("bo");
        let id = engine
            .create_group_conversation(&[ann.clone()], Some("Crew"))
            .unwrap();
        engine.add_participants(&id, &[ann.clone(), bo.clone()]).unwrap();
        assert_eq!(engine.conversation(&id).unwrap().participants, vec![ann, bo]);

        assert!(engine
            .add_participants(&ConvId::from("new"), &[UserId::from("cy")])
            .is_err());
    }

    #[test]
    fn test_unknown_conversation_is_error() {
        let engine = InMemoryEngine::new();
        assert!(matches!(
            engine.set_muted(&ConvId::from("missing"), true),
            Err(UiError::ConversationNotFound(_))
        ));
    }

    #[test]
    fn test_fixture_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(
            &path,
            r#"{"conversations":[{"id":"c1","name":"Team","kind":"group","last_event_at":"2024-01-01T00:00:00Z"}],"current":"c1"}"#,
        )
        .unwrap();
        let engine = InMemoryEngine::from_fixture(EngineFixture::from_file(&path).unwrap());
        assert_eq!(engine.current_conversation().unwrap().name, "Team");
    }
}
