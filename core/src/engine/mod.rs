/// Boundary with the messaging engine
///
/// The engine owns conversations, users, message delivery and sync. This
/// layer only reads snapshots, calls mutators and listens for updates. All
/// calls happen on the UI thread.
pub mod memory;

use crate::error::Result;
use crate::types::{ConvId, ConversationInfo, MessageContent, SyncError, SyncState, UserId};
use std::rc::Rc;
use uuid::Uuid;

pub use memory::{EngineFixture, InMemoryEngine};

/// Update listener registered with the engine
pub trait EngineObserver {
    fn on_conversation_updated(&self, _conversation: &ConversationInfo) {}
    fn on_conversation_removed(&self, _id: &ConvId) {}
    fn on_current_conversation_changed(&self, _from: Option<&ConvId>, _to: Option<&ConvId>) {}
    fn on_sync_state_changed(&self, _state: SyncState) {}
    fn on_sync_error(&self, _error: &SyncError) {}
}

pub trait MessagingEngine {
    // Reads

    fn conversation(&self, id: &ConvId) -> Option<ConversationInfo>;

    /// All conversations, most recent activity first
    fn conversations(&self) -> Vec<ConversationInfo>;

    fn current_conversation(&self) -> Option<ConversationInfo>;

    fn sync_state(&self) -> SyncState;

    fn is_network_available(&self) -> bool;

    // Mutators

    fn set_current_conversation(&self, id: Option<&ConvId>) -> Result<()>;
    fn set_archived(&self, id: &ConvId, archived: bool) -> Result<()>;
    fn set_muted(&self, id: &ConvId, muted: bool) -> Result<()>;
    fn rename(&self, id: &ConvId, name: &str) -> Result<()>;
    fn leave(&self, id: &ConvId) -> Result<()>;
    /// Deletes the conversation's content and removes it from the list
    fn clear(&self, id: &ConvId) -> Result<()>;
    fn accept_connection(&self, user: &UserId) -> Result<ConvId>;
    fn block_user(&self, user: &UserId) -> Result<()>;
    fn unblock_user(&self, user: &UserId) -> Result<()>;
    fn create_group_conversation(&self, users: &[UserId], name: Option<&str>) -> Result<ConvId>;
    /// Adds members to an active group; users already in it are skipped
    fn add_participants(&self, id: &ConvId, users: &[UserId]) -> Result<()>;
    fn send_message(&self, id: &ConvId, content: MessageContent) -> Result<()>;
    fn start_call(&self, id: &ConvId) -> Result<()>;
    fn dismiss_sync_error(&self, id: Uuid);

    // Subscription

    fn add_observer(&self, observer: Rc<dyn EngineObserver>) -> Result<()>;
    fn remove_observer(&self, observer: &Rc<dyn EngineObserver>) -> Result<()>;
}
