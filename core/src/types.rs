/// Shared types: identifiers and the read model handed out by the messaging engine
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque conversation identifier. Only ever used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConvId(String);

impl ConvId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConvId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Group,
    OneToOne,
    /// Connection request not yet accepted, in either direction
    Pending,
    SelfConversation,
}

/// Connection status of the other participant of a one-to-one or pending conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Accepted,
    /// We sent the request
    PendingFromUser,
    /// They sent the request
    PendingFromOther,
    Blocked,
    Ignored,
    Cancelled,
    Unconnected,
}

/// Snapshot of one conversation as seen by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: ConvId,
    pub name: String,
    pub kind: ConversationKind,
    /// Self user is still a member
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub other_user: Option<UserId>,
    #[serde(default)]
    pub other_connection: Option<ConnectionStatus>,
    /// Other members of a group
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub unread_count: u32,
    pub last_event_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl ConversationInfo {
    pub fn group(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ConvId::new(id),
            name: name.into(),
            kind: ConversationKind::Group,
            is_active: true,
            is_muted: false,
            is_archived: false,
            other_user: None,
            other_connection: None,
            participants: Vec::new(),
            unread_count: 0,
            last_event_at: Utc::now(),
        }
    }

    pub fn one_to_one(id: impl Into<String>, name: impl Into<String>, other: UserId) -> Self {
        Self {
            kind: ConversationKind::OneToOne,
            other_user: Some(other),
            other_connection: Some(ConnectionStatus::Accepted),
            ..Self::group(id, name)
        }
    }

    pub fn pending(
        id: impl Into<String>,
        name: impl Into<String>,
        other: UserId,
        status: ConnectionStatus,
    ) -> Self {
        Self {
            kind: ConversationKind::Pending,
            other_user: Some(other),
            other_connection: Some(status),
            ..Self::group(id, name)
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Syncing,
    Waiting,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    Image { path: PathBuf },
    Asset { path: PathBuf, mime: String },
    Location { latitude: f64, longitude: f64, name: String },
}

/// Screen geometry a popover is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    CannotAddUnconnectedUserToConversation,
    CannotAddUserToFullConversation,
    CannotCreateGroupConversationWithUnconnectedUser,
    CannotSendMessageToUnverifiedConversation,
    CannotSendAssetTooLarge,
    CannotSendAssetFileNotFound,
    RecordingFailure,
    PlaybackFailure,
    CannotCallConversationWithTooManyMembers,
    Unknown,
}

/// Business-rule error reported by the engine after an async operation failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncError {
    pub id: Uuid,
    pub kind: SyncErrorKind,
    pub conversation: Option<ConvId>,
    #[serde(default)]
    pub users: Vec<UserId>,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, conversation: Option<ConvId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            conversation,
            users: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_compare_by_value() {
        assert_eq!(ConvId::from("c1"), ConvId::new("c1".to_string()));
        assert_ne!(ConvId::random(), ConvId::random());
        assert!(UserId::new("").is_empty());
    }

    #[test]
    fn test_conversation_info_defaults_from_json() {
        let json = r#"{
            "id": "c1",
            "name": "Team",
            "kind": "group",
            "last_event_at": "2024-01-01T10:00:00Z"
        }"#;
        let info: ConversationInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id.as_str(), "c1");
        assert!(info.is_active);
        assert!(!info.is_muted);
        assert!(info.other_user.is_none());
    }
}
