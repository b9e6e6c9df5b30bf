/// Error types for the UI coordination layer
use crate::controllers::options_menu::OptionsMenuItem;
use crate::types::ConvId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UiError {
    #[error("{0} used after tear down")]
    TornDown(&'static str),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConvId),

    #[error("No options menu is open")]
    MenuUnavailable,

    #[error("Menu item not available: {0:?}")]
    MenuItemUnavailable(OptionsMenuItem),

    #[error("Invalid pager position: {0}")]
    InvalidPagerPosition(usize),

    #[error("No local executor for deferred task '{0}'")]
    NoExecutor(&'static str),

    #[error("No users selected")]
    NothingSelected,

    #[error("Conversation name must not be empty")]
    EmptyName,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UiError>;
