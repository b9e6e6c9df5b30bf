/// Messenger UI coordination layer
///
/// View-state controllers for a messaging client: which panel is showing,
/// which page sits in each slot of a two-pane layout, which confirmation is
/// live, and which actions a conversation menu offers. Controllers fan
/// changes out to observers on a single UI thread and talk to the messaging
/// engine only through the `MessagingEngine` trait.

pub mod error;
pub mod config;
pub mod types;
pub mod observer;
pub mod scheduler;
pub mod engine;
pub mod controllers;
pub mod context;
pub mod handlers;
pub mod cli_app;

pub use config::{LayoutMode, UiConfig};
pub use context::ControllerContext;
pub use engine::{InMemoryEngine, MessagingEngine};
pub use error::{Result, UiError};
pub use observer::ObserverSet;
