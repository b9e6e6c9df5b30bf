/// Maps engine-reported business-rule errors to UI reactions
use crate::context::{live_context, ControllerContext};
use crate::controllers::{ConfirmationPrompt, ConfirmationRequest, ConfirmationScope, OnHideAnimationEnd};
use crate::engine::EngineObserver;
use crate::types::{SyncError, SyncErrorKind};
use std::rc::{Rc, Weak};
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReaction {
    /// Single-button dialog; the error is dismissed when the dialog is gone
    ShowDialog {
        header: &'static str,
        message: &'static str,
    },
    /// Dismissed without telling the user
    Dismiss,
    /// Logged as a crash-worthy report, then dismissed
    Report,
}

const ERROR_TABLE: &[(SyncErrorKind, ErrorReaction)] = &[
    (
        SyncErrorKind::CannotAddUnconnectedUserToConversation,
        ErrorReaction::ShowDialog {
            header: "Cannot add participant",
            message: "You can only add people you are connected to.",
        },
    ),
    (
        SyncErrorKind::CannotAddUserToFullConversation,
        ErrorReaction::ShowDialog {
            header: "Conversation full",
            message: "This conversation has reached its participant limit.",
        },
    ),
    (
        SyncErrorKind::CannotCreateGroupConversationWithUnconnectedUser,
        ErrorReaction::ShowDialog {
            header: "Cannot start conversation",
            message: "Some of the people you picked are not connected to you.",
        },
    ),
    (
        SyncErrorKind::CannotSendAssetTooLarge,
        ErrorReaction::ShowDialog {
            header: "File too large",
            message: "The file you picked exceeds the upload limit.",
        },
    ),
    (
        SyncErrorKind::CannotCallConversationWithTooManyMembers,
        ErrorReaction::ShowDialog {
            header: "Call not possible",
            message: "This conversation has too many participants for a call.",
        },
    ),
    (
        SyncErrorKind::CannotSendMessageToUnverifiedConversation,
        ErrorReaction::Dismiss,
    ),
    (SyncErrorKind::CannotSendAssetFileNotFound, ErrorReaction::Dismiss),
    (SyncErrorKind::RecordingFailure, ErrorReaction::Report),
    (SyncErrorKind::PlaybackFailure, ErrorReaction::Report),
];

/// `None` for kinds the table does not map
pub fn reaction_for(kind: SyncErrorKind) -> Option<ErrorReaction> {
    ERROR_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, reaction)| *reaction)
}

pub struct SyncErrorHandler {
    ctx: Weak<ControllerContext>,
}

impl SyncErrorHandler {
    pub fn new(ctx: &Rc<ControllerContext>) -> Self {
        Self {
            ctx: Rc::downgrade(ctx),
        }
    }

    pub fn handle(&self, sync_error: &SyncError) -> crate::error::Result<()> {
        let ctx = match live_context(&self.ctx) {
            Some(ctx) => ctx,
            None => return Ok(()),
        };
        let engine = ctx.engine().clone();

        match reaction_for(sync_error.kind) {
            Some(ErrorReaction::ShowDialog { header, message }) => {
                let id = sync_error.id;
                let callback = OnHideAnimationEnd(move |_, _, _| engine.dismiss_sync_error(id));
                ctx.confirmation().request_confirmation(
                    ConfirmationRequest::new(ConfirmationPrompt::new(header, message, "OK"), callback),
                    ConfirmationScope::ConversationList,
                )?;
            }
            Some(ErrorReaction::Dismiss) => engine.dismiss_sync_error(sync_error.id),
            Some(ErrorReaction::Report) => {
                error!(
                    "Sync error reported: {:?} (conversation {:?})",
                    sync_error.kind, sync_error.conversation
                );
                engine.dismiss_sync_error(sync_error.id);
            }
            None => {
                error!("Unexpected sync error: {:?}", sync_error);
                engine.dismiss_sync_error(sync_error.id);
            }
        }
        Ok(())
    }
}

impl EngineObserver for SyncErrorHandler {
    fn on_sync_error(&self, sync_error: &SyncError) {
        if let Err(e) = self.handle(sync_error) {
            warn!("Failed to handle sync error {}: {}", sync_error.id, e);
        }
    }
}
