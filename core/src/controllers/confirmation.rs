/// Confirmation dialogs, one live request per scope
///
/// A user response runs in two phases. The button click fires the button
/// hook and starts hiding the dialog. When the UI reports that the hide
/// animation has finished, `on_hide_animation_end` fires and the request is
/// released. Work that must not race the dismiss animation (deleting a
/// conversation, leaving it) belongs in `on_hide_animation_end`.
///
/// A new request for a scope that already has one replaces it. The
/// displaced request gets its negative path: `negative_button_clicked` and
/// then `on_hide_animation_end(false, true, _)`.
use crate::error::Result;
use crate::observer::ObserverSet;
use crate::types::Theme;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};
use uuid::Uuid;

/// Screen region that owns a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationScope {
    ConversationList,
    Participants,
    UserProfile,
}

impl ConfirmationScope {
    pub const ALL: [ConfirmationScope; 3] = [
        ConfirmationScope::ConversationList,
        ConfirmationScope::Participants,
        ConfirmationScope::UserProfile,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkbox {
    pub label: String,
    pub default_checked: bool,
}

/// What the dialog shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPrompt {
    pub header: String,
    pub message: String,
    pub positive_label: String,
    pub negative_label: Option<String>,
    pub checkbox: Option<Checkbox>,
    pub theme: Theme,
}

impl ConfirmationPrompt {
    pub fn new(
        header: impl Into<String>,
        message: impl Into<String>,
        positive_label: impl Into<String>,
    ) -> Self {
        Self {
            header: header.into(),
            message: message.into(),
            positive_label: positive_label.into(),
            negative_label: None,
            checkbox: None,
            theme: Theme::default(),
        }
    }

    pub fn with_negative(mut self, label: impl Into<String>) -> Self {
        self.negative_label = Some(label.into());
        self
    }

    pub fn with_checkbox(mut self, label: impl Into<String>, default_checked: bool) -> Self {
        self.checkbox = Some(Checkbox {
            label: label.into(),
            default_checked,
        });
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    fn default_checked(&self) -> bool {
        self.checkbox
            .as_ref()
            .map(|c| c.default_checked)
            .unwrap_or(false)
    }
}

pub trait ConfirmationCallback {
    fn positive_button_clicked(&self, checkbox_checked: bool);
    fn negative_button_clicked(&self);
    fn on_hide_animation_end(&self, confirmed: bool, canceled: bool, checkbox_checked: bool);
}

/// Callback that only reacts once the dialog is gone
pub struct OnHideAnimationEnd<F>(pub F)
where
    F: Fn(bool, bool, bool);

impl<F> ConfirmationCallback for OnHideAnimationEnd<F>
where
    F: Fn(bool, bool, bool),
{
    fn positive_button_clicked(&self, _checkbox_checked: bool) {}

    fn negative_button_clicked(&self) {}

    fn on_hide_animation_end(&self, confirmed: bool, canceled: bool, checkbox_checked: bool) {
        (self.0)(confirmed, canceled, checkbox_checked)
    }
}

pub struct ConfirmationRequest {
    pub prompt: ConfirmationPrompt,
    callback: Rc<dyn ConfirmationCallback>,
}

impl ConfirmationRequest {
    pub fn new(prompt: ConfirmationPrompt, callback: impl ConfirmationCallback + 'static) -> Self {
        Self {
            prompt,
            callback: Rc::new(callback),
        }
    }
}

/// UI side: displays prompts and runs the hide animation
pub trait ConfirmationObserver {
    fn on_request_confirmation(&self, prompt: &ConfirmationPrompt, scope: ConfirmationScope);
    fn on_hide_confirmation(&self, _scope: ConfirmationScope) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Showing,
    Hiding {
        confirmed: bool,
        canceled: bool,
        checkbox_checked: bool,
    },
}

struct Pending {
    id: Uuid,
    prompt: ConfirmationPrompt,
    callback: Rc<dyn ConfirmationCallback>,
    phase: Phase,
}

pub struct ConfirmationCoordinator {
    pending: RefCell<HashMap<ConfirmationScope, Pending>>,
    observers: ObserverSet<dyn ConfirmationObserver>,
}

impl ConfirmationCoordinator {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(HashMap::new()),
            observers: ObserverSet::new("confirmation"),
        }
    }

    pub fn add_observer(&self, observer: Rc<dyn ConfirmationObserver>) -> Result<bool> {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Rc<dyn ConfirmationObserver>) -> Result<bool> {
        self.observers.remove(observer)
    }

    /// Shows a request for `scope`, replacing any request already there.
    pub fn request_confirmation(
        &self,
        request: ConfirmationRequest,
        scope: ConfirmationScope,
    ) -> Result<Uuid> {
        self.observers.verify_lifecycle()?;

        let displaced = self.pending.borrow_mut().remove(&scope);
        if let Some(old) = displaced {
            info!("Confirmation {} on {:?} replaced", old.id, scope);
            match old.phase {
                Phase::Showing => {
                    old.callback.negative_button_clicked();
                    old.callback
                        .on_hide_animation_end(false, true, old.prompt.default_checked());
                }
                Phase::Hiding {
                    confirmed,
                    canceled,
                    checkbox_checked,
                } => old
                    .callback
                    .on_hide_animation_end(confirmed, canceled, checkbox_checked),
            }
        }

        let id = Uuid::new_v4();
        let prompt = request.prompt.clone();
        debug!("Confirmation {} on {:?}: {}", id, scope, prompt.header);
        self.pending.borrow_mut().insert(
            scope,
            Pending {
                id,
                prompt: request.prompt,
                callback: request.callback,
                phase: Phase::Showing,
            },
        );
        self.observers
            .notify_all(|o| o.on_request_confirmation(&prompt, scope))?;
        Ok(id)
    }

    /// Returns the callback of a request that is still showing and moves it
    /// to the hiding phase.
    fn begin_hide(&self, scope: ConfirmationScope, phase: Phase) -> Option<Rc<dyn ConfirmationCallback>> {
        let mut pending = self.pending.borrow_mut();
        let entry = pending.get_mut(&scope)?;
        if entry.phase != Phase::Showing {
            return None;
        }
        entry.phase = phase;
        Some(entry.callback.clone())
    }

    pub fn positive_clicked(&self, scope: ConfirmationScope, checkbox_checked: bool) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let phase = Phase::Hiding {
            confirmed: true,
            canceled: false,
            checkbox_checked,
        };
        let callback = match self.begin_hide(scope, phase) {
            Some(callback) => callback,
            None => return Ok(false),
        };
        callback.positive_button_clicked(checkbox_checked);
        self.observers.notify_all(|o| o.on_hide_confirmation(scope))?;
        Ok(true)
    }

    pub fn negative_clicked(&self, scope: ConfirmationScope) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let checkbox_checked = match self.pending.borrow().get(&scope) {
            Some(entry) => entry.prompt.default_checked(),
            None => return Ok(false),
        };
        let phase = Phase::Hiding {
            confirmed: false,
            canceled: true,
            checkbox_checked,
        };
        let callback = match self.begin_hide(scope, phase) {
            Some(callback) => callback,
            None => return Ok(false),
        };
        callback.negative_button_clicked();
        self.observers.notify_all(|o| o.on_hide_confirmation(scope))?;
        Ok(true)
    }

    /// Programmatic dismissal; the callback later sees
    /// `on_hide_animation_end(false, false, _)`.
    pub fn dismiss(&self, scope: ConfirmationScope) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let checkbox_checked = match self.pending.borrow().get(&scope) {
            Some(entry) => entry.prompt.default_checked(),
            None => return Ok(false),
        };
        let phase = Phase::Hiding {
            confirmed: false,
            canceled: false,
            checkbox_checked,
        };
        if self.begin_hide(scope, phase).is_none() {
            return Ok(false);
        }
        self.observers.notify_all(|o| o.on_hide_confirmation(scope))?;
        Ok(true)
    }

    /// Called by the UI once the dialog is fully hidden. Releases the request.
    pub fn hide_animation_finished(&self, scope: ConfirmationScope) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let finished = {
            let mut pending = self.pending.borrow_mut();
            match pending.get(&scope).map(|entry| entry.phase) {
                Some(Phase::Hiding { .. }) => pending.remove(&scope),
                _ => None,
            }
        };
        let entry = match finished {
            Some(entry) => entry,
            None => return Ok(false),
        };
        if let Phase::Hiding {
            confirmed,
            canceled,
            checkbox_checked,
        } = entry.phase
        {
            debug!(
                "Confirmation {} finished (confirmed: {}, canceled: {})",
                entry.id, confirmed, canceled
            );
            entry
                .callback
                .on_hide_animation_end(confirmed, canceled, checkbox_checked);
        }
        Ok(true)
    }

    /// True while a request for `scope` is on screen and not yet answered.
    pub fn is_showing(&self, scope: ConfirmationScope) -> bool {
        self.pending
            .borrow()
            .get(&scope)
            .map(|entry| entry.phase == Phase::Showing)
            .unwrap_or(false)
    }

    pub fn has_pending(&self, scope: ConfirmationScope) -> bool {
        self.pending.borrow().contains_key(&scope)
    }

    pub fn pending_prompt(&self, scope: ConfirmationScope) -> Option<ConfirmationPrompt> {
        self.pending.borrow().get(&scope).map(|e| e.prompt.clone())
    }

    /// Drops outstanding requests without invoking their callbacks.
    pub fn tear_down(&self) {
        let dropped = self.pending.borrow_mut().drain().count();
        if dropped > 0 {
            debug!("Dropped {} pending confirmation(s) on tear down", dropped);
        }
        self.observers.tear_down();
    }
}

impl Default for ConfirmationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
