/// Conversation screen state: which overlay or side panel is showing
///
/// The flags here are orthogonal. Every show/hide call mutates state and
/// then fans out to `ConversationScreenObserver`s; every call after
/// `tear_down` fails with `UiError::TornDown`.
use crate::controllers::options_menu::Requester;
use crate::error::Result;
use crate::observer::ObserverSet;
use crate::types::{Anchor, ConvId, ConversationInfo, ConversationKind, UserId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// How the currently showing popover was launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogLaunchMode {
    Avatar,
    CommonUser,
}

pub trait ConversationScreenObserver {
    fn on_show_participants(
        &self,
        _anchor: Option<Anchor>,
        _is_single_conversation: bool,
        _is_member_of_conversation: bool,
        _show_device_tab: bool,
    ) {
    }

    fn on_hide_participants(
        &self,
        _back_or_button_pressed: bool,
        _hide_by_conversation_change: bool,
        _is_single_conversation: bool,
    ) {
    }

    fn on_show_edit_conversation_name(&self, _edit: bool) {}
    fn on_show_user(&self, _user: &UserId) {}
    fn on_hide_user(&self) {}
    fn on_add_people_to_conversation(&self) {}

    fn on_show_conversation_menu(
        &self,
        _requester: Requester,
        _conversation: &ConvId,
        _anchor: Option<Anchor>,
    ) {
    }

    fn on_show_otr_client(&self, _user: &UserId, _client: &str) {}
    fn on_hide_otr_client(&self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenState {
    pub showing_participant: bool,
    pub showing_user: bool,
    pub showing_otr_client: bool,
    pub show_devices_tab_for: Option<UserId>,
    pub launch_mode: Option<DialogLaunchMode>,
    pub single_conversation: bool,
    pub member_of_conversation: bool,
}

pub struct ConversationScreenController {
    state: RefCell<ScreenState>,
    observers: ObserverSet<dyn ConversationScreenObserver>,
}

impl ConversationScreenController {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(ScreenState::default()),
            observers: ObserverSet::new("conversation_screen"),
        }
    }

    pub fn add_observer(&self, observer: Rc<dyn ConversationScreenObserver>) -> Result<bool> {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Rc<dyn ConversationScreenObserver>) -> Result<bool> {
        self.observers.remove(observer)
    }

    pub fn state(&self) -> ScreenState {
        self.state.borrow().clone()
    }

    pub fn is_showing_participant(&self) -> bool {
        self.state.borrow().showing_participant
    }

    pub fn is_showing_user(&self) -> bool {
        self.state.borrow().showing_user
    }

    pub fn launch_mode(&self) -> Option<DialogLaunchMode> {
        self.state.borrow().launch_mode
    }

    pub fn set_popover_launch_mode(&self, mode: Option<DialogLaunchMode>) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.state.borrow_mut().launch_mode = mode;
        Ok(())
    }

    pub fn show_devices_tab_for(&self) -> Option<UserId> {
        self.state.borrow().show_devices_tab_for.clone()
    }

    pub fn set_show_devices_tab(&self, user: Option<UserId>) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.state.borrow_mut().show_devices_tab_for = user;
        Ok(())
    }

    pub fn set_single_conversation(&self, single: bool) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.state.borrow_mut().single_conversation = single;
        Ok(())
    }

    pub fn set_member_of_conversation(&self, member: bool) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.state.borrow_mut().member_of_conversation = member;
        Ok(())
    }

    /// Refreshes the conversation-derived flags after a conversation loads.
    pub fn configure_for(&self, conversation: &ConversationInfo) -> Result<()> {
        self.observers.verify_lifecycle()?;
        let mut state = self.state.borrow_mut();
        state.single_conversation = conversation.kind == ConversationKind::OneToOne;
        state.member_of_conversation = conversation.is_active;
        Ok(())
    }

    pub fn show_participants(&self, anchor: Option<Anchor>, show_device_tab: bool) -> Result<()> {
        self.observers.verify_lifecycle()?;
        let (single, member) = {
            let mut state = self.state.borrow_mut();
            state.showing_participant = true;
            (state.single_conversation, state.member_of_conversation)
        };
        debug!("Show participants (device tab: {})", show_device_tab);
        self.observers.notify_all(|o| {
            o.on_show_participants(anchor, single, member, show_device_tab)
        })?;
        Ok(())
    }

    /// Hides participants and resets every flag. Returns false (and notifies
    /// nobody) when nothing was showing.
    pub fn hide_participants(
        &self,
        back_or_button_pressed: bool,
        hide_by_conversation_change: bool,
    ) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let single = {
            let state = self.state.borrow();
            if !state.showing_participant && state.launch_mode.is_none() {
                return Ok(false);
            }
            state.single_conversation
        };
        debug!(
            "Hide participants (back: {}, conversation change: {})",
            back_or_button_pressed, hide_by_conversation_change
        );
        self.observers.notify_all(|o| {
            o.on_hide_participants(back_or_button_pressed, hide_by_conversation_change, single)
        })?;
        self.reset_to_message_stream();
        Ok(true)
    }

    fn reset_to_message_stream(&self) {
        let mut state = self.state.borrow_mut();
        state.showing_participant = false;
        state.showing_user = false;
        state.show_devices_tab_for = None;
        state.launch_mode = None;
    }

    /// Returns false when `user` is empty or a user is already showing.
    pub fn show_user(&self, user: &UserId) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        {
            let mut state = self.state.borrow_mut();
            if user.is_empty() || state.showing_user {
                return Ok(false);
            }
            state.showing_user = true;
        }
        debug!("Show user {}", user);
        self.observers.notify_all(|o| o.on_show_user(user))?;
        Ok(true)
    }

    /// Hides the user. Only an `Avatar` launch mode is cleared here; a
    /// `CommonUser` mode survives until participants are hidden.
    pub fn hide_user(&self) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        if !self.state.borrow().showing_user {
            return Ok(false);
        }
        self.observers.notify_all(|o| o.on_hide_user())?;
        let mut state = self.state.borrow_mut();
        state.showing_user = false;
        if state.launch_mode == Some(DialogLaunchMode::Avatar) {
            state.launch_mode = None;
        }
        Ok(true)
    }

    pub fn edit_conversation_name(&self, edit: bool) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.observers
            .notify_all(|o| o.on_show_edit_conversation_name(edit))?;
        Ok(())
    }

    pub fn add_people_to_conversation(&self) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.observers
            .notify_all(|o| o.on_add_people_to_conversation())?;
        Ok(())
    }

    pub fn show_conversation_menu(
        &self,
        requester: Requester,
        conversation: &ConvId,
        anchor: Option<Anchor>,
    ) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.observers
            .notify_all(|o| o.on_show_conversation_menu(requester, conversation, anchor))?;
        Ok(())
    }

    pub fn show_otr_client(&self, user: &UserId, client: &str) -> Result<()> {
        self.observers.verify_lifecycle()?;
        self.state.borrow_mut().showing_otr_client = true;
        self.observers
            .notify_all(|o| o.on_show_otr_client(user, client))?;
        Ok(())
    }

    pub fn hide_otr_client(&self) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        if !self.state.borrow().showing_otr_client {
            return Ok(false);
        }
        self.observers.notify_all(|o| o.on_hide_otr_client())?;
        self.state.borrow_mut().showing_otr_client = false;
        Ok(true)
    }

    pub fn is_torn_down(&self) -> bool {
        self.observers.is_torn_down()
    }

    pub fn tear_down(&self) {
        self.observers.tear_down();
        *self.state.borrow_mut() = ScreenState::default();
    }
}

impl Default for ConversationScreenController {
    fn default() -> Self {
        Self::new()
    }
}
