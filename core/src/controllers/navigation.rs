/// Two-pane navigation model: left/right page slots plus a two-position pager
use crate::error::{Result, UiError};
use crate::observer::ObserverSet;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Start,
    ConversationList,
    Archive,
    PickUser,
    ConversationMenuOverConversationList,
    MessageStream,
    Participant,
    ParticipantUserProfile,
    CommonUserProfile,
    OtrDevice,
    PickUserAddToConversation,
    ConnectRequestPending,
    ConnectRequestInbox,
    SendConnectRequest,
    BlockUser,
    Drawing,
    Camera,
    Photo,
}

/// Layout position a page lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Left,
    Right,
}

impl Page {
    pub const ALL: [Page; 18] = [
        Page::Start,
        Page::ConversationList,
        Page::Archive,
        Page::PickUser,
        Page::ConversationMenuOverConversationList,
        Page::MessageStream,
        Page::Participant,
        Page::ParticipantUserProfile,
        Page::CommonUserProfile,
        Page::OtrDevice,
        Page::PickUserAddToConversation,
        Page::ConnectRequestPending,
        Page::ConnectRequestInbox,
        Page::SendConnectRequest,
        Page::BlockUser,
        Page::Drawing,
        Page::Camera,
        Page::Photo,
    ];

    /// Fixed page-to-slot table used by `set_visible_page`
    pub fn slot(self) -> Slot {
        match self {
            Page::Start
            | Page::ConversationList
            | Page::Archive
            | Page::PickUser
            | Page::ConversationMenuOverConversationList => Slot::Left,
            Page::MessageStream
            | Page::Participant
            | Page::ParticipantUserProfile
            | Page::CommonUserProfile
            | Page::OtrDevice
            | Page::PickUserAddToConversation
            | Page::ConnectRequestPending
            | Page::ConnectRequestInbox
            | Page::SendConnectRequest
            | Page::BlockUser
            | Page::Drawing
            | Page::Camera
            | Page::Photo => Slot::Right,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Page::Start => "start",
            Page::ConversationList => "conversation_list",
            Page::Archive => "archive",
            Page::PickUser => "pick_user",
            Page::ConversationMenuOverConversationList => "conversation_menu_over_conversation_list",
            Page::MessageStream => "message_stream",
            Page::Participant => "participant",
            Page::ParticipantUserProfile => "participant_user_profile",
            Page::CommonUserProfile => "common_user_profile",
            Page::OtrDevice => "otr_device",
            Page::PickUserAddToConversation => "pick_user_add_to_conversation",
            Page::ConnectRequestPending => "connect_request_pending",
            Page::ConnectRequestInbox => "connect_request_inbox",
            Page::SendConnectRequest => "send_connect_request",
            Page::BlockUser => "block_user",
            Page::Drawing => "drawing",
            Page::Camera => "camera",
            Page::Photo => "photo",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UiError::Parse(format!("unknown page '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagerPosition {
    #[default]
    First = 0,
    Second = 1,
}

impl TryFrom<usize> for PagerPosition {
    type Error = UiError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(PagerPosition::First),
            1 => Ok(PagerPosition::Second),
            other => Err(UiError::InvalidPagerPosition(other)),
        }
    }
}

pub trait NavigationObserver {
    fn on_page_visible(&self, _page: Page) {}
    fn on_slot_page_changed(&self, _slot: Slot, _page: Page) {}
}

pub trait PagerEnabledObserver {
    fn on_pager_enabled_state_changed(&self, enabled: bool);
}

pub trait PagerPositionObserver {
    fn on_pager_position_changed(&self, position: PagerPosition);
}

/// Snapshot for diagnostics and the simulator's `state` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub left: Option<Page>,
    pub right: Option<Page>,
    pub visible: Option<Page>,
    pub pager_enabled: bool,
    pub pager_position: PagerPosition,
    pub history: Vec<Page>,
}

pub struct NavigationController {
    left: Cell<Option<Page>>,
    right: Cell<Option<Page>>,
    visible: Cell<Option<Page>>,
    history: RefCell<Vec<Page>>,
    history_limit: usize,
    pager_enabled: Cell<bool>,
    pager_position: Cell<PagerPosition>,
    page_observers: ObserverSet<dyn NavigationObserver>,
    pager_enabled_observers: ObserverSet<dyn PagerEnabledObserver>,
    pager_position_observers: ObserverSet<dyn PagerPositionObserver>,
}

impl NavigationController {
    pub fn new(history_limit: usize) -> Self {
        Self {
            left: Cell::new(None),
            right: Cell::new(None),
            visible: Cell::new(None),
            history: RefCell::new(Vec::new()),
            history_limit,
            pager_enabled: Cell::new(true),
            pager_position: Cell::new(PagerPosition::First),
            page_observers: ObserverSet::new("navigation"),
            pager_enabled_observers: ObserverSet::new("navigation.pager_enabled"),
            pager_position_observers: ObserverSet::new("navigation.pager_position"),
        }
    }

    pub fn add_navigation_observer(&self, observer: Rc<dyn NavigationObserver>) -> Result<bool> {
        self.page_observers.add(observer)
    }

    pub fn remove_navigation_observer(&self, observer: &Rc<dyn NavigationObserver>) -> Result<bool> {
        self.page_observers.remove(observer)
    }

    pub fn add_pager_enabled_observer(&self, observer: Rc<dyn PagerEnabledObserver>) -> Result<bool> {
        self.pager_enabled_observers.add(observer)
    }

    pub fn remove_pager_enabled_observer(
        &self,
        observer: &Rc<dyn PagerEnabledObserver>,
    ) -> Result<bool> {
        self.pager_enabled_observers.remove(observer)
    }

    pub fn add_pager_position_observer(
        &self,
        observer: Rc<dyn PagerPositionObserver>,
    ) -> Result<bool> {
        self.pager_position_observers.add(observer)
    }

    pub fn remove_pager_position_observer(
        &self,
        observer: &Rc<dyn PagerPositionObserver>,
    ) -> Result<bool> {
        self.pager_position_observers.remove(observer)
    }

    pub fn current_left_page(&self) -> Option<Page> {
        self.left.get()
    }

    pub fn current_right_page(&self) -> Option<Page> {
        self.right.get()
    }

    pub fn current_page(&self) -> Option<Page> {
        self.visible.get()
    }

    pub fn is_pager_enabled(&self) -> bool {
        self.pager_enabled.get()
    }

    pub fn pager_position(&self) -> PagerPosition {
        self.pager_position.get()
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            left: self.left.get(),
            right: self.right.get(),
            visible: self.visible.get(),
            pager_enabled: self.pager_enabled.get(),
            pager_position: self.pager_position.get(),
            history: self.history.borrow().clone(),
        }
    }

    fn verify_lifecycle(&self) -> Result<()> {
        self.page_observers.verify_lifecycle()
    }

    /// `source` only tags the log line.
    pub fn set_left_page(&self, page: Page, source: &str) -> Result<bool> {
        self.verify_lifecycle()?;
        self.set_slot(Slot::Left, page, source)
    }

    pub fn set_right_page(&self, page: Page, source: &str) -> Result<bool> {
        self.verify_lifecycle()?;
        self.set_slot(Slot::Right, page, source)
    }

    fn set_slot(&self, slot: Slot, page: Page, source: &str) -> Result<bool> {
        let cell = match slot {
            Slot::Left => &self.left,
            Slot::Right => &self.right,
        };
        if cell.get() == Some(page) {
            return Ok(false);
        }
        debug!("{:?} page -> {} (from {})", slot, page, source);
        cell.set(Some(page));
        self.page_observers
            .notify_all(|o| o.on_slot_page_changed(slot, page))?;
        Ok(true)
    }

    /// Puts `page` in the slot the page table assigns it and makes it the
    /// visible page. The previously visible page is pushed on the history.
    pub fn set_visible_page(&self, page: Page, source: &str) -> Result<bool> {
        self.verify_lifecycle()?;
        self.set_slot(page.slot(), page, source)?;
        let previous = self.visible.get();
        if previous == Some(page) {
            return Ok(false);
        }
        if let Some(previous) = previous {
            let mut history = self.history.borrow_mut();
            history.push(previous);
            if history.len() > self.history_limit {
                let overflow = history.len() - self.history_limit;
                history.drain(..overflow);
            }
        }
        self.show_page(page, source)?;
        Ok(true)
    }

    fn show_page(&self, page: Page, source: &str) -> Result<()> {
        debug!("Visible page -> {} (from {})", page, source);
        self.visible.set(Some(page));
        self.page_observers.notify_all(|o| o.on_page_visible(page))?;
        Ok(())
    }

    /// Pops the history and shows the page found there, if any.
    pub fn navigate_back(&self, source: &str) -> Result<Option<Page>> {
        self.verify_lifecycle()?;
        let previous = self.history.borrow_mut().pop();
        let page = match previous {
            Some(page) => page,
            None => return Ok(None),
        };
        self.set_slot(page.slot(), page, source)?;
        self.show_page(page, source)?;
        Ok(Some(page))
    }

    pub fn set_pager_enabled(&self, enabled: bool) -> Result<bool> {
        self.verify_lifecycle()?;
        if self.pager_enabled.replace(enabled) == enabled {
            return Ok(false);
        }
        debug!("Pager enabled: {}", enabled);
        self.pager_enabled_observers
            .notify_all(|o| o.on_pager_enabled_state_changed(enabled))?;
        Ok(true)
    }

    pub fn set_pager_position(&self, position: usize) -> Result<bool> {
        let position = PagerPosition::try_from(position)?;
        self.set_pager_page(position)
    }

    pub fn set_pager_page(&self, position: PagerPosition) -> Result<bool> {
        self.verify_lifecycle()?;
        if self.pager_position.replace(position) == position {
            return Ok(false);
        }
        debug!("Pager position: {:?}", position);
        self.pager_position_observers
            .notify_all(|o| o.on_pager_position_changed(position))?;
        Ok(true)
    }

    pub fn reset_pager_position_to_default(&self) -> Result<bool> {
        self.set_pager_page(PagerPosition::default())
    }

    pub fn is_torn_down(&self) -> bool {
        self.page_observers.is_torn_down()
    }

    pub fn tear_down(&self) {
        self.page_observers.tear_down();
        self.pager_enabled_observers.tear_down();
        self.pager_position_observers.tear_down();
        self.history.borrow_mut().clear();
    }
}
