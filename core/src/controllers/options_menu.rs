/// Per-conversation action menu
///
/// Which actions a menu offers is decided by `MENU_RULES`, a fixed table
/// keyed by conversation kind, requester and a condition over the
/// conversation's flags. `OptionsMenuControl` builds a menu from that table
/// and tracks whether it is open.
use crate::engine::MessagingEngine;
use crate::error::{Result, UiError};
use crate::observer::ObserverSet;
use crate::types::{ConnectionStatus, ConvId, ConversationInfo, ConversationKind, Theme};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info};

/// Which screen region asked for the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requester {
    ConversationList,
    Archive,
    Participants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsMenuItem {
    Silence,
    Unsilence,
    Call,
    Picture,
    Rename,
    Archive,
    Unarchive,
    Leave,
    Delete,
    Block,
    Unblock,
}

/// Conversation flags the rules are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuFacts {
    pub kind: ConversationKind,
    pub requester: Requester,
    pub is_active: bool,
    pub is_muted: bool,
    pub is_archived: bool,
    pub connection: Option<ConnectionStatus>,
}

impl MenuFacts {
    pub fn new(conversation: &ConversationInfo, requester: Requester) -> Self {
        Self {
            kind: conversation.kind,
            requester,
            is_active: conversation.is_active,
            is_muted: conversation.is_muted,
            is_archived: conversation.is_archived,
            connection: conversation.other_connection,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Condition {
    Always,
    Active,
    ActiveUnmuted,
    ActiveMuted,
    NotArchived,
    Archived,
    ConnectionIn(&'static [ConnectionStatus]),
}

impl Condition {
    fn holds(self, facts: &MenuFacts) -> bool {
        match self {
            Condition::Always => true,
            Condition::Active => facts.is_active,
            Condition::ActiveUnmuted => facts.is_active && !facts.is_muted,
            Condition::ActiveMuted => facts.is_active && facts.is_muted,
            Condition::NotArchived => !facts.is_archived,
            Condition::Archived => facts.is_archived,
            Condition::ConnectionIn(statuses) => facts
                .connection
                .map(|c| statuses.contains(&c))
                .unwrap_or(false),
        }
    }
}

struct MenuRule {
    item: OptionsMenuItem,
    kinds: &'static [ConversationKind],
    requesters: &'static [Requester],
    condition: Condition,
}

const ALL_KINDS: &[ConversationKind] = &[
    ConversationKind::Group,
    ConversationKind::OneToOne,
    ConversationKind::Pending,
    ConversationKind::SelfConversation,
];
const CHAT_KINDS: &[ConversationKind] = &[ConversationKind::Group, ConversationKind::OneToOne];
const CONNECTION_KINDS: &[ConversationKind] =
    &[ConversationKind::OneToOne, ConversationKind::Pending];
const GROUP: &[ConversationKind] = &[ConversationKind::Group];

const ALL_REQUESTERS: &[Requester] = &[
    Requester::ConversationList,
    Requester::Archive,
    Requester::Participants,
];

/// Order of this table is the order items appear in the menu.
const MENU_RULES: &[MenuRule] = &[
    MenuRule {
        item: OptionsMenuItem::Silence,
        kinds: CHAT_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::ActiveUnmuted,
    },
    MenuRule {
        item: OptionsMenuItem::Unsilence,
        kinds: CHAT_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::ActiveMuted,
    },
    MenuRule {
        item: OptionsMenuItem::Call,
        kinds: CHAT_KINDS,
        requesters: &[Requester::ConversationList],
        condition: Condition::Active,
    },
    MenuRule {
        item: OptionsMenuItem::Picture,
        kinds: CHAT_KINDS,
        requesters: &[Requester::ConversationList],
        condition: Condition::Active,
    },
    MenuRule {
        item: OptionsMenuItem::Rename,
        kinds: GROUP,
        requesters: &[Requester::Participants],
        condition: Condition::Active,
    },
    MenuRule {
        item: OptionsMenuItem::Archive,
        kinds: ALL_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::NotArchived,
    },
    MenuRule {
        item: OptionsMenuItem::Unarchive,
        kinds: ALL_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::Archived,
    },
    MenuRule {
        item: OptionsMenuItem::Leave,
        kinds: GROUP,
        requesters: ALL_REQUESTERS,
        condition: Condition::Active,
    },
    MenuRule {
        item: OptionsMenuItem::Delete,
        kinds: ALL_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::Always,
    },
    MenuRule {
        item: OptionsMenuItem::Block,
        kinds: CONNECTION_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::ConnectionIn(&[
            ConnectionStatus::Accepted,
            ConnectionStatus::PendingFromUser,
        ]),
    },
    MenuRule {
        item: OptionsMenuItem::Unblock,
        kinds: CONNECTION_KINDS,
        requesters: ALL_REQUESTERS,
        condition: Condition::ConnectionIn(&[ConnectionStatus::Blocked]),
    },
];

/// Evaluates the rules table.
pub fn menu_items(facts: &MenuFacts) -> Vec<OptionsMenuItem> {
    MENU_RULES
        .iter()
        .filter(|rule| rule.kinds.contains(&facts.kind))
        .filter(|rule| rule.requesters.contains(&facts.requester))
        .filter(|rule| rule.condition.holds(facts))
        .map(|rule| rule.item)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsMenu {
    pub conversation: ConvId,
    pub title: String,
    pub requester: Requester,
    pub theme: Theme,
    pub items: Vec<OptionsMenuItem>,
}

pub trait OptionsMenuObserver {
    fn on_options_menu_state_changed(&self, _open: bool, _menu: &OptionsMenu) {}
    fn on_options_menu_item_clicked(
        &self,
        _conversation: &ConvId,
        _requester: Requester,
        _item: OptionsMenuItem,
    ) {
    }
}

pub struct OptionsMenuControl {
    engine: Rc<dyn MessagingEngine>,
    menu: RefCell<Option<OptionsMenu>>,
    open: Cell<bool>,
    observers: ObserverSet<dyn OptionsMenuObserver>,
}

impl OptionsMenuControl {
    pub fn new(engine: Rc<dyn MessagingEngine>) -> Self {
        Self {
            engine,
            menu: RefCell::new(None),
            open: Cell::new(false),
            observers: ObserverSet::new("options_menu"),
        }
    }

    pub fn add_observer(&self, observer: Rc<dyn OptionsMenuObserver>) -> Result<bool> {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Rc<dyn OptionsMenuObserver>) -> Result<bool> {
        self.observers.remove(observer)
    }

    /// Builds the menu for a conversation. An open menu for another
    /// conversation is closed first.
    pub fn create_menu(
        &self,
        conversation: &ConvId,
        requester: Requester,
        theme: Theme,
    ) -> Result<Vec<OptionsMenuItem>> {
        self.observers.verify_lifecycle()?;
        let info = self
            .engine
            .conversation(conversation)
            .ok_or_else(|| UiError::ConversationNotFound(conversation.clone()))?;

        self.close()?;

        let items = menu_items(&MenuFacts::new(&info, requester));
        debug!(
            "Options menu for {} ({:?}): {:?}",
            conversation, requester, items
        );
        *self.menu.borrow_mut() = Some(OptionsMenu {
            conversation: conversation.clone(),
            title: info.name,
            requester,
            theme,
            items: items.clone(),
        });
        Ok(items)
    }

    /// Returns false if there is no menu or it is already open.
    pub fn open(&self) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        if self.open.get() {
            return Ok(false);
        }
        let menu = match self.menu.borrow().clone() {
            Some(menu) => menu,
            None => return Ok(false),
        };
        self.open.set(true);
        self.observers
            .notify_all(|o| o.on_options_menu_state_changed(true, &menu))?;
        Ok(true)
    }

    /// Returns whether a menu was open and is now closed.
    pub fn close(&self) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        if !self.open.replace(false) {
            return Ok(false);
        }
        let menu = self.menu.borrow().clone();
        if let Some(menu) = menu {
            self.observers
                .notify_all(|o| o.on_options_menu_state_changed(false, &menu))?;
        }
        Ok(true)
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn current_menu(&self) -> Option<OptionsMenu> {
        self.menu.borrow().clone()
    }

    /// Closes the menu and reports the chosen item to observers.
    pub fn select(&self, item: OptionsMenuItem) -> Result<()> {
        self.observers.verify_lifecycle()?;
        if !self.open.get() {
            return Err(UiError::MenuUnavailable);
        }
        let menu = self.menu.borrow().clone().ok_or(UiError::MenuUnavailable)?;
        if !menu.items.contains(&item) {
            return Err(UiError::MenuItemUnavailable(item));
        }
        self.close()?;
        info!("Menu item {:?} chosen for {}", item, menu.conversation);
        self.observers.notify_all(|o| {
            o.on_options_menu_item_clicked(&menu.conversation, menu.requester, item)
        })?;
        Ok(())
    }

    pub fn tear_down(&self) {
        self.menu.borrow_mut().take();
        self.open.set(false);
        self.observers.tear_down();
    }
}
