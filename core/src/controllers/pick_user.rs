/// Pick-user (people search) screen state
use crate::error::Result;
use crate::observer::ObserverSet;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Where the pick-user screen was opened from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickUserDestination {
    ConversationList,
    Participants,
    Cursor,
}

pub trait PickUserObserver {
    fn on_show_pick_user(&self, _destination: PickUserDestination) {}
    fn on_hide_pick_user(&self, _destination: PickUserDestination, _close_without_animation: bool) {}
    fn on_show_user_profile(&self, _user: &UserId) {}
    fn on_hide_user_profile(&self) {}
    fn on_selected_users_changed(&self, _selected: &[UserId]) {}
}

pub struct PickUserController {
    /// Destinations in the order they were opened
    showing: RefCell<Vec<PickUserDestination>>,
    profile: RefCell<Option<UserId>>,
    selected: RefCell<Vec<UserId>>,
    observers: ObserverSet<dyn PickUserObserver>,
}

impl PickUserController {
    pub fn new() -> Self {
        Self {
            showing: RefCell::new(Vec::new()),
            profile: RefCell::new(None),
            selected: RefCell::new(Vec::new()),
            observers: ObserverSet::new("pick_user"),
        }
    }

    pub fn add_observer(&self, observer: Rc<dyn PickUserObserver>) -> Result<bool> {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Rc<dyn PickUserObserver>) -> Result<bool> {
        self.observers.remove(observer)
    }

    pub fn show_pick_user(&self, destination: PickUserDestination) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        {
            let mut showing = self.showing.borrow_mut();
            if showing.contains(&destination) {
                return Ok(false);
            }
            showing.push(destination);
        }
        debug!("Show pick user ({:?})", destination);
        self.observers
            .notify_all(|o| o.on_show_pick_user(destination))?;
        Ok(true)
    }

    /// Hiding also clears the selection made on that screen.
    pub fn hide_pick_user(
        &self,
        destination: PickUserDestination,
        close_without_animation: bool,
    ) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        {
            let mut showing = self.showing.borrow_mut();
            let Some(index) = showing.iter().position(|d| *d == destination) else {
                return Ok(false);
            };
            showing.remove(index);
        }
        self.selected.borrow_mut().clear();
        self.observers
            .notify_all(|o| o.on_hide_pick_user(destination, close_without_animation))?;
        Ok(true)
    }

    pub fn is_showing_pick_user(&self, destination: PickUserDestination) -> bool {
        self.showing.borrow().contains(&destination)
    }

    /// Most recently opened destination still showing, if any
    pub fn showing_destination(&self) -> Option<PickUserDestination> {
        self.showing.borrow().last().copied()
    }

    pub fn show_user_profile(&self, user: &UserId) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        {
            let mut profile = self.profile.borrow_mut();
            if user.is_empty() || profile.as_ref() == Some(user) {
                return Ok(false);
            }
            *profile = Some(user.clone());
        }
        self.observers.notify_all(|o| o.on_show_user_profile(user))?;
        Ok(true)
    }

    pub fn hide_user_profile(&self) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        if self.profile.borrow_mut().take().is_none() {
            return Ok(false);
        }
        self.observers.notify_all(|o| o.on_hide_user_profile())?;
        Ok(true)
    }

    pub fn is_showing_user_profile(&self) -> bool {
        self.profile.borrow().is_some()
    }

    /// Adds or removes `user` from the selection; returns whether it is now selected.
    pub fn toggle_selected_user(&self, user: &UserId) -> Result<bool> {
        self.observers.verify_lifecycle()?;
        let (selected, snapshot) = {
            let mut list = self.selected.borrow_mut();
            let selected = match list.iter().position(|u| u == user) {
                Some(index) => {
                    list.remove(index);
                    false
                }
                None => {
                    list.push(user.clone());
                    true
                }
            };
            (selected, list.clone())
        };
        self.observers
            .notify_all(|o| o.on_selected_users_changed(&snapshot))?;
        Ok(selected)
    }

    pub fn selected_users(&self) -> Vec<UserId> {
        self.selected.borrow().clone()
    }

    pub fn tear_down(&self) {
        self.observers.tear_down();
        self.showing.borrow_mut().clear();
        self.profile.borrow_mut().take();
        self.selected.borrow_mut().clear();
    }
}

impl Default for PickUserController {
    fn default() -> Self {
        Self::new()
    }
}
