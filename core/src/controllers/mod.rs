/// View-state controllers
pub mod confirmation;
pub mod navigation;
pub mod options_menu;
pub mod pick_user;
pub mod screen;

pub use confirmation::{
    ConfirmationCallback, ConfirmationCoordinator, ConfirmationObserver, ConfirmationPrompt,
    ConfirmationRequest, ConfirmationScope, OnHideAnimationEnd,
};
pub use navigation::{NavigationController, NavigationObserver, Page, PagerPosition, Slot};
pub use options_menu::{OptionsMenuControl, OptionsMenuItem, OptionsMenuObserver, Requester};
pub use pick_user::{PickUserController, PickUserDestination, PickUserObserver};
pub use screen::{ConversationScreenController, ConversationScreenObserver, DialogLaunchMode};
