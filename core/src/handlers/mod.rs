/// Per-concern handlers attached to the controllers
///
/// Each handler owns one concern and holds only a weak handle on the
/// context, so the context never outlives its owner through them.
pub mod back_press;
pub mod conversation_list;
pub mod network;
pub mod pick_user;
pub mod sync_errors;

pub use back_press::BackPressHandler;
pub use conversation_list::ConversationListHandler;
pub use network::run_if_online;
pub use pick_user::PickUserHandler;
pub use sync_errors::{ErrorReaction, SyncErrorHandler};

use crate::context::ControllerContext;
use crate::controllers::{ConversationScreenObserver, OptionsMenuObserver};
use crate::engine::EngineObserver;
use crate::error::Result;
use crate::types::Theme;
use std::rc::Rc;
use tracing::debug;

/// The standard handler set, registered with the controllers it serves
pub struct Handlers {
    pub conversation_list: Rc<ConversationListHandler>,
    pub pick_user: Rc<PickUserHandler>,
    pub back_press: BackPressHandler,
    pub sync_errors: Rc<SyncErrorHandler>,
}

impl Handlers {
    pub fn install(ctx: &Rc<ControllerContext>, menu_theme: Theme) -> Result<Self> {
        let conversation_list = ConversationListHandler::new(ctx, menu_theme);
        let pick_user = Rc::new(PickUserHandler::new(ctx, conversation_list.clone()));
        let sync_errors = Rc::new(SyncErrorHandler::new(ctx));

        ctx.options_menu().add_observer(conversation_list.clone())?;
        ctx.screen().add_observer(conversation_list.clone())?;
        ctx.screen().add_observer(pick_user.clone())?;
        ctx.engine().add_observer(sync_errors.clone())?;
        debug!("Handlers installed");

        Ok(Self {
            conversation_list,
            pick_user,
            back_press: BackPressHandler::new(ctx),
            sync_errors,
        })
    }

    /// Unregisters from controllers that are still alive.
    pub fn detach(&self, ctx: &ControllerContext) {
        let menu_observer: Rc<dyn OptionsMenuObserver> = self.conversation_list.clone();
        let screen_observer: Rc<dyn ConversationScreenObserver> = self.conversation_list.clone();
        let picker_observer: Rc<dyn ConversationScreenObserver> = self.pick_user.clone();
        let engine_observer: Rc<dyn EngineObserver> = self.sync_errors.clone();
        let _ = ctx.options_menu().remove_observer(&menu_observer);
        let _ = ctx.screen().remove_observer(&screen_observer);
        let _ = ctx.screen().remove_observer(&picker_observer);
        let _ = ctx.engine().remove_observer(&engine_observer);
    }
}
