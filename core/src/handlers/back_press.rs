/// Back-press chain: the first layer that can close something consumes the press
use crate::config::LayoutMode;
use crate::context::{live_context, ControllerContext};
use crate::controllers::{ConfirmationScope, PagerPosition};
use crate::error::{Result, UiError};
use std::rc::{Rc, Weak};
use tracing::debug;

pub struct BackPressHandler {
    ctx: Weak<ControllerContext>,
}

impl BackPressHandler {
    pub fn new(ctx: &Rc<ControllerContext>) -> Self {
        Self {
            ctx: Rc::downgrade(ctx),
        }
    }

    /// Returns whether the press was consumed. Order: options menu,
    /// confirmations, user, OTR client, participants, pick user, pager,
    /// page history.
    pub fn on_back_pressed(&self) -> Result<bool> {
        let ctx = live_context(&self.ctx).ok_or(UiError::TornDown("back_press_handler"))?;

        if ctx.options_menu().close()? {
            debug!("Back: closed options menu");
            return Ok(true);
        }

        for scope in ConfirmationScope::ALL {
            if ctx.confirmation().negative_clicked(scope)? {
                debug!("Back: canceled confirmation on {:?}", scope);
                return Ok(true);
            }
        }

        let screen = ctx.screen();
        if screen.is_showing_user() {
            return screen.hide_user();
        }
        if screen.state().showing_otr_client {
            return screen.hide_otr_client();
        }
        if screen.is_showing_participant() {
            return screen.hide_participants(true, false);
        }

        if ctx.pick_user().is_showing_user_profile() {
            return ctx.pick_user().hide_user_profile();
        }
        if let Some(destination) = ctx.pick_user().showing_destination() {
            return ctx.pick_user().hide_pick_user(destination, false);
        }

        let navigation = ctx.navigation();
        if ctx.config().layout == LayoutMode::SinglePane
            && navigation.pager_position() == PagerPosition::Second
        {
            return navigation.set_pager_page(PagerPosition::First);
        }

        Ok(navigation.navigate_back("back_press")?.is_some())
    }
}
