/// Conversation selection and the actions behind the options menu
use super::network::run_if_online;
use crate::config::LayoutMode;
use crate::context::{live_context, ControllerContext};
use crate::controllers::{
    ConfirmationPrompt, ConfirmationRequest, ConfirmationScope, ConversationScreenObserver,
    OnHideAnimationEnd, OptionsMenuItem, OptionsMenuObserver, Page, PagerPosition, Requester,
};
use crate::error::{Result, UiError};
use crate::types::{
    Anchor, ConnectionStatus, ConvId, ConversationInfo, ConversationKind, MessageContent, Theme,
    UserId,
};
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Page a conversation opens on
pub fn page_for(conversation: &ConversationInfo) -> Page {
    match (conversation.kind, conversation.other_connection) {
        (ConversationKind::Pending, Some(ConnectionStatus::PendingFromOther)) => {
            Page::ConnectRequestInbox
        }
        (ConversationKind::Pending, _) => Page::ConnectRequestPending,
        _ => Page::MessageStream,
    }
}

fn scope_for(requester: Requester) -> ConfirmationScope {
    match requester {
        Requester::ConversationList | Requester::Archive => ConfirmationScope::ConversationList,
        Requester::Participants => ConfirmationScope::Participants,
    }
}

pub struct ConversationListHandler {
    ctx: Weak<ControllerContext>,
    me: Weak<ConversationListHandler>,
    menu_theme: Theme,
}

impl ConversationListHandler {
    pub fn new(ctx: &Rc<ControllerContext>, menu_theme: Theme) -> Rc<Self> {
        let ctx = Rc::downgrade(ctx);
        Rc::new_cyclic(|me| Self {
            ctx,
            me: me.clone(),
            menu_theme,
        })
    }

    fn context(&self) -> Result<Rc<ControllerContext>> {
        live_context(&self.ctx).ok_or(UiError::TornDown("conversation_list_handler"))
    }

    pub fn show_conversation_list(&self, source: &str) -> Result<()> {
        let ctx = self.context()?;
        ctx.navigation().set_visible_page(Page::ConversationList, source)?;
        ctx.navigation().reset_pager_position_to_default()?;
        Ok(())
    }

    pub fn show_archive(&self, source: &str) -> Result<()> {
        let ctx = self.context()?;
        ctx.options_menu().close()?;
        ctx.navigation().set_visible_page(Page::Archive, source)?;
        Ok(())
    }

    /// Makes `id` current and routes to its page. In single-pane layout the
    /// pager follows after `pager_advance_delay`.
    pub fn select_conversation(&self, id: &ConvId, source: &str) -> Result<()> {
        let ctx = self.context()?;
        let info = ctx
            .engine()
            .conversation(id)
            .ok_or_else(|| UiError::ConversationNotFound(id.clone()))?;

        ctx.options_menu().close()?;
        if ctx.screen().is_showing_participant() {
            ctx.screen().hide_participants(false, true)?;
        }
        ctx.engine().set_current_conversation(Some(id))?;
        ctx.screen().configure_for(&info)?;
        ctx.navigation().set_visible_page(page_for(&info), source)?;
        info!("Selected conversation {} ({})", id, info.name);

        if ctx.config().layout == LayoutMode::SinglePane {
            self.advance_pager(&ctx)?;
        }
        Ok(())
    }

    fn advance_pager(&self, ctx: &ControllerContext) -> Result<()> {
        let delay = ctx.config().pager_advance_delay;
        if delay.is_zero() {
            ctx.navigation().set_pager_page(PagerPosition::Second)?;
            return Ok(());
        }
        let weak = self.ctx.clone();
        ctx.scheduler().post_delayed("pager_advance", delay, move || {
            let Some(ctx) = live_context(&weak) else {
                return;
            };
            if let Err(e) = ctx.navigation().set_pager_page(PagerPosition::Second) {
                warn!("Pager advance failed: {}", e);
            }
        })?;
        Ok(())
    }

    /// Accepts an incoming connect request from `user` and opens the
    /// resulting one-to-one conversation.
    pub fn accept_connection(&self, user: &UserId) -> Result<ConvId> {
        let ctx = self.context()?;
        let id = ctx.engine().accept_connection(user)?;
        info!("Accepted connection from {}", user);
        self.select_conversation(&id, "accept_connection")?;
        Ok(id)
    }

    /// Commits a name typed into the rename field and closes it.
    /// Returns false when the rename was blocked because we are offline.
    pub fn rename(&self, id: &ConvId, name: &str, scope: ConfirmationScope) -> Result<bool> {
        let ctx = self.context()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(UiError::EmptyName);
        }
        let engine = ctx.engine().clone();
        let online = run_if_online(&ctx, "rename_commit", scope, || engine.rename(id, name))?;
        if online {
            ctx.screen().edit_conversation_name(false)?;
        }
        Ok(online)
    }

    pub fn send_text(&self, id: &ConvId, text: &str) -> Result<()> {
        let ctx = self.context()?;
        ctx.engine().send_message(
            id,
            MessageContent::Text {
                text: text.to_string(),
            },
        )
    }

    /// Creates and opens the options menu for a conversation.
    pub fn open_menu(&self, id: &ConvId, requester: Requester) -> Result<bool> {
        let ctx = self.context()?;
        ctx.options_menu().create_menu(id, requester, self.menu_theme)?;
        ctx.options_menu().open()
    }

    /// Archives `id`. If it was the current conversation the next one is
    /// selected once `archive_reselect_delay` has passed.
    pub fn archive(&self, id: &ConvId) -> Result<()> {
        let ctx = self.context()?;
        let was_current = ctx
            .engine()
            .current_conversation()
            .map(|c| &c.id == id)
            .unwrap_or(false);
        ctx.engine().set_archived(id, true)?;
        info!("Archived {}", id);
        if !was_current {
            return Ok(());
        }

        let delay = ctx.config().archive_reselect_delay;
        if delay.is_zero() {
            return self.select_next_after(id);
        }
        let me = self.me.clone();
        let archived = id.clone();
        ctx.scheduler().post_delayed("archive_reselect", delay, move || {
            let Some(handler) = me.upgrade() else {
                return;
            };
            if let Err(e) = handler.select_next_after(&archived) {
                warn!("Reselect after archive failed: {}", e);
            }
        })?;
        Ok(())
    }

    /// Selects the most recent unarchived conversation other than `gone`,
    /// or falls back to the list when there is none.
    pub fn select_next_after(&self, gone: &ConvId) -> Result<()> {
        let ctx = self.context()?;
        let next = ctx
            .engine()
            .conversations()
            .into_iter()
            .find(|c| !c.is_archived && &c.id != gone);
        match next {
            Some(next) => self.select_conversation(&next.id, "select_next"),
            None => {
                debug!("No conversation left to select");
                ctx.engine().set_current_conversation(None)?;
                self.show_conversation_list("select_next")
            }
        }
    }

    pub fn perform(&self, id: &ConvId, requester: Requester, item: OptionsMenuItem) -> Result<()> {
        let ctx = self.context()?;
        let info = ctx
            .engine()
            .conversation(id)
            .ok_or_else(|| UiError::ConversationNotFound(id.clone()))?;
        let scope = scope_for(requester);
        debug!("Performing {:?} on {} from {:?}", item, id, requester);

        match item {
            OptionsMenuItem::Archive => self.archive(id),
            OptionsMenuItem::Unarchive => ctx.engine().set_archived(id, false),
            OptionsMenuItem::Silence => ctx.engine().set_muted(id, true),
            OptionsMenuItem::Unsilence => ctx.engine().set_muted(id, false),
            OptionsMenuItem::Call => {
                let engine = ctx.engine().clone();
                run_if_online(&ctx, "call", scope, || engine.start_call(id)).map(|_| ())
            }
            OptionsMenuItem::Picture => {
                self.select_conversation(id, "menu_picture")?;
                ctx.navigation().set_visible_page(Page::Camera, "menu_picture")?;
                Ok(())
            }
            OptionsMenuItem::Rename => {
                run_if_online(&ctx, "rename", scope, || ctx.screen().edit_conversation_name(true))
                    .map(|_| ())
            }
            OptionsMenuItem::Leave => self.confirm_leave(&ctx, info, requester),
            OptionsMenuItem::Delete => self.confirm_delete(&ctx, info, scope),
            OptionsMenuItem::Block => self.confirm_block(&ctx, info, scope),
            OptionsMenuItem::Unblock => match info.other_user {
                Some(user) => ctx.engine().unblock_user(&user),
                None => Err(UiError::MenuItemUnavailable(item)),
            },
        }
    }

    fn confirm_leave(
        &self,
        ctx: &ControllerContext,
        info: ConversationInfo,
        requester: Requester,
    ) -> Result<()> {
        let prompt = ConfirmationPrompt::new(
            "Leave conversation?",
            format!("You will no longer receive messages from {}.", info.name),
            "Leave",
        )
        .with_negative("Cancel")
        .with_theme(self.menu_theme);

        let weak = self.ctx.clone();
        let id = info.id;
        let callback = OnHideAnimationEnd(move |confirmed, _, _| {
            if !confirmed {
                return;
            }
            let Some(ctx) = live_context(&weak) else {
                return;
            };
            if let Err(e) = ctx.engine().leave(&id) {
                warn!("Leave {} failed: {}", id, e);
                return;
            }
            if requester == Requester::Participants {
                if let Err(e) = ctx.screen().hide_participants(false, false) {
                    warn!("Hiding participants after leaving {} failed: {}", id, e);
                }
            }
        });
        ctx.confirmation()
            .request_confirmation(ConfirmationRequest::new(prompt, callback), scope_for(requester))?;
        Ok(())
    }

    fn confirm_delete(
        &self,
        ctx: &ControllerContext,
        info: ConversationInfo,
        scope: ConfirmationScope,
    ) -> Result<()> {
        let mut prompt = ConfirmationPrompt::new(
            "Delete content?",
            format!("This will delete the history of {} on this device.", info.name),
            "Delete",
        )
        .with_negative("Cancel")
        .with_theme(self.menu_theme);
        let can_leave = info.is_group() && info.is_active;
        if can_leave {
            prompt = prompt.with_checkbox("Also leave the conversation", false);
        }

        let me = self.me.clone();
        let id = info.id;
        let callback = OnHideAnimationEnd(move |confirmed, _, leave_too| {
            if !confirmed {
                return;
            }
            let Some(handler) = me.upgrade() else {
                return;
            };
            if let Err(e) = handler.delete_now(&id, can_leave && leave_too) {
                warn!("Delete {} failed: {}", id, e);
            }
        });
        ctx.confirmation()
            .request_confirmation(ConfirmationRequest::new(prompt, callback), scope)?;
        Ok(())
    }

    fn delete_now(&self, id: &ConvId, leave: bool) -> Result<()> {
        let ctx = self.context()?;
        let was_current = ctx
            .engine()
            .current_conversation()
            .map(|c| &c.id == id)
            .unwrap_or(false);
        if leave {
            ctx.engine().leave(id)?;
        }
        ctx.engine().clear(id)?;
        info!("Deleted {}", id);
        if was_current {
            self.select_next_after(id)?;
        }
        Ok(())
    }

    fn confirm_block(
        &self,
        ctx: &ControllerContext,
        info: ConversationInfo,
        scope: ConfirmationScope,
    ) -> Result<()> {
        let user = info
            .other_user
            .clone()
            .ok_or(UiError::MenuItemUnavailable(OptionsMenuItem::Block))?;
        let prompt = ConfirmationPrompt::new(
            "Block?",
            format!("{} won't be able to contact you or add you to group conversations.", info.name),
            "Block",
        )
        .with_negative("Cancel")
        .with_theme(self.menu_theme);

        let me = self.me.clone();
        let id = info.id;
        let callback = OnHideAnimationEnd(move |confirmed, _, _| {
            if !confirmed {
                return;
            }
            let Some(handler) = me.upgrade() else {
                return;
            };
            if let Err(e) = handler.block_now(&id, &user) {
                warn!("Block {} failed: {}", user, e);
            }
        });
        ctx.confirmation()
            .request_confirmation(ConfirmationRequest::new(prompt, callback), scope)?;
        Ok(())
    }

    fn block_now(&self, id: &ConvId, user: &UserId) -> Result<()> {
        let ctx = self.context()?;
        let was_current = ctx
            .engine()
            .current_conversation()
            .map(|c| &c.id == id)
            .unwrap_or(false);
        ctx.engine().block_user(user)?;
        if was_current {
            self.select_next_after(id)?;
        }
        Ok(())
    }
}

impl OptionsMenuObserver for ConversationListHandler {
    fn on_options_menu_item_clicked(
        &self,
        conversation: &ConvId,
        requester: Requester,
        item: OptionsMenuItem,
    ) {
        if let Err(e) = self.perform(conversation, requester, item) {
            warn!("{:?} on {} failed: {}", item, conversation, e);
        }
    }
}

impl ConversationScreenObserver for ConversationListHandler {
    fn on_show_conversation_menu(
        &self,
        requester: Requester,
        conversation: &ConvId,
        _anchor: Option<Anchor>,
    ) {
        if let Err(e) = self.open_menu(conversation, requester) {
            warn!("Opening menu for {} failed: {}", conversation, e);
        }
    }
}
