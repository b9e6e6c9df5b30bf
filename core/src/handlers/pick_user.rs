/// Pick-user confirmation: turns the selection into a group or new members
use super::conversation_list::ConversationListHandler;
use super::network::run_if_online;
use crate::context::{live_context, ControllerContext};
use crate::controllers::{ConfirmationScope, ConversationScreenObserver, Page, PickUserDestination};
use crate::error::{Result, UiError};
use crate::types::{ConvId, UserId};
use std::rc::{Rc, Weak};
use tracing::{info, warn};

pub struct PickUserHandler {
    ctx: Weak<ControllerContext>,
    conversation_list: Rc<ConversationListHandler>,
}

impl PickUserHandler {
    pub fn new(ctx: &Rc<ControllerContext>, conversation_list: Rc<ConversationListHandler>) -> Self {
        Self {
            ctx: Rc::downgrade(ctx),
            conversation_list,
        }
    }

    fn context(&self) -> Result<Rc<ControllerContext>> {
        live_context(&self.ctx).ok_or(UiError::TornDown("pick_user_handler"))
    }

    /// Opens the picker for adding people to the current conversation.
    pub fn add_people(&self) -> Result<()> {
        let ctx = self.context()?;
        ctx.pick_user().show_pick_user(PickUserDestination::Participants)?;
        ctx.navigation()
            .set_visible_page(Page::PickUserAddToConversation, "add_people")?;
        Ok(())
    }

    /// Commits the selection made on `destination`.
    ///
    /// From the participants screen of a group the users join that group.
    /// From a one-to-one conversation a new group is created with the other
    /// participant included. Anywhere else the selection becomes a new group.
    /// Returns the created conversation; `Ok(None)` when people were added to
    /// an existing group or the action was blocked because we are offline.
    pub fn confirm_selection(
        &self,
        destination: PickUserDestination,
        name: Option<&str>,
    ) -> Result<Option<ConvId>> {
        let ctx = self.context()?;
        let picked = ctx.pick_user().selected_users();
        if picked.is_empty() {
            return Err(UiError::NothingSelected);
        }
        let scope = match destination {
            PickUserDestination::Participants => ConfirmationScope::Participants,
            _ => ConfirmationScope::ConversationList,
        };
        let current = match destination {
            PickUserDestination::Participants => ctx.engine().current_conversation(),
            _ => None,
        };

        let engine = ctx.engine().clone();
        let mut created = None;
        let online = match current {
            Some(group) if group.is_group() => {
                run_if_online(&ctx, "add_participants", scope, || {
                    engine.add_participants(&group.id, &picked)
                })?
            }
            current => {
                let mut members: Vec<UserId> =
                    current.and_then(|c| c.other_user).into_iter().collect();
                for user in picked {
                    if !members.contains(&user) {
                        members.push(user);
                    }
                }
                run_if_online(&ctx, "create_group", scope, || {
                    created = Some(engine.create_group_conversation(&members, name)?);
                    Ok(())
                })?
            }
        };
        if !online {
            return Ok(None);
        }

        ctx.pick_user().hide_pick_user(destination, false)?;
        match &created {
            Some(id) => {
                info!("Opening new group {}", id);
                self.conversation_list
                    .select_conversation(id, "pick_user")?;
            }
            None => {
                ctx.navigation().set_visible_page(Page::Participant, "pick_user")?;
            }
        }
        Ok(created)
    }
}

impl ConversationScreenObserver for PickUserHandler {
    fn on_add_people_to_conversation(&self) {
        if let Err(e) = self.add_people() {
            warn!("Opening the people picker failed: {}", e);
        }
    }
}
