/// End-to-end flows through the handlers: menu actions, confirmations,
/// offline alerts, sync errors and the script simulator.
use chrono::{Duration as ChronoDuration, Utc};
use messenger_ui_core::cli_app::{Command, Simulator};
use messenger_ui_core::controllers::{
    ConfirmationScope, ConversationScreenObserver, OptionsMenuItem, Page, PickUserDestination,
    Requester,
};
use messenger_ui_core::engine::InMemoryEngine;
use messenger_ui_core::handlers::network::OFFLINE_HEADER;
use messenger_ui_core::handlers::Handlers;
use messenger_ui_core::types::{
    ConnectionStatus, ConvId, ConversationInfo, ConversationKind, MessageContent, SyncError,
    SyncErrorKind, Theme, UserId,
};
use messenger_ui_core::{ControllerContext, MessagingEngine, UiConfig, UiError};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

fn engine() -> Rc<InMemoryEngine> {
    let engine = InMemoryEngine::new();
    let now = Utc::now();

    let mut team = ConversationInfo::group("team", "Team");
    team.last_event_at = now;
    engine.insert_conversation(team);

    let mut bob = ConversationInfo::one_to_one("bob", "Bob", UserId::from("bob"));
    bob.last_event_at = now - ChronoDuration::minutes(1);
    engine.insert_conversation(bob);

    let mut dana = ConversationInfo::pending(
        "dana",
        "Dana",
        UserId::from("dana"),
        ConnectionStatus::PendingFromOther,
    );
    dana.last_event_at = now - ChronoDuration::minutes(2);
    engine.insert_conversation(dana);

    Rc::new(engine)
}

fn immediate() -> UiConfig {
    UiConfig {
        archive_reselect_delay: Duration::ZERO,
        pager_advance_delay: Duration::ZERO,
        ..UiConfig::default()
    }
}

struct Fixture {
    engine: Rc<InMemoryEngine>,
    ctx: Rc<ControllerContext>,
    handlers: Handlers,
}

fn setup() -> Fixture {
    let engine = engine();
    let ctx = ControllerContext::new(immediate(), engine.clone());
    let handlers = Handlers::install(&ctx, Theme::Dark).unwrap();
    Fixture {
        engine,
        ctx,
        handlers,
    }
}

impl Fixture {
    fn pick(&self, id: &str, requester: Requester, item: OptionsMenuItem) {
        self.ctx
            .screen()
            .show_conversation_menu(requester, &ConvId::from(id), None)
            .unwrap();
        assert!(self.ctx.options_menu().is_open());
        self.ctx.options_menu().select(item).unwrap();
    }

    fn answer(&self, scope: ConfirmationScope, confirm: bool, checked: bool) {
        let confirmation = self.ctx.confirmation();
        if confirm {
            assert!(confirmation.positive_clicked(scope, checked).unwrap());
        } else {
            assert!(confirmation.negative_clicked(scope).unwrap());
        }
        assert!(confirmation.hide_animation_finished(scope).unwrap());
    }
}

#[test]
fn test_select_routes_by_conversation_kind() {
    let f = setup();
    let list = &f.handlers.conversation_list;

    list.select_conversation(&"team".into(), "test").unwrap();
    assert_eq!(f.ctx.navigation().current_page(), Some(Page::MessageStream));
    assert_eq!(f.engine.current_conversation().unwrap().id.as_str(), "team");

    list.select_conversation(&"dana".into(), "test").unwrap();
    assert_eq!(
        f.ctx.navigation().current_page(),
        Some(Page::ConnectRequestInbox)
    );

    assert!(list.select_conversation(&"nobody".into(), "test").is_err());
}

#[test]
fn test_delete_waits_for_hide_animation() {
    let f = setup();
    f.handlers
        .conversation_list
        .select_conversation(&"team".into(), "test")
        .unwrap();

    f.pick("team", Requester::ConversationList, OptionsMenuItem::Delete);
    let prompt = f
        .ctx
        .confirmation()
        .pending_prompt(ConfirmationScope::ConversationList)
        .unwrap();
    assert!(prompt.checkbox.is_some());

    let scope = ConfirmationScope::ConversationList;
    assert!(f.ctx.confirmation().positive_clicked(scope, true).unwrap());
    assert!(f.engine.conversation(&"team".into()).is_some());

    f.ctx.confirmation().hide_animation_finished(scope).unwrap();
    assert!(f.engine.conversation(&"team".into()).is_none());
    assert_eq!(f.engine.current_conversation().unwrap().id.as_str(), "bob");
}

#[test]
fn test_canceled_delete_keeps_conversation() {
    let f = setup();
    f.pick("bob", Requester::ConversationList, OptionsMenuItem::Delete);
    f.answer(ConfirmationScope::ConversationList, false, false);
    assert!(f.engine.conversation(&"bob".into()).is_some());
}

#[test]
fn test_leave_from_participants() {
    let f = setup();
    f.ctx.screen().show_participants(None, false).unwrap();

    f.pick("team", Requester::Participants, OptionsMenuItem::Leave);
    assert!(f.ctx.confirmation().is_showing(ConfirmationScope::Participants));
    f.answer(ConfirmationScope::Participants, true, false);

    assert!(!f.engine.conversation(&"team".into()).unwrap().is_active);
    assert!(!f.ctx.screen().is_showing_participant());
}

#[test]
fn test_block_then_unblock() {
    let f = setup();
    f.pick("bob", Requester::ConversationList, OptionsMenuItem::Block);
    f.answer(ConfirmationScope::ConversationList, true, false);
    assert_eq!(
        f.engine.conversation(&"bob".into()).unwrap().other_connection,
        Some(ConnectionStatus::Blocked)
    );

    f.pick("bob", Requester::ConversationList, OptionsMenuItem::Unblock);
    assert_eq!(
        f.engine.conversation(&"bob".into()).unwrap().other_connection,
        Some(ConnectionStatus::Accepted)
    );
}

#[test]
fn test_silence_toggles_mute() {
    let f = setup();
    f.pick("team", Requester::ConversationList, OptionsMenuItem::Silence);
    assert!(f.engine.conversation(&"team".into()).unwrap().is_muted);
    f.pick("team", Requester::ConversationList, OptionsMenuItem::Unsilence);
    assert!(!f.engine.conversation(&"team".into()).unwrap().is_muted);
}

#[derive(Default)]
struct NameEditor(Cell<bool>);

impl ConversationScreenObserver for NameEditor {
    fn on_show_edit_conversation_name(&self, edit: bool) {
        self.0.set(edit);
    }
}

#[test]
fn test_rename_offline_shows_alert() {
    let f = setup();
    let editor = Rc::new(NameEditor::default());
    f.ctx.screen().add_observer(editor.clone()).unwrap();

    f.engine.set_network_available(false);
    f.pick("team", Requester::Participants, OptionsMenuItem::Rename);
    assert!(!editor.0.get());
    let prompt = f
        .ctx
        .confirmation()
        .pending_prompt(ConfirmationScope::Participants)
        .unwrap();
    assert_eq!(prompt.header, OFFLINE_HEADER);
    f.answer(ConfirmationScope::Participants, true, false);

    f.engine.set_network_available(true);
    f.pick("team", Requester::Participants, OptionsMenuItem::Rename);
    assert!(editor.0.get());
}

#[test]
fn test_rename_commit_closes_editor() {
    let f = setup();
    let editor = Rc::new(NameEditor::default());
    f.ctx.screen().add_observer(editor.clone()).unwrap();
    let list = &f.handlers.conversation_list;
    let scope = ConfirmationScope::Participants;

    f.pick("team", Requester::Participants, OptionsMenuItem::Rename);
    assert!(editor.0.get());
    assert!(matches!(
        list.rename(&"team".into(), "   ", scope),
        Err(UiError::EmptyName)
    ));
    assert!(editor.0.get());

    assert!(list.rename(&"team".into(), "  Night shift ", scope).unwrap());
    assert_eq!(f.engine.conversation(&"team".into()).unwrap().name, "Night shift");
    assert!(!editor.0.get());
}

#[test]
fn test_rename_commit_offline_keeps_name() {
    let f = setup();
    let list = &f.handlers.conversation_list;
    f.engine.set_network_available(false);

    let scope = ConfirmationScope::ConversationList;
    assert!(!list.rename(&"team".into(), "Elsewhere", scope).unwrap());
    assert_eq!(f.engine.conversation(&"team".into()).unwrap().name, "Team");
    assert_eq!(
        f.ctx.confirmation().pending_prompt(scope).unwrap().header,
        OFFLINE_HEADER
    );
}

#[test]
fn test_accept_connection_opens_conversation() {
    let f = setup();
    let list = &f.handlers.conversation_list;
    list.select_conversation(&"dana".into(), "test").unwrap();
    assert_eq!(
        f.ctx.navigation().current_page(),
        Some(Page::ConnectRequestInbox)
    );

    let id = list.accept_connection(&UserId::from("dana")).unwrap();
    assert_eq!(id.as_str(), "dana");
    let dana = f.engine.conversation(&id).unwrap();
    assert_eq!(dana.kind, ConversationKind::OneToOne);
    assert_eq!(dana.other_connection, Some(ConnectionStatus::Accepted));
    assert_eq!(f.ctx.navigation().current_page(), Some(Page::MessageStream));
    assert_eq!(f.engine.current_conversation().unwrap().id, id);

    assert!(list.accept_connection(&UserId::from("nobody")).is_err());
}

#[test]
fn test_send_text() {
    let f = setup();
    f.handlers
        .conversation_list
        .send_text(&"bob".into(), "hi")
        .unwrap();
    assert_eq!(
        f.engine.sent_messages(),
        vec![(
            ConvId::from("bob"),
            MessageContent::Text {
                text: "hi".to_string()
            }
        )]
    );
}

#[test]
fn test_pick_user_creates_group() {
    let f = setup();
    let picker = f.ctx.pick_user();
    let destination = PickUserDestination::ConversationList;
    picker.show_pick_user(destination).unwrap();

    assert!(matches!(
        f.handlers.pick_user.confirm_selection(destination, None),
        Err(UiError::NothingSelected)
    ));

    picker.toggle_selected_user(&UserId::from("ann")).unwrap();
    picker.toggle_selected_user(&UserId::from("cy")).unwrap();
    let id = f
        .handlers
        .pick_user
        .confirm_selection(destination, Some("Crew"))
        .unwrap()
        .unwrap();

    let crew = f.engine.conversation(&id).unwrap();
    assert!(crew.is_group());
    assert_eq!(crew.name, "Crew");
    assert_eq!(crew.participants, vec![UserId::from("ann"), UserId::from("cy")]);
    assert_eq!(f.engine.current_conversation().unwrap().id, id);
    assert_eq!(f.ctx.navigation().current_page(), Some(Page::MessageStream));
    assert!(!picker.is_showing_pick_user(destination));
    assert!(picker.selected_users().is_empty());
}

#[test]
fn test_pick_user_offline_keeps_selection() {
    let f = setup();
    let picker = f.ctx.pick_user();
    let destination = PickUserDestination::ConversationList;
    picker.show_pick_user(destination).unwrap();
    picker.toggle_selected_user(&UserId::from("ann")).unwrap();

    f.engine.set_network_available(false);
    let before = f.engine.conversations().len();
    assert_eq!(
        f.handlers.pick_user.confirm_selection(destination, None).unwrap(),
        None
    );
    assert_eq!(f.engine.conversations().len(), before);
    assert!(picker.is_showing_pick_user(destination));
    assert_eq!(picker.selected_users(), vec![UserId::from("ann")]);
}

#[test]
fn test_add_people_to_group() {
    let f = setup();
    f.handlers
        .conversation_list
        .select_conversation(&"team".into(), "test")
        .unwrap();

    f.ctx.screen().add_people_to_conversation().unwrap();
    let picker = f.ctx.pick_user();
    assert!(picker.is_showing_pick_user(PickUserDestination::Participants));
    assert_eq!(
        f.ctx.navigation().current_page(),
        Some(Page::PickUserAddToConversation)
    );

    picker.toggle_selected_user(&UserId::from("eve")).unwrap();
    let created = f
        .handlers
        .pick_user
        .confirm_selection(PickUserDestination::Participants, None)
        .unwrap();
    assert_eq!(created, None);
    assert_eq!(
        f.engine.conversation(&"team".into()).unwrap().participants,
        vec![UserId::from("eve")]
    );
    assert_eq!(f.ctx.navigation().current_page(), Some(Page::Participant));
    assert!(!picker.is_showing_pick_user(PickUserDestination::Participants));
}

#[test]
fn test_add_people_to_one_to_one_starts_group() {
    let f = setup();
    f.handlers
        .conversation_list
        .select_conversation(&"bob".into(), "test")
        .unwrap();
    f.ctx.screen().add_people_to_conversation().unwrap();
    f.ctx.pick_user().toggle_selected_user(&UserId::from("eve")).unwrap();

    let id = f
        .handlers
        .pick_user
        .confirm_selection(PickUserDestination::Participants, None)
        .unwrap()
        .unwrap();
    let group = f.engine.conversation(&id).unwrap();
    assert_eq!(group.participants, vec![UserId::from("bob"), UserId::from("eve")]);
    assert_eq!(f.engine.current_conversation().unwrap().id, id);
    assert!(f.engine.conversation(&"bob".into()).is_some());
}

#[test]
fn test_call_offline_is_not_started() {
    let f = setup();
    f.engine.set_network_available(false);
    f.pick("bob", Requester::ConversationList, OptionsMenuItem::Call);
    assert!(f.engine.started_calls().is_empty());

    f.engine.set_network_available(true);
    f.pick("bob", Requester::ConversationList, OptionsMenuItem::Call);
    assert_eq!(f.engine.started_calls(), vec![ConvId::from("bob")]);
}

#[test]
fn test_sync_error_dialog_dismisses_on_hide() {
    let f = setup();
    f.engine.report_sync_error(SyncError::new(
        SyncErrorKind::CannotAddUserToFullConversation,
        Some("team".into()),
    ));

    let scope = ConfirmationScope::ConversationList;
    assert!(f.ctx.confirmation().is_showing(scope));
    assert_eq!(f.engine.pending_errors().len(), 1);

    f.answer(scope, true, false);
    assert!(f.engine.pending_errors().is_empty());
}

#[test]
fn test_silent_and_unmapped_sync_errors_are_dismissed() {
    let f = setup();
    f.engine.report_sync_error(SyncError::new(
        SyncErrorKind::CannotSendAssetFileNotFound,
        None,
    ));
    f.engine
        .report_sync_error(SyncError::new(SyncErrorKind::Unknown, None));

    assert!(f.engine.pending_errors().is_empty());
    assert!(!f.ctx.confirmation().has_pending(ConfirmationScope::ConversationList));
}

#[test]
fn test_calls_after_tear_down_fail() {
    let f = setup();
    f.ctx.tear_down();
    assert!(f
        .handlers
        .conversation_list
        .select_conversation(&"team".into(), "test")
        .is_err());
    assert!(f.ctx.navigation().set_visible_page(Page::Archive, "test").is_err());
    assert!(f.handlers.back_press.on_back_pressed().is_err());
}

#[tokio::test]
async fn test_simulator_script() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let simulator = Simulator::new(immediate(), engine(), local.clone(), true).unwrap();
            let script = "\
                # open a conversation and archive it from the menu\n\
                select team\n\
                menu team\n\
                pick archive\n\
                bogus\n\
                state\n\
                quit\n\
                select bob\n";
            let failures = simulator.run_script(script).await;
            assert_eq!(failures, 1);

            let ctx = simulator.context();
            let current = ctx.engine().current_conversation().unwrap();
            assert_eq!(current.id.as_str(), "bob");
            assert!(ctx.engine().conversation(&"team".into()).unwrap().is_archived);
            assert!(simulator
                .shell()
                .lines()
                .iter()
                .any(|line| line.starts_with("[state]")));

            assert!(!simulator.execute(Command::Quit).await.unwrap());
            simulator.shutdown();
            assert!(ctx.is_torn_down());
        })
        .await;
}

#[tokio::test]
async fn test_simulator_back_finishes_canceled_confirmation() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let simulator = Simulator::new(immediate(), engine(), local.clone(), true).unwrap();
            let script = "\
                menu bob\n\
                pick delete\n\
                back\n";
            assert_eq!(simulator.run_script(script).await, 0);

            let ctx = simulator.context();
            let scope = ConfirmationScope::ConversationList;
            assert!(!ctx.confirmation().has_pending(scope));
            assert!(ctx.engine().conversation(&"bob".into()).is_some());

            let script = "\
                menu team\n\
                pick leave\n\
                confirm\n";
            assert_eq!(simulator.run_script(script).await, 0);
            assert!(!ctx.engine().conversation(&"team".into()).unwrap().is_active);
            simulator.shutdown();
        })
        .await;
}

#[tokio::test]
async fn test_simulator_people_and_devices() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let simulator = Simulator::new(immediate(), engine(), local.clone(), true).unwrap();
            let script = "\
                accept dana\n\
                send dana hello there\n\
                pick-user conversation-list\n\
                toggle-user ann\n\
                create-group Book club\n\
                participants\n\
                device ann tablet\n\
                back\n\
                rename team Team two\n";
            assert_eq!(simulator.run_script(script).await, 0);

            let ctx = simulator.context();
            assert_eq!(
                ctx.engine().conversation(&"dana".into()).unwrap().kind,
                ConversationKind::OneToOne
            );
            let current = ctx.engine().current_conversation().unwrap();
            assert_eq!(current.name, "Book club");
            assert!(!ctx.screen().state().showing_otr_client);
            assert!(ctx.screen().is_showing_participant());
            assert_eq!(ctx.engine().conversation(&"team".into()).unwrap().name, "Team two");
            assert!(simulator
                .shell()
                .lines()
                .iter()
                .any(|line| line == "[screen] hide device"));
            simulator.shutdown();
        })
        .await;
}
