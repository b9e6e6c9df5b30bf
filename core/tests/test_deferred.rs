/// Deferred work: pager advance, reselect after archive, skipped after tear down
use chrono::{Duration as ChronoDuration, Utc};
use messenger_ui_core::controllers::{Page, PagerPosition};
use messenger_ui_core::engine::InMemoryEngine;
use messenger_ui_core::handlers::Handlers;
use messenger_ui_core::types::{ConversationInfo, Theme};
use messenger_ui_core::{ControllerContext, LayoutMode, MessagingEngine, UiConfig, UiError};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;
use tokio::time::sleep;

fn seeded_engine() -> Rc<InMemoryEngine> {
    let engine = InMemoryEngine::new();
    let now = Utc::now();
    for (i, id) in ["first", "second", "third"].iter().enumerate() {
        let mut conversation = ConversationInfo::group(*id, id.to_uppercase());
        conversation.last_event_at = now - ChronoDuration::minutes(i as i64);
        engine.insert_conversation(conversation);
    }
    Rc::new(engine)
}

fn config(archive_ms: u64, pager_ms: u64) -> UiConfig {
    UiConfig {
        layout: LayoutMode::SinglePane,
        archive_reselect_delay: Duration::from_millis(archive_ms),
        pager_advance_delay: Duration::from_millis(pager_ms),
        ..UiConfig::default()
    }
}

#[tokio::test]
async fn test_pager_advances_after_delay() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let ctx =
                ControllerContext::with_local_set(config(0, 30), seeded_engine(), local.clone());
            let handlers = Handlers::install(&ctx, Theme::Light).unwrap();

            handlers
                .conversation_list
                .select_conversation(&"second".into(), "test")
                .unwrap();
            assert_eq!(ctx.navigation().pager_position(), PagerPosition::First);

            sleep(Duration::from_millis(100)).await;
            assert_eq!(ctx.navigation().pager_position(), PagerPosition::Second);
        })
        .await;
}

#[tokio::test]
async fn test_two_pane_never_moves_pager() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let config = UiConfig {
                layout: LayoutMode::TwoPane,
                ..config(0, 10)
            };
            let ctx =
                ControllerContext::with_local_set(config, seeded_engine(), local.clone());
            let handlers = Handlers::install(&ctx, Theme::Light).unwrap();

            handlers
                .conversation_list
                .select_conversation(&"first".into(), "test")
                .unwrap();
            sleep(Duration::from_millis(50)).await;
            assert_eq!(ctx.navigation().pager_position(), PagerPosition::First);
        })
        .await;
}

#[tokio::test]
async fn test_archiving_current_reselects_later() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let engine = seeded_engine();
            let ctx =
                ControllerContext::with_local_set(config(40, 0), engine.clone(), local.clone());
            let handlers = Handlers::install(&ctx, Theme::Light).unwrap();
            let list = &handlers.conversation_list;

            list.select_conversation(&"first".into(), "test").unwrap();
            list.archive(&"first".into()).unwrap();

            // Still on the archived conversation until the delay has passed
            assert_eq!(engine.current_conversation().unwrap().id.as_str(), "first");
            assert!(engine.conversation(&"first".into()).unwrap().is_archived);

            sleep(Duration::from_millis(120)).await;
            assert_eq!(engine.current_conversation().unwrap().id.as_str(), "second");
        })
        .await;
}

#[tokio::test]
async fn test_archiving_other_conversation_keeps_selection() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let engine = seeded_engine();
            let ctx =
                ControllerContext::with_local_set(config(10, 0), engine.clone(), local.clone());
            let handlers = Handlers::install(&ctx, Theme::Light).unwrap();
            let list = &handlers.conversation_list;

            list.select_conversation(&"second".into(), "test").unwrap();
            list.archive(&"third".into()).unwrap();
            sleep(Duration::from_millis(50)).await;
            assert_eq!(engine.current_conversation().unwrap().id.as_str(), "second");
        })
        .await;
}

#[tokio::test]
async fn test_deferred_work_skipped_after_tear_down() {
    let local = Rc::new(LocalSet::new());
    local
        .run_until(async {
            let engine = seeded_engine();
            let ctx =
                ControllerContext::with_local_set(config(30, 30), engine.clone(), local.clone());
            let handlers = Handlers::install(&ctx, Theme::Light).unwrap();
            let list = &handlers.conversation_list;

            list.select_conversation(&"first".into(), "test").unwrap();
            list.archive(&"first".into()).unwrap();
            handlers.detach(&ctx);
            ctx.tear_down();

            sleep(Duration::from_millis(100)).await;
            assert_eq!(engine.current_conversation().unwrap().id.as_str(), "first");
            assert_eq!(ctx.navigation().pager_position(), PagerPosition::First);
        })
        .await;
}

#[test]
fn test_delayed_pager_without_executor_is_an_error() {
    let engine = seeded_engine();
    let ctx = ControllerContext::new(UiConfig::default(), engine.clone());
    let handlers = Handlers::install(&ctx, Theme::Light).unwrap();

    let result = handlers
        .conversation_list
        .select_conversation(&"second".into(), "test");
    assert!(matches!(result, Err(UiError::NoExecutor("pager_advance"))));

    // The selection itself went through before the pager step
    assert_eq!(engine.current_conversation().unwrap().id.as_str(), "second");
    assert_eq!(ctx.navigation().current_page(), Some(Page::MessageStream));
    assert_eq!(ctx.navigation().pager_position(), PagerPosition::First);
}

#[test]
fn test_delayed_reselect_without_executor_is_an_error() {
    let engine = seeded_engine();
    let config = UiConfig {
        layout: LayoutMode::TwoPane,
        ..UiConfig::default()
    };
    let ctx = ControllerContext::new(config, engine.clone());
    let handlers = Handlers::install(&ctx, Theme::Light).unwrap();
    let list = &handlers.conversation_list;

    list.select_conversation(&"first".into(), "test").unwrap();
    let result = list.archive(&"first".into());
    assert!(matches!(result, Err(UiError::NoExecutor("archive_reselect"))));
    assert!(engine.conversation(&"first".into()).unwrap().is_archived);
}
