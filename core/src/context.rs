/// Controller context: every controller plus the engine handle, passed explicitly
use crate::config::UiConfig;
use crate::controllers::{
    ConfirmationCoordinator, ConversationScreenController, NavigationController,
    OptionsMenuControl, PickUserController,
};
use crate::engine::MessagingEngine;
use crate::error::{Result, UiError};
use crate::scheduler::{Liveness, UiScheduler};
use std::rc::Rc;
use tokio::task::LocalSet;
use tracing::info;

pub struct ControllerContext {
    config: UiConfig,
    engine: Rc<dyn MessagingEngine>,
    screen: ConversationScreenController,
    navigation: NavigationController,
    confirmation: ConfirmationCoordinator,
    options_menu: OptionsMenuControl,
    pick_user: PickUserController,
    scheduler: UiScheduler,
}

impl ControllerContext {
    /// Context without an executor: any delayed follow-up fails with
    /// `UiError::NoExecutor`. Zero delays still run inline.
    pub fn new(config: UiConfig, engine: Rc<dyn MessagingEngine>) -> Rc<Self> {
        Self::build(config, engine, UiScheduler::new(Liveness::new()))
    }

    /// Deferred work is spawned onto `local`, which the caller drives.
    pub fn with_local_set(
        config: UiConfig,
        engine: Rc<dyn MessagingEngine>,
        local: Rc<LocalSet>,
    ) -> Rc<Self> {
        Self::build(
            config,
            engine,
            UiScheduler::with_local_set(Liveness::new(), local),
        )
    }

    fn build(config: UiConfig, engine: Rc<dyn MessagingEngine>, scheduler: UiScheduler) -> Rc<Self> {
        let navigation = NavigationController::new(config.navigation_history_limit);
        let options_menu = OptionsMenuControl::new(engine.clone());
        info!("Controller context created ({:?} layout)", config.layout);
        Rc::new(Self {
            config,
            engine,
            screen: ConversationScreenController::new(),
            navigation,
            confirmation: ConfirmationCoordinator::new(),
            options_menu,
            pick_user: PickUserController::new(),
            scheduler,
        })
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn engine(&self) -> &Rc<dyn MessagingEngine> {
        &self.engine
    }

    pub fn screen(&self) -> &ConversationScreenController {
        &self.screen
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn confirmation(&self) -> &ConfirmationCoordinator {
        &self.confirmation
    }

    pub fn options_menu(&self) -> &OptionsMenuControl {
        &self.options_menu
    }

    pub fn pick_user(&self) -> &PickUserController {
        &self.pick_user
    }

    pub fn scheduler(&self) -> &UiScheduler {
        &self.scheduler
    }

    pub fn is_torn_down(&self) -> bool {
        !self.scheduler.liveness().is_alive()
    }

    pub fn verify_lifecycle(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(UiError::TornDown("controller_context"));
        }
        Ok(())
    }

    /// Tears down every controller. Deferred work still sleeping is skipped
    /// when it wakes.
    pub fn tear_down(&self) {
        if self.is_torn_down() {
            return;
        }
        self.scheduler.liveness().kill();
        self.options_menu.tear_down();
        self.confirmation.tear_down();
        self.pick_user.tear_down();
        self.screen.tear_down();
        self.navigation.tear_down();
        info!("Controller context torn down");
    }
}

/// Resolves a weak context handle, or `None` once the context is gone or torn down.
pub fn live_context(ctx: &std::rc::Weak<ControllerContext>) -> Option<Rc<ControllerContext>> {
    ctx.upgrade().filter(|ctx| !ctx.is_torn_down())
}
