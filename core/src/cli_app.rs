use crate::config::UiConfig;
use crate::context::ControllerContext;
use crate::controllers::confirmation::ConfirmationObserver;
use crate::controllers::navigation::{PagerEnabledObserver, PagerPositionObserver};
use crate::controllers::options_menu::OptionsMenu;
use crate::controllers::{
    ConfirmationPrompt, ConfirmationScope, ConversationScreenObserver, NavigationObserver,
    OptionsMenuItem, OptionsMenuObserver, Page, PagerPosition, PickUserDestination,
    PickUserObserver, Requester, Slot,
};
use crate::engine::{EngineObserver, InMemoryEngine, MessagingEngine};
use crate::error::{Result, UiError};
use crate::handlers::Handlers;
use crate::types::{
    Anchor, ConnectionStatus, ConvId, ConversationInfo, SyncError, SyncErrorKind, SyncState,
    Theme, UserId,
};
use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

// ─── Console shell ───────────────────────────────────────────────────────────

/// Thin UI shell: prints every notification it receives
#[derive(Default)]
pub struct ConsoleShell {
    lines: RefCell<Vec<String>>,
    quiet: bool,
}

impl ConsoleShell {
    pub fn new(quiet: bool) -> Self {
        Self {
            lines: RefCell::new(Vec::new()),
            quiet,
        }
    }

    fn emit(&self, tag: &str, text: String) {
        if !self.quiet {
            println!("{} {}", format!("[{}]", tag).bright_cyan(), text);
        }
        self.lines.borrow_mut().push(format!("[{}] {}", tag, text));
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl ConversationScreenObserver for ConsoleShell {
    fn on_show_participants(&self, _anchor: Option<Anchor>, single: bool, member: bool, device_tab: bool) {
        self.emit(
            "screen",
            format!("show participants (single: {}, member: {}, devices: {})", single, member, device_tab),
        );
    }

    fn on_hide_participants(&self, back: bool, by_change: bool, _single: bool) {
        self.emit(
            "screen",
            format!("hide participants (back: {}, conversation change: {})", back, by_change),
        );
    }

    fn on_show_edit_conversation_name(&self, edit: bool) {
        self.emit("screen", format!("edit name: {}", edit));
    }

    fn on_show_user(&self, user: &UserId) {
        self.emit("screen", format!("show user {}", user));
    }

    fn on_hide_user(&self) {
        self.emit("screen", "hide user".to_string());
    }

    fn on_show_otr_client(&self, user: &UserId, client: &str) {
        self.emit("screen", format!("show device {} of {}", client, user));
    }

    fn on_hide_otr_client(&self) {
        self.emit("screen", "hide device".to_string());
    }

    fn on_add_people_to_conversation(&self) {
        self.emit("screen", "add people".to_string());
    }
}

impl NavigationObserver for ConsoleShell {
    fn on_page_visible(&self, page: Page) {
        self.emit("nav", format!("visible: {}", page.to_string().green()));
    }

    fn on_slot_page_changed(&self, slot: Slot, page: Page) {
        self.emit("nav", format!("{:?} slot: {}", slot, page));
    }
}

impl PagerEnabledObserver for ConsoleShell {
    fn on_pager_enabled_state_changed(&self, enabled: bool) {
        self.emit("pager", format!("enabled: {}", enabled));
    }
}

impl PagerPositionObserver for ConsoleShell {
    fn on_pager_position_changed(&self, position: PagerPosition) {
        self.emit("pager", format!("position: {:?}", position));
    }
}

impl ConfirmationObserver for ConsoleShell {
    fn on_request_confirmation(&self, prompt: &ConfirmationPrompt, scope: ConfirmationScope) {
        let checkbox = prompt
            .checkbox
            .as_ref()
            .map(|c| format!(" [{}]", c.label))
            .unwrap_or_default();
        self.emit(
            "confirm",
            format!(
                "{:?}: {} - {}{} ({} / {})",
                scope,
                prompt.header.bold(),
                prompt.message,
                checkbox,
                prompt.positive_label,
                prompt.negative_label.as_deref().unwrap_or("-")
            ),
        );
    }

    fn on_hide_confirmation(&self, scope: ConfirmationScope) {
        self.emit("confirm", format!("{:?}: hiding", scope));
    }
}

impl OptionsMenuObserver for ConsoleShell {
    fn on_options_menu_state_changed(&self, open: bool, menu: &OptionsMenu) {
        if open {
            self.emit(
                "menu",
                format!("{} ({:?}): {:?}", menu.title.bold(), menu.requester, menu.items),
            );
        } else {
            self.emit("menu", "closed".to_string());
        }
    }
}

impl PickUserObserver for ConsoleShell {
    fn on_show_pick_user(&self, destination: PickUserDestination) {
        self.emit("pick", format!("show ({:?})", destination));
    }

    fn on_hide_pick_user(&self, destination: PickUserDestination, _close_without_animation: bool) {
        self.emit("pick", format!("hide ({:?})", destination));
    }

    fn on_show_user_profile(&self, user: &UserId) {
        self.emit("pick", format!("profile {}", user));
    }

    fn on_hide_user_profile(&self) {
        self.emit("pick", "hide profile".to_string());
    }

    fn on_selected_users_changed(&self, selected: &[UserId]) {
        let names: Vec<&str> = selected.iter().map(UserId::as_str).collect();
        self.emit("pick", format!("selected: [{}]", names.join(", ")));
    }
}

impl EngineObserver for ConsoleShell {
    fn on_conversation_updated(&self, conversation: &ConversationInfo) {
        self.emit(
            "engine",
            format!(
                "{} updated (active: {}, muted: {}, archived: {})",
                conversation.id, conversation.is_active, conversation.is_muted, conversation.is_archived
            ),
        );
    }

    fn on_conversation_removed(&self, id: &ConvId) {
        self.emit("engine", format!("{} removed", id));
    }

    fn on_current_conversation_changed(&self, _from: Option<&ConvId>, to: Option<&ConvId>) {
        let to = to.map(ConvId::to_string).unwrap_or_else(|| "none".to_string());
        self.emit("engine", format!("current: {}", to.yellow()));
    }

    fn on_sync_state_changed(&self, state: SyncState) {
        self.emit("engine", format!("sync: {:?}", state));
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(ConvId),
    List,
    Archive,
    Menu(ConvId, Requester),
    Open,
    Close,
    Pick(OptionsMenuItem),
    Confirm(ConfirmationScope, bool),
    Cancel(ConfirmationScope),
    Participants,
    HideParticipants,
    User(UserId),
    HideUser,
    PickUser(PickUserDestination),
    HidePickUser(PickUserDestination),
    ToggleUser(UserId),
    CreateGroup(Option<String>),
    AddPeople,
    Accept(UserId),
    Rename(ConvId, String),
    Send(ConvId, String),
    Device(UserId, String),
    HideDevice,
    Left(Page),
    Right(Page),
    Visible(Page),
    Pager(usize),
    Back,
    Offline,
    Online,
    Error(SyncErrorKind),
    Sleep(Duration),
    State,
    Quit,
}

fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value = serde_json::Value::String(raw.trim().replace('-', "_").to_ascii_lowercase());
    serde_json::from_value(value).map_err(|_| UiError::Parse(format!("unexpected value '{}'", raw)))
}

fn arg<'a>(parts: &'a [&str], index: usize, command: &str) -> Result<&'a str> {
    parts
        .get(index)
        .copied()
        .ok_or_else(|| UiError::Parse(format!("{} needs an argument", command)))
}

/// Everything from `index` on, for free-text arguments
fn rest(parts: &[&str], index: usize, command: &str) -> Result<String> {
    match parts.get(index..) {
        Some(words) if !words.is_empty() => Ok(words.join(" ")),
        _ => Err(UiError::Parse(format!("{} needs an argument", command))),
    }
}

impl Command {
    /// `Ok(None)` for blank lines and `#` comments
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let name = parts[0];
        let command = match name {
            "select" => Command::Select(ConvId::from(arg(&parts, 1, name)?)),
            "list" => Command::List,
            "archive" => Command::Archive,
            "menu" => {
                let id = ConvId::from(arg(&parts, 1, name)?);
                let requester = match parts.get(2) {
                    Some(raw) => parse_enum(raw)?,
                    None => Requester::ConversationList,
                };
                Command::Menu(id, requester)
            }
            "open" => Command::Open,
            "close" => Command::Close,
            "pick" => Command::Pick(parse_enum(arg(&parts, 1, name)?)?),
            "confirm" => {
                let scope = match parts.get(1) {
                    Some(raw) => parse_enum(raw)?,
                    None => ConfirmationScope::ConversationList,
                };
                Command::Confirm(scope, parts.get(2) == Some(&"checked"))
            }
            "cancel" => Command::Cancel(match parts.get(1) {
                Some(raw) => parse_enum(raw)?,
                None => ConfirmationScope::ConversationList,
            }),
            "participants" => Command::Participants,
            "hide-participants" => Command::HideParticipants,
            "user" => Command::User(UserId::from(arg(&parts, 1, name)?)),
            "hide-user" => Command::HideUser,
            "pick-user" => Command::PickUser(parse_enum(arg(&parts, 1, name)?)?),
            "hide-pick-user" => Command::HidePickUser(parse_enum(arg(&parts, 1, name)?)?),
            "toggle-user" => Command::ToggleUser(UserId::from(arg(&parts, 1, name)?)),
            "create-group" => Command::CreateGroup(rest(&parts, 1, name).ok()),
            "add-people" => Command::AddPeople,
            "accept" => Command::Accept(UserId::from(arg(&parts, 1, name)?)),
            "rename" => Command::Rename(
                ConvId::from(arg(&parts, 1, name)?),
                rest(&parts, 2, name)?,
            ),
            "send" => Command::Send(ConvId::from(arg(&parts, 1, name)?), rest(&parts, 2, name)?),
            "device" => Command::Device(
                UserId::from(arg(&parts, 1, name)?),
                arg(&parts, 2, name)?.to_string(),
            ),
            "hide-device" => Command::HideDevice,
            "left" => Command::Left(arg(&parts, 1, name)?.parse()?),
            "right" => Command::Right(arg(&parts, 1, name)?.parse()?),
            "visible" => Command::Visible(arg(&parts, 1, name)?.parse()?),
            "pager" => Command::Pager(
                arg(&parts, 1, name)?
                    .parse()
                    .map_err(|_| UiError::Parse("pager takes 0 or 1".to_string()))?,
            ),
            "back" => Command::Back,
            "offline" => Command::Offline,
            "online" => Command::Online,
            "error" => Command::Error(parse_enum(arg(&parts, 1, name)?)?),
            "sleep" => Command::Sleep(Duration::from_millis(
                arg(&parts, 1, name)?
                    .parse()
                    .map_err(|_| UiError::Parse("sleep takes milliseconds".to_string()))?,
            )),
            "state" => Command::State,
            "quit" | "exit" => Command::Quit,
            other => return Err(UiError::Parse(format!("unknown command '{}'", other))),
        };
        Ok(Some(command))
    }
}

// ─── Simulator ───────────────────────────────────────────────────────────────

pub struct Simulator {
    ctx: Rc<ControllerContext>,
    engine: Rc<InMemoryEngine>,
    handlers: Handlers,
    shell: Rc<ConsoleShell>,
}

impl Simulator {
    /// Delayed follow-ups are spawned on `local`, which the caller drives.
    pub fn new(
        config: UiConfig,
        engine: Rc<InMemoryEngine>,
        local: Rc<LocalSet>,
        quiet: bool,
    ) -> Result<Self> {
        let ctx = ControllerContext::with_local_set(config, engine.clone(), local);
        let handlers = Handlers::install(&ctx, Theme::Dark)?;
        let shell = Rc::new(ConsoleShell::new(quiet));

        ctx.screen().add_observer(shell.clone())?;
        ctx.navigation().add_navigation_observer(shell.clone())?;
        ctx.navigation().add_pager_enabled_observer(shell.clone())?;
        ctx.navigation().add_pager_position_observer(shell.clone())?;
        ctx.confirmation().add_observer(shell.clone())?;
        ctx.options_menu().add_observer(shell.clone())?;
        ctx.pick_user().add_observer(shell.clone())?;
        engine.add_observer(shell.clone())?;

        Ok(Self {
            ctx,
            engine,
            handlers,
            shell,
        })
    }

    pub fn context(&self) -> &Rc<ControllerContext> {
        &self.ctx
    }

    pub fn shell(&self) -> &Rc<ConsoleShell> {
        &self.shell
    }

    /// Returns false when the script should stop.
    pub async fn execute(&self, command: Command) -> Result<bool> {
        let ctx = &self.ctx;
        let list = &self.handlers.conversation_list;
        match command {
            Command::Select(id) => list.select_conversation(&id, "cli")?,
            Command::List => list.show_conversation_list("cli")?,
            Command::Archive => list.show_archive("cli")?,
            Command::Menu(id, requester) => {
                ctx.screen().show_conversation_menu(requester, &id, None)?;
            }
            Command::Open => {
                ctx.options_menu().open()?;
            }
            Command::Close => {
                ctx.options_menu().close()?;
            }
            Command::Pick(item) => ctx.options_menu().select(item)?,
            Command::Confirm(scope, checked) => {
                // The shell has no animation: the hide finishes right away.
                if ctx.confirmation().positive_clicked(scope, checked)? {
                    ctx.confirmation().hide_animation_finished(scope)?;
                }
            }
            Command::Cancel(scope) => {
                if ctx.confirmation().negative_clicked(scope)? {
                    ctx.confirmation().hide_animation_finished(scope)?;
                }
            }
            Command::Participants => {
                let device_tab = ctx.screen().show_devices_tab_for().is_some();
                ctx.screen().show_participants(None, device_tab)?;
                ctx.navigation().set_visible_page(Page::Participant, "cli")?;
            }
            Command::HideParticipants => {
                ctx.screen().hide_participants(true, false)?;
            }
            Command::User(user) => {
                ctx.screen().show_user(&user)?;
            }
            Command::HideUser => {
                ctx.screen().hide_user()?;
            }
            Command::PickUser(destination) => {
                ctx.pick_user().show_pick_user(destination)?;
            }
            Command::HidePickUser(destination) => {
                ctx.pick_user().hide_pick_user(destination, false)?;
            }
            Command::ToggleUser(user) => {
                ctx.pick_user().toggle_selected_user(&user)?;
            }
            Command::CreateGroup(name) => {
                let destination = ctx
                    .pick_user()
                    .showing_destination()
                    .unwrap_or(PickUserDestination::ConversationList);
                self.handlers
                    .pick_user
                    .confirm_selection(destination, name.as_deref())?;
            }
            Command::AddPeople => ctx.screen().add_people_to_conversation()?,
            Command::Accept(user) => {
                list.accept_connection(&user)?;
            }
            Command::Rename(id, name) => {
                let scope = if ctx.screen().is_showing_participant() {
                    ConfirmationScope::Participants
                } else {
                    ConfirmationScope::ConversationList
                };
                list.rename(&id, &name, scope)?;
            }
            Command::Send(id, text) => list.send_text(&id, &text)?,
            Command::Device(user, client) => ctx.screen().show_otr_client(&user, &client)?,
            Command::HideDevice => {
                ctx.screen().hide_otr_client()?;
            }
            Command::Left(page) => {
                ctx.navigation().set_left_page(page, "cli")?;
            }
            Command::Right(page) => {
                ctx.navigation().set_right_page(page, "cli")?;
            }
            Command::Visible(page) => {
                ctx.navigation().set_visible_page(page, "cli")?;
            }
            Command::Pager(position) => {
                ctx.navigation().set_pager_position(position)?;
            }
            Command::Back => {
                if !self.handlers.back_press.on_back_pressed()? {
                    self.shell.emit("back", "nothing to close".to_string());
                }
                // A canceled confirmation hides without animation here too
                for scope in ConfirmationScope::ALL {
                    ctx.confirmation().hide_animation_finished(scope)?;
                }
            }
            Command::Offline => self.engine.set_network_available(false),
            Command::Online => self.engine.set_network_available(true),
            Command::Error(kind) => {
                let conversation = self.engine.current_conversation().map(|c| c.id);
                self.engine.report_sync_error(SyncError::new(kind, conversation));
            }
            Command::Sleep(duration) => tokio::time::sleep(duration).await,
            Command::State => self.print_state()?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn print_state(&self) -> Result<()> {
        let state = serde_json::json!({
            "current": self.engine.current_conversation().map(|c| c.id),
            "navigation": self.ctx.navigation().state(),
            "screen": self.ctx.screen().state(),
            "menu_open": self.ctx.options_menu().is_open(),
            "sync": self.engine.sync_state(),
        });
        self.shell
            .emit("state", serde_json::to_string_pretty(&state)?);
        Ok(())
    }

    /// Runs every line of `script`; failing commands are reported and skipped.
    pub async fn run_script(&self, script: &str) -> usize {
        let mut failures = 0;
        for (number, line) in script.lines().enumerate() {
            let outcome = match Command::parse(line) {
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    failures += 1;
                    eprintln!("{} line {}: {}", "✗".red().bold(), number + 1, e.to_string().red());
                }
            }
        }
        failures
    }

    pub fn shutdown(&self) {
        self.handlers.detach(&self.ctx);
        self.ctx.tear_down();
    }
}

/// Seed data used when no fixture is given
pub fn demo_engine() -> InMemoryEngine {
    let engine = InMemoryEngine::new();
    let now = Utc::now();

    let mut team = ConversationInfo::group("team", "Team");
    team.last_event_at = now;
    team.unread_count = 3;
    engine.insert_conversation(team);

    let mut alice = ConversationInfo::one_to_one("alice", "Alice", UserId::from("alice"));
    alice.last_event_at = now - ChronoDuration::minutes(5);
    engine.insert_conversation(alice);

    let mut family = ConversationInfo::group("family", "Family");
    family.last_event_at = now - ChronoDuration::hours(1);
    family.is_muted = true;
    engine.insert_conversation(family);

    let mut carol = ConversationInfo::pending(
        "carol",
        "Carol",
        UserId::from("carol"),
        ConnectionStatus::PendingFromOther,
    );
    carol.last_event_at = now - ChronoDuration::hours(2);
    engine.insert_conversation(carol);

    engine
}

pub fn print_usage(bin: &str) {
    println!("{}", "⚡ Navigation simulator".bright_cyan().bold());
    println!();
    println!("{}", "Usage:".bright_white().bold());
    println!(
        "  {} [--two-pane] [--archive-delay <ms>] [--pager-delay <ms>] [--history <n>]",
        bin.cyan()
    );
    println!("         [--config <file>] [--fixture <file>] [--script <file>]");
    println!();
    println!("{}", "Script commands:".bright_white().bold());
    println!("  {} <conv> | {} | {}", "select".cyan(), "list".cyan(), "archive".cyan());
    println!(
        "  {} <conv> [requester] | {} | {} | {} <item>",
        "menu".cyan(),
        "open".cyan(),
        "close".cyan(),
        "pick".cyan()
    );
    println!(
        "  {} [scope] [checked] | {} [scope]",
        "confirm".cyan(),
        "cancel".cyan()
    );
    println!(
        "  {} | {} | {} <user> | {}",
        "participants".cyan(),
        "hide-participants".cyan(),
        "user".cyan(),
        "hide-user".cyan()
    );
    println!(
        "  {} <dest> | {} <dest>",
        "pick-user".cyan(),
        "hide-pick-user".cyan()
    );
    println!(
        "  {} <user> | {} [name] | {}",
        "toggle-user".cyan(),
        "create-group".cyan(),
        "add-people".cyan()
    );
    println!(
        "  {} <user> | {} <conv> <name> | {} <conv> <text>",
        "accept".cyan(),
        "rename".cyan(),
        "send".cyan()
    );
    println!(
        "  {} <user> <client> | {}",
        "device".cyan(),
        "hide-device".cyan()
    );
    println!(
        "  {} | {} | {} <page> | {} <0|1> | {}",
        "left".cyan(),
        "right".cyan(),
        "visible".cyan(),
        "pager".cyan(),
        "back".cyan()
    );
    println!(
        "  {} | {} | {} <kind> | {} <ms> | {} | {}",
        "offline".cyan(),
        "online".cyan(),
        "error".cyan(),
        "sleep".cyan(),
        "state".cyan(),
        "quit".cyan()
    );
}
