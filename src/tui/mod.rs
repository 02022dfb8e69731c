//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the screens
//! and translates keyboard events into core actions and background work.
//!
//! ## Screens
//!
//! ```text
//!              login ok / user restored
//!   Login ───────────────────────────────► Chat ◄──Tab──► Marketplace
//!     ▲                                                    │ Enter  ▲ Esc
//!     └──────────── Ctrl+L (from any screen) ──────────    ▼        │
//!                                                        Product ───┘
//! ```
//!
//! The chat session (and its `SessionManager`) is mounted when a user is
//! signed in and unmounted on logout or quit. Switching to the marketplace
//! keeps it mounted so the conversation survives the tab change.
//!
//! ## Background work
//!
//! Network calls run on tokio tasks and report back over a std `mpsc`
//! channel as `Background` messages, drained once per loop iteration. Chat
//! messages carry the generation of the session that sent them; anything
//! from an unmounted session is dropped.

pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::core::action::{Action, Effect, update};
use crate::core::catalog::{Product, ProductDetail};
use crate::core::config::ResolvedConfig;
use crate::core::identity::{
    IdentityAction, IdentityState, IdentityStore, UserRecord, transition, validate_user_id,
};
use crate::core::state::App;
use crate::session::{EngineIoTransport, SessionManager, Transport};
use crate::tui::component::EventHandler;
use crate::tui::components::{
    CatalogEvent, CatalogState, InputBox, LoadState, LoginEvent, LoginState, MessageListState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
    Marketplace,
    Product(u64),
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Chat => "Chat",
            Screen::Marketplace => "Marketplace",
            Screen::Product(_) => "Product",
        }
    }
}

/// Results of background tasks, delivered to the run loop.
#[derive(Debug)]
pub enum Background {
    /// A chat action from the session with this generation.
    Chat(u64, Action),
    LoginFinished(Result<UserRecord, String>),
    ProductsLoaded(Result<Vec<Product>, String>),
    ProductLoaded(u64, Result<ProductDetail, String>),
}

/// Builds the chat transport for a new session.
pub type TransportFactory = Box<dyn Fn() -> Arc<dyn Transport>>;

/// Long-lived collaborators of the run loop.
pub struct Services {
    pub config: ResolvedConfig,
    pub api: ApiClient,
    pub store: IdentityStore,
    pub connect: TransportFactory,
    pub tx: mpsc::Sender<Background>,
}

impl Services {
    pub fn new(config: ResolvedConfig, tx: mpsc::Sender<Background>) -> Self {
        let transport_config = config.clone();
        Self {
            api: ApiClient::new(&config.base_url),
            store: IdentityStore::new(&config.storage_dir),
            connect: Box::new(move || {
                Arc::new(EngineIoTransport::new(
                    &transport_config.base_url,
                    &transport_config.namespace,
                    transport_config.reconnect.clone(),
                )) as Arc<dyn Transport>
            }),
            config,
            tx,
        }
    }
}

/// A mounted chat screen: conversation state plus its session manager.
pub struct ChatSession {
    pub app: App,
    pub manager: Arc<SessionManager>,
    pub list: MessageListState,
    pub input: InputBox,
    generation: u64,
    forwarder: JoinHandle<()>,
}

impl ChatSession {
    fn mount(user: UserRecord, generation: u64, services: &Services) -> Self {
        info!("Mounting chat session {} for {}", generation, user.user_id);
        let manager = Arc::new(SessionManager::open(
            (services.connect)(),
            services.config.session_settings(),
        ));

        let mut states = manager.subscribe_state();
        let tx = services.tx.clone();
        let forwarder = tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                if tx
                    .send(Background::Chat(generation, Action::ConnectionChanged(state)))
                    .is_err()
                {
                    break;
                }
            }
        });

        let max_chars = services.config.max_input_chars;
        Self {
            app: App::new(user, max_chars),
            manager,
            list: MessageListState::new(),
            input: InputBox::new(" Ask a farming question ")
                .placeholder("e.g. How do I treat aphids on tomatoes?")
                .max_chars(max_chars),
            generation,
            forwarder,
        }
    }

    /// Unmount in the background. Only for paths where the runtime outlives
    /// the close, such as logout.
    fn unmount(self) {
        tokio::spawn(self.close());
    }

    /// Unmount; the returned future completes once the channel has been told
    /// goodbye.
    fn close(self) -> impl Future<Output = ()> + Send + 'static {
        info!("Unmounting chat session {}", self.generation);
        self.forwarder.abort();
        let manager = self.manager;
        async move { manager.close().await }
    }

    /// Apply `action` and carry out the effect. Returns true on quit.
    fn dispatch(&mut self, action: Action, tx: &mpsc::Sender<Background>) -> bool {
        match update(&mut self.app, action) {
            Effect::None => false,
            Effect::Quit => true,
            Effect::SendQuestion(question) => {
                self.list.stick_to_bottom = true;
                self.spawn_ask(question, tx.clone());
                false
            }
        }
    }

    fn spawn_ask(&self, question: String, tx: mpsc::Sender<Background>) {
        let manager = self.manager.clone();
        let requester = self.app.user.user_id.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let action = match manager.ask(&requester, &question).await {
                Ok(answer) => Action::AnswerReceived(answer),
                Err(e) => Action::AskFailed(e.to_string()),
            };
            if tx.send(Background::Chat(generation, action)).is_err() {
                warn!("Dropping chat result: run loop has exited");
            }
        });
    }
}

/// Everything the run loop owns besides the terminal.
pub struct TuiState {
    pub screen: Screen,
    pub identity: IdentityState,
    pub login: LoginState,
    pub chat: Option<ChatSession>,
    pub catalog: CatalogState,
    pub product: LoadState<ProductDetail>,
    generation: u64,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            identity: IdentityState::Loading,
            login: LoginState::new(),
            chat: None,
            catalog: CatalogState::new(),
            product: LoadState::Loading,
            generation: 0,
        }
    }

    /// Resolve the startup `Loading` state from storage.
    pub fn restore(&mut self, services: &Services) {
        let action = services.store.restore();
        self.apply_identity(action, services);
    }

    fn apply_identity(&mut self, action: IdentityAction, services: &Services) {
        self.identity = transition(&self.identity, action);
        match self.identity.user().cloned() {
            Some(user) if self.chat.is_none() => self.sign_in(user, services),
            Some(_) => {}
            None => self.sign_out(),
        }
    }

    fn sign_in(&mut self, user: UserRecord, services: &Services) {
        self.generation += 1;
        self.chat = Some(ChatSession::mount(user, self.generation, services));
        self.login = LoginState::new();
        self.catalog = CatalogState::new();
        self.screen = Screen::Chat;
    }

    fn sign_out(&mut self) {
        if let Some(chat) = self.chat.take() {
            chat.unmount();
        }
        self.screen = Screen::Login;
    }

    /// Route one terminal event. Returns true when the app should quit.
    pub fn handle_event(&mut self, event: TuiEvent, services: &Services) -> bool {
        match event {
            TuiEvent::Resize => return false,
            TuiEvent::ForceQuit => return true,
            TuiEvent::Logout if self.screen != Screen::Login => {
                info!("Logging out");
                let action = services.store.logout();
                self.apply_identity(action, services);
                return false;
            }
            _ => {}
        }

        match self.screen {
            Screen::Login => self.handle_login(&event, services),
            Screen::Chat => return self.handle_chat(event, services),
            Screen::Marketplace => self.handle_marketplace(&event, services),
            Screen::Product(id) => self.handle_product(id, &event, services),
        }
        false
    }

    fn handle_login(&mut self, event: &TuiEvent, services: &Services) {
        match self.login.handle_event(event) {
            Some(LoginEvent::Edited) if self.identity.error().is_some() => {
                self.identity = transition(&self.identity, IdentityAction::ErrorCleared);
            }
            Some(LoginEvent::Submit(raw)) => match validate_user_id(&raw) {
                Ok(user_id) => {
                    self.identity = transition(&self.identity, IdentityAction::LoginStarted);
                    spawn_login(services, user_id);
                }
                Err(e) => {
                    debug!("User id rejected: {:?}", e.issues);
                    self.identity =
                        transition(&self.identity, IdentityAction::LoginFailed(e.to_string()));
                }
            },
            _ => {}
        }
    }

    fn handle_chat(&mut self, event: TuiEvent, services: &Services) -> bool {
        let Some(chat) = self.chat.as_mut() else {
            return false;
        };
        match event {
            TuiEvent::SwitchTab => {
                self.open_marketplace(services);
                false
            }
            TuiEvent::ScrollUp
            | TuiEvent::ScrollDown
            | TuiEvent::ScrollPageUp
            | TuiEvent::ScrollPageDown
            | TuiEvent::CursorUp
            | TuiEvent::CursorDown => {
                chat.list.handle_event(&event);
                false
            }
            other => {
                chat.input.disabled = chat.app.is_loading;
                match chat.input.handle_event(&other) {
                    Some(components::InputEvent::Submit(text)) => {
                        chat.dispatch(Action::Submit(text), &services.tx)
                    }
                    _ => false,
                }
            }
        }
    }

    fn open_marketplace(&mut self, services: &Services) {
        self.screen = Screen::Marketplace;
        if !matches!(self.catalog.products, LoadState::Loaded(_)) {
            self.catalog.products = LoadState::Loading;
            spawn_products(services);
        }
    }

    fn handle_marketplace(&mut self, event: &TuiEvent, services: &Services) {
        match event {
            TuiEvent::SwitchTab => self.screen = Screen::Chat,
            TuiEvent::Retry => {
                self.catalog.products = LoadState::Loading;
                spawn_products(services);
            }
            other => {
                if let Some(CatalogEvent::Open(id)) = self.catalog.handle_event(other) {
                    self.screen = Screen::Product(id);
                    self.product = LoadState::Loading;
                    spawn_product(services, id);
                }
            }
        }
    }

    fn handle_product(&mut self, id: u64, event: &TuiEvent, services: &Services) {
        match event {
            TuiEvent::Escape | TuiEvent::SwitchTab => self.screen = Screen::Marketplace,
            TuiEvent::Retry => {
                self.product = LoadState::Loading;
                spawn_product(services, id);
            }
            _ => {}
        }
    }

    /// Fold in one background result. Returns true when the app should quit.
    pub fn apply_background(&mut self, message: Background, services: &Services) -> bool {
        match message {
            Background::Chat(generation, action) => {
                let Some(chat) = self.chat.as_mut().filter(|c| c.generation == generation) else {
                    debug!("Dropping {:?} from stale chat session {}", action, generation);
                    return false;
                };
                return chat.dispatch(action, &services.tx);
            }
            Background::LoginFinished(result) => {
                if !self.identity.is_loading() {
                    return false;
                }
                match result {
                    Ok(user) => {
                        if let Err(e) = services.store.save(&user) {
                            warn!("Could not remember user: {}", e);
                        }
                        self.apply_identity(IdentityAction::LoginSucceeded(user), services);
                    }
                    Err(message) => {
                        self.apply_identity(IdentityAction::LoginFailed(message), services);
                    }
                }
            }
            Background::ProductsLoaded(result) => self.catalog.set_products(result),
            Background::ProductLoaded(id, result) => {
                if self.screen == Screen::Product(id) {
                    self.product = match result {
                        Ok(detail) => LoadState::Loaded(detail),
                        Err(message) => LoadState::Failed(message),
                    };
                }
            }
        }
        false
    }

    /// Tear down the chat session, if any, before exit. Completes once the
    /// transport has disconnected.
    pub async fn shutdown(&mut self) {
        if let Some(chat) = self.chat.take() {
            chat.close().await;
        }
    }
}

fn send(tx: &mpsc::Sender<Background>, message: Background) {
    if tx.send(message).is_err() {
        warn!("Dropping background result: run loop has exited");
    }
}

fn spawn_login(services: &Services, user_id: String) {
    let api = services.api.clone();
    let tx = services.tx.clone();
    tokio::spawn(async move {
        let result = api.login(&user_id).await.map_err(|e| e.to_string());
        send(&tx, Background::LoginFinished(result));
    });
}

fn spawn_products(services: &Services) {
    let api = services.api.clone();
    let tx = services.tx.clone();
    tokio::spawn(async move {
        let result = api.list_products().await.map_err(|e| e.to_string());
        send(&tx, Background::ProductsLoaded(result));
    });
}

fn spawn_product(services: &Services, id: u64) {
    let api = services.api.clone();
    let tx = services.tx.clone();
    tokio::spawn(async move {
        let result = api.get_product(id).await.map_err(|e| e.to_string());
        send(&tx, Background::ProductLoaded(id, result));
    });
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            // blinking cursors reset on every draw()
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let services = Services::new(config, tx);
    let mut state = TuiState::new();
    state.restore(&services);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut needs_redraw = true;
    let mut should_quit = false;

    while !should_quit {
        // Keep the "Thinking..." bubble and connection indicator fresh
        let busy = state.identity.is_loading()
            || state.chat.as_ref().is_some_and(|c| c.app.is_loading);

        if needs_redraw || busy {
            terminal.draw(|f| ui::draw(f, &mut state))?;
            needs_redraw = false;
        }

        let timeout = if busy {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if state.handle_event(event, &services) {
                should_quit = true;
                break;
            }
        }

        while let Ok(message) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", message);
            if state.apply_background(message, &services) {
                should_quit = true;
            }
        }
    }

    // The runtime is dropped as soon as `main` returns, so the goodbye is
    // sent here rather than on a detached task
    let runtime = tokio::runtime::Handle::current();
    tokio::task::block_in_place(|| runtime.block_on(state.shutdown()));
    ratatui::restore();
    Ok(())
}
