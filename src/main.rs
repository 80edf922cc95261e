//! Pokédex TUI - paginated PokeAPI browser

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pokedex::action::Action;
use pokedex::api::{PokeApiClient, PokemonSource};
use pokedex::components::{
    Component, DetailScreen, DetailScreenProps, ListScreen, ListScreenProps,
};
use pokedex::config::{
    ApiConfig, DEFAULT_BASE_ADDRESS, DEFAULT_PAGE_LIMIT, DEFAULT_TIMEOUT_MS, MAX_PAGE_LIMIT,
};
use pokedex::effect::{self, Effect};
use pokedex::logging::{self, Verbosity};
use pokedex::reducer::reducer;
use pokedex::state::{AppState, SPINNER_TICK_MS, Screen};
use ratatui::{Frame, Terminal, backend::CrosstermBackend, layout::Rect};
use tracing::info;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

/// Browse Pokémon from the PokeAPI in the terminal
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "A paginated PokeAPI browser built with tui-dispatch")]
struct Args {
    /// Collection endpoint
    #[arg(long, default_value = DEFAULT_BASE_ADDRESS)]
    base_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: u64,

    /// Items requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_LIMIT as i64))]
    page_size: u32,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level logs
    #[arg(long, short)]
    verbose: bool,

    /// Errors only
    #[arg(long, short, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum PokedexComponentId {
    List,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum PokedexContext {
    List,
    Detail,
}

impl EventRoutingState<PokedexComponentId, PokedexContext> for AppState {
    fn focused(&self) -> Option<PokedexComponentId> {
        match self.screen {
            Screen::List => Some(PokedexComponentId::List),
            Screen::Detail { .. } => Some(PokedexComponentId::Detail),
        }
    }

    fn modal(&self) -> Option<PokedexComponentId> {
        None
    }

    fn binding_context(&self, id: PokedexComponentId) -> PokedexContext {
        match id {
            PokedexComponentId::List => PokedexContext::List,
            PokedexComponentId::Detail => PokedexContext::Detail,
        }
    }

    fn default_context(&self) -> PokedexContext {
        PokedexContext::List
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        base_url,
        timeout_ms,
        page_size,
        log_file,
        verbose,
        quiet,
        debug: debug_args,
    } = Args::parse();

    // Logging goes to a file; the terminal belongs to the UI
    let _log_guard = match log_file {
        Some(path) => Some(
            logging::init(&path, Verbosity::from_flags(verbose, quiet)).map_err(|err| {
                eprintln!("Error: {err}");
                io::Error::other(err)
            })?,
        ),
        None => None,
    };

    let config = ApiConfig::new(base_url, timeout_ms);
    let client = PokeApiClient::new(&config).map_err(|err| {
        eprintln!("Error: could not build HTTP client: {err}");
        io::Error::other(err)
    })?;
    info!(base = client.base_address(), timeout_ms, page_size, "starting");
    let source: Arc<dyn PokemonSource> = Arc::new(client);

    let debug = DebugSession::new(debug_args);

    // Export JSON schemas if requested
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(page_size))
        })
        .await
        .map_err(debug_error)?;

    let replay_actions = debug.load_replay_items().map_err(debug_error)?;

    let (middleware, action_recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, source).await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug
        .save_actions(action_recorder.as_ref())
        .map_err(debug_error)?;

    Ok(())
}

struct PokedexUi {
    list: ListScreen,
    detail: DetailScreen,
}

impl PokedexUi {
    fn new() -> Self {
        Self {
            list: ListScreen::new(),
            detail: DetailScreen,
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<PokedexComponentId>,
    ) {
        match state.screen {
            Screen::List => {
                event_ctx.set_component_area(PokedexComponentId::List, area);
                event_ctx
                    .component_areas
                    .remove(&PokedexComponentId::Detail);
                let props = ListScreenProps {
                    state,
                    is_focused: render_ctx.is_focused(),
                };
                self.list.render(frame, area, props);
            }
            Screen::Detail { .. } => {
                event_ctx.set_component_area(PokedexComponentId::Detail, area);
                event_ctx.component_areas.remove(&PokedexComponentId::List);
                let props = DetailScreenProps {
                    state,
                    is_focused: render_ctx.is_focused(),
                };
                self.detail.render(frame, area, props);
            }
        }
    }

    fn handle_list_event(&mut self, event: &EventKind, state: &AppState) -> HandlerResponse<Action> {
        let props = ListScreenProps {
            state,
            is_focused: state.screen == Screen::List,
        };
        let actions: Vec<_> = self.list.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = DetailScreenProps {
            state,
            is_focused: matches!(state.screen, Screen::Detail { .. }),
        };
        let actions: Vec<_> = self.detail.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    source: Arc<dyn PokemonSource>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(PokedexUi::new()));
    let mut bus: EventBus<AppState, Action, PokedexComponentId, PokedexContext> =
        EventBus::new();
    let keybindings: Keybindings<PokedexContext> = Keybindings::new();

    let ui_list = Rc::clone(&ui);
    bus.register(PokedexComponentId::List, move |event, state| {
        ui_list.borrow_mut().handle_list_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(PokedexComponentId::Detail, move |event, state| {
        ui_detail.borrow_mut().handle_detail_event(&event.kind, state)
    });

    bus.register_global(|event, _state| match &event.kind {
        EventKind::Resize(_, _) => HandlerResponse::ignored().with_render(),
        EventKind::Key(key) if key.code == KeyCode::Char('q') => {
            handler_response(vec![Action::Quit])
        }
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::ListFetch),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }

                runtime.subscriptions().interval(
                    "tick",
                    Duration::from_millis(SPINNER_TICK_MS),
                    || Action::Tick,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &source),
        )
        .await
}

/// Handle effects by spawning keyed tasks against the shared source
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, source: &Arc<dyn PokemonSource>) {
    let key = TaskKey::new(effect.task_key());
    let source = Arc::clone(source);
    ctx.tasks()
        .spawn(key, async move { effect::run(effect, source.as_ref()).await });
}
