mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::{AppSettings, CliAction};
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::refresher::{PeriodicRefresher, PollGate};
use crate::state::store::LocalStore;
use anyhow::Context;
use bracket_api::client::BracketApi;
use bracket_api::endpoints::Endpoints;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info, warn};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Instant;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Duration;
use tui::{Terminal, backend::CrosstermBackend};

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = AppSettings::load();
    if handle_cli_args(&mut settings) {
        return Ok(());
    }

    let endpoints = Endpoints::load(&settings.func_urls).with_context(|| {
        format!(
            "backend function map missing; pass --urls or set BRACKETVIEW_FUNC_URLS ({})",
            settings.func_urls.display()
        )
    })?;

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Debug)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let store = LocalStore::open(settings.store_path.clone());
    if let Some(path) = store.path() {
        info!("store at {}", path.display());
    }
    let poll_interval = settings.poll_interval;
    let app = Arc::new(Mutex::new(App::new(settings, store.state().clone())));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread: the only place backend calls and store writes happen.
    let poll_gate = PollGate::default();
    let network_worker = NetworkWorker::new(
        BracketApi::new(endpoints),
        store,
        network_req_rx,
        network_resp_tx,
        poll_gate.clone(),
    );
    let network_task = tokio::spawn(network_worker.run());

    // Poll loop, cancelled on shutdown.
    let (poll_stop_tx, poll_stop_rx) = watch::channel(false);
    let periodic_updater = PeriodicRefresher::new(network_req_tx.clone(), poll_interval, poll_gate);
    let periodic_task = tokio::spawn(periodic_updater.run(poll_stop_rx));

    // Tick thread: expires notifications.
    let tick_tx = ui_event_tx.clone();
    let tick_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            if tick_tx.send(UiEvent::Tick).await.is_err() {
                break;
            }
        }
    });

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    let _ = poll_stop_tx.send(true);
    if let Err(e) = periodic_task.await {
        warn!("poll loop ended abnormally: {e}");
    }
    input_handler.abort();
    network_task.abort();
    tick_task.abort();
    cleanup_terminal();

    Ok(())
}

/// Returns true when the process should exit without starting the UI.
fn handle_cli_args(settings: &mut AppSettings) -> bool {
    match settings.apply_args(std::env::args().skip(1)) {
        Ok(CliAction::Run) => false,
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            true
        }
        Ok(CliAction::Version) => {
            println!("bracketview {}", env!("CARGO_PKG_VERSION"));
            true
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "bracketview - tournament bracket viewer and admin console

Usage:
  bracketview [--urls PATH] [--store PATH]
  bracketview --help
  bracketview --version

Options:
  --urls PATH    Backend function map (func2url.json)
  --store PATH   Local state file

Environment:
  BRACKETVIEW_FUNC_URLS   Backend function map (default ./func2url.json)
  BRACKETVIEW_STORE       Local state file (default $XDG_CONFIG_HOME/bracketview/state.json)
  BRACKETVIEW_POLL_SECS   Poll interval in seconds (default 3)
  BRACKETVIEW_LOG         Log level: error, warn, info, debug, trace"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                let mut app_guard = app.lock().await;
                if app_guard.state.should_quit {
                    break;
                }
                if should_redraw {
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = network_requests.send(NetworkRequest::LoadSharedSettings).await;
            let _ = network_requests
                .send(NetworkRequest::Refresh { background: false })
                .await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
        UiEvent::Tick => app.lock().await.on_tick(Instant::now()),
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    let follow_up = app.lock().await.on_network_response(response, loading);
    if let Some(request) = follow_up {
        let _ = network_requests.send(request).await;
    }
    true
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    while !ui_events.is_closed() {
        // Bounded wait so the task notices shutdown.
        match crossterm_event::poll(INPUT_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                error!("terminal input failed: {e}");
                break;
            }
        }

        let ui_event = match crossterm_event::read() {
            Ok(Event::Key(key_event)) => Some(UiEvent::KeyPressed(key_event)),
            Ok(Event::Resize(_, _)) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.send(ui_event).await.is_err()
        {
            break;
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
