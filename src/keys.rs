use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if guard.is_composing() {
        if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
            guard.quit();
            return;
        }
        let input = &mut guard.state.tournament_input;
        let submitted = match key_event.code {
            KeyCode::Esc => {
                input.cancel();
                None
            }
            KeyCode::Backspace => {
                input.input.pop();
                None
            }
            KeyCode::Enter => input.submit_input(),
            Char(c) => {
                input.input.push(c);
                None
            }
            _ => None,
        };
        drop(guard);
        if let Some(input) = submitted {
            let _ = network_requests.send(NetworkRequest::ChallongeSync { input }).await;
        }
        return;
    }

    let request = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            guard.quit();
            None
        }

        // Tab switching
        (_, Char('1'), _) => {
            guard.update_tab(MenuItem::Bracket);
            None
        }
        (_, Char('2'), _) => {
            guard.update_tab(MenuItem::Admin);
            None
        }
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
            None
        }
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // Bracket scrolling
        (MenuItem::Bracket, Char('j') | KeyCode::Down, _) => {
            guard.state.bracket.scroll_down();
            None
        }
        (MenuItem::Bracket, Char('k') | KeyCode::Up, _) => {
            guard.state.bracket.scroll_up();
            None
        }

        // Admin actions, available from every tab
        (_, Char('g'), _) => Some(NetworkRequest::GenerateBracket),
        (_, Char('i') | Char('s'), _) => {
            guard.update_tab(MenuItem::Admin);
            guard.state.tournament_input.start();
            None
        }
        (_, Char('e'), _) => Some(NetworkRequest::SetEmbedMode { on: !guard.state.embed_mode }),
        (_, Char('r'), _) => Some(NetworkRequest::Refresh { background: false }),
        (_, Char('d'), _) => Some(NetworkRequest::Disconnect),
        (_, KeyCode::Esc, _) => {
            guard.state.notifications.dismiss_all();
            None
        }

        // Global
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    if let Some(request) = request {
        drop(guard);
        let _ = network_requests.send(request).await;
    }
}
