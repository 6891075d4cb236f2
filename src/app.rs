use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, NotificationKind};
use crate::state::messages::{NetworkRequest, NetworkResponse, Snapshot};
use crate::state::network::LoadingState;
use crate::state::store::{MatchSource, PersistedState};
use chrono::{DateTime, Local};
use log::error;
use std::time::Instant;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Bracket,
    Admin,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings, persisted: PersistedState) -> Self {
        let app = Self {
            state: AppState::from_persisted(persisted),
            settings,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Applies a worker response and returns the request it should trigger,
    /// if any.
    pub fn on_network_response(
        &mut self,
        response: NetworkResponse,
        loading: &mut LoadingState,
    ) -> Option<NetworkRequest> {
        match response {
            NetworkResponse::LoadingStateChanged { loading_state } => {
                *loading = loading_state;
                None
            }
            NetworkResponse::MatchesLoaded { snapshot, updated_at, error, background } => {
                self.on_matches_loaded(snapshot, updated_at, error, background);
                None
            }
            NetworkResponse::BracketGenerated { matches_created } => {
                self.on_bracket_generated(matches_created);
                Some(NetworkRequest::Refresh { background: false })
            }
            NetworkResponse::SyncCompleted { tournament_id, match_count } => {
                self.on_sync_completed(tournament_id, match_count);
                Some(NetworkRequest::Refresh { background: false })
            }
            NetworkResponse::SyncFailed { message, snapshot } => {
                self.on_sync_failed(message, snapshot);
                None
            }
            NetworkResponse::SelectionChanged { source, embed_mode } => {
                let was_embedded = self.state.embed_mode;
                self.on_selection_changed(source, embed_mode);
                // Leaving embed mode resumes the native bracket right away.
                (was_embedded && !embed_mode).then_some(NetworkRequest::Refresh { background: false })
            }
            NetworkResponse::RefreshSkipped => None,
            NetworkResponse::Error { title, message } => {
                error!("{title}: {message}");
                self.on_error(title, message);
                None
            }
        }
    }

    pub fn on_matches_loaded(
        &mut self,
        snapshot: Snapshot,
        updated_at: Option<DateTime<Local>>,
        error: Option<String>,
        background: bool,
    ) {
        self.state.bracket.apply(snapshot);
        self.state.last_updated = updated_at;
        match error {
            Some(message) => {
                // Poll failures stay off screen; the next tick retries.
                if !background {
                    self.notify(NotificationKind::Error, "Refresh failed", message.clone());
                }
                self.state.last_error = Some(message);
            }
            None => self.state.last_error = None,
        }
    }

    pub fn on_bracket_generated(&mut self, matches_created: u32) {
        self.state.source = Some(MatchSource::Generated);
        self.state.last_error = None;
        self.notify(
            NotificationKind::Info,
            "Bracket generated",
            format!("{matches_created} matches created"),
        );
    }

    pub fn on_sync_completed(&mut self, tournament_id: String, match_count: usize) {
        self.notify(
            NotificationKind::Info,
            "Synced with Challonge",
            format!("{match_count} matches from {tournament_id}"),
        );
        self.state.source = Some(MatchSource::Challonge { tournament_id });
        self.state.last_error = None;
    }

    pub fn on_sync_failed(&mut self, message: String, snapshot: Snapshot) {
        self.state.bracket.apply(snapshot);
        self.notify(NotificationKind::Error, "Challonge sync failed", message.clone());
        self.state.last_error = Some(message);
    }

    pub fn on_selection_changed(&mut self, source: Option<MatchSource>, embed_mode: bool) {
        if source.is_none() {
            self.state.bracket.clear();
            self.state.last_updated = None;
        }
        self.state.source = source;
        self.state.embed_mode = embed_mode;
    }

    pub fn on_error(&mut self, title: String, message: String) {
        self.notify(NotificationKind::Error, title, message.clone());
        self.state.last_error = Some(message);
    }

    /// Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        self.state.notifications.expire(now)
    }

    fn notify(&mut self, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) {
        self.state.notifications.push(kind, title, message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn quit(&mut self) {
        self.state.should_quit = true;
    }

    pub fn is_composing(&self) -> bool {
        self.state.tournament_input.composing
    }
}
