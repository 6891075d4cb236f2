use crate::state::network::LoadingState;
use crate::state::store::MatchSource;
use bracket_api::Match;
use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkRequest {
    /// Adopt the server-published selection when nothing is stored locally.
    LoadSharedSettings,
    /// Refetch the current source. Background refreshes come from the poll
    /// loop: no spinner, no notification on failure.
    Refresh { background: bool },
    GenerateBracket,
    /// Raw user input: a tournament id or a full Challonge URL.
    ChallongeSync { input: String },
    SetEmbedMode { on: bool },
    Disconnect,
}

impl NetworkRequest {
    pub fn shows_loading(&self) -> bool {
        !matches!(
            self,
            NetworkRequest::Refresh { background: true } | NetworkRequest::LoadSharedSettings
        )
    }
}

/// How a refresh ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Fresh(Vec<Match>),
    /// The fetch failed; this is the last good cached snapshot.
    Cached(Vec<Match>),
    /// No source selected, or the fetch failed with nothing cached.
    NotConnected,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    SelectionChanged {
        source: Option<MatchSource>,
        embed_mode: bool,
    },
    MatchesLoaded {
        snapshot: Snapshot,
        updated_at: Option<DateTime<Local>>,
        /// Set when the fetch failed; shown only for foreground requests.
        error: Option<String>,
        background: bool,
    },
    BracketGenerated { matches_created: u32 },
    SyncCompleted { tournament_id: String, match_count: usize },
    /// Challonge sync failed; `snapshot` is what to show instead.
    SyncFailed { message: String, snapshot: Snapshot },
    /// Embedded-widget mode is on; nothing was fetched.
    RefreshSkipped,
    Error { title: String, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    Tick,
}
