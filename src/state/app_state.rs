use crate::app::MenuItem;
use crate::state::messages::Snapshot;
use crate::state::store::{MatchSource, PersistedState};
use bracket_api::{BracketLayout, Match};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// Bracket state
// ---------------------------------------------------------------------------

/// Where the matches on screen came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Freshness {
    #[default]
    NotConnected,
    Live,
    /// Last fetch failed; showing the cached snapshot.
    Cached,
}

#[derive(Debug, Default)]
pub struct BracketState {
    pub matches: Vec<Match>,
    pub layout: BracketLayout,
    pub freshness: Freshness,
    pub scroll_offset: u16,
}

impl BracketState {
    /// Replace the whole list. Partial updates never happen.
    pub fn apply(&mut self, snapshot: Snapshot) {
        let (matches, freshness) = match snapshot {
            Snapshot::Fresh(matches) => (matches, Freshness::Live),
            Snapshot::Cached(matches) => (matches, Freshness::Cached),
            Snapshot::NotConnected => (Vec::new(), Freshness::NotConnected),
        };
        self.layout = BracketLayout::from_matches(&matches);
        self.matches = matches;
        self.freshness = freshness;
        let max = self.max_scroll();
        self.scroll_offset = self.scroll_offset.min(max);
    }

    pub fn clear(&mut self) {
        self.apply(Snapshot::NotConnected);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn max_scroll(&self) -> u16 {
        let rows = self
            .layout
            .columns
            .iter()
            .map(|c| c.matches.len())
            .max()
            .unwrap_or(0);
        u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

// ---------------------------------------------------------------------------
// Tournament id input
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TournamentInput {
    pub input: String,
    pub composing: bool,
}

impl TournamentInput {
    pub fn start(&mut self) {
        self.composing = true;
        self.input.clear();
    }

    pub fn cancel(&mut self) {
        self.composing = false;
        self.input.clear();
    }

    /// Returns the trimmed input, or `None` when there is nothing to submit.
    pub fn submit_input(&mut self) -> Option<String> {
        let value = self.input.trim().to_owned();
        self.cancel();
        (!value.is_empty()).then_some(value)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created: Instant,
}

/// Toasts, newest last. Each one lives for [`NOTIFICATION_TTL`].
#[derive(Debug, Default)]
pub struct Notifications {
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub fn push(&mut self, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) {
        self.push_at(kind, title.into(), message.into(), Instant::now());
    }

    fn push_at(&mut self, kind: NotificationKind, title: String, message: String, created: Instant) {
        // Same toast twice in a row just restarts its clock.
        if let Some(last) = self.queue.back_mut()
            && last.title == title
            && last.message == message
        {
            last.created = created;
            return;
        }
        self.queue.push_back(Notification { kind, title, message, created });
        if self.queue.len() > 3 {
            self.queue.pop_front();
        }
    }

    /// Drop expired toasts. Returns true when something was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.queue.len();
        self.queue
            .retain(|n| now.saturating_duration_since(n.created) < NOTIFICATION_TTL);
        self.queue.len() != before
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn dismiss_all(&mut self) {
        self.queue.clear();
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub should_quit: bool,
    pub last_error: Option<String>,
    pub bracket: BracketState,
    pub source: Option<MatchSource>,
    pub embed_mode: bool,
    pub last_updated: Option<DateTime<Local>>,
    pub tournament_input: TournamentInput,
    pub notifications: Notifications,
}

impl AppState {
    /// Start from whatever was persisted: the cached snapshot is shown until
    /// the first fetch finishes.
    pub fn from_persisted(persisted: PersistedState) -> Self {
        let mut state = Self {
            source: persisted.source,
            embed_mode: persisted.embed_mode,
            last_updated: persisted.last_updated,
            ..Self::default()
        };
        if state.source.is_some()
            && let Some(matches) = persisted.matches
            && !matches.is_empty()
        {
            state.bracket.apply(Snapshot::Cached(matches));
        }
        state
    }

    pub fn tournament_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(MatchSource::tournament_id)
    }
}
