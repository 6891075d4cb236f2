use bracket_api::Match;
use chrono::{DateTime, Local};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the bracket snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    /// The backend's own bracket, seeded by generate-bracket.
    Generated,
    Challonge { tournament_id: String },
}

impl MatchSource {
    pub fn tournament_id(&self) -> Option<&str> {
        match self {
            MatchSource::Challonge { tournament_id } => Some(tournament_id),
            MatchSource::Generated => None,
        }
    }
}

/// Selection state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub source: Option<MatchSource>,
    /// Last snapshot that was fetched successfully.
    #[serde(default)]
    pub matches: Option<Vec<Match>>,
    #[serde(default)]
    pub embed_mode: bool,
    #[serde(default)]
    pub last_updated: Option<DateTime<Local>>,
}

/// JSON file backed key-value store for [`PersistedState`].
///
/// Reads are served from memory; every mutation is written through.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    state: PersistedState,
}

impl LocalStore {
    pub fn open(path: PathBuf) -> Self {
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("ignoring unreadable store {}: {e}", path.display());
                PersistedState::default()
            }),
            Err(_) => PersistedState::default(),
        };
        Self { path: Some(path), state }
    }

    /// Store that never touches disk.
    #[cfg(test)]
    pub fn in_memory(state: PersistedState) -> Self {
        Self { path: None, state }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn source(&self) -> Option<&MatchSource> {
        self.state.source.as_ref()
    }

    pub fn cached_matches(&self) -> Option<&[Match]> {
        self.state.matches.as_deref()
    }

    pub fn embed_mode(&self) -> bool {
        self.state.embed_mode
    }

    pub fn set_source(&mut self, source: Option<MatchSource>) -> Result<(), String> {
        self.update(|s| s.source = source)
    }

    /// Replace the cached snapshot and stamp the refresh time.
    pub fn set_snapshot(&mut self, matches: Vec<Match>) -> Result<(), String> {
        self.update(|s| {
            s.matches = Some(matches);
            s.last_updated = Some(Local::now());
        })
    }

    pub fn set_embed_mode(&mut self, on: bool) -> Result<(), String> {
        self.update(|s| s.embed_mode = on)
    }

    /// Forget the selected tournament and its cached snapshot.
    pub fn clear_selection(&mut self) -> Result<(), String> {
        self.update(|s| {
            s.source = None;
            s.matches = None;
            s.last_updated = None;
        })
    }

    fn update<F>(&mut self, update: F) -> Result<(), String>
    where
        F: FnOnce(&mut PersistedState),
    {
        update(&mut self.state);
        self.save()
    }

    fn save(&self) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
        }
        let payload = serde_json::to_string_pretty(&self.state)
            .map_err(|e| format!("serialize state failed: {e}"))?;
        std::fs::write(path, payload).map_err(|e| format!("write state failed: {e}"))
    }
}

/// Default location: `$XDG_CONFIG_HOME/bracketview/state.json`, then
/// `~/.config/bracketview/state.json`, then the working directory.
pub fn default_store_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("bracketview").join("state.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("bracketview")
            .join("state.json");
    }
    PathBuf::from("bracketview_state.json")
}
