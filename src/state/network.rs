use crate::state::messages::{NetworkRequest, NetworkResponse, Snapshot};
use crate::state::refresher::PollGate;
use crate::state::store::{LocalStore, MatchSource};
use bracket_api::client::{ApiError, BracketApi};
use bracket_api::endpoints::Operation;
use bracket_api::{SharedSettings, extract_tournament_id};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

const GENERATE_FALLBACK: &str = "Could not generate the bracket";
const REFRESH_FALLBACK: &str = "Could not load the bracket";
const SYNC_FALLBACK: &str = "Could not reach Challonge";

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Executes every backend call in issue order and owns the persisted
/// selection. Each response replaces the displayed snapshot as a whole.
pub struct NetworkWorker {
    client: BracketApi,
    store: LocalStore,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    poll_gate: PollGate,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: BracketApi,
        store: LocalStore,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
        poll_gate: PollGate,
    ) -> Self {
        Self {
            client,
            store,
            requests,
            responses,
            poll_gate,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let shows_loading = request.shows_loading();
            let is_poll = request == NetworkRequest::Refresh { background: true };
            if shows_loading {
                self.start_loading_animation().await;
            }

            let response = self.handle(request).await;
            if is_poll {
                self.poll_gate.release();
            }

            debug!("network request complete");
            if shows_loading {
                self.stop_loading_animation(!is_failure(&response)).await;
            }

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    pub(crate) async fn handle(&mut self, request: NetworkRequest) -> NetworkResponse {
        match request {
            NetworkRequest::LoadSharedSettings => self.handle_load_shared_settings().await,
            NetworkRequest::Refresh { background } => self.handle_refresh(background).await,
            NetworkRequest::GenerateBracket => {
                self.handle_generate_bracket()
                    .await
                    .unwrap_or_else(|err| NetworkResponse::Error {
                        title: "Bracket generation failed".into(),
                        message: err.user_message(GENERATE_FALLBACK),
                    })
            }
            NetworkRequest::ChallongeSync { input } => self.handle_challonge_sync(&input).await,
            NetworkRequest::SetEmbedMode { on } => self.handle_set_embed_mode(on).await,
            NetworkRequest::Disconnect => self.handle_disconnect().await,
        }
    }

    async fn handle_load_shared_settings(&mut self) -> NetworkResponse {
        if self.store.source().is_none() && self.client.endpoints().has(Operation::GetSettings) {
            match self.client.fetch_settings().await {
                Ok(settings) => {
                    if let Some(id) = settings.tournament_id.as_deref().and_then(extract_tournament_id) {
                        info!("adopting published tournament {id}");
                        self.persist(|s| {
                            s.set_source(Some(MatchSource::Challonge { tournament_id: id }))
                        });
                        self.persist(|s| s.set_embed_mode(settings.iframe_mode));
                    }
                }
                Err(e) => debug!("shared settings unavailable: {e}"),
            }
        }
        self.selection_changed()
    }

    async fn handle_refresh(&mut self, background: bool) -> NetworkResponse {
        if self.store.embed_mode() {
            return NetworkResponse::RefreshSkipped;
        }

        let result = match self.store.source().cloned() {
            None => {
                return NetworkResponse::MatchesLoaded {
                    snapshot: Snapshot::NotConnected,
                    updated_at: None,
                    error: None,
                    background,
                };
            }
            Some(MatchSource::Generated) => {
                debug!("refreshing generated bracket");
                self.client.fetch_matches().await
            }
            Some(MatchSource::Challonge { tournament_id }) => {
                debug!("refreshing challonge tournament {tournament_id}");
                self.client.challonge_sync(&tournament_id).await
            }
        };

        match result {
            Ok(matches) => {
                self.persist(|s| s.set_snapshot(matches.clone()));
                NetworkResponse::MatchesLoaded {
                    snapshot: Snapshot::Fresh(matches),
                    updated_at: self.store.state().last_updated,
                    error: None,
                    background,
                }
            }
            Err(err) => {
                if background {
                    warn!("background refresh failed: {err}");
                } else {
                    error!("refresh failed: {err}");
                }
                NetworkResponse::MatchesLoaded {
                    snapshot: self.fallback_snapshot(),
                    updated_at: self.store.state().last_updated,
                    error: Some(err.user_message(REFRESH_FALLBACK)),
                    background,
                }
            }
        }
    }

    async fn handle_generate_bracket(&mut self) -> Result<NetworkResponse, ApiError> {
        debug!("generating bracket");
        let matches_created = self.client.generate_bracket().await?;
        info!("backend created {matches_created} matches");
        self.persist(|s| s.set_source(Some(MatchSource::Generated)));
        Ok(NetworkResponse::BracketGenerated { matches_created })
    }

    async fn handle_challonge_sync(&mut self, input: &str) -> NetworkResponse {
        let Some(tournament_id) = extract_tournament_id(input) else {
            return NetworkResponse::Error {
                title: "Invalid tournament".into(),
                message: "Enter a Challonge tournament id or URL".into(),
            };
        };

        debug!("syncing challonge tournament {tournament_id}");
        match self.client.challonge_sync(&tournament_id).await {
            Ok(matches) => {
                let match_count = matches.len();
                self.persist(|s| {
                    s.set_source(Some(MatchSource::Challonge {
                        tournament_id: tournament_id.clone(),
                    }))
                });
                self.persist(|s| s.set_snapshot(matches));
                self.publish_selection().await;
                NetworkResponse::SyncCompleted { tournament_id, match_count }
            }
            Err(err) => {
                error!("challonge sync for {tournament_id} failed: {err}");
                NetworkResponse::SyncFailed {
                    message: err.user_message(SYNC_FALLBACK),
                    snapshot: self.fallback_snapshot(),
                }
            }
        }
    }

    async fn handle_set_embed_mode(&mut self, on: bool) -> NetworkResponse {
        self.persist(|s| s.set_embed_mode(on));
        self.publish_selection().await;
        self.selection_changed()
    }

    async fn handle_disconnect(&mut self) -> NetworkResponse {
        self.persist(LocalStore::clear_selection);
        self.publish_selection().await;
        self.selection_changed()
    }

    fn fallback_snapshot(&self) -> Snapshot {
        match self.store.cached_matches() {
            Some(cached) if !cached.is_empty() => Snapshot::Cached(cached.to_vec()),
            _ => Snapshot::NotConnected,
        }
    }

    fn selection_changed(&self) -> NetworkResponse {
        NetworkResponse::SelectionChanged {
            source: self.store.source().cloned(),
            embed_mode: self.store.embed_mode(),
        }
    }

    /// Best-effort push of the selection to every other viewer.
    async fn publish_selection(&self) {
        if !self.client.endpoints().has(Operation::UpdateSettings) {
            return;
        }
        let settings = SharedSettings {
            tournament_id: self
                .store
                .source()
                .and_then(MatchSource::tournament_id)
                .map(ToOwned::to_owned),
            iframe_mode: self.store.embed_mode(),
        };
        if let Err(e) = self.client.update_settings(&settings).await {
            warn!("publishing selection failed: {e}");
        }
    }

    fn persist<F>(&mut self, write: F)
    where
        F: FnOnce(&mut LocalStore) -> Result<(), String>,
    {
        if let Err(e) = write(&mut self.store) {
            error!("local store: {e}");
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn is_failure(response: &NetworkResponse) -> bool {
    matches!(
        response,
        NetworkResponse::Error { .. }
            | NetworkResponse::SyncFailed { .. }
            | NetworkResponse::MatchesLoaded { error: Some(_), .. }
    )
}
