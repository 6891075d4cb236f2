use crate::endpoints::{Endpoints, Operation};
use crate::wire::{ErrorBody, GenerateResponse, MatchesResponse, UpdateSettingsRequest};
use crate::{Match, SharedSettings};
use log::debug;
use reqwest::{Client, Response, Url};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

/// Client for the bracket backend functions.
#[derive(Debug, Clone)]
pub struct BracketApi {
    client: Client,
    endpoints: Endpoints,
    timeout: Duration,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    /// Non-2xx status. `message` is the backend's `error` field, when it sent one.
    Server { status: u16, message: Option<String>, url: String },
    Parsing(reqwest::Error, String),
    NotConfigured(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Server { status, message: Some(msg), url } => {
                write!(f, "Server error {status} for {url}: {msg}")
            }
            ApiError::Server { status, message: None, url } => {
                write!(f, "Server error {status} for {url}")
            }
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotConfigured(msg) => write!(f, "Not configured: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Message to show the user: what the server said, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            _ => fallback.to_owned(),
        }
    }
}

impl BracketApi {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("bracketview/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            endpoints,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Ask the backend to seed a fresh random bracket. Returns the number of
    /// matches it created.
    pub async fn generate_bracket(&self) -> ApiResult<u32> {
        let url = self.endpoints.url(Operation::GenerateBracket)?;
        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        let body: GenerateResponse = read_json(response, url).await?;
        Ok(body.matches_created)
    }

    /// All matches of the backend's own (generated) bracket.
    pub async fn fetch_matches(&self) -> ApiResult<Vec<Match>> {
        let url = self.endpoints.url(Operation::GetMatches)?;
        let raw: MatchesResponse = self.get(url).await?;
        Ok(raw.into_matches())
    }

    /// Live matches of a Challonge tournament, mapped by the backend.
    pub async fn challonge_sync(&self, tournament_id: &str) -> ApiResult<Vec<Match>> {
        let base = self.endpoints.url(Operation::ChallongeSync)?;
        let url = Url::parse_with_params(base, &[("tournament_id", tournament_id)])
            .map_err(|e| ApiError::Other(format!("invalid url {base}: {e}")))?;
        let raw: MatchesResponse = self.get(url.as_str()).await?;
        Ok(raw.into_matches())
    }

    /// Tournament selection published for every viewer.
    pub async fn fetch_settings(&self) -> ApiResult<SharedSettings> {
        let url = self.endpoints.url(Operation::GetSettings)?;
        self.get(url).await
    }

    pub async fn update_settings(&self, settings: &SharedSettings) -> ApiResult<()> {
        let url = self.endpoints.url(Operation::UpdateSettings)?;
        debug!("POST {url}");
        let body = UpdateSettingsRequest {
            tournament_id: settings.tournament_id.as_deref(),
            iframe_mode: settings.iframe_mode,
        };
        let response = self
            .client
            .post(url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        let _: serde_json::Value = read_json(response, url).await?;
        Ok(())
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        read_json(response, url).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()));
    }

    // The body may not be JSON at all (gateway errors); the message is optional.
    let message = response
        .text()
        .await
        .ok()
        .and_then(|text| serde_json::from_str::<ErrorBody>(&text).ok())
        .and_then(|body| body.error);
    Err(ApiError::Server { status: status.as_u16(), message, url: url.to_owned() })
}
