use crate::client::{ApiError, ApiResult};
use std::collections::HashMap;
use std::path::Path;

/// Backend functions the client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GenerateBracket,
    GetMatches,
    ChallongeSync,
    GetSettings,
    UpdateSettings,
}

impl Operation {
    /// Key of the operation in the function → URL map.
    pub fn key(&self) -> &'static str {
        match self {
            Operation::GenerateBracket => "generate-bracket",
            Operation::GetMatches => "get-matches",
            Operation::ChallongeSync => "challonge-sync",
            Operation::GetSettings => "get-settings",
            Operation::UpdateSettings => "update-settings",
        }
    }
}

/// Function name → URL map (`func2url.json`), as produced by the backend deploy.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    urls: HashMap<String, String>,
}

impl Endpoints {
    pub fn new(urls: HashMap<String, String>) -> Self {
        Self { urls }
    }

    /// Every operation mounted under one base URL, e.g. `{base}/get-matches`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let urls = [
            Operation::GenerateBracket,
            Operation::GetMatches,
            Operation::ChallongeSync,
            Operation::GetSettings,
            Operation::UpdateSettings,
        ]
        .into_iter()
        .map(|op| (op.key().to_owned(), format!("{base}/{}", op.key())))
        .collect();
        Self { urls }
    }

    pub fn from_json(content: &str) -> ApiResult<Self> {
        let urls: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| ApiError::Other(format!("invalid function url map: {e}")))?;
        Ok(Self::new(urls))
    }

    pub fn load(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::NotConfigured(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn url(&self, op: Operation) -> ApiResult<&str> {
        self.urls
            .get(op.key())
            .map(String::as_str)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::NotConfigured(format!("no url for {}", op.key())))
    }

    pub fn has(&self, op: Operation) -> bool {
        self.url(op).is_ok()
    }
}
