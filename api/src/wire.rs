/// Wire types for the bracket backend functions.
/// These map to the clean domain types in lib.rs via `into_matches` and friends.
use crate::Match;
use log::warn;
use serde::{Deserialize, Serialize};

/// Body of `get-matches` and of a successful `challonge-sync`.
///
/// Entries are kept as raw JSON so that one malformed match (unknown round
/// tag, missing id) is skipped instead of failing the whole snapshot.
#[derive(Debug, Deserialize, Default)]
pub struct MatchesResponse {
    #[serde(default)]
    pub matches: Option<Vec<serde_json::Value>>,
}

impl MatchesResponse {
    pub fn into_matches(self) -> Vec<Match> {
        self.matches
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Match>(raw) {
                Ok(mut m) => {
                    if !m.enforce_winner_invariant() {
                        warn!("match {}: winner id names neither team, ignoring it", m.id);
                    }
                    Some(m)
                }
                Err(e) => {
                    warn!("skipping malformed match entry: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Body of a successful `generate-bracket`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub matches_created: u32,
    #[serde(default)]
    pub teams_seeded: Option<u32>,
}

/// Error body every backend function returns on a non-2xx status.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Body of `update-settings`.
#[derive(Debug, Serialize)]
pub struct UpdateSettingsRequest<'a> {
    pub tournament_id: Option<&'a str>,
    pub iframe_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Round;

    #[test]
    fn absent_matches_field_is_an_empty_snapshot() {
        let raw: MatchesResponse = serde_json::from_str("{}").unwrap();
        assert!(raw.into_matches().is_empty());

        let raw: MatchesResponse = serde_json::from_str(r#"{"matches":null}"#).unwrap();
        assert!(raw.into_matches().is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let raw: MatchesResponse = serde_json::from_str(
            r#"{"matches":[
                {"id":1,"round":"quarter","match_number":1,"status":"pending"},
                {"id":2,"round":"round5","match_number":1,"status":"pending"},
                {"round":"semi","match_number":1}
            ]}"#,
        )
        .unwrap();
        let matches = raw.into_matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].round, Round::Quarterfinal);
    }

    #[test]
    fn full_match_payload_maps_teams_and_winner() {
        let raw: MatchesResponse = serde_json::from_str(
            r#"{"matches":[{
                "id": 11, "round": "final", "match_number": 1,
                "team1": {"id": 1, "name": "Alpha", "logo_url": null},
                "team2": {"id": 2, "name": "Bravo", "seed": 4},
                "team1_score": 13, "team2_score": 9,
                "winner_id": 1, "status": "finished"
            }]}"#,
        )
        .unwrap();
        let matches = raw.into_matches();
        let m = &matches[0];
        assert_eq!(m.team1.as_ref().map(|t| t.name.as_str()), Some("Alpha"));
        assert_eq!(m.team2.as_ref().map(|t| t.id), Some(2));
        assert_eq!(m.winner_id, Some(1));
        assert!(m.is_finished());
    }

    #[test]
    fn generate_response_reads_camel_case_count() {
        let raw: GenerateResponse =
            serde_json::from_str(r#"{"success":true,"matchesCreated":7,"teamsSeeded":8}"#).unwrap();
        assert_eq!(raw.matches_created, 7);
        assert_eq!(raw.teams_seeded, Some(8));
    }
}
