pub mod bracket;
pub mod client;
pub mod endpoints;
pub mod wire;

use serde::{Deserialize, Serialize};

pub use bracket::{BracketLayout, BracketVariant, RoundColumn};

// ---------------------------------------------------------------------------
// Domain types, independent of the backend wire format
// ---------------------------------------------------------------------------

/// Bracket stage. Ordered from earliest to latest, which is also the order
/// the columns are laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Round {
    #[serde(rename = "round16")]
    RoundOf16,
    #[serde(rename = "quarter")]
    Quarterfinal,
    #[serde(rename = "semi")]
    Semifinal,
    #[serde(rename = "final")]
    Final,
}

impl Round {
    pub const ALL: [Round; 4] = [
        Round::RoundOf16,
        Round::Quarterfinal,
        Round::Semifinal,
        Round::Final,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Round::RoundOf16 => "Round of 16",
            Round::Quarterfinal => "Quarterfinal",
            Round::Semifinal => "Semifinal",
            Round::Final => "Final",
        }
    }

    /// Wire tag used by the backend.
    pub fn tag(&self) -> &'static str {
        match self {
            Round::RoundOf16 => "round16",
            Round::Quarterfinal => "quarter",
            Round::Semifinal => "semi",
            Round::Final => "final",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Round::ALL.into_iter().find(|r| r.tag() == tag)
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Round::RoundOf16 => Some(Round::Quarterfinal),
            Round::Quarterfinal => Some(Round::Semifinal),
            Round::Semifinal => Some(Round::Final),
            Round::Final => None,
        }
    }
}

/// Only `Finished` matches show scores and a winner. Everything the backend
/// sends that is not "finished" ("pending", "scheduled", ...) is `Scheduled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Finished,
}

impl From<String> for MatchStatus {
    fn from(s: String) -> Self {
        if s == "finished" {
            MatchStatus::Finished
        } else {
            MatchStatus::Scheduled
        }
    }
}

impl From<MatchStatus> for String {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Finished => "finished".into(),
            MatchStatus::Scheduled => "pending".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Team1,
    Team2,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub round: Round,
    pub match_number: u32,
    #[serde(default)]
    pub team1: Option<Team>,
    #[serde(default)]
    pub team2: Option<Team>,
    #[serde(default)]
    pub team1_score: u32,
    #[serde(default)]
    pub team2_score: u32,
    #[serde(default)]
    pub winner_id: Option<i64>,
    #[serde(default)]
    pub status: MatchStatus,
}

impl Match {
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn team(&self, side: Side) -> Option<&Team> {
        match side {
            Side::Team1 => self.team1.as_ref(),
            Side::Team2 => self.team2.as_ref(),
        }
    }

    /// Winner styling applies only to finished matches, and only to the side
    /// whose team id equals the winner id.
    pub fn side_won(&self, side: Side) -> bool {
        if !self.is_finished() {
            return false;
        }
        match (self.winner_id, self.team(side)) {
            (Some(winner), Some(team)) => team.id == winner,
            _ => false,
        }
    }

    /// Score to display for a side; `None` until the match is finished.
    pub fn display_score(&self, side: Side) -> Option<u32> {
        if !self.is_finished() {
            return None;
        }
        Some(match side {
            Side::Team1 => self.team1_score,
            Side::Team2 => self.team2_score,
        })
    }

    pub fn winner(&self) -> Option<&Team> {
        [Side::Team1, Side::Team2]
            .into_iter()
            .find(|side| self.side_won(*side))
            .and_then(|side| self.team(side))
    }

    /// Drop a winner id that names neither side.
    pub(crate) fn enforce_winner_invariant(&mut self) -> bool {
        let Some(winner) = self.winner_id else {
            return true;
        };
        let names_a_side = [&self.team1, &self.team2]
            .into_iter()
            .flatten()
            .any(|t| t.id == winner);
        if !names_a_side {
            self.winner_id = None;
        }
        names_a_side
    }
}

/// Tournament selection published through the backend's settings functions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedSettings {
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub iframe_mode: bool,
}

/// Accepts either a bare Challonge tournament id or a full tournament URL and
/// returns the identifier (the last non-empty path segment).
pub fn extract_tournament_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    // With a scheme the host is never the id: "https://challonge.com/" has none.
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => without_query,
    };
    let id = path.split('/').rev().find(|segment| !segment.is_empty())?;
    if id.contains(':') {
        return None;
    }
    Some(id.to_owned())
}

/// Embed URL of Challonge's own bracket widget for a tournament.
pub fn challonge_embed_url(tournament_id: &str) -> String {
    format!("https://challonge.com/{tournament_id}/module")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, name: &str) -> Team {
        Team { id, name: name.into(), logo_url: None }
    }

    fn finished(winner: Option<i64>) -> Match {
        Match {
            id: 1,
            round: Round::Final,
            match_number: 1,
            team1: Some(team(10, "Navi")),
            team2: Some(team(20, "Vitality")),
            team1_score: 2,
            team2_score: 1,
            winner_id: winner,
            status: MatchStatus::Finished,
        }
    }

    #[test]
    fn extracts_trailing_segment_from_url() {
        assert_eq!(
            extract_tournament_id("https://example.com/my_cup").as_deref(),
            Some("my_cup")
        );
    }

    #[test]
    fn extract_keeps_bare_identifier() {
        assert_eq!(extract_tournament_id("  my_cup ").as_deref(), Some("my_cup"));
    }

    #[test]
    fn extract_ignores_trailing_slash_query_and_fragment() {
        assert_eq!(
            extract_tournament_id("https://challonge.com/ru/spring2025/?tab=bracket#top").as_deref(),
            Some("spring2025")
        );
    }

    #[test]
    fn extract_rejects_empty_input() {
        assert_eq!(extract_tournament_id("   "), None);
        assert_eq!(extract_tournament_id("https://"), None);
        assert_eq!(extract_tournament_id("https://challonge.com/"), None);
        assert_eq!(extract_tournament_id("https://challonge.com"), None);
        assert_eq!(extract_tournament_id("challonge.com/my_cup/").as_deref(), Some("my_cup"));
    }

    #[test]
    fn only_winning_side_is_marked_won() {
        let m = finished(Some(20));
        assert!(!m.side_won(Side::Team1));
        assert!(m.side_won(Side::Team2));
        assert_eq!(m.winner().map(|t| t.name.as_str()), Some("Vitality"));
    }

    #[test]
    fn unfinished_match_marks_no_winner_and_hides_scores() {
        let mut m = finished(Some(10));
        m.status = MatchStatus::Scheduled;
        assert!(!m.side_won(Side::Team1));
        assert!(!m.side_won(Side::Team2));
        assert_eq!(m.display_score(Side::Team1), None);
    }

    #[test]
    fn winner_naming_neither_side_is_dropped() {
        let mut m = finished(Some(99));
        assert!(!m.enforce_winner_invariant());
        assert_eq!(m.winner_id, None);

        let mut ok = finished(Some(10));
        assert!(ok.enforce_winner_invariant());
        assert_eq!(ok.winner_id, Some(10));
    }

    #[test]
    fn status_decodes_anything_but_finished_as_scheduled() {
        let json = r#"{"id":3,"round":"semi","match_number":2,"status":"pending"}"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.round, Round::Semifinal);
        assert!(m.team1.is_none());
        assert_eq!(m.team1_score, 0);
    }

    #[test]
    fn round_navigation_and_tags() {
        assert_eq!(Round::Quarterfinal.next(), Some(Round::Semifinal));
        assert_eq!(Round::Final.next(), None);
        assert_eq!(Round::from_tag("quarter"), Some(Round::Quarterfinal));
        assert_eq!(Round::from_tag("round5"), None);
    }
}
