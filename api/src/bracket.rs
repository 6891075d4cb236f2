use crate::{Match, Round};
use std::collections::BTreeMap;

/// Matches of one round, ordered by match number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundColumn {
    pub round: Round,
    pub matches: Vec<Match>,
}

/// Layout variants seen in practice. They differ only in column count and
/// spacing; the per-match logic is the same for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketVariant {
    FinalOnly,
    SemifinalBracket,
    QuarterfinalBracket,
    RoundOf16Bracket,
}

impl BracketVariant {
    pub fn column_count(&self) -> usize {
        match self {
            BracketVariant::FinalOnly => 1,
            BracketVariant::SemifinalBracket => 2,
            BracketVariant::QuarterfinalBracket => 3,
            BracketVariant::RoundOf16Bracket => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BracketVariant::FinalOnly => "final only",
            BracketVariant::SemifinalBracket => "4-team bracket",
            BracketVariant::QuarterfinalBracket => "8-team bracket",
            BracketVariant::RoundOf16Bracket => "16-team bracket",
        }
    }

    fn starting_at(round: Round) -> Self {
        match round {
            Round::RoundOf16 => BracketVariant::RoundOf16Bracket,
            Round::Quarterfinal => BracketVariant::QuarterfinalBracket,
            Round::Semifinal => BracketVariant::SemifinalBracket,
            Round::Final => BracketVariant::FinalOnly,
        }
    }
}

/// The bracket grouped for display: one column per round, earliest first,
/// the final always last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketLayout {
    pub columns: Vec<RoundColumn>,
}

impl BracketLayout {
    /// Group an unordered list of matches by round.
    ///
    /// Columns run from the earliest round present through the final. Rounds
    /// in between that have no matches yet still get an (empty) column so the
    /// renderer can draw "not yet formed" slots for them.
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut by_round: BTreeMap<Round, Vec<Match>> = BTreeMap::new();
        for m in matches {
            by_round.entry(m.round).or_default().push(m.clone());
        }

        let Some(&first) = by_round.keys().next() else {
            return Self::default();
        };

        let mut columns = Vec::new();
        let mut round = Some(first);
        while let Some(r) = round {
            let mut games = by_round.remove(&r).unwrap_or_default();
            // Stable: equal match numbers keep their input order.
            games.sort_by_key(|m| m.match_number);
            columns.push(RoundColumn { round: r, matches: games });
            round = r.next();
        }

        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.matches.is_empty())
    }

    pub fn variant(&self) -> Option<BracketVariant> {
        self.columns.first().map(|c| BracketVariant::starting_at(c.round))
    }

    pub fn column(&self, round: Round) -> Option<&RoundColumn> {
        self.columns.iter().find(|c| c.round == round)
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.column(Round::Final).and_then(|c| c.matches.first())
    }

    pub fn match_count(&self) -> usize {
        self.columns.iter().map(|c| c.matches.len()).sum()
    }
}
